//! Checkpoint store: plans and job ledgers.
//!
//! One experiment directory holds two small JSON documents:
//!
//! - `plan.json` — the fixed, randomness-resolved workload. Written once,
//!   then read-only: a crashed run resumed against the same directory
//!   reproduces the identical work set.
//! - `jobs.json` — the per-work-item submission ledger. Rewritten after
//!   every state-changing remote interaction.
//!
//! plus zero or one `job_<id>.json` backend descriptor files (see
//! `clifftest_hal::job`).
//!
//! Every write is atomic (temp sibling + rename): a crash mid-write leaves
//! either the old complete document or the new one, never a hybrid.

use std::collections::BTreeMap;
use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::debug;

use clifftest_hal::{Counts, JobId};

use crate::error::{TesterError, TesterResult};
use crate::key::WeylKey;

/// Plan document filename.
pub const PLAN_FILE: &str = "plan.json";
/// Jobs ledger filename.
pub const JOBS_FILE: &str = "jobs.json";

const BATCHED_TAG: &str = "batched";
const PAIRED_TAG: &str = "paired_runs";

// --- Plans ---

/// The fixed workload of a batched run: every Weyl key exactly once, one
/// uniform shot count, executed as a single joint submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchedPlan {
    /// Qubit count of the unitary under test.
    pub n: usize,
    /// Shots per key.
    pub shots_per_key: u32,
    /// Every 2n-bit key, in submission order.
    pub all_keys: Vec<WeylKey>,
}

impl BatchedPlan {
    /// Deterministically enumerate all 2^(2n) keys.
    pub fn enumerate(n: usize, shots_per_key: u32) -> Self {
        Self {
            n,
            shots_per_key,
            all_keys: WeylKey::all(n),
        }
    }
}

/// The fixed workload of a paired run: `total_samples` keys drawn uniformly
/// at random, deduplicated into multiplicities.
///
/// A key drawn k times needs `2k` shots later: each pair of shots yields
/// one paired sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairedPlan {
    /// Qubit count of the unitary under test.
    pub n: usize,
    /// Number of keys drawn (= number of eventual sample pairs).
    pub total_samples: u32,
    /// Encoded key → draw multiplicity.
    pub key_counts: BTreeMap<String, u32>,
}

impl PairedPlan {
    /// Draw `total_samples` keys uniformly from {0,1}^2n and deduplicate.
    ///
    /// Randomness is resolved here, once; the persisted plan never
    /// re-draws.
    pub fn sample(n: usize, total_samples: u32, rng: &mut impl Rng) -> Self {
        let mut key_counts: BTreeMap<String, u32> = BTreeMap::new();
        for _ in 0..total_samples {
            let key = WeylKey::random(n, rng);
            *key_counts.entry(key.encode()).or_insert(0) += 1;
        }
        Self {
            n,
            total_samples,
            key_counts,
        }
    }

    /// Decoded (key, multiplicity) pairs, in encoded-key order.
    ///
    /// The order is deterministic across resumed runs, which keeps progress
    /// output and ledger writes stable.
    pub fn multiplicities(&self) -> TesterResult<Vec<(WeylKey, u32)>> {
        self.key_counts
            .iter()
            .map(|(encoded, &count)| Ok((WeylKey::decode(encoded)?, count)))
            .collect()
    }

    /// Number of unique keys.
    pub fn num_unique(&self) -> usize {
        self.key_counts.len()
    }
}

/// The discriminated plan union persisted as `plan.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Plan {
    /// A batched-variant plan.
    #[serde(rename = "batched")]
    Batched(BatchedPlan),
    /// A paired-runs-variant plan.
    #[serde(rename = "paired_runs")]
    Paired(PairedPlan),
}

impl Plan {
    fn tag(&self) -> &'static str {
        match self {
            Plan::Batched(_) => BATCHED_TAG,
            Plan::Paired(_) => PAIRED_TAG,
        }
    }
}

// --- Ledgers ---

/// Per-key submission state.
///
/// States: unsubmitted (no entry) → submitted (id set) → collected (counts
/// set). Once `counts` is set it is immutable and the key is skipped on
/// every later pass; a retry after a transient failure overwrites the id
/// only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobEntry {
    /// Backend job id, if the submission registered one.
    pub job_id: Option<JobId>,
    /// Collected histogram, once retrieval succeeded.
    pub counts: Option<Counts>,
}

/// Ledger for the batched variant: one global submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchedLedger {
    /// The joint submission's job id.
    pub job_id: Option<JobId>,
}

/// Ledger for the paired variant: one entry per work key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PairedLedger {
    /// Encoded key → submission state.
    pub jobs: BTreeMap<String, JobEntry>,
}

impl PairedLedger {
    /// Look up the entry for a key.
    pub fn entry(&self, key: &WeylKey) -> Option<&JobEntry> {
        self.jobs.get(&key.encode())
    }

    /// Insert or replace the entry for a key.
    pub fn set_entry(&mut self, key: &WeylKey, entry: JobEntry) {
        self.jobs.insert(key.encode(), entry);
    }

    /// Number of keys with collected counts.
    pub fn num_collected(&self) -> usize {
        self.jobs.values().filter(|e| e.counts.is_some()).count()
    }
}

// --- Save / Load ---

/// Atomically persist a JSON document: temp sibling, then rename.
pub async fn atomic_write_json<T: Serialize>(path: &Path, value: &T) -> TesterResult<()> {
    let content = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, content).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> TesterResult<Option<T>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Persist a plan. Creates the directory if needed.
pub async fn save_plan(plan: &Plan, dir: &Path) -> TesterResult<()> {
    tokio::fs::create_dir_all(dir).await?;
    atomic_write_json(&dir.join(PLAN_FILE), plan).await?;
    debug!(dir = %dir.display(), plan_type = plan.tag(), "plan persisted");
    Ok(())
}

/// Load a batched plan, or `None` if no plan exists.
///
/// A persisted plan of the other variant is a fatal configuration error:
/// the directory was reused across tester variants.
pub async fn load_batched_plan(dir: &Path) -> TesterResult<Option<BatchedPlan>> {
    match read_json::<Plan>(&dir.join(PLAN_FILE)).await? {
        None => Ok(None),
        Some(Plan::Batched(plan)) => Ok(Some(plan)),
        Some(other) => Err(TesterError::PlanTypeMismatch {
            expected: BATCHED_TAG,
            found: other.tag().to_string(),
        }),
    }
}

/// Load a paired plan, or `None` if no plan exists.
pub async fn load_paired_plan(dir: &Path) -> TesterResult<Option<PairedPlan>> {
    match read_json::<Plan>(&dir.join(PLAN_FILE)).await? {
        None => Ok(None),
        Some(Plan::Paired(plan)) => Ok(Some(plan)),
        Some(other) => Err(TesterError::PlanTypeMismatch {
            expected: PAIRED_TAG,
            found: other.tag().to_string(),
        }),
    }
}

/// Persist the batched ledger.
pub async fn save_batched_jobs(ledger: &BatchedLedger, dir: &Path) -> TesterResult<()> {
    tokio::fs::create_dir_all(dir).await?;
    atomic_write_json(&dir.join(JOBS_FILE), ledger).await
}

/// Load the batched ledger, or `None` if absent.
pub async fn load_batched_jobs(dir: &Path) -> TesterResult<Option<BatchedLedger>> {
    read_json(&dir.join(JOBS_FILE)).await
}

/// Persist the paired ledger.
pub async fn save_paired_jobs(ledger: &PairedLedger, dir: &Path) -> TesterResult<()> {
    tokio::fs::create_dir_all(dir).await?;
    atomic_write_json(&dir.join(JOBS_FILE), ledger).await
}

/// Load the paired ledger, or `None` if absent.
pub async fn load_paired_jobs(dir: &Path) -> TesterResult<Option<PairedLedger>> {
    read_json(&dir.join(JOBS_FILE)).await
}

/// Delete plan, ledger, and any serialized job descriptors.
///
/// The commit point of a finished experiment. Must only be called after
/// raw results have been durably written.
pub async fn cleanup(dir: &Path) -> TesterResult<()> {
    for filename in [PLAN_FILE, JOBS_FILE] {
        match tokio::fs::remove_file(dir.join(filename)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    clifftest_hal::job::purge_descriptors(dir).await?;
    debug!(dir = %dir.display(), "checkpoint cleaned up");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[tokio::test]
    async fn test_plan_round_trip_batched() {
        let dir = tempfile::tempdir().unwrap();
        let plan = BatchedPlan::enumerate(2, 500);
        save_plan(&Plan::Batched(plan.clone()), dir.path())
            .await
            .unwrap();

        let loaded = load_batched_plan(dir.path()).await.unwrap().unwrap();
        assert_eq!(plan, loaded);
        assert_eq!(loaded.all_keys.len(), 16);
    }

    #[tokio::test]
    async fn test_plan_round_trip_paired() {
        let dir = tempfile::tempdir().unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let plan = PairedPlan::sample(2, 100, &mut rng);
        assert_eq!(plan.key_counts.values().sum::<u32>(), 100);

        save_plan(&Plan::Paired(plan.clone()), dir.path())
            .await
            .unwrap();
        let loaded = load_paired_plan(dir.path()).await.unwrap().unwrap();
        assert_eq!(plan, loaded);
    }

    #[tokio::test]
    async fn test_plan_type_mismatch_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let plan = Plan::Batched(BatchedPlan::enumerate(1, 10));
        save_plan(&plan, dir.path()).await.unwrap();

        let err = load_paired_plan(dir.path()).await.unwrap_err();
        assert!(matches!(
            err,
            TesterError::PlanTypeMismatch {
                expected: "paired_runs",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_missing_plan_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_batched_plan(dir.path()).await.unwrap().is_none());
        assert!(load_paired_plan(dir.path()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ledger_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let key = WeylKey::new(vec![0, 1]).unwrap();
        let mut ledger = PairedLedger::default();
        ledger.set_entry(
            &key,
            JobEntry {
                job_id: Some(JobId::new("j-1")),
                counts: None,
            },
        );
        save_paired_jobs(&ledger, dir.path()).await.unwrap();

        let loaded = load_paired_jobs(dir.path()).await.unwrap().unwrap();
        assert_eq!(ledger, loaded);
        assert_eq!(loaded.entry(&key).unwrap().job_id, Some(JobId::new("j-1")));
        assert_eq!(loaded.num_collected(), 0);
    }

    #[tokio::test]
    async fn test_interrupted_write_leaves_old_content() {
        // A crash between "write temp" and "rename" must leave the old
        // document fully readable.
        let dir = tempfile::tempdir().unwrap();
        let plan = Plan::Batched(BatchedPlan::enumerate(1, 10));
        save_plan(&plan, dir.path()).await.unwrap();

        let tmp = dir.path().join("plan.json.tmp");
        tokio::fs::write(&tmp, "{ half a docum").await.unwrap();

        let loaded = load_batched_plan(dir.path()).await.unwrap().unwrap();
        assert_eq!(loaded.all_keys.len(), 4);
    }

    #[tokio::test]
    async fn test_cleanup_removes_everything() {
        let dir = tempfile::tempdir().unwrap();
        save_plan(&Plan::Batched(BatchedPlan::enumerate(1, 10)), dir.path())
            .await
            .unwrap();
        save_batched_jobs(
            &BatchedLedger {
                job_id: Some(JobId::new("j")),
            },
            dir.path(),
        )
        .await
        .unwrap();
        clifftest_hal::job::write_descriptor(dir.path(), &JobId::new("j"), "{}")
            .await
            .unwrap();

        cleanup(dir.path()).await.unwrap();
        assert!(load_batched_plan(dir.path()).await.unwrap().is_none());
        assert!(load_batched_jobs(dir.path()).await.unwrap().is_none());
        assert!(
            clifftest_hal::job::read_descriptor(dir.path(), &JobId::new("j"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_cleanup_on_empty_dir_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        cleanup(dir.path()).await.unwrap();
    }

    #[test]
    fn test_paired_plan_multiplicities_decode() {
        let mut rng = StdRng::seed_from_u64(1);
        let plan = PairedPlan::sample(1, 20, &mut rng);
        let mults = plan.multiplicities().unwrap();
        assert_eq!(mults.iter().map(|(_, c)| c).sum::<u32>(), 20);
        assert!(mults.iter().all(|(k, _)| k.len() == 2));
    }
}
