//! Paired-runs tester orchestrator.
//!
//! The per-key analogue of the batched state machine: every unique Weyl
//! key is tracked, submitted, and resumed independently, and the ledger is
//! persisted after every submission and every successful collection so
//! partial progress across many keys survives a crash between keys.
//!
//! Keys are processed strictly sequentially, so at most one unresolved
//! submission exists at a time.
//!
//! Submitting `2k` shots as one backend call is far cheaper than `k`
//! separate 2-shot calls, but the paired semantics require each pair to be
//! drawn as if from two independent executions. The collected histogram is
//! therefore expanded into individual outcomes, shuffled uniformly, and
//! partitioned into disjoint consecutive pairs, which removes any ordering
//! artifact the backend may introduce between adjacent shots.

use std::path::Path;
use std::time::Duration;

use rand::Rng;
use rand::seq::SliceRandom;
use rustc_hash::FxHashMap;
use tracing::{info, warn};

use clifftest_hal::{Backend, Counts, HalError, JobId, Retrieval, TranspileFn};
use clifftest_ir::Circuit;

use crate::checkpoint::{
    JobEntry, PairedPlan, Plan, load_paired_jobs, load_paired_plan, save_paired_jobs, save_plan,
};
use crate::circuits::tester_circuit;
use crate::error::{TesterError, TesterResult};
use crate::key::WeylKey;
use crate::results::{PairedRawResults, PairedSample};

/// Expand a histogram into individual outcomes, shuffle, and split into
/// disjoint consecutive pairs.
///
/// An odd total drops the final unpaired outcome.
pub fn expand_and_pair(counts: &Counts, rng: &mut impl Rng) -> Vec<(String, String)> {
    let mut outcomes: Vec<&str> = Vec::with_capacity(counts.total() as usize);
    for (bitstring, freq) in counts.iter() {
        for _ in 0..freq {
            outcomes.push(bitstring);
        }
    }
    outcomes.shuffle(rng);
    outcomes
        .chunks_exact(2)
        .map(|pair| (pair[0].to_string(), pair[1].to_string()))
        .collect()
}

/// Run the paired-runs Clifford tester for `u_circuit` on `backend`.
///
/// Draws `total_samples` random Weyl keys (the persisted plan fixes them
/// for all resumed runs), executes `2 * multiplicity` shots per unique
/// key, and returns one `(y1, y2)` pair per drawn sample.
pub async fn run_paired(
    u_circuit: &Circuit,
    n: usize,
    total_samples: u32,
    backend: &dyn Backend,
    transpile: &TranspileFn,
    timeout: Option<Duration>,
    checkpoint_dir: Option<&Path>,
) -> TesterResult<PairedRawResults> {
    // Phase 1: load or generate the plan. Randomness is resolved here,
    // exactly once.
    let plan = match checkpoint_dir {
        Some(dir) => load_paired_plan(dir).await?,
        None => None,
    };
    let plan = match plan {
        Some(plan) => {
            info!(
                unique_keys = plan.num_unique(),
                total_samples = plan.total_samples,
                "loaded existing paired plan"
            );
            plan
        }
        None => {
            let plan = PairedPlan::sample(n, total_samples, &mut rand::thread_rng());
            if let Some(dir) = checkpoint_dir {
                save_plan(&Plan::Paired(plan.clone()), dir).await?;
            }
            info!(
                unique_keys = plan.num_unique(),
                total_samples, "created new paired plan"
            );
            plan
        }
    };
    let work_items = plan.multiplicities()?;

    // Phase 2: one circuit per unique key.
    info!(circuits = work_items.len(), "building tester circuits");
    let mut circuits: FxHashMap<WeylKey, Circuit> = FxHashMap::default();
    for (key, _) in &work_items {
        circuits.insert(
            key.clone(),
            transpile(&tester_circuit(u_circuit, plan.n, key)?),
        );
    }

    // Phase 3: load the ledger and collect each key independently.
    let mut ledger = match checkpoint_dir {
        Some(dir) => load_paired_jobs(dir).await?,
        None => None,
    }
    .unwrap_or_default();
    if ledger.num_collected() > 0 {
        info!(
            collected = ledger.num_collected(),
            total = work_items.len(),
            "loaded jobs ledger"
        );
    }

    let total = work_items.len();
    for (idx, (key, multiplicity)) in work_items.iter().enumerate() {
        let entry = ledger.entry(key).cloned();

        // Collected counts are immutable; skip on every later pass.
        if entry.as_ref().is_some_and(|e| e.counts.is_some()) {
            continue;
        }

        // A recorded id without counts: try retrieval before resubmitting.
        if let (Some(dir), Some(recorded_id)) = (
            checkpoint_dir,
            entry.as_ref().and_then(|e| e.job_id.clone()),
        ) {
            info!(key = %key, job_id = %recorded_id, idx = idx + 1, total,
                  "retrieving previous submission");
            match try_retrieve(backend, dir, &recorded_id, timeout).await? {
                Some(counts) => {
                    ledger.set_entry(
                        key,
                        JobEntry {
                            job_id: Some(recorded_id),
                            counts: Some(counts),
                        },
                    );
                    save_paired_jobs(&ledger, dir).await?;
                    info!(key = %key, idx = idx + 1, total, "retrieved");
                    continue;
                }
                None => {
                    warn!(key = %key, job_id = %recorded_id, "retrieval failed, resubmitting");
                }
            }
        }

        // Submit fresh: 2 shots per drawn sample of this key.
        let shots = 2 * multiplicity;
        info!(key = %key, shots, idx = idx + 1, total, "submitting");
        let circuit = circuits
            .get(key)
            .ok_or_else(|| TesterError::MissingCounts(key.encode()))?;
        let handle = backend.submit(std::slice::from_ref(circuit), shots).await?;
        let job_id = handle.id();
        ledger.set_entry(
            key,
            JobEntry {
                job_id: job_id.clone(),
                counts: None,
            },
        );
        if let Some(dir) = checkpoint_dir {
            save_paired_jobs(&ledger, dir).await?;
            handle.serialize(dir).await?;
        }

        let counts = match handle.result(timeout).await {
            Retrieval::Success(result) => match result.counts.into_iter().next() {
                Some(counts) => counts,
                None => {
                    return Err(TesterError::ResultShapeMismatch {
                        expected: 1,
                        got: 0,
                    });
                }
            },
            Retrieval::TimedOut => {
                return Err(TesterError::Timeout(
                    job_id.unwrap_or_else(|| JobId::new("unregistered")),
                ));
            }
            Retrieval::TransientFailure(reason) => {
                // The persisted id lets the next invocation retry retrieval.
                return Err(HalError::JobFailed(reason).into());
            }
        };
        ledger.set_entry(
            key,
            JobEntry {
                job_id,
                counts: Some(counts),
            },
        );
        if let Some(dir) = checkpoint_dir {
            save_paired_jobs(&ledger, dir).await?;
        }
        info!(key = %key, idx = idx + 1, total, "collected");
    }

    // Phase 4: expand → shuffle → pair, then concatenate across keys.
    let mut rng = rand::thread_rng();
    let mut samples = Vec::new();
    for (key, _) in &work_items {
        let counts = ledger
            .entry(key)
            .and_then(|e| e.counts.as_ref())
            .ok_or_else(|| TesterError::MissingCounts(key.encode()))?;
        for (y1, y2) in expand_and_pair(counts, &mut rng) {
            samples.push(PairedSample {
                key: key.clone(),
                y1,
                y2,
            });
        }
    }
    info!(pairs = samples.len(), "paired run collected");
    Ok(PairedRawResults(samples))
}

/// One retrieval attempt for a previously recorded submission.
///
/// `Ok(Some(counts))` on success; `Ok(None)` for any transient condition
/// (reattachment failure, id mismatch, lost job, malformed shape) so the
/// caller resubmits; `Err` only for a timeout, which must abort the run.
async fn try_retrieve(
    backend: &dyn Backend,
    dir: &Path,
    recorded_id: &JobId,
    timeout: Option<Duration>,
) -> TesterResult<Option<Counts>> {
    let handle = match backend.retrieve(dir, recorded_id).await {
        Ok(handle) => handle,
        Err(e) => {
            warn!(job_id = %recorded_id, error = %e, "could not reattach");
            return Ok(None);
        }
    };
    // A reconstructed handle whose id no longer matches the ledger is not
    // trusted; force resubmission rather than collect someone else's job.
    if let Some(actual) = handle.id() {
        if actual != *recorded_id {
            warn!(job_id = %recorded_id, actual = %actual, "descriptor id mismatch");
            return Ok(None);
        }
    }
    match handle.result(timeout).await {
        Retrieval::Success(result) => match result.counts.into_iter().next() {
            Some(counts) => Ok(Some(counts)),
            None => Ok(None),
        },
        Retrieval::TimedOut => Err(TesterError::Timeout(recorded_id.clone())),
        Retrieval::TransientFailure(reason) => {
            warn!(job_id = %recorded_id, %reason, "transient retrieval failure");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn counts(pairs: &[(&str, u64)]) -> Counts {
        pairs.iter().map(|(s, c)| (s.to_string(), *c)).collect()
    }

    #[test]
    fn test_pairing_even_total() {
        let c = counts(&[("00", 4), ("11", 2)]);
        let mut rng = StdRng::seed_from_u64(3);
        let pairs = expand_and_pair(&c, &mut rng);
        assert_eq!(pairs.len(), 3);

        // Expansion preserves multiplicities.
        let mut flat: Vec<&str> = pairs
            .iter()
            .flat_map(|(a, b)| [a.as_str(), b.as_str()])
            .collect();
        flat.sort_unstable();
        assert_eq!(flat, vec!["00", "00", "00", "00", "11", "11"]);
    }

    #[test]
    fn test_pairing_odd_total_drops_one() {
        let c = counts(&[("00", 3), ("10", 2)]);
        let mut rng = StdRng::seed_from_u64(3);
        let pairs = expand_and_pair(&c, &mut rng);
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn test_pairing_empty() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(expand_and_pair(&Counts::new(), &mut rng).is_empty());
    }

    #[test]
    fn test_pairing_single_outcome_dropped() {
        let c = counts(&[("01", 1)]);
        let mut rng = StdRng::seed_from_u64(3);
        assert!(expand_and_pair(&c, &mut rng).is_empty());
    }
}
