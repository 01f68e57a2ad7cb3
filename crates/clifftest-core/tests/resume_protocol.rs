//! Resumption-protocol tests against a scripted backend.
//!
//! These tests pre-seed checkpoint directories with plans and ledgers in
//! various states of progress, then assert on exactly which backend calls
//! the orchestrators make when resuming: collected work is never redone,
//! recorded submissions are retrieved before any resubmission, and a
//! timeout aborts without resubmitting.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use clifftest_core::checkpoint::{
    BatchedLedger, BatchedPlan, JobEntry, PairedLedger, PairedPlan, Plan, load_batched_jobs,
    load_paired_jobs, load_paired_plan, save_batched_jobs, save_paired_jobs, save_plan,
};
use clifftest_core::{TesterError, WeylKey, run_batched, run_paired};
use clifftest_hal::{
    Backend, Counts, ExecutionResult, HalError, HalResult, JobHandle, JobId, Retrieval,
    TranspileFn, identity_transpile,
};
use clifftest_ir::Circuit;

/// What a handle's `result()` call should produce.
#[derive(Clone)]
enum Script {
    Succeed,
    TimeOut,
    Fail(&'static str),
}

struct ScriptedHandle {
    id: JobId,
    num_circuits: usize,
    shots: u32,
    script: Script,
}

#[async_trait]
impl JobHandle for ScriptedHandle {
    fn id(&self) -> Option<JobId> {
        Some(self.id.clone())
    }

    async fn result(&self, _timeout: Option<Duration>) -> Retrieval {
        match &self.script {
            Script::Succeed => {
                // Deterministic histograms: every shot lands on "00".
                let counts: Vec<Counts> = (0..self.num_circuits)
                    .map(|_| [("00".to_string(), u64::from(self.shots))].into_iter().collect())
                    .collect();
                Retrieval::Success(ExecutionResult::new(counts, self.shots))
            }
            Script::TimeOut => Retrieval::TimedOut,
            Script::Fail(reason) => Retrieval::TransientFailure((*reason).to_string()),
        }
    }
}

/// A backend that follows a fixed script and counts its calls.
struct ScriptedBackend {
    submits: AtomicUsize,
    retrieves: AtomicUsize,
    submit_script: Script,
    /// `None` means every reattachment attempt fails with `JobNotFound`.
    retrieve_script: Option<Script>,
    /// Circuits covered by a retrieved job's result.
    retrieve_circuits: usize,
    retrieve_shots: u32,
}

impl ScriptedBackend {
    fn new(submit_script: Script) -> Self {
        Self {
            submits: AtomicUsize::new(0),
            retrieves: AtomicUsize::new(0),
            submit_script,
            retrieve_script: None,
            retrieve_circuits: 1,
            retrieve_shots: 2,
        }
    }

    fn with_retrieval(mut self, script: Script, circuits: usize, shots: u32) -> Self {
        self.retrieve_script = Some(script);
        self.retrieve_circuits = circuits;
        self.retrieve_shots = shots;
        self
    }

    fn num_submits(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }

    fn num_retrieves(&self) -> usize {
        self.retrieves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn submit(&self, circuits: &[Circuit], shots: u32) -> HalResult<Box<dyn JobHandle>> {
        let n = self.submits.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedHandle {
            id: JobId::new(format!("sub-{n}")),
            num_circuits: circuits.len(),
            shots,
            script: self.submit_script.clone(),
        }))
    }

    async fn retrieve(&self, _dir: &Path, id: &JobId) -> HalResult<Box<dyn JobHandle>> {
        self.retrieves.fetch_add(1, Ordering::SeqCst);
        match &self.retrieve_script {
            Some(script) => Ok(Box::new(ScriptedHandle {
                id: id.clone(),
                num_circuits: self.retrieve_circuits,
                shots: self.retrieve_shots,
                script: script.clone(),
            })),
            None => Err(HalError::JobNotFound(id.to_string())),
        }
    }
}

fn identity_circuit() -> Circuit {
    Circuit::new("identity", 1, 0)
}

fn transpile() -> TranspileFn {
    identity_transpile()
}

fn counts(pairs: &[(&str, u64)]) -> Counts {
    pairs.iter().map(|(s, c)| (s.to_string(), *c)).collect()
}

// ── Paired variant ────────────────────────────────────────────────────

#[tokio::test]
async fn test_paired_resume_skips_collected_and_retrieves_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let k_collected = WeylKey::new(vec![0, 0]).unwrap();
    let k_recorded = WeylKey::new(vec![0, 1]).unwrap();
    let k_fresh = WeylKey::new(vec![1, 0]).unwrap();

    let mut key_counts = BTreeMap::new();
    for key in [&k_collected, &k_recorded, &k_fresh] {
        key_counts.insert(key.encode(), 1);
    }
    let plan = PairedPlan {
        n: 1,
        total_samples: 3,
        key_counts,
    };
    save_plan(&Plan::Paired(plan), dir.path()).await.unwrap();

    let mut ledger = PairedLedger::default();
    ledger.set_entry(
        &k_collected,
        JobEntry {
            job_id: Some(JobId::new("done-0")),
            counts: Some(counts(&[("00", 2)])),
        },
    );
    ledger.set_entry(
        &k_recorded,
        JobEntry {
            job_id: Some(JobId::new("pending-1")),
            counts: None,
        },
    );
    save_paired_jobs(&ledger, dir.path()).await.unwrap();

    let backend = ScriptedBackend::new(Script::Succeed).with_retrieval(Script::Succeed, 1, 2);
    let raw = run_paired(
        &identity_circuit(),
        1,
        3,
        &backend,
        &transpile(),
        None,
        Some(dir.path()),
    )
    .await
    .unwrap();

    // One pair per drawn sample, nothing lost across resumption.
    assert_eq!(raw.len(), 3);
    // The collected key was skipped, the recorded key retrieved, only the
    // fresh key submitted.
    assert_eq!(backend.num_retrieves(), 1);
    assert_eq!(backend.num_submits(), 1);

    let ledger = load_paired_jobs(dir.path()).await.unwrap().unwrap();
    assert_eq!(ledger.num_collected(), 3);
}

#[tokio::test]
async fn test_paired_timeout_leaves_checkpoint_for_retry() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new(Script::TimeOut);

    let err = run_paired(
        &identity_circuit(),
        1,
        2,
        &backend,
        &transpile(),
        Some(Duration::from_millis(1)),
        Some(dir.path()),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, TesterError::Timeout(_)));

    // Plan and ledger survive: the next invocation retries retrieval of the
    // recorded id instead of paying for a resubmission.
    assert!(load_paired_plan(dir.path()).await.unwrap().is_some());
    let ledger = load_paired_jobs(dir.path()).await.unwrap().unwrap();
    assert_eq!(ledger.num_collected(), 0);
    assert!(ledger.jobs.values().any(|e| e.job_id.is_some()));
}

#[tokio::test]
async fn test_paired_lost_recorded_job_is_resubmitted() {
    let dir = tempfile::tempdir().unwrap();
    let key = WeylKey::new(vec![1, 1]).unwrap();

    let plan = PairedPlan {
        n: 1,
        total_samples: 1,
        key_counts: BTreeMap::from([(key.encode(), 1)]),
    };
    save_plan(&Plan::Paired(plan), dir.path()).await.unwrap();

    let mut ledger = PairedLedger::default();
    ledger.set_entry(
        &key,
        JobEntry {
            job_id: Some(JobId::new("ghost")),
            counts: None,
        },
    );
    save_paired_jobs(&ledger, dir.path()).await.unwrap();

    // Reattachment fails with JobNotFound, which is transient: the key is
    // resubmitted rather than aborting the run.
    let backend = ScriptedBackend::new(Script::Succeed);
    let raw = run_paired(
        &identity_circuit(),
        1,
        1,
        &backend,
        &transpile(),
        None,
        Some(dir.path()),
    )
    .await
    .unwrap();

    assert_eq!(raw.len(), 1);
    assert_eq!(backend.num_retrieves(), 1);
    assert_eq!(backend.num_submits(), 1);

    let ledger = load_paired_jobs(dir.path()).await.unwrap().unwrap();
    assert_eq!(
        ledger.entry(&key).unwrap().job_id,
        Some(JobId::new("sub-0"))
    );
}

// ── Batched variant ───────────────────────────────────────────────────

#[tokio::test]
async fn test_batched_resume_retrieves_without_resubmitting() {
    let dir = tempfile::tempdir().unwrap();
    save_plan(&Plan::Batched(BatchedPlan::enumerate(1, 10)), dir.path())
        .await
        .unwrap();
    save_batched_jobs(
        &BatchedLedger {
            job_id: Some(JobId::new("seeded")),
        },
        dir.path(),
    )
    .await
    .unwrap();

    let backend = ScriptedBackend::new(Script::Succeed).with_retrieval(Script::Succeed, 4, 10);
    let raw = run_batched(
        &identity_circuit(),
        1,
        10,
        &backend,
        &transpile(),
        None,
        Some(dir.path()),
    )
    .await
    .unwrap();

    assert_eq!(raw.len(), 4);
    assert_eq!(backend.num_retrieves(), 1);
    assert_eq!(backend.num_submits(), 0);
}

#[tokio::test]
async fn test_batched_lost_job_is_resubmitted() {
    let dir = tempfile::tempdir().unwrap();
    save_plan(&Plan::Batched(BatchedPlan::enumerate(1, 10)), dir.path())
        .await
        .unwrap();
    save_batched_jobs(
        &BatchedLedger {
            job_id: Some(JobId::new("ghost")),
        },
        dir.path(),
    )
    .await
    .unwrap();

    let backend = ScriptedBackend::new(Script::Succeed);
    let raw = run_batched(
        &identity_circuit(),
        1,
        10,
        &backend,
        &transpile(),
        None,
        Some(dir.path()),
    )
    .await
    .unwrap();

    assert_eq!(raw.len(), 4);
    assert_eq!(backend.num_submits(), 1);

    // The ledger records the replacement submission.
    let ledger = load_batched_jobs(dir.path()).await.unwrap().unwrap();
    assert_eq!(ledger.job_id, Some(JobId::new("sub-0")));
}

#[tokio::test]
async fn test_batched_timeout_on_resume_never_resubmits() {
    let dir = tempfile::tempdir().unwrap();
    save_plan(&Plan::Batched(BatchedPlan::enumerate(1, 10)), dir.path())
        .await
        .unwrap();
    save_batched_jobs(
        &BatchedLedger {
            job_id: Some(JobId::new("seeded")),
        },
        dir.path(),
    )
    .await
    .unwrap();

    let backend = ScriptedBackend::new(Script::Succeed).with_retrieval(Script::TimeOut, 4, 10);
    let err = run_batched(
        &identity_circuit(),
        1,
        10,
        &backend,
        &transpile(),
        Some(Duration::from_millis(1)),
        Some(dir.path()),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, TesterError::Timeout(id) if id == JobId::new("seeded")));
    assert_eq!(backend.num_submits(), 0);
    // The ledger still points at the possibly-running job.
    let ledger = load_batched_jobs(dir.path()).await.unwrap().unwrap();
    assert_eq!(ledger.job_id, Some(JobId::new("seeded")));
}

#[tokio::test]
async fn test_batched_transient_failure_aborts_with_id_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new(Script::Fail("queue hiccup"));

    let err = run_batched(
        &identity_circuit(),
        1,
        10,
        &backend,
        &transpile(),
        None,
        Some(dir.path()),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, TesterError::Hal(HalError::JobFailed(_))));

    // The fresh submission's id was persisted before blocking, so the next
    // invocation starts by retrying retrieval.
    let ledger = load_batched_jobs(dir.path()).await.unwrap().unwrap();
    assert_eq!(ledger.job_id, Some(JobId::new("sub-0")));
}

// ── Cross-variant checks ──────────────────────────────────────────────

#[tokio::test]
async fn test_directory_reuse_across_variants_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    save_plan(&Plan::Batched(BatchedPlan::enumerate(1, 10)), dir.path())
        .await
        .unwrap();

    let backend = ScriptedBackend::new(Script::Succeed);
    let err = run_paired(
        &identity_circuit(),
        1,
        5,
        &backend,
        &transpile(),
        None,
        Some(dir.path()),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, TesterError::PlanTypeMismatch { .. }));
    assert_eq!(backend.num_submits(), 0);
}
