//! Batched tester orchestrator.
//!
//! Drives one aggregate workload (every Weyl key, one joint backend
//! submission) through the checkpointed state machine:
//!
//! ```text
//!   PLANNING → BUILDING → {RETRIEVING | SUBMITTING} → COLLECTING → DONE
//! ```
//!
//! The checkpoint directory is the durable source of truth. The plan is
//! persisted before anything else happens; the submission id is persisted
//! before blocking on the result; a timeout leaves everything intact so
//! the next invocation retries retrieval instead of resubmitting.
//!
//! The orchestrator returns raw results but does not persist them or clean
//! the checkpoint: the collection layer writes `raw_results.json` durably
//! first and only then calls [`crate::checkpoint::cleanup`].

use std::path::Path;
use std::time::Duration;

use tracing::{info, warn};

use clifftest_hal::{Backend, HalError, JobId, Retrieval, TranspileFn};
use clifftest_ir::Circuit;

use crate::checkpoint::{
    BatchedLedger, BatchedPlan, Plan, load_batched_jobs, load_batched_plan, save_batched_jobs,
    save_plan,
};
use crate::circuits::tester_circuit;
use crate::error::{TesterError, TesterResult};
use crate::results::BatchedRawResults;

/// Run the batched Clifford tester for `u_circuit` on `backend`.
///
/// Enumerates all 2^(2n) Weyl operators, runs every tester circuit with
/// `shots` shots in a single joint submission, and returns the raw
/// per-key histograms.
///
/// With a `checkpoint_dir`, a killed or crashed run resumes without
/// resubmitting: the plan is reloaded (tag-checked), and a recorded
/// submission id is retrieved before any new submission is made.
pub async fn run_batched(
    u_circuit: &Circuit,
    n: usize,
    shots: u32,
    backend: &dyn Backend,
    transpile: &TranspileFn,
    timeout: Option<Duration>,
    checkpoint_dir: Option<&Path>,
) -> TesterResult<BatchedRawResults> {
    // Phase 1: load or generate the plan. Persist before anything else.
    let plan = match checkpoint_dir {
        Some(dir) => load_batched_plan(dir).await?,
        None => None,
    };
    let plan = match plan {
        Some(plan) => {
            info!(keys = plan.all_keys.len(), "loaded existing batched plan");
            plan
        }
        None => {
            let plan = BatchedPlan::enumerate(n, shots);
            if let Some(dir) = checkpoint_dir {
                save_plan(&Plan::Batched(plan.clone()), dir).await?;
            }
            info!(
                keys = plan.all_keys.len(),
                shots, "created new batched plan"
            );
            plan
        }
    };

    // Phase 2: build one circuit per key, in plan order. The index is the
    // cross-reference key between submission and collection.
    info!(circuits = plan.all_keys.len(), "building tester circuits");
    let circuits: Vec<Circuit> = plan
        .all_keys
        .iter()
        .map(|key| Ok(transpile(&tester_circuit(u_circuit, plan.n, key)?)))
        .collect::<TesterResult<_>>()?;

    // Phase 3: try to retrieve a previously submitted job before
    // resubmitting paid work.
    let ledger = match checkpoint_dir {
        Some(dir) => load_batched_jobs(dir).await?,
        None => None,
    };
    let mut result = None;

    if let (Some(dir), Some(recorded_id)) =
        (checkpoint_dir, ledger.and_then(|ledger| ledger.job_id))
    {
        info!(job_id = %recorded_id, "attempting to retrieve previous submission");
        match backend.retrieve(dir, &recorded_id).await {
            Ok(handle) => match handle.result(timeout).await {
                Retrieval::Success(r) => {
                    info!(job_id = %recorded_id, "retrieved results from previous submission");
                    result = Some(r);
                }
                Retrieval::TimedOut => {
                    // The job may still be running remotely: do not resubmit.
                    return Err(TesterError::Timeout(recorded_id));
                }
                Retrieval::TransientFailure(reason) => {
                    warn!(job_id = %recorded_id, %reason, "retrieval failed, will resubmit");
                }
            },
            Err(e) => {
                warn!(job_id = %recorded_id, error = %e, "could not reattach, will resubmit");
            }
        }
    }

    // Phase 4: submit fresh if there was nothing to retrieve. The new id
    // is persisted before blocking so a crash during the wait still lets
    // the next run retrieve.
    let result = match result {
        Some(result) => result,
        None => {
            info!(
                circuits = circuits.len(),
                shots = plan.shots_per_key,
                "submitting joint job"
            );
            let handle = backend.submit(&circuits, plan.shots_per_key).await?;
            let job_id = handle.id();
            if let Some(dir) = checkpoint_dir {
                save_batched_jobs(
                    &BatchedLedger {
                        job_id: job_id.clone(),
                    },
                    dir,
                )
                .await?;
                handle.serialize(dir).await?;
            }
            info!(job_id = ?job_id, "job submitted, waiting for result");
            match handle.result(timeout).await {
                Retrieval::Success(r) => r,
                Retrieval::TimedOut => {
                    return Err(TesterError::Timeout(
                        job_id.unwrap_or_else(|| JobId::new("unregistered")),
                    ));
                }
                Retrieval::TransientFailure(reason) => {
                    // Fresh submission failed; the persisted id lets the
                    // next invocation try retrieval before resubmitting.
                    return Err(HalError::JobFailed(reason).into());
                }
            }
        }
    };

    // Phase 5: collect one histogram per key, in plan order.
    if result.num_circuits() != plan.all_keys.len() {
        return Err(TesterError::ResultShapeMismatch {
            expected: plan.all_keys.len(),
            got: result.num_circuits(),
        });
    }
    let mut raw = BatchedRawResults::default();
    for (i, key) in plan.all_keys.iter().enumerate() {
        let counts = result
            .get_counts(i)
            .ok_or_else(|| TesterError::MissingCounts(key.encode()))?;
        raw.insert(key, counts.clone());
    }
    info!(keys = raw.len(), "batched run collected");
    Ok(raw)
}
