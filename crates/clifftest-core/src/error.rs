//! Error types for the tester core.

use clifftest_hal::{HalError, JobId};
use thiserror::Error;

/// Errors that can occur while planning, executing, or collecting a test run.
///
/// The taxonomy matters operationally:
///
/// - configuration errors (`PlanTypeMismatch`, `UnknownGate`,
///   `UnknownBackend`) are fatal and never retried;
/// - transient retrieval failures never surface here; the orchestrators
///   recover them locally by resubmitting;
/// - `Timeout` is fatal to the current invocation by design: the remote job
///   may still be running, so the checkpoint is left intact for the next
///   invocation to retry retrieval;
/// - `MissingCounts` and `ResultShapeMismatch` are internal-consistency
///   violations that abort loudly rather than produce incomplete results.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TesterError {
    /// A checkpoint directory holds a plan of the other variant.
    #[error("Checkpoint plan type mismatch: expected '{expected}', found '{found}' \
             (is this directory reused across tester variants?)")]
    PlanTypeMismatch {
        /// The variant this orchestrator runs.
        expected: &'static str,
        /// The tag found in plan.json.
        found: String,
    },

    /// A gate name not present in the registry.
    #[error("Unknown gate '{0}'")]
    UnknownGate(String),

    /// A backend name not recognized by the harness.
    #[error("Unknown backend '{0}'")]
    UnknownBackend(String),

    /// A persisted key did not decode to a bit-vector.
    #[error("Invalid Weyl key encoding: {0}")]
    InvalidKey(String),

    /// A circuit with measurements was passed where a unitary is required.
    #[error("Circuit '{0}' contains measurements and has no unitary")]
    NonUnitary(String),

    /// A key reached the collection phase without counts. Indicates an
    /// orchestrator bookkeeping bug, never expected in correct operation.
    #[error("No counts collected for key {0} after collection phase")]
    MissingCounts(String),

    /// The backend returned a different number of histograms than circuits
    /// were submitted.
    #[error("Result shape mismatch: submitted {expected} circuits, got {got} histograms")]
    ResultShapeMismatch {
        /// Circuits submitted.
        expected: usize,
        /// Histograms returned.
        got: usize,
    },

    /// Retrieval timed out while the job may still be running remotely.
    #[error("Timed out waiting for job {0}; checkpoint left intact, re-run to retry retrieval")]
    Timeout(JobId),

    /// Backend error that is not recoverable by resubmission.
    #[error(transparent)]
    Hal(#[from] HalError),

    /// Circuit construction error.
    #[error(transparent)]
    Ir(#[from] clifftest_ir::IrError),

    /// Checkpoint or results I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Checkpoint or results serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for tester operations.
pub type TesterResult<T> = Result<T, TesterError>;
