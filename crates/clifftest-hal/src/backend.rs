//! Backend trait and configuration.
//!
//! The [`Backend`] trait defines the two interactions an orchestrator has
//! with an execution resource:
//!
//! ```text
//!   submit(circuits, shots) ──→ Box<dyn JobHandle>
//!   retrieve(dir, id)       ──→ Box<dyn JobHandle>   (reattach on resume)
//! ```
//!
//! ## Design principles
//!
//! - **Async-native**: all I/O methods are async.
//! - **Thread-safe**: `Send + Sync` bound enables shared ownership.
//! - **Explicitly injected**: a backend is always passed in by the caller,
//!   never looked up through process-wide state.
//! - **Fire-and-forget submit**: `submit` returns as soon as the backend
//!   has accepted the work; blocking happens in `JobHandle::result`.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use clifftest_ir::Circuit;

use crate::error::HalResult;
use crate::job::{JobHandle, JobId};

/// Maps an abstract circuit to a backend-executable form.
///
/// Identity for simulators; hardware backends apply their qubit layout.
pub type TranspileFn = Arc<dyn Fn(&Circuit) -> Circuit + Send + Sync>;

/// The identity transpilation: run the circuit as built.
pub fn identity_transpile() -> TranspileFn {
    Arc::new(|qc: &Circuit| qc.clone())
}

/// Configuration for a backend instance.
#[derive(Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Name of the backend.
    pub name: String,
    /// API endpoint URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Authentication token.
    #[serde(skip_serializing)]
    pub token: Option<String>,
}

impl BackendConfig {
    /// Create a new backend configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: None,
            token: None,
        }
    }

    /// Set the endpoint URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the authentication token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Trait for execution backends.
///
/// # Contract
///
/// - `submit()` accepts one or more circuits as a single joint submission;
///   the i-th histogram of the eventual result corresponds to the i-th
///   circuit.
/// - `retrieve()` reattaches to a previously submitted job: id-based lookup
///   where the backend supports it, descriptor-file reconstruction (from
///   `checkpoint_dir`) where it does not. A job that cannot be found MUST
///   surface as `HalError::JobNotFound`, which callers treat as transient.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Get the name of this backend.
    fn name(&self) -> &str;

    /// Submit circuits for execution with the given shot count per circuit.
    async fn submit(&self, circuits: &[Circuit], shots: u32) -> HalResult<Box<dyn JobHandle>>;

    /// Reattach to a previously submitted job.
    ///
    /// `checkpoint_dir` is where a serialized descriptor may have been
    /// written by [`JobHandle::serialize`].
    async fn retrieve(&self, checkpoint_dir: &Path, id: &JobId) -> HalResult<Box<dyn JobHandle>>;
}
