//! Backend and job-handle abstraction for the Clifford tester.
//!
//! This crate defines the seam between the tester orchestrators and the
//! execution resource that actually runs circuits, whether an in-process
//! simulator or a remote hardware queue:
//!
//! - A common [`Backend`] trait for submission and reattachment
//! - A polymorphic [`JobHandle`] for identifier extraction, on-disk
//!   descriptor serialization, and blocking result retrieval
//! - An explicit [`Retrieval`] outcome so orchestrators branch on
//!   `Success` / `TransientFailure` / `TimedOut` tags instead of error
//!   identity
//! - Unified result handling via [`ExecutionResult`] and [`Counts`]
//!
//! # The retrieval contract
//!
//! The three-way [`Retrieval`] split is load-bearing for checkpointed
//! execution against paid hardware:
//!
//! - `Success` — per-circuit histograms, in submission order.
//! - `TransientFailure` — the job is presumed lost (not found remotely,
//!   malformed response, backend error). The caller resubmits.
//! - `TimedOut` — the job may still be running remotely. The caller MUST
//!   NOT resubmit; it propagates the failure and leaves its checkpoint
//!   intact so a later invocation can retry retrieval instead.
//!
//! # Example: implementing a backend
//!
//! ```ignore
//! use clifftest_hal::{Backend, JobHandle, JobId, Retrieval, HalResult};
//! use clifftest_ir::Circuit;
//! use async_trait::async_trait;
//!
//! struct MyBackend { /* ... */ }
//!
//! #[async_trait]
//! impl Backend for MyBackend {
//!     fn name(&self) -> &str { "my_backend" }
//!     async fn submit(&self, circuits: &[Circuit], shots: u32)
//!         -> HalResult<Box<dyn JobHandle>> { /* ... */ }
//!     async fn retrieve(&self, dir: &std::path::Path, id: &JobId)
//!         -> HalResult<Box<dyn JobHandle>> { /* ... */ }
//! }
//! ```

pub mod backend;
pub mod error;
pub mod job;
pub mod result;

pub use backend::{Backend, BackendConfig, TranspileFn, identity_transpile};
pub use error::{HalError, HalResult};
pub use job::{JobHandle, JobId, Retrieval};
pub use result::{Counts, ExecutionResult};
