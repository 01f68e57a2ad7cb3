//! Remote hardware-queue backend over HTTP.
//!
//! Talks to a Quantum Inspire style job queue: submissions are paid,
//! queue waits are long, and the connection is occasionally flaky. The
//! adapter therefore leans on the resumption side of the HAL contract:
//!
//! - a submitted job's descriptor (`job_<id>.json`) is written next to the
//!   checkpoint ledger, so a restarted process can reattach without the
//!   queue's cooperation;
//! - the queue may accept work before assigning a public id; the handle
//!   reports `id() == None` until registration and writes no descriptor;
//! - `result(timeout)` polls the status endpoint and maps queue states to
//!   the three-way `Retrieval` outcome. A deadline elapse is `TimedOut`,
//!   never a failure, because the job may still be running and must not be
//!   resubmitted.
//!
//! Circuits are laid out on the Tuna-9 device's priority qubits by
//! [`tuna9_transpile`].

mod api;
mod backend;
mod error;

pub use api::QiClient;
pub use backend::{DEFAULT_ENDPOINT, DEFAULT_TARGET, JobDescriptor, QiBackend, tuna9_transpile};
pub use error::{QiError, QiResult};
