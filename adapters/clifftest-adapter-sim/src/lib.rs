//! In-process statevector simulator backend.
//!
//! Runs tester circuits exactly, with sampling noise only, up to ~20
//! qubits. Submission is synchronous: by the time `submit` returns the
//! result already exists, so this backend never produces a transient
//! failure or a timeout. It is the default backend for development and for
//! the integration tests.
//!
//! Results live in an in-memory job map and do not survive the process.
//! `retrieve` across a restart reports `JobNotFound`; the orchestrators
//! treat that as transient and resubmit, which costs nothing here.

mod simulator;
mod statevector;

pub use simulator::SimulatorBackend;
pub use statevector::Statevector;
