//! Statistical Clifford testing with checkpointed execution.
//!
//! Decides whether an n-qubit unitary is a Clifford operation by running
//! Choi-state tester circuits and measuring how often independent runs
//! agree: Clifford unitaries accept with probability 1, non-Cliffords
//! strictly less (a T gate gives 3/4, a Toffoli 11/32).
//!
//! The interesting part is not the quantum math but the execution model.
//! Runs target a remote hardware queue that is slow, paid, and
//! occasionally flaky, so every experiment is driven through a durable
//! checkpoint directory:
//!
//! ```text
//!   plan.json          the randomness-resolved workload, written once
//!   jobs.json          submission ledger, rewritten per state change
//!   job_<id>.json      at most one backend job descriptor
//! ```
//!
//! A killed run resumed against the same directory reproduces the same
//! work set, reattaches to in-flight submissions instead of paying for
//! them twice, and treats a retrieval timeout as fatal-but-resumable
//! because the remote job may still be running.
//!
//! # Module map
//!
//! - [`key`] — Weyl operator keys and their canonical encoding
//! - [`circuits`] — Choi-state tester circuit construction
//! - [`checkpoint`] — plans, ledgers, atomic persistence
//! - [`batched`] / [`paired`] — the two orchestrator variants
//! - [`aggregate`] — acceptance-rate reducers
//! - [`expected`] — closed-form expected acceptance probability
//! - [`registry`] — named standard test unitaries
//! - [`collect`] — per-gate collection, layout, and idempotence
//! - [`results`] — terminal result artifacts

pub mod aggregate;
pub mod batched;
pub mod checkpoint;
pub mod circuits;
pub mod collect;
pub mod error;
pub mod expected;
pub mod key;
pub mod paired;
pub mod registry;
pub mod results;

pub use batched::run_batched;
pub use collect::{CollectionReport, Variant, VariantOutcome, collect_results_for_unitary};
pub use error::{TesterError, TesterResult};
pub use key::WeylKey;
pub use paired::run_paired;
pub use registry::{STANDARD_NAMES, standard_unitary};
