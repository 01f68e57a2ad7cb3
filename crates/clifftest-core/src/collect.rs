//! Result collection for a single unitary.
//!
//! Orchestrates the full experiment lifecycle for one gate on one backend
//! and leaves a stable directory layout behind:
//!
//! ```text
//!   <results_dir>/<gate>/<shots>_shots/
//!     expected_acceptance_probability.json
//!     <backend>/<variant>/raw_results.json
//!     <backend>/<variant>/summary.json
//! ```
//!
//! Raw results are the idempotence marker: a variant directory that already
//! holds `raw_results.json` is never re-executed, only re-summarised. The
//! checkpoint is cleaned up only after the raw results are durably on disk,
//! so a crash between the two leaves a resumable checkpoint rather than a
//! lost run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::info;

use clifftest_hal::{Backend, TranspileFn};

use crate::aggregate::{summarise_batched, summarise_paired};
use crate::batched::run_batched;
use crate::checkpoint::cleanup;
use crate::error::TesterResult;
use crate::expected::acceptance_probability;
use crate::paired::run_paired;
use crate::registry::standard_unitary;
use crate::results::{
    load_batched_raw, load_expected, load_paired_raw, save_batched_raw, save_expected,
    save_paired_raw, save_summary,
};

/// Which tester variant to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Per-key paired runs.
    Paired,
    /// One joint submission over all keys.
    Batched,
}

impl Variant {
    /// Both variants, in collection order.
    pub const ALL: [Variant; 2] = [Variant::Paired, Variant::Batched];

    /// Directory name under the backend directory.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Variant::Paired => "paired",
            Variant::Batched => "batched",
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Outcome of collecting one variant.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantOutcome {
    /// The variant that ran.
    pub variant: Variant,
    /// Measured acceptance rate.
    pub acceptance_rate: f64,
    /// Whether raw results already existed and no execution happened.
    pub skipped: bool,
}

/// Everything the harness needs to print a summary for one gate.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionReport {
    /// Gate name as registered.
    pub gate: String,
    /// Qubits of the unitary under test.
    pub n: usize,
    /// Shots per run.
    pub shots: u32,
    /// Closed-form expected acceptance probability.
    pub expected: f64,
    /// One outcome per requested variant.
    pub outcomes: Vec<VariantOutcome>,
}

fn gate_dir(results_dir: &Path, gate: &str, shots: u32) -> PathBuf {
    results_dir.join(gate).join(format!("{shots}_shots"))
}

/// Run the requested tester variants for the registered gate `gate_name`
/// on `backend` and persist all result artifacts.
pub async fn collect_results_for_unitary(
    gate_name: &str,
    backend: &dyn Backend,
    transpile: &TranspileFn,
    variants: &[Variant],
    shots: u32,
    timeout: Option<Duration>,
    results_dir: &Path,
) -> TesterResult<CollectionReport> {
    let u = standard_unitary(gate_name)?;
    let n = u.num_qubits();
    let gate_dir = gate_dir(results_dir, gate_name, shots);

    // Expected acceptance probability: computed once per gate/shots pair.
    let expected = match load_expected(&gate_dir).await? {
        Some(doc) => {
            info!(gate = gate_name, expected = doc.expected_acceptance_probability,
                  "expected acceptance probability already computed");
            doc.expected_acceptance_probability
        }
        None => {
            let expected = acceptance_probability(&u)?;
            save_expected(expected, &gate_dir).await?;
            info!(gate = gate_name, expected, "expected acceptance probability computed");
            expected
        }
    };

    let backend_dir = gate_dir.join(backend.name());
    let mut outcomes = Vec::with_capacity(variants.len());
    for &variant in variants {
        let variant_dir = backend_dir.join(variant.dir_name());
        let outcome = match variant {
            Variant::Paired => {
                collect_paired(&u, n, shots, backend, transpile, timeout, &variant_dir).await?
            }
            Variant::Batched => {
                collect_batched(&u, n, shots, backend, transpile, timeout, &variant_dir).await?
            }
        };
        info!(
            gate = gate_name,
            %variant,
            acceptance_rate = outcome.acceptance_rate,
            skipped = outcome.skipped,
            "variant collected"
        );
        outcomes.push(outcome);
    }

    Ok(CollectionReport {
        gate: gate_name.to_string(),
        n,
        shots,
        expected,
        outcomes,
    })
}

async fn collect_paired(
    u: &clifftest_ir::Circuit,
    n: usize,
    shots: u32,
    backend: &dyn Backend,
    transpile: &TranspileFn,
    timeout: Option<Duration>,
    dir: &Path,
) -> TesterResult<VariantOutcome> {
    let (raw, skipped) = match load_paired_raw(dir).await? {
        Some(raw) => {
            info!(dir = %dir.display(), "raw results exist, skipping execution");
            (raw, true)
        }
        None => {
            let raw = run_paired(u, n, shots, backend, transpile, timeout, Some(dir)).await?;
            save_paired_raw(&raw, dir).await?;
            // Raw results are durable; the checkpoint has served its purpose.
            cleanup(dir).await?;
            (raw, false)
        }
    };
    let acceptance_rate = summarise_paired(&raw);
    save_summary(acceptance_rate, dir).await?;
    Ok(VariantOutcome {
        variant: Variant::Paired,
        acceptance_rate,
        skipped,
    })
}

async fn collect_batched(
    u: &clifftest_ir::Circuit,
    n: usize,
    shots: u32,
    backend: &dyn Backend,
    transpile: &TranspileFn,
    timeout: Option<Duration>,
    dir: &Path,
) -> TesterResult<VariantOutcome> {
    let (raw, skipped) = match load_batched_raw(dir).await? {
        Some(raw) => {
            info!(dir = %dir.display(), "raw results exist, skipping execution");
            (raw, true)
        }
        None => {
            let raw = run_batched(u, n, shots, backend, transpile, timeout, Some(dir)).await?;
            save_batched_raw(&raw, dir).await?;
            cleanup(dir).await?;
            (raw, false)
        }
    };
    let acceptance_rate = summarise_batched(&raw);
    save_summary(acceptance_rate, dir).await?;
    Ok(VariantOutcome {
        variant: Variant::Batched,
        acceptance_rate,
        skipped,
    })
}
