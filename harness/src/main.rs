//! Clifford tester command line.
//!
//! Runs the statistical Clifford test for one or more registered unitaries
//! and prints a summary table of measured vs. expected acceptance rates:
//!
//! ```text
//!   clifftest                            # whole registry on the simulator
//!   clifftest t_gate toffoli -s 4000     # two gates, 4000 shots
//!   clifftest --backend qi hadamard      # remote queue (needs QI_TOKEN)
//! ```
//!
//! Runs are checkpointed under `--results-dir`; re-invoking the same command
//! resumes interrupted work and skips gates whose raw results already exist.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use console::style;
use tracing::info;
use tracing_subscriber::EnvFilter;

use clifftest_adapter_qi::{QiBackend, tuna9_transpile};
use clifftest_adapter_sim::SimulatorBackend;
use clifftest_core::{
    CollectionReport, STANDARD_NAMES, TesterError, Variant, collect_results_for_unitary,
};
use clifftest_hal::{Backend, TranspileFn, identity_transpile};

/// Default retrieval timeout against the remote queue.
const QI_TIMEOUT_SECS: u64 = 300;

/// clifftest - statistical Clifford testing of quantum backends
#[derive(Parser)]
#[command(name = "clifftest")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Gates to test (defaults to the whole registry)
    gates: Vec<String>,

    /// Backend to run on (sim, qi)
    #[arg(short, long, default_value = "sim")]
    backend: String,

    /// Number of shots per run
    #[arg(short, long, default_value = "1000")]
    shots: u32,

    /// Retrieval timeout in seconds (default: none for sim, 300 for qi)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Directory for result artifacts and checkpoints
    #[arg(long, default_value = "results")]
    results_dir: PathBuf,

    /// Tester variant to run
    #[arg(long, value_enum, default_value_t = VariantArg::Both)]
    variant: VariantArg,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum VariantArg {
    /// Per-key paired runs
    Paired,
    /// One joint submission over all keys
    Batched,
    /// Both variants
    Both,
}

impl VariantArg {
    fn variants(self) -> &'static [Variant] {
        match self {
            VariantArg::Paired => &[Variant::Paired],
            VariantArg::Batched => &[Variant::Batched],
            VariantArg::Both => &Variant::ALL,
        }
    }
}

/// A backend together with its transpile pass and retrieval timeout.
struct Resolved {
    backend: Box<dyn Backend>,
    transpile: TranspileFn,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for Resolved {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolved")
            .field("backend", &self.backend.name())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

fn resolve_backend(name: &str, timeout_secs: Option<u64>) -> Result<Resolved> {
    let timeout = timeout_secs.map(Duration::from_secs);
    match name.to_lowercase().as_str() {
        "sim" | "simulator" => Ok(Resolved {
            backend: Box::new(SimulatorBackend::new()),
            transpile: identity_transpile(),
            timeout,
        }),
        "qi" | "quantum-inspire" | "tuna-9" => {
            let backend = QiBackend::new()?;
            Ok(Resolved {
                backend: Box::new(backend),
                transpile: tuna9_transpile(),
                timeout: timeout.or(Some(Duration::from_secs(QI_TIMEOUT_SECS))),
            })
        }
        other => Err(TesterError::UnknownBackend(other.to_string()).into()),
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Resolve the backend before touching the filesystem so a bad name
    // fails fast.
    let resolved = resolve_backend(&cli.backend, cli.timeout_secs)?;

    let gates: Vec<String> = if cli.gates.is_empty() {
        STANDARD_NAMES.iter().map(|s| s.to_string()).collect()
    } else {
        cli.gates.clone()
    };
    let variants = cli.variant.variants();

    println!(
        "{} Testing {} gate(s) on {} ({} shots)",
        style("→").cyan().bold(),
        gates.len(),
        style(resolved.backend.name()).yellow(),
        cli.shots
    );

    let mut reports = Vec::with_capacity(gates.len());
    for gate in &gates {
        println!("  {} {}", style("·").dim(), style(gate).green());
        info!(
            gate = %gate,
            backend = resolved.backend.name(),
            shots = cli.shots,
            "collecting gate"
        );
        let report = collect_results_for_unitary(
            gate,
            resolved.backend.as_ref(),
            &resolved.transpile,
            variants,
            cli.shots,
            resolved.timeout,
            &cli.results_dir,
        )
        .await?;
        info!(gate = %gate, expected = report.expected, "gate collected");
        reports.push(report);
    }

    print_summary(&reports);
    Ok(())
}

fn print_summary(reports: &[CollectionReport]) {
    println!();
    println!(
        "  {:<24} {:>2}  {:>10}  {:>10}  {:>10}",
        style("gate").bold(),
        "n",
        "expected",
        "paired",
        "batched"
    );
    for report in reports {
        let mut paired = String::from("-");
        let mut batched = String::from("-");
        for outcome in &report.outcomes {
            let mark = if outcome.skipped { "*" } else { "" };
            let cell = format!("{:.4}{mark}", outcome.acceptance_rate);
            match outcome.variant {
                Variant::Paired => paired = cell,
                Variant::Batched => batched = cell,
            }
        }
        println!(
            "  {:<24} {:>2}  {:>10.4}  {:>10}  {:>10}",
            report.gate, report.n, report.expected, paired, batched
        );
    }
    let any_skipped = reports
        .iter()
        .any(|r| r.outcomes.iter().any(|o| o.skipped));
    if any_skipped {
        println!();
        println!("  {} loaded from existing raw results", style("*").dim());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
