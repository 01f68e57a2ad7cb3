//! Simulator backend implementation.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use tracing::debug;
use uuid::Uuid;

use clifftest_hal::{
    Backend, BackendConfig, Counts, ExecutionResult, HalError, HalResult, JobHandle, JobId,
    Retrieval,
};
use clifftest_ir::{Circuit, Instruction};

use crate::statevector::Statevector;

/// In-process statevector simulator backend.
///
/// `submit` runs every circuit synchronously before returning, so a handle's
/// `result` always succeeds immediately. Completed results are kept in an
/// in-memory job map; they do not survive the process, so `retrieve` after a
/// restart reports `JobNotFound` and the caller resubmits. For a free local
/// simulator that is the correct economics.
pub struct SimulatorBackend {
    /// Backend configuration.
    config: BackendConfig,
    /// Completed jobs.
    jobs: Arc<Mutex<FxHashMap<String, ExecutionResult>>>,
    /// Maximum number of qubits supported.
    max_qubits: usize,
}

impl SimulatorBackend {
    /// Create a new simulator backend with default settings.
    pub fn new() -> Self {
        Self::with_max_qubits(20)
    }

    /// Create a simulator with custom max qubits.
    pub fn with_max_qubits(max_qubits: usize) -> Self {
        Self {
            config: BackendConfig::new("sim"),
            jobs: Arc::new(Mutex::new(FxHashMap::default())),
            max_qubits,
        }
    }

    /// Run one circuit for `shots` shots.
    fn run_circuit(&self, circuit: &Circuit, shots: u32) -> Counts {
        let start = Instant::now();
        let num_qubits = circuit.num_qubits();
        debug!(
            circuit = circuit.name(),
            num_qubits, shots, "starting simulation"
        );

        // The final state is shot-independent (measurements are terminal),
        // so evolve once and sample repeatedly.
        let mut sv = Statevector::new(num_qubits);
        for inst in circuit.instructions() {
            sv.apply(inst);
        }

        // qubit → clbit routing from the measure instructions; a circuit
        // without measurements reads out every qubit in place.
        let measures: Vec<(usize, usize)> = circuit
            .instructions()
            .iter()
            .filter_map(|inst| match inst {
                Instruction::Measure { qubit, clbit } => Some((*qubit, *clbit)),
                _ => None,
            })
            .collect();
        let num_clbits = if measures.is_empty() {
            num_qubits
        } else {
            circuit.num_clbits()
        };

        let mut rng = rand::thread_rng();
        let mut counts = Counts::new();
        for _ in 0..shots {
            let outcome = sv.sample(&mut rng);
            let mut bits = vec![b'0'; num_clbits];
            if measures.is_empty() {
                for (q, bit) in bits.iter_mut().enumerate() {
                    *bit = b'0' + ((outcome >> q) & 1) as u8;
                }
            } else {
                for &(qubit, clbit) in &measures {
                    bits[clbit] = b'0' + ((outcome >> qubit) & 1) as u8;
                }
            }
            counts.record(String::from_utf8_lossy(&bits).into_owned());
        }

        debug!(
            circuit = circuit.name(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            top_outcome = counts.most_frequent().map(|(b, _)| b).unwrap_or("-"),
            "simulation completed"
        );
        counts
    }
}

impl Default for SimulatorBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for SimulatorBackend {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn submit(&self, circuits: &[Circuit], shots: u32) -> HalResult<Box<dyn JobHandle>> {
        for circuit in circuits {
            if circuit.num_qubits() > self.max_qubits {
                return Err(HalError::SubmissionFailed(format!(
                    "circuit '{}' has {} qubits but the simulator supports {}",
                    circuit.name(),
                    circuit.num_qubits(),
                    self.max_qubits
                )));
            }
        }

        let counts: Vec<Counts> = circuits
            .iter()
            .map(|qc| self.run_circuit(qc, shots))
            .collect();
        let result = ExecutionResult::new(counts, shots);

        let job_id = JobId::new(Uuid::new_v4().to_string());
        {
            let mut jobs = self
                .jobs
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            jobs.insert(job_id.0.clone(), result.clone());
        }
        debug!(job_id = %job_id, circuits = circuits.len(), "job completed");

        Ok(Box::new(SimJobHandle { id: job_id, result }))
    }

    async fn retrieve(
        &self,
        _checkpoint_dir: &Path,
        id: &JobId,
    ) -> HalResult<Box<dyn JobHandle>> {
        let jobs = self
            .jobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let result = jobs
            .get(&id.0)
            .cloned()
            .ok_or_else(|| HalError::JobNotFound(id.0.clone()))?;
        Ok(Box::new(SimJobHandle {
            id: id.clone(),
            result,
        }))
    }
}

/// Handle to a completed simulator job.
struct SimJobHandle {
    id: JobId,
    result: ExecutionResult,
}

#[async_trait]
impl JobHandle for SimJobHandle {
    fn id(&self) -> Option<JobId> {
        Some(self.id.clone())
    }

    async fn result(&self, _timeout: Option<Duration>) -> Retrieval {
        Retrieval::Success(self.result.clone())
    }
}
