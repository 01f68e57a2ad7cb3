//! High-level circuit builder API.

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::gate::Gate;
use crate::instruction::Instruction;

/// A quantum circuit: a fixed register size and an ordered instruction list.
///
/// Builder methods return `IrResult<&mut Self>` so calls chain and index
/// errors surface at construction time rather than at execution time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    /// Name of the circuit.
    name: String,
    /// Number of qubits.
    num_qubits: usize,
    /// Number of classical bits.
    num_clbits: usize,
    /// Ordered instructions.
    instructions: Vec<Instruction>,
}

impl Circuit {
    /// Create a new empty circuit.
    pub fn new(name: impl Into<String>, num_qubits: usize, num_clbits: usize) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            num_clbits,
            instructions: Vec::new(),
        }
    }

    /// Name of the circuit.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Number of classical bits.
    pub fn num_clbits(&self) -> usize {
        self.num_clbits
    }

    /// The ordered instruction list.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Rename the circuit.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn check_qubit(&self, qubit: usize) -> IrResult<()> {
        if qubit >= self.num_qubits {
            return Err(IrError::QubitOutOfRange {
                qubit,
                num_qubits: self.num_qubits,
            });
        }
        Ok(())
    }

    /// Apply a gate to the given qubits.
    pub fn apply(&mut self, gate: Gate, qubits: &[usize]) -> IrResult<&mut Self> {
        if qubits.len() != gate.num_qubits() {
            return Err(IrError::ArityMismatch {
                gate: gate.name(),
                expected: gate.num_qubits(),
                got: qubits.len(),
            });
        }
        for (i, &q) in qubits.iter().enumerate() {
            self.check_qubit(q)?;
            if qubits[..i].contains(&q) {
                return Err(IrError::DuplicateQubit {
                    gate: gate.name(),
                    qubit: q,
                });
            }
        }
        self.instructions.push(Instruction::gate(gate, qubits));
        Ok(self)
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: usize) -> IrResult<&mut Self> {
        self.apply(Gate::H, &[qubit])
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: usize) -> IrResult<&mut Self> {
        self.apply(Gate::X, &[qubit])
    }

    /// Apply Pauli-Y gate.
    pub fn y(&mut self, qubit: usize) -> IrResult<&mut Self> {
        self.apply(Gate::Y, &[qubit])
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, qubit: usize) -> IrResult<&mut Self> {
        self.apply(Gate::Z, &[qubit])
    }

    /// Apply S gate.
    pub fn s(&mut self, qubit: usize) -> IrResult<&mut Self> {
        self.apply(Gate::S, &[qubit])
    }

    /// Apply S-dagger gate.
    pub fn sdg(&mut self, qubit: usize) -> IrResult<&mut Self> {
        self.apply(Gate::Sdg, &[qubit])
    }

    /// Apply T gate.
    pub fn t(&mut self, qubit: usize) -> IrResult<&mut Self> {
        self.apply(Gate::T, &[qubit])
    }

    /// Apply T-dagger gate.
    pub fn tdg(&mut self, qubit: usize) -> IrResult<&mut Self> {
        self.apply(Gate::Tdg, &[qubit])
    }

    /// Apply Rx rotation gate.
    pub fn rx(&mut self, theta: f64, qubit: usize) -> IrResult<&mut Self> {
        self.apply(Gate::Rx(theta), &[qubit])
    }

    // =========================================================================
    // Multi-qubit gates
    // =========================================================================

    /// Apply CNOT gate.
    pub fn cx(&mut self, control: usize, target: usize) -> IrResult<&mut Self> {
        self.apply(Gate::Cx, &[control, target])
    }

    /// Apply Toffoli gate.
    pub fn ccx(&mut self, c1: usize, c2: usize, target: usize) -> IrResult<&mut Self> {
        self.apply(Gate::Ccx, &[c1, c2, target])
    }

    // =========================================================================
    // Non-gate instructions
    // =========================================================================

    /// Measure a qubit into a classical bit.
    pub fn measure(&mut self, qubit: usize, clbit: usize) -> IrResult<&mut Self> {
        self.check_qubit(qubit)?;
        if clbit >= self.num_clbits {
            return Err(IrError::ClbitOutOfRange {
                clbit,
                num_clbits: self.num_clbits,
            });
        }
        self.instructions.push(Instruction::Measure { qubit, clbit });
        Ok(self)
    }

    /// Insert a barrier.
    pub fn barrier(&mut self) -> &mut Self {
        self.instructions.push(Instruction::Barrier);
        self
    }

    /// Compose `other` onto this circuit, mapping its qubit `i` to
    /// `qubits[i]`.
    ///
    /// Only gate and barrier instructions are composed; the tester applies
    /// the unitary under test to each register this way, so sub-circuits
    /// carry no measurements.
    pub fn compose(&mut self, other: &Circuit, qubits: &[usize]) -> IrResult<&mut Self> {
        if qubits.len() != other.num_qubits {
            return Err(IrError::ComposeMismatch {
                sub_qubits: other.num_qubits,
                mapped: qubits.len(),
            });
        }
        for inst in &other.instructions {
            match inst {
                Instruction::Gate { gate, qubits: qs } => {
                    let mapped: Vec<usize> = qs.iter().map(|&q| qubits[q]).collect();
                    self.apply(*gate, &mapped)?;
                }
                Instruction::Barrier => {
                    self.barrier();
                }
                Instruction::Measure { qubit, clbit } => {
                    // Measurements do not relocate; map the qubit, keep the bit.
                    self.measure(qubits[*qubit], *clbit)?;
                }
            }
        }
        Ok(self)
    }

    /// Create a 2-qubit Bell state circuit (no measurement).
    pub fn bell() -> IrResult<Self> {
        let mut qc = Circuit::new("bell", 2, 0);
        qc.h(0)?.cx(0, 1)?;
        Ok(qc)
    }
}
