//! Circuit instructions.

use serde::{Deserialize, Serialize};

use crate::gate::Gate;

/// A single operation in a circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    /// A gate applied to one or more qubits.
    Gate {
        /// The gate to apply.
        gate: Gate,
        /// Target qubits, control(s) first for controlled gates.
        qubits: Vec<usize>,
    },
    /// Measure a qubit into a classical bit (computational basis).
    Measure {
        /// Qubit to measure.
        qubit: usize,
        /// Classical bit receiving the outcome.
        clbit: usize,
    },
    /// A barrier. No effect on simulation; kept so transpilers do not
    /// reorder across the tester's phase boundaries.
    Barrier,
}

impl Instruction {
    /// Construct a gate instruction.
    pub fn gate(gate: Gate, qubits: impl Into<Vec<usize>>) -> Self {
        Instruction::Gate {
            gate,
            qubits: qubits.into(),
        }
    }
}
