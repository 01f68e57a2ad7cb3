//! Error types for the IR crate.

use thiserror::Error;

/// Errors that can occur while building circuits.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// A qubit index is outside the circuit.
    #[error("Qubit {qubit} out of range (circuit has {num_qubits} qubits)")]
    QubitOutOfRange {
        /// The offending index.
        qubit: usize,
        /// Number of qubits in the circuit.
        num_qubits: usize,
    },

    /// A classical bit index is outside the circuit.
    #[error("Classical bit {clbit} out of range (circuit has {num_clbits} bits)")]
    ClbitOutOfRange {
        /// The offending index.
        clbit: usize,
        /// Number of classical bits in the circuit.
        num_clbits: usize,
    },

    /// A gate was applied to the wrong number of qubits.
    #[error("Gate '{gate}' expects {expected} qubits, got {got}")]
    ArityMismatch {
        /// Gate name.
        gate: &'static str,
        /// Expected qubit count.
        expected: usize,
        /// Provided qubit count.
        got: usize,
    },

    /// The same qubit was used twice in one multi-qubit gate.
    #[error("Duplicate qubit {qubit} in multi-qubit gate '{gate}'")]
    DuplicateQubit {
        /// Gate name.
        gate: &'static str,
        /// The repeated index.
        qubit: usize,
    },

    /// A composed sub-circuit does not fit the provided qubit mapping.
    #[error("Cannot compose: sub-circuit has {sub_qubits} qubits but {mapped} were mapped")]
    ComposeMismatch {
        /// Qubits in the sub-circuit.
        sub_qubits: usize,
        /// Qubits provided in the mapping.
        mapped: usize,
    },
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
