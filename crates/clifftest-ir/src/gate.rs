//! Quantum gate types.

use serde::{Deserialize, Serialize};

/// The gate set used by the tester circuits and the gate registry.
///
/// Single-qubit Paulis and Cliffords, the non-Clifford `T` and `Rx`, and the
/// entangling `CX`/`CCX`. This is deliberately small: everything the tester
/// builds decomposes into these.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Gate {
    /// Identity gate.
    I,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,
    /// Hadamard gate.
    H,
    /// S gate (sqrt(Z)).
    S,
    /// S-dagger gate.
    Sdg,
    /// T gate (fourth root of Z).
    T,
    /// T-dagger gate.
    Tdg,
    /// Rotation around the X axis by a fixed angle.
    Rx(f64),
    /// Controlled-X (CNOT) gate.
    Cx,
    /// Toffoli gate (CCX).
    Ccx,
}

impl Gate {
    /// Get the name of this gate.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Gate::I => "id",
            Gate::X => "x",
            Gate::Y => "y",
            Gate::Z => "z",
            Gate::H => "h",
            Gate::S => "s",
            Gate::Sdg => "sdg",
            Gate::T => "t",
            Gate::Tdg => "tdg",
            Gate::Rx(_) => "rx",
            Gate::Cx => "cx",
            Gate::Ccx => "ccx",
        }
    }

    /// Number of qubits this gate acts on.
    #[inline]
    pub fn num_qubits(&self) -> usize {
        match self {
            Gate::Cx => 2,
            Gate::Ccx => 3,
            _ => 1,
        }
    }

    /// Whether this gate is a member of the Clifford group.
    pub fn is_clifford(&self) -> bool {
        !matches!(self, Gate::T | Gate::Tdg | Gate::Rx(_))
    }
}

impl std::fmt::Display for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
