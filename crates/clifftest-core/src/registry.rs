//! Registry of named test unitaries.
//!
//! Every unitary the harness can test is a measurement-free [`Circuit`]
//! looked up by name. Unknown names are configuration errors and fail
//! fast.

use clifftest_ir::{Circuit, IrResult};

use crate::error::{TesterError, TesterResult};

/// Names of every registered unitary, in registry order.
pub const STANDARD_NAMES: &[&str] = &[
    "identity",
    "hadamard",
    "s_gate",
    "t_gate",
    "rx_0_3",
    "cnot",
    "toffoli",
    "c_4_hadamard_3_cnot",
    "c_4_t_gate",
];

/// Build the registered unitary called `name`.
pub fn standard_unitary(name: &str) -> TesterResult<Circuit> {
    let qc = match name {
        "identity" => Circuit::new("identity", 1, 0),
        "hadamard" => single(name, |qc| qc.h(0))?,
        "s_gate" => single(name, |qc| qc.s(0))?,
        "t_gate" => single(name, |qc| qc.t(0))?,
        "rx_0_3" => single(name, |qc| qc.rx(0.3, 0))?,
        "cnot" => {
            let mut qc = Circuit::new("cnot", 2, 0);
            qc.cx(0, 1)?;
            qc
        }
        "toffoli" => {
            let mut qc = Circuit::new("toffoli", 3, 0);
            qc.ccx(0, 1, 2)?;
            qc
        }
        "c_4_hadamard_3_cnot" => hadamard_cnot_chain(4)?.with_name(name),
        "c_4_t_gate" => t_layer(4)?.with_name(name),
        other => return Err(TesterError::UnknownGate(other.to_string())),
    };
    Ok(qc)
}

fn single(
    name: &str,
    build: impl FnOnce(&mut Circuit) -> IrResult<&mut Circuit>,
) -> IrResult<Circuit> {
    let mut qc = Circuit::new(name, 1, 0);
    build(&mut qc)?;
    Ok(qc)
}

/// A layer of Hadamards followed by a CX chain on `n` qubits.
fn hadamard_cnot_chain(n: usize) -> IrResult<Circuit> {
    let mut qc = Circuit::new("hadamard_cnot_chain", n, 0);
    for i in 0..n {
        qc.h(i)?;
    }
    for i in 0..n - 1 {
        qc.cx(i, i + 1)?;
    }
    Ok(qc)
}

/// A T gate on every one of `n` qubits.
fn t_layer(n: usize) -> IrResult<Circuit> {
    let mut qc = Circuit::new("t_layer", n, 0);
    for i in 0..n {
        qc.t(i)?;
    }
    Ok(qc)
}
