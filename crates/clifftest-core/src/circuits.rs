//! Tester circuit construction.
//!
//! One tester circuit per Weyl key:
//!
//! 1. prepare the Choi state |P_x⟩⟩ of the selected Weyl operator,
//! 2. apply U ⊗ U (the unitary under test on both registers),
//! 3. measure in the Bell basis.
//!
//! For a Clifford U the measurement outcome distribution is deterministic,
//! so two independent runs always coincide and the collision probability
//! is 1.

use clifftest_ir::{Circuit, IrResult};

use crate::error::TesterResult;
use crate::key::WeylKey;

/// The Weyl operator P_{a,b} = Z^{a_1}⊗…⊗Z^{a_n} · X^{b_1}⊗…⊗X^{b_n}.
///
/// The global phase i^{⟨a,b⟩} does not affect measurement outcomes and is
/// omitted.
pub fn weyl_operator(a: &[u8], b: &[u8]) -> IrResult<Circuit> {
    debug_assert_eq!(a.len(), b.len());
    let n = a.len();
    let mut qc = Circuit::new("weyl", n, 0);
    for (i, &ai) in a.iter().enumerate() {
        if ai == 1 {
            qc.z(i)?;
        }
    }
    for (i, &bi) in b.iter().enumerate() {
        if bi == 1 {
            qc.x(i)?;
        }
    }
    Ok(qc)
}

/// Prepare the maximally entangled state on 2n qubits: H then CX on each
/// (i, n+i) pair.
pub fn maximally_entangled(n: usize) -> IrResult<Circuit> {
    let mut qc = Circuit::new("bell_pairs", 2 * n, 0);
    for i in 0..n {
        qc.h(i)?;
        qc.cx(i, n + i)?;
    }
    Ok(qc)
}

/// Prepare the Choi state |P_x⟩⟩: entangle, then apply P_x to register A
/// (qubits 0..n).
pub fn weyl_choi_state(n: usize, key: &WeylKey) -> TesterResult<Circuit> {
    debug_assert_eq!(key.len(), 2 * n);
    let mut qc = maximally_entangled(n)?;
    let p_x = weyl_operator(key.z_bits(), key.x_bits())?;
    let a_register: Vec<usize> = (0..n).collect();
    qc.compose(&p_x, &a_register)?;
    Ok(qc)
}

/// Append a Bell-basis measurement: undo the Bell preparation (CX then H)
/// and measure computationally.
///
/// Register A (qubits 0..n) lands in clbits 0..n, register B (qubits
/// n..2n) in clbits n..2n, so the outcome bitstring reads y = (a, b).
pub fn bell_measurement(qc: &mut Circuit, n: usize) -> IrResult<()> {
    for i in 0..n {
        qc.cx(i, n + i)?;
        qc.h(i)?;
    }
    for i in 0..n {
        qc.measure(i, i)?;
        qc.measure(n + i, n + i)?;
    }
    Ok(())
}

/// Build the full tester circuit for one Weyl key: 2n qubits, 2n clbits.
pub fn tester_circuit(u_circuit: &Circuit, n: usize, key: &WeylKey) -> TesterResult<Circuit> {
    let mut qc = Circuit::new(format!("tester_{}", key.encode()), 2 * n, 2 * n);

    let choi = weyl_choi_state(n, key)?;
    let all: Vec<usize> = (0..2 * n).collect();
    qc.compose(&choi, &all)?;
    qc.barrier();

    // U ⊗ U: the unitary under test on both registers.
    let a_register: Vec<usize> = (0..n).collect();
    let b_register: Vec<usize> = (n..2 * n).collect();
    qc.compose(u_circuit, &a_register)?;
    qc.compose(u_circuit, &b_register)?;
    qc.barrier();

    bell_measurement(&mut qc, n)?;
    Ok(qc)
}
