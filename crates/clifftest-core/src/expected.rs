//! Closed-form expected acceptance probability.
//!
//! The tester accepts with probability
//!
//! ```text
//!   p_acc = 2^(2n) · Σ_{x,y} p_U(x,y)²
//!   p_U(x,y) = 2^(-4n) · |Tr(P_x U P_y U†)|²
//! ```
//!
//! computed by dense matrix algebra over all 4^n × 4^n Weyl pairs. This is
//! exponential in n and intended for the small unitaries the registry
//! serves, where it gives the exact value the measured acceptance rate
//! should converge to: 1 for Clifford unitaries, 3/4 for a T gate, 11/32
//! for a Toffoli.
//!
//! State indices are little-endian throughout: qubit `j` is bit `j` of the
//! basis-state index, matching the bitstring convention of
//! [`clifftest_hal::Counts`].

use ndarray::{Array2, array};
use num_complex::Complex64;

use clifftest_ir::{Circuit, Gate, Instruction};

use crate::error::{TesterError, TesterResult};
use crate::key::WeylKey;

type Matrix = Array2<Complex64>;

fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

/// The unitary matrix of a single gate, in the gate's own qubit order
/// (operand `k` of the gate is bit `k` of the sub-index).
pub fn gate_unitary(gate: &Gate) -> Matrix {
    let h = std::f64::consts::FRAC_1_SQRT_2;
    match gate {
        Gate::I => array![[c(1.0, 0.0), c(0.0, 0.0)], [c(0.0, 0.0), c(1.0, 0.0)]],
        Gate::X => array![[c(0.0, 0.0), c(1.0, 0.0)], [c(1.0, 0.0), c(0.0, 0.0)]],
        Gate::Y => array![[c(0.0, 0.0), c(0.0, -1.0)], [c(0.0, 1.0), c(0.0, 0.0)]],
        Gate::Z => array![[c(1.0, 0.0), c(0.0, 0.0)], [c(0.0, 0.0), c(-1.0, 0.0)]],
        Gate::H => array![[c(h, 0.0), c(h, 0.0)], [c(h, 0.0), c(-h, 0.0)]],
        Gate::S => array![[c(1.0, 0.0), c(0.0, 0.0)], [c(0.0, 0.0), c(0.0, 1.0)]],
        Gate::Sdg => array![[c(1.0, 0.0), c(0.0, 0.0)], [c(0.0, 0.0), c(0.0, -1.0)]],
        Gate::T => {
            let p = Complex64::from_polar(1.0, std::f64::consts::FRAC_PI_4);
            array![[c(1.0, 0.0), c(0.0, 0.0)], [c(0.0, 0.0), p]]
        }
        Gate::Tdg => {
            let p = Complex64::from_polar(1.0, -std::f64::consts::FRAC_PI_4);
            array![[c(1.0, 0.0), c(0.0, 0.0)], [c(0.0, 0.0), p]]
        }
        Gate::Rx(theta) => {
            let cos = c((theta / 2.0).cos(), 0.0);
            let isin = c(0.0, -(theta / 2.0).sin());
            array![[cos, isin], [isin, cos]]
        }
        // Permutations: flip the target bit when every control bit is set.
        Gate::Cx => permutation(2, |j| j ^ ((j & 1) << 1)),
        Gate::Ccx => permutation(3, |j| j ^ (((j & 1) & ((j >> 1) & 1)) << 2)),
    }
}

fn permutation(num_qubits: usize, map: impl Fn(usize) -> usize) -> Matrix {
    let dim = 1 << num_qubits;
    let mut m = Array2::zeros((dim, dim));
    for j in 0..dim {
        m[(map(j), j)] = c(1.0, 0.0);
    }
    m
}

/// Lift `sub` (acting on `qubits`) to the full 2^n-dimensional space.
///
/// Sub-index bit `k` corresponds to full-index bit `qubits[k]`; all other
/// qubits are untouched.
pub fn embed(sub: &Matrix, qubits: &[usize], n: usize) -> Matrix {
    let dim = 1usize << n;
    let sub_dim = 1usize << qubits.len();
    debug_assert_eq!(sub.nrows(), sub_dim);
    let mut full = Array2::zeros((dim, dim));
    for col in 0..dim {
        let mut sub_col = 0usize;
        let mut rest = col;
        for (k, &q) in qubits.iter().enumerate() {
            sub_col |= ((col >> q) & 1) << k;
            rest &= !(1 << q);
        }
        for sub_row in 0..sub_dim {
            let mut row = rest;
            for (k, &q) in qubits.iter().enumerate() {
                row |= ((sub_row >> k) & 1) << q;
            }
            full[(row, col)] = sub[(sub_row, sub_col)];
        }
    }
    full
}

/// The full unitary of a measurement-free circuit, as a 2^n × 2^n matrix.
///
/// Barriers are transparent; a measurement instruction is an error.
pub fn unitary_of(circuit: &Circuit) -> TesterResult<Matrix> {
    let n = circuit.num_qubits();
    let dim = 1usize << n;
    let mut u = Array2::eye(dim);
    for inst in circuit.instructions() {
        match inst {
            Instruction::Gate { gate, qubits } => {
                u = embed(&gate_unitary(gate), qubits, n).dot(&u);
            }
            Instruction::Barrier => {}
            Instruction::Measure { .. } => {
                return Err(TesterError::NonUnitary(circuit.name().to_string()));
            }
        }
    }
    Ok(u)
}

/// The matrix of the Weyl operator P_x selected by `key`, up to global
/// phase.
pub fn weyl_unitary(n: usize, key: &WeylKey) -> Matrix {
    let mut m = Array2::eye(1usize << n);
    for (i, &a) in key.z_bits().iter().enumerate() {
        if a == 1 {
            m = embed(&gate_unitary(&Gate::Z), &[i], n).dot(&m);
        }
    }
    for (i, &b) in key.x_bits().iter().enumerate() {
        if b == 1 {
            m = embed(&gate_unitary(&Gate::X), &[i], n).dot(&m);
        }
    }
    m
}

/// The outcome distribution p_U(x, y) = 2^(-4n) |Tr(P_x U P_y U†)|².
pub fn p_u(u: &Matrix, n: usize, x: &WeylKey, y: &WeylKey) -> f64 {
    let u_dag = u.t().mapv(|z| z.conj());
    let m = weyl_unitary(n, x).dot(u).dot(&weyl_unitary(n, y)).dot(&u_dag);
    let trace: Complex64 = m.diag().sum();
    trace.norm_sqr() / 2f64.powi(4 * n as i32)
}

/// The full p_U table over all 4^n × 4^n Weyl pairs, in `WeylKey::all`
/// order for both axes. Sums to 1 for any unitary.
pub fn p_table(u: &Matrix, n: usize) -> Array2<f64> {
    let keys = WeylKey::all(n);
    let weyls: Vec<Matrix> = keys.iter().map(|k| weyl_unitary(n, k)).collect();
    let u_dag = u.t().mapv(|z| z.conj());
    let norm = 2f64.powi(4 * n as i32);
    let mut table = Array2::zeros((keys.len(), keys.len()));
    for (i, px) in weyls.iter().enumerate() {
        let left = px.dot(u);
        for (j, py) in weyls.iter().enumerate() {
            let trace: Complex64 = left.dot(py).dot(&u_dag).diag().sum();
            table[(i, j)] = trace.norm_sqr() / norm;
        }
    }
    table
}

/// Expected acceptance probability of a unitary: 2^(2n) Σ p_U(x, y)².
pub fn p_acc(u: &Matrix, n: usize) -> f64 {
    let table = p_table(u, n);
    2f64.powi(2 * n as i32) * table.iter().map(|p| p * p).sum::<f64>()
}

/// Expected acceptance probability of a measurement-free circuit.
///
/// Clifford unitaries commute the Weyl group onto itself, so a circuit
/// built entirely from Clifford gates is accepted with certainty and
/// skips the dense 4^n × 4^n table.
pub fn acceptance_probability(circuit: &Circuit) -> TesterResult<f64> {
    let mut all_clifford = true;
    for inst in circuit.instructions() {
        match inst {
            Instruction::Gate { gate, .. } => all_clifford &= gate.is_clifford(),
            Instruction::Barrier => {}
            Instruction::Measure { .. } => {
                return Err(TesterError::NonUnitary(circuit.name().to_string()));
            }
        }
    }
    if all_clifford {
        return Ok(1.0);
    }
    let u = unitary_of(circuit)?;
    Ok(p_acc(&u, circuit.num_qubits()))
}
