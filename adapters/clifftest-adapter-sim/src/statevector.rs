//! Statevector simulation engine.

use num_complex::Complex64;
use std::f64::consts::PI;

use clifftest_ir::{Gate, Instruction};

/// A statevector representing a quantum state.
///
/// Basis-state indices are little-endian: bit `i` of the index is qubit
/// `i`, matching the bitstring convention of `clifftest_hal::Counts`.
pub struct Statevector {
    /// The state amplitudes (2^n complex numbers).
    amplitudes: Vec<Complex64>,
    /// Number of qubits.
    num_qubits: usize,
}

impl Statevector {
    /// Create a new statevector initialized to |0...0⟩.
    pub fn new(num_qubits: usize) -> Self {
        let size = 1 << num_qubits;
        let mut amplitudes = vec![Complex64::new(0.0, 0.0); size];
        amplitudes[0] = Complex64::new(1.0, 0.0);
        Self {
            amplitudes,
            num_qubits,
        }
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Apply an instruction to the statevector.
    ///
    /// Measurements and barriers do not modify the state; sampling happens
    /// once at the end of the shot.
    pub fn apply(&mut self, instruction: &Instruction) {
        match instruction {
            Instruction::Gate { gate, qubits } => self.apply_gate(gate, qubits),
            Instruction::Measure { .. } | Instruction::Barrier => {}
        }
    }

    fn apply_gate(&mut self, gate: &Gate, qubits: &[usize]) {
        match gate {
            Gate::I => {}
            Gate::X => self.apply_x(qubits[0]),
            Gate::Y => self.apply_y(qubits[0]),
            Gate::Z => self.apply_z(qubits[0]),
            Gate::H => self.apply_h(qubits[0]),
            Gate::S => self.apply_phase(qubits[0], PI / 2.0),
            Gate::Sdg => self.apply_phase(qubits[0], -PI / 2.0),
            Gate::T => self.apply_phase(qubits[0], PI / 4.0),
            Gate::Tdg => self.apply_phase(qubits[0], -PI / 4.0),
            Gate::Rx(theta) => self.apply_rx(qubits[0], *theta),
            Gate::Cx => self.apply_cx(qubits[0], qubits[1]),
            Gate::Ccx => self.apply_ccx(qubits[0], qubits[1], qubits[2]),
        }
    }

    // =========================================================================
    // Gate kernels
    // =========================================================================
    //
    // Every gate in the set is one of three shapes: a 2x2 update on the
    // amplitude pairs (i, i | 1 << qubit), a diagonal factor on the
    // amplitudes whose qubit bit is set, or a controlled bit flip. The
    // iteration lives in the helpers; each kernel supplies the arithmetic.

    /// Visit each amplitude pair that differs only in `qubit`, low index
    /// first.
    fn for_each_pair(&mut self, qubit: usize, mut f: impl FnMut(&mut Complex64, &mut Complex64)) {
        let mask = 1 << qubit;
        for i in 0..(1 << self.num_qubits) {
            if i & mask == 0 {
                let (low, high) = self.amplitudes.split_at_mut(i | mask);
                f(&mut low[i], &mut high[0]);
            }
        }
    }

    /// Multiply every amplitude whose `qubit` bit is set by `factor`.
    fn scale_upper(&mut self, qubit: usize, factor: Complex64) {
        let mask = 1 << qubit;
        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            if i & mask != 0 {
                *amp *= factor;
            }
        }
    }

    /// Flip `target` on every basis state where all bits of `ctrl_mask`
    /// are set. An empty mask flips unconditionally.
    fn flip_when(&mut self, ctrl_mask: usize, target: usize) {
        let tgt_mask = 1 << target;
        for i in 0..(1 << self.num_qubits) {
            if i & ctrl_mask == ctrl_mask && i & tgt_mask == 0 {
                self.amplitudes.swap(i, i | tgt_mask);
            }
        }
    }

    fn apply_x(&mut self, qubit: usize) {
        self.flip_when(0, qubit);
    }

    fn apply_y(&mut self, qubit: usize) {
        let im = Complex64::new(0.0, 1.0);
        self.for_each_pair(qubit, |a, b| {
            let (x, y) = (*a, *b);
            *a = -im * y;
            *b = im * x;
        });
    }

    fn apply_z(&mut self, qubit: usize) {
        self.scale_upper(qubit, Complex64::new(-1.0, 0.0));
    }

    fn apply_h(&mut self, qubit: usize) {
        let s = std::f64::consts::FRAC_1_SQRT_2;
        self.for_each_pair(qubit, |a, b| {
            let (x, y) = (*a, *b);
            *a = s * (x + y);
            *b = s * (x - y);
        });
    }

    fn apply_phase(&mut self, qubit: usize, theta: f64) {
        self.scale_upper(qubit, Complex64::from_polar(1.0, theta));
    }

    fn apply_rx(&mut self, qubit: usize, theta: f64) {
        let c = (theta / 2.0).cos();
        let s = Complex64::new(0.0, -(theta / 2.0).sin());
        self.for_each_pair(qubit, |a, b| {
            let (x, y) = (*a, *b);
            *a = c * x + s * y;
            *b = s * x + c * y;
        });
    }

    fn apply_cx(&mut self, control: usize, target: usize) {
        self.flip_when(1 << control, target);
    }

    fn apply_ccx(&mut self, c1: usize, c2: usize, target: usize) {
        self.flip_when((1 << c1) | (1 << c2), target);
    }

    /// Sample a measurement outcome over all qubits.
    pub fn sample(&self, rng: &mut impl rand::Rng) -> usize {
        let r: f64 = rng.r#gen();

        let mut cumulative = 0.0;
        for (i, amp) in self.amplitudes.iter().enumerate() {
            cumulative += amp.norm_sqr();
            if r < cumulative {
                return i;
            }
        }

        // Fallback (shouldn't happen with normalized states)
        self.amplitudes.len() - 1
    }
}
