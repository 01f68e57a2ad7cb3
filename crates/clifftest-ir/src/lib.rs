//! Minimal quantum circuit IR for the Clifford tester.
//!
//! This crate provides just enough circuit representation to express the
//! tester circuits (Choi-state preparation, a unitary under test applied to
//! both registers, and a Bell-basis measurement) and to let backends execute
//! them:
//!
//! - [`Gate`] — the gate set the tester and its registry need
//! - [`Instruction`] — a gate application, a measurement, or a barrier
//! - [`Circuit`] — an ordered instruction list with a builder API
//!
//! Circuits serialize with serde so remote backends can ship them as JSON.
//!
//! # Example
//!
//! ```
//! use clifftest_ir::Circuit;
//!
//! let mut qc = Circuit::new("bell", 2, 2);
//! qc.h(0).unwrap().cx(0, 1).unwrap();
//! qc.measure(0, 0).unwrap();
//! qc.measure(1, 1).unwrap();
//! assert_eq!(qc.num_qubits(), 2);
//! ```

pub mod circuit;
pub mod error;
pub mod gate;
pub mod instruction;

pub use circuit::Circuit;
pub use error::{IrError, IrResult};
pub use gate::Gate;
pub use instruction::Instruction;
