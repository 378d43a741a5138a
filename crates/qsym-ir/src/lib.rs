//! qsym operator facade
//!
//! This crate provides the operator model the rest of the workspace builds on:
//! wire labels, a fixed gate vocabulary with closed-form matrices, generic
//! controlled operations, symbolic powers, and circuit tapes.
//!
//! # Core Components
//!
//! - **Wires**: [`Wire`] labels (integers or strings) and ordered [`Wires`]
//! - **Gates**: [`GateKind`] for the vocabulary and [`Gate`] for concrete,
//!   validated instances
//! - **Operators**: [`Operator`] unifies gates, [`Controlled`] operations and
//!   [`Pow`] powers behind one interface
//! - **Tapes**: [`Tape`] records operations and [`Measurement`]s
//!
//! # Example: Square root of X
//!
//! ```rust
//! use qsym_ir::{Gate, GateKind, Pow, linalg};
//!
//! let x = Gate::new(GateKind::PauliX, [0], []).unwrap();
//! let root = Pow::new(x, 0.5);
//!
//! // The native power hook knows X^½ = SX.
//! let ops = root.decomposition().unwrap();
//! assert_eq!(ops[0].name(), "SX");
//!
//! // The matrix squares back to X.
//! let m = root.matrix().unwrap();
//! let x_matrix = Gate::new(GateKind::PauliX, [0], []).unwrap().matrix().unwrap();
//! assert!(linalg::allclose(&m.dot(&m), &x_matrix, 1e-8));
//! ```
//!
//! # Example: Recording a tape
//!
//! ```rust
//! use qsym_ir::{Gate, GateKind, Measurement, Tape, Wires};
//!
//! let tape = Tape::record(|t| {
//!     t.apply(Gate::new(GateKind::Hadamard, ["a"], [])?);
//!     t.apply(Gate::new(GateKind::CNOT, ["a", "b"], [])?);
//!     t.measure(Measurement::probs(Wires::new(["a", "b"])));
//!     Ok(())
//! })
//! .unwrap();
//!
//! assert_eq!(tape.operations().len(), 2);
//! assert_eq!(tape.wires(), Wires::new(["a", "b"]));
//! ```

pub mod controlled;
pub mod error;
pub mod gate;
pub mod linalg;
pub mod matrices;
pub mod operator;
pub mod pow;
pub mod sparse;
pub mod tape;
pub mod wire;

pub use controlled::Controlled;
pub use error::{IrError, IrResult};
pub use gate::{Basis, Gate, GateKind, Hyperparameters, WireCount};
pub use linalg::Matrix;
pub use operator::{Capabilities, Generator, Operator};
pub use pow::{Exponent, Pow};
pub use sparse::SparseMatrix;
pub use tape::{Measurement, ReturnType, Tape};
pub use wire::{Wire, Wires};
