//! Commutation analysis for qsym operators
//!
//! This crate decides whether two operators commute and builds the
//! commutation DAG of a circuit: operations as nodes, with an edge wherever
//! two operations must keep their relative order.
//!
//! # Core Components
//!
//! - **Rule engine**: [`CommutationChecker`] and the standalone [`commutes`]
//!   function, backed by the static [`CommutationTable`] and a matrix fallback
//! - **Canonicalization**: [`canonicalize`] and [`simplify_rotation`] fold
//!   trivially parametrized gates into simpler ones
//! - **DAG**: [`CommutationDag`] with transitive closures cached per node
//! - **Configuration**: [`CommutationConfig`] loaded from YAML and the
//!   environment
//!
//! # Example: Deciding commutation
//!
//! ```rust
//! use qsym_commute::{CommutationChecker, Rule, commutes};
//! use qsym_ir::{Gate, GateKind, Operator};
//!
//! let cnot: Operator = Gate::new(GateKind::CNOT, [0, 1], []).unwrap().into();
//! let x_target: Operator = Gate::new(GateKind::PauliX, [1], []).unwrap().into();
//! let x_control: Operator = Gate::new(GateKind::PauliX, [0], []).unwrap().into();
//!
//! assert!(commutes(&cnot, &x_target).unwrap());
//! assert!(!commutes(&cnot, &x_control).unwrap());
//!
//! let decision = CommutationChecker::default().decide(&cnot, &x_target).unwrap();
//! assert_eq!(decision.rule, Rule::Signature);
//! ```
//!
//! # Example: Building a DAG
//!
//! ```rust
//! use qsym_commute::CommutationDag;
//! use qsym_ir::{Gate, GateKind};
//!
//! let dag = CommutationDag::from_recorder(|t| {
//!     t.apply(Gate::new(GateKind::PauliZ, [0], [])?);
//!     t.apply(Gate::new(GateKind::PauliX, [0], [])?);
//!     t.apply(Gate::new(GateKind::PauliZ, [1], [])?);
//!     Ok(())
//! })
//! .unwrap();
//!
//! assert_eq!(dag.num_nodes(), 3);
//! assert!(dag.get_edge(0, 1).unwrap().is_some());
//! assert!(dag.successors(2).unwrap().is_empty());
//! ```

pub mod canonical;
pub mod checker;
pub mod config;
pub mod dag;
pub mod error;
pub mod table;

pub use canonical::{canonicalize, simplify_rotation};
pub use checker::{CommutationChecker, Decision, Rule, commutes};
pub use config::{CommutationConfig, ConfigError};
pub use dag::{CommutationDag, CommutationEdge, CommutationNode, EdgeEntry, NodeIndex};
pub use error::{CommuteError, CommuteResult};
pub use table::{Axis, CommutationTable, CommutationTableBuilder, Placement, WireAxes};
