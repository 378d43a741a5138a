//! Error types for the operator facade.

use crate::wire::Wire;
use thiserror::Error;

/// Errors that can occur when constructing or evaluating operators.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Operator requires a different number of wires.
    #[error("Operator '{name}' requires {expected} wires, got {got}")]
    WireCountMismatch {
        /// Name of the operator.
        name: String,
        /// Expected number of wires (minimum for variable-width operators).
        expected: usize,
        /// Actual number of wires provided.
        got: usize,
    },

    /// Operator requires a different number of parameters.
    #[error("Operator '{name}' requires {expected} parameters, got {got}")]
    ParameterCountMismatch {
        /// Name of the operator.
        name: String,
        /// Expected number of parameters.
        expected: usize,
        /// Actual number of parameters provided.
        got: usize,
    },

    /// The same wire appears twice in one operator.
    #[error("Duplicate wire {wire} in operation{}", format_op_context(.name))]
    DuplicateWire {
        /// The duplicate wire.
        wire: Wire,
        /// Optional operator name for context.
        name: Option<String>,
    },

    /// A user-supplied matrix has the wrong shape.
    #[error("Invalid matrix for '{name}': {reason}")]
    InvalidMatrix {
        /// Name of the operator.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// No closed-form matrix is available.
    #[error("Matrix undefined for '{name}'{}", format_reason(.reason))]
    MatrixUndefined {
        /// Name of the operator.
        name: String,
        /// Optional detail (singular matrix, not diagonalizable, ...).
        reason: Option<String>,
    },

    /// No sparse matrix is available.
    #[error("Sparse matrix undefined for '{0}'")]
    SparseMatrixUndefined(String),

    /// No decomposition is available.
    #[error("Decomposition undefined for '{0}'")]
    DecompositionUndefined(String),

    /// The native power hook has no rule for this exponent.
    #[error("Power '{name}' ** {exponent} has no native decomposition")]
    PowUndefined {
        /// Name of the operator.
        name: String,
        /// The exponent, rendered.
        exponent: String,
    },

    /// The operator has no generator.
    #[error("Generator undefined for '{0}'")]
    GeneratorUndefined(String),

    /// The operator has no eigenvalues.
    #[error("Eigenvalues undefined for '{0}'")]
    EigvalsUndefined(String),

    /// The operator has no diagonalizing gates.
    #[error("Diagonalizing gates undefined for '{0}'")]
    DiagonalizingGatesUndefined(String),

    /// The operator cannot be inverted through its inverse flag.
    #[error("Inverse undefined for '{0}'")]
    InverseUndefined(String),

    /// A recorded circuit or other input is malformed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[allow(clippy::ref_option)]
fn format_op_context(name: &Option<String>) -> String {
    match name {
        Some(name) => format!(" (operator: {name})"),
        None => String::new(),
    }
}

#[allow(clippy::ref_option)]
fn format_reason(reason: &Option<String>) -> String {
    match reason {
        Some(reason) => format!(": {reason}"),
        None => String::new(),
    }
}

impl IrError {
    /// Shorthand for a [`IrError::MatrixUndefined`] without a reason.
    pub fn matrix_undefined(name: impl Into<String>) -> Self {
        IrError::MatrixUndefined {
            name: name.into(),
            reason: None,
        }
    }
}

/// Result type for operator-facade operations.
pub type IrResult<T> = Result<T, IrError>;
