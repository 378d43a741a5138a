//! Error types for commutation analysis.

use qsym_ir::IrError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised by the rule engine and the commutation DAG.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CommuteError {
    /// The operator kind is outside the supported vocabulary.
    #[error("Operation {0} not supported.")]
    UnsupportedOperation(String),

    /// A controlled operation whose body has more than one target.
    #[error("{0}: controlled operations with more than one target wire are not supported.")]
    MultipleTargets(String),

    /// Node index out of range.
    #[error("Node {0} does not exist in the commutation DAG")]
    InvalidNode(usize),

    /// Input that cannot be turned into a DAG.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A structural invariant of the DAG does not hold.
    #[error("Invalid commutation DAG: {0}")]
    InvalidDag(String),

    /// The matrix fallback would need more wires than allowed.
    #[error("Matrix commutation check on {wires} wires exceeds the limit of {max}")]
    FallbackTooLarge {
        /// Combined wire count of the pair.
        wires: usize,
        /// Configured maximum.
        max: usize,
    },

    /// `simplify_rotation` called on something that is not a rotation family gate.
    #[error("{0} is not a Rot, U2, U3 or CRot gate")]
    NotARotation(String),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Error from the operator facade.
    #[error(transparent)]
    Ir(#[from] IrError),
}

impl CommuteError {
    /// Whether this is one of the "operation not supported" conditions.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            CommuteError::UnsupportedOperation(_) | CommuteError::MultipleTargets(_)
        )
    }
}

/// Result type for commutation analysis.
pub type CommuteResult<T> = Result<T, CommuteError>;
