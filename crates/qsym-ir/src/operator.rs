//! The operator facade consumed by the power wrapper and the commutation engine.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::controlled::Controlled;
use crate::error::{IrError, IrResult};
use crate::gate::{Basis, Gate, GateKind};
use crate::linalg::{self, Matrix};
use crate::pow::{Exponent, Pow};
use crate::sparse::SparseMatrix;
use crate::wire::Wires;

/// What an operator can be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capabilities {
    /// A closed-form matrix exists.
    pub has_matrix: bool,
    /// The operator can be measured.
    pub is_observable: bool,
    /// The operator acts on the state.
    pub is_operation: bool,
}

/// A Hermitian generator with its prefactor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generator {
    /// Prefactor multiplying the parameter.
    pub coeff: f64,
    /// Hermitian observable.
    pub observable: Gate,
}

/// Any operator: a concrete gate, a generic controlled operation, or a
/// symbolic power.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operator {
    /// A gate from the fixed vocabulary.
    Gate(Gate),
    /// Controls attached to a body of operations.
    Controlled(Controlled),
    /// `base ** z`.
    Pow(Pow),
}

impl Operator {
    /// The gate, if this is a plain gate.
    pub fn as_gate(&self) -> Option<&Gate> {
        match self {
            Operator::Gate(g) => Some(g),
            _ => None,
        }
    }

    /// The gate kind, if this is a plain gate.
    pub fn gate_kind(&self) -> Option<GateKind> {
        self.as_gate().map(Gate::kind)
    }

    /// Display name.
    pub fn name(&self) -> String {
        match self {
            Operator::Gate(g) => g.name(),
            Operator::Controlled(c) => c.name(),
            Operator::Pow(p) => p.name(),
        }
    }

    /// Ordered wires.
    pub fn wires(&self) -> &Wires {
        match self {
            Operator::Gate(g) => g.wires(),
            Operator::Controlled(c) => c.wires(),
            Operator::Pow(p) => p.wires(),
        }
    }

    /// Numeric parameters.
    pub fn parameters(&self) -> Vec<f64> {
        match self {
            Operator::Gate(g) => g.params().to_vec(),
            Operator::Controlled(c) => c.parameters(),
            Operator::Pow(p) => p.parameters(),
        }
    }

    /// Replace the numeric parameters.
    pub fn set_parameters(&mut self, params: &[f64]) -> IrResult<()> {
        match self {
            Operator::Gate(g) => g.set_params(params),
            Operator::Controlled(c) => c.set_parameters(params),
            Operator::Pow(p) => p.set_parameters(params),
        }
    }

    /// Capability flags.
    pub fn capabilities(&self) -> Capabilities {
        match self {
            Operator::Gate(g) => g.capabilities(),
            Operator::Controlled(c) => c.capabilities(),
            Operator::Pow(p) => p.capabilities(),
        }
    }

    /// Whether a closed-form matrix exists.
    #[inline]
    pub fn has_matrix(&self) -> bool {
        self.capabilities().has_matrix
    }

    /// Matrix in this operator's own wire order.
    pub fn matrix(&self) -> IrResult<Matrix> {
        match self {
            Operator::Gate(g) => g.matrix(),
            Operator::Controlled(c) => c.matrix(),
            Operator::Pow(p) => p.matrix(),
        }
    }

    /// Matrix expanded onto `order`, which must contain every wire of this
    /// operator. Wires of `order` not acted on get the identity.
    pub fn matrix_on(&self, order: &Wires) -> IrResult<Matrix> {
        let positions = self
            .wires()
            .iter()
            .map(|w| {
                order.index_of(w).ok_or_else(|| {
                    IrError::InvalidInput(format!("wire {w} of '{}' is not in {order}", self.name()))
                })
            })
            .collect::<IrResult<Vec<usize>>>()?;
        Ok(linalg::expand(&self.matrix()?, &positions, order.len()))
    }

    /// Sparse matrix.
    pub fn sparse_matrix(&self) -> IrResult<SparseMatrix> {
        match self {
            Operator::Gate(g) => g.sparse_matrix(),
            Operator::Controlled(c) => Ok(SparseMatrix::from_dense(&c.matrix()?)),
            Operator::Pow(p) => p.sparse_matrix(),
        }
    }

    /// Eigenvalues.
    pub fn eigvals(&self) -> IrResult<Vec<Complex64>> {
        match self {
            Operator::Gate(g) => g.eigvals(),
            Operator::Controlled(c) => c.eigvals(),
            Operator::Pow(p) => p.eigvals(),
        }
    }

    /// Generator.
    pub fn generator(&self) -> IrResult<Generator> {
        match self {
            Operator::Gate(g) => g.generator(),
            Operator::Controlled(c) => Err(IrError::GeneratorUndefined(c.name())),
            Operator::Pow(p) => p.generator(),
        }
    }

    /// Native power decomposition `self ** z`.
    pub fn pow(&self, z: impl Into<Exponent>) -> IrResult<Vec<Operator>> {
        let z = z.into();
        match self {
            Operator::Gate(g) => g.pow(z),
            Operator::Controlled(_) => self.generic_pow(z),
            Operator::Pow(p) => p.pow(z),
        }
    }

    /// Power rule every operator has: `z = 0` is nothing, `z = 1` is a copy.
    pub(crate) fn generic_pow(&self, z: Exponent) -> IrResult<Vec<Operator>> {
        let zf = z.as_f64();
        if zf == 0.0 {
            Ok(vec![])
        } else if zf == 1.0 {
            Ok(vec![self.clone()])
        } else {
            Err(IrError::PowUndefined {
                name: self.name(),
                exponent: z.to_string(),
            })
        }
    }

    /// Decomposition into simpler operators.
    pub fn decomposition(&self) -> IrResult<Vec<Operator>> {
        match self {
            Operator::Gate(g) => g.decomposition(),
            Operator::Controlled(c) => Err(IrError::DecompositionUndefined(c.name())),
            Operator::Pow(p) => p.decomposition(),
        }
    }

    /// Gates rotating into the eigenbasis of this observable.
    pub fn diagonalizing_gates(&self) -> IrResult<Vec<Operator>> {
        match self {
            Operator::Gate(g) => g.diagonalizing_gates(),
            Operator::Controlled(c) => Err(IrError::DiagonalizingGatesUndefined(c.name())),
            Operator::Pow(p) => p.diagonalizing_gates(),
        }
    }

    /// Drawing label.
    pub fn label(&self, decimals: Option<usize>) -> String {
        match self {
            Operator::Gate(g) => g.label(decimals),
            Operator::Controlled(c) => c.label(decimals),
            Operator::Pow(p) => p.label(decimals),
        }
    }

    /// Whether the inverse flag is set.
    pub fn is_inverse(&self) -> bool {
        match self {
            Operator::Gate(g) => g.is_inverse(),
            Operator::Controlled(c) => c.is_inverse(),
            Operator::Pow(_) => false,
        }
    }

    /// Set the inverse flag.
    pub fn set_inverse(&mut self, inverse: bool) -> IrResult<()> {
        match self {
            Operator::Gate(g) => g.set_inverse(inverse),
            Operator::Controlled(c) => {
                c.set_inverse(inverse);
                Ok(())
            }
            Operator::Pow(p) => p.set_inverse(inverse),
        }
    }

    /// The inverse operator.
    pub fn inv(self) -> IrResult<Operator> {
        match self {
            Operator::Gate(g) => g.inv().map(Operator::Gate),
            Operator::Controlled(mut c) => {
                let flag = !c.is_inverse();
                c.set_inverse(flag);
                Ok(Operator::Controlled(c))
            }
            Operator::Pow(p) => p.inv().map(Operator::Pow),
        }
    }

    /// Eigenbasis of the target action.
    pub fn basis(&self) -> Option<Basis> {
        match self {
            Operator::Gate(g) => g.kind().basis(),
            Operator::Controlled(c) => c.basis(),
            Operator::Pow(p) => p.basis(),
        }
    }

    /// Control wires.
    pub fn control_wires(&self) -> Wires {
        match self {
            Operator::Gate(g) => g.control_wires(),
            Operator::Controlled(c) => c.control_wires().clone(),
            Operator::Pow(p) => p.control_wires(),
        }
    }
}
