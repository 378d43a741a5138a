//! Symbolic operator powers `base ** z`.
//!
//! A [`Pow`] keeps its base intact and derives everything else (matrix,
//! spectrum, decomposition, generator) from the base and the exponent.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{IrError, IrResult};
use crate::gate::Basis;
use crate::linalg::{self, Matrix};
use crate::operator::{Capabilities, Generator, Operator};
use crate::sparse::SparseMatrix;
use crate::wire::Wires;

/// A power exponent.
///
/// Integer exponents take the exact repeated-squaring paths; real ones go
/// through the principal branch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Exponent {
    /// Integer exponent.
    Int(i64),
    /// Real exponent.
    Real(f64),
}

impl Exponent {
    /// The exponent as a float.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(self) -> f64 {
        match self {
            Exponent::Int(k) => k as f64,
            Exponent::Real(x) => x,
        }
    }

    /// The exponent as an integer, if it is one.
    #[allow(clippy::cast_possible_truncation)]
    pub fn as_integer(self) -> Option<i64> {
        match self {
            Exponent::Int(k) => Some(k),
            Exponent::Real(x) if x.is_finite() && x.fract() == 0.0 && x.abs() < 9.0e15 => {
                Some(x as i64)
            }
            Exponent::Real(_) => None,
        }
    }

    /// Product of two exponents, staying integral when both are.
    pub fn mul(self, other: Exponent) -> Exponent {
        match (self, other) {
            (Exponent::Int(a), Exponent::Int(b)) => match a.checked_mul(b) {
                Some(p) => Exponent::Int(p),
                None => Exponent::Real(self.as_f64() * other.as_f64()),
            },
            _ => Exponent::Real(self.as_f64() * other.as_f64()),
        }
    }
}

impl std::ops::Neg for Exponent {
    type Output = Exponent;

    fn neg(self) -> Exponent {
        match self {
            Exponent::Int(k) => k
                .checked_neg()
                .map_or(Exponent::Real(-self.as_f64()), Exponent::Int),
            Exponent::Real(x) => Exponent::Real(-x),
        }
    }
}

impl fmt::Display for Exponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exponent::Int(k) => write!(f, "{k}"),
            Exponent::Real(x) if x.is_finite() && x.fract() == 0.0 => write!(f, "{x:.1}"),
            Exponent::Real(x) => write!(f, "{x}"),
        }
    }
}

impl From<i64> for Exponent {
    fn from(k: i64) -> Self {
        Exponent::Int(k)
    }
}

impl From<i32> for Exponent {
    fn from(k: i32) -> Self {
        Exponent::Int(i64::from(k))
    }
}

impl From<f64> for Exponent {
    fn from(x: f64) -> Self {
        Exponent::Real(x)
    }
}

fn superscript(ch: char) -> char {
    match ch {
        '0' => '⁰',
        '1' => '¹',
        '2' => '²',
        '3' => '³',
        '4' => '⁴',
        '5' => '⁵',
        '6' => '⁶',
        '7' => '⁷',
        '8' => '⁸',
        '9' => '⁹',
        '.' => '⋅',
        '+' => '⁺',
        '-' => '⁻',
        other => other,
    }
}

/// `base ** z` as a single operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pow {
    base: Box<Operator>,
    z: Exponent,
}

impl Pow {
    /// Wrap `base` raised to `z`.
    ///
    /// An inverted base has its flag cleared and the exponent negated, so
    /// `Pow(G†, z)` is stored as `Pow(G, -z)`.
    pub fn new(base: impl Into<Operator>, z: impl Into<Exponent>) -> Self {
        let mut base = base.into();
        let mut z = z.into();
        if base.is_inverse() && base.set_inverse(false).is_ok() {
            z = -z;
        }
        Self {
            base: Box::new(base),
            z,
        }
    }

    /// The wrapped operator.
    pub fn base(&self) -> &Operator {
        &self.base
    }

    /// The exponent.
    pub fn exponent(&self) -> Exponent {
        self.z
    }

    /// `"{base}**{z}"`.
    pub fn name(&self) -> String {
        format!("{}**{}", self.base.name(), self.z)
    }

    /// Wires of the base.
    pub fn wires(&self) -> &Wires {
        self.base.wires()
    }

    /// Parameters of the base.
    pub fn parameters(&self) -> Vec<f64> {
        self.base.parameters()
    }

    /// Replace the parameters of the base.
    pub fn set_parameters(&mut self, params: &[f64]) -> IrResult<()> {
        self.base.set_parameters(params)
    }

    /// Capabilities of the base.
    pub fn capabilities(&self) -> Capabilities {
        self.base.capabilities()
    }

    /// Matrix of `base ** z`.
    ///
    /// Integer exponents use repeated squaring (inverting first when
    /// negative); other exponents use the principal branch of an
    /// eigendecomposition.
    pub fn matrix(&self) -> IrResult<Matrix> {
        if !self.base.has_matrix() {
            return Err(IrError::matrix_undefined(self.name()));
        }
        let base = self.base.matrix()?;
        match self.z.as_integer() {
            Some(k) => linalg::int_power(&base, k).ok_or_else(|| IrError::MatrixUndefined {
                name: self.name(),
                reason: Some("base matrix is singular".into()),
            }),
            None => linalg::fractional_power(&base, self.z.as_f64()).ok_or_else(|| {
                IrError::MatrixUndefined {
                    name: self.name(),
                    reason: Some("base matrix is not diagonalizable".into()),
                }
            }),
        }
    }

    /// Sparse matrix; integer exponents only.
    pub fn sparse_matrix(&self) -> IrResult<SparseMatrix> {
        let Some(k) = self.z.as_integer() else {
            return Err(IrError::SparseMatrixUndefined(self.name()));
        };
        if !self.base.has_matrix() {
            return Err(IrError::SparseMatrixUndefined(self.name()));
        }
        self.base
            .sparse_matrix()?
            .pow(k)
            .ok_or_else(|| IrError::MatrixUndefined {
                name: self.name(),
                reason: Some("base matrix is singular".into()),
            })
    }

    /// Eigenvalues of the base raised to `z` on the principal branch.
    pub fn eigvals(&self) -> IrResult<Vec<Complex64>> {
        let p = self.z.as_f64();
        Ok(self
            .base
            .eigvals()?
            .into_iter()
            .map(|v| linalg::principal_pow(v, p))
            .collect())
    }

    /// `z` times the generator of the base.
    pub fn generator(&self) -> IrResult<Generator> {
        let g = self.base.generator()?;
        Ok(Generator {
            coeff: g.coeff * self.z.as_f64(),
            observable: g.observable,
        })
    }

    /// The base's native power, or the base repeated for a positive integer
    /// exponent.
    pub fn decomposition(&self) -> IrResult<Vec<Operator>> {
        match self.base.pow(self.z) {
            Ok(ops) => Ok(ops),
            Err(IrError::PowUndefined { .. }) => match self.z.as_integer() {
                Some(k) if k > 0 => Ok((0..k).map(|_| (*self.base).clone()).collect()),
                _ => Err(IrError::DecompositionUndefined(self.name())),
            },
            Err(e) => Err(e),
        }
    }

    /// `(base ** z) ** w`. An integer `w` folds into the exponent.
    pub fn pow(&self, w: Exponent) -> IrResult<Vec<Operator>> {
        if w.as_integer().is_some() {
            let folded = Pow {
                base: self.base.clone(),
                z: self.z.mul(w),
            };
            return Ok(vec![Operator::Pow(folded)]);
        }
        Operator::Pow(self.clone()).generic_pow(w)
    }

    /// Diagonalizing gates of the base, for integer exponents.
    pub fn diagonalizing_gates(&self) -> IrResult<Vec<Operator>> {
        if self.z.as_integer().is_none() {
            return Err(IrError::DiagonalizingGatesUndefined(self.name()));
        }
        self.base.diagonalizing_gates()
    }

    /// Base label followed by the exponent in superscript.
    pub fn label(&self, decimals: Option<usize>) -> String {
        let z: String = self.z.to_string().chars().map(superscript).collect();
        format!("{}{z}", self.base.label(decimals))
    }

    /// Powers fold inversion into the exponent; the flag itself is never set.
    pub fn set_inverse(&mut self, inverse: bool) -> IrResult<()> {
        if inverse {
            return Err(IrError::InverseUndefined(self.name()));
        }
        Ok(())
    }

    /// `base ** -z`, for operations.
    pub fn inv(self) -> IrResult<Self> {
        if !self.capabilities().is_operation {
            return Err(IrError::InverseUndefined(self.name()));
        }
        Ok(Self {
            base: self.base,
            z: -self.z,
        })
    }

    /// Basis of the base.
    pub fn basis(&self) -> Option<Basis> {
        self.base.basis()
    }

    /// Control wires of the base.
    pub fn control_wires(&self) -> Wires {
        self.base.control_wires()
    }
}

impl From<Pow> for Operator {
    fn from(p: Pow) -> Self {
        Operator::Pow(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::{Gate, GateKind};
    use crate::linalg::allclose;

    fn gate(kind: GateKind, wires: &[i64], params: &[f64]) -> Operator {
        Gate::new(kind, wires.iter().copied(), params.iter().copied())
            .unwrap()
            .into()
    }

    #[test]
    fn test_exponent_display() {
        assert_eq!(Exponent::Int(-3).to_string(), "-3");
        assert_eq!(Exponent::Real(2.0).to_string(), "2.0");
        assert_eq!(Exponent::Real(0.5).to_string(), "0.5");
        assert_eq!(Exponent::Real(2.0).as_integer(), Some(2));
        assert_eq!(Exponent::Real(2.5).as_integer(), None);
    }

    #[test]
    fn test_name_and_label() {
        let p = Pow::new(gate(GateKind::PauliX, &[0], &[]), Exponent::Real(-1.5));
        assert_eq!(p.name(), "PauliX**-1.5");
        assert_eq!(p.label(None), "X⁻¹⋅⁵");

        let nested = Pow::new(Operator::Pow(p), 2);
        assert_eq!(nested.label(None), "X⁻¹⋅⁵²");
    }

    #[test]
    fn test_inverse_base_folds_into_exponent() {
        let s_inv = gate(GateKind::S, &[0], &[]).inv().unwrap();
        let p = Pow::new(s_inv, 2);
        assert_eq!(p.exponent(), Exponent::Int(-2));
        assert!(!p.base().is_inverse());
        let z = gate(GateKind::PauliZ, &[0], &[]).matrix().unwrap();
        assert!(allclose(&p.matrix().unwrap(), &z, 1e-12));
    }

    #[test]
    fn test_set_inverse_rejected() {
        let mut p = Pow::new(gate(GateKind::T, &[0], &[]), 3);
        assert!(matches!(p.set_inverse(true), Err(IrError::InverseUndefined(_))));
        assert!(p.set_inverse(false).is_ok());
        assert_eq!(p.inv().unwrap().exponent(), Exponent::Int(-3));
    }

    #[test]
    fn test_fractional_matrix() {
        let p = Pow::new(gate(GateKind::PauliX, &[0], &[]), 0.5);
        let sx = gate(GateKind::SX, &[0], &[]).matrix().unwrap();
        assert!(allclose(&p.matrix().unwrap(), &sx, 1e-8));
    }

    #[test]
    fn test_sparse_requires_integer() {
        let p = Pow::new(gate(GateKind::Hadamard, &[0], &[]), 0.5);
        assert!(matches!(
            p.sparse_matrix(),
            Err(IrError::SparseMatrixUndefined(_))
        ));
        let q = Pow::new(gate(GateKind::CNOT, &[0, 1], &[]), 3);
        let cnot = gate(GateKind::CNOT, &[0, 1], &[]).matrix().unwrap();
        assert!(allclose(&q.sparse_matrix().unwrap().to_dense(), &cnot, 1e-12));
    }

    #[test]
    fn test_decomposition_fallbacks() {
        let p = Pow::new(gate(GateKind::Hadamard, &[0], &[]), 3);
        let ops = p.decomposition().unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].name(), "Hadamard");

        let u = Pow::new(gate(GateKind::U2, &[0], &[0.1, 0.2]), 3);
        assert_eq!(u.decomposition().unwrap().len(), 3);

        let r = Pow::new(gate(GateKind::U2, &[0], &[0.1, 0.2]), 0.5);
        assert!(matches!(
            r.decomposition(),
            Err(IrError::DecompositionUndefined(_))
        ));
    }

    #[test]
    fn test_decomposition_propagates_native_errors() {
        // Deserialization skips validation, so the native SISWAP rule fails
        // when it rebuilds the gate on three wires.
        let bad: Gate = serde_json::from_str(r#"{"kind":"ISwap","wires":[0,1,2]}"#).unwrap();
        let p = Pow::new(Operator::from(bad), 0.5);
        assert!(matches!(
            p.decomposition(),
            Err(IrError::WireCountMismatch { .. })
        ));
    }

    #[test]
    fn test_generator_scales() {
        let p = Pow::new(gate(GateKind::RY, &[0], &[0.4]), 3);
        let g = p.generator().unwrap();
        assert!((g.coeff + 1.5).abs() < 1e-12);
        assert_eq!(g.observable.name(), "PauliY");
    }

    #[test]
    fn test_pow_of_pow_folds_integer() {
        let p = Pow::new(gate(GateKind::T, &[0], &[]), Exponent::Real(0.5));
        let ops = p.pow(Exponent::Int(4)).unwrap();
        match &ops[0] {
            Operator::Pow(q) => assert_eq!(q.exponent(), Exponent::Real(2.0)),
            other => panic!("Expected Pow, got {other:?}"),
        }
        assert!(matches!(
            p.pow(Exponent::Real(0.5)),
            Err(IrError::PowUndefined { .. })
        ));
    }
}
