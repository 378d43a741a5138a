//! The commutation rule engine.

use std::sync::LazyLock;

use qsym_ir::{GateKind, Operator, linalg};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use crate::canonical::canonicalize;
use crate::config::CommutationConfig;
use crate::error::{CommuteError, CommuteResult};
use crate::table::CommutationTable;

/// The rule that settled a commutation query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// No shared wire, before or after canonicalization.
    DisjointWires,
    /// Both operands are the same operator.
    Identical,
    /// A barrier fences every operator on its wires.
    Barrier,
    /// One operand is the identity on its support.
    Identity,
    /// Per-wire axis signatures.
    Signature,
    /// An explicit kind-pair rule.
    PairRule,
    /// `AB == BA` on the combined support.
    MatrixFallback,
}

/// A commutation verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// Whether the operators commute.
    pub commutes: bool,
    /// The rule that decided it.
    pub rule: Rule,
}

impl Decision {
    fn new(commutes: bool, rule: Rule) -> Self {
        Self { commutes, rule }
    }
}

/// Decides whether two operators commute.
///
/// Cheap structural rules run first; the static [`CommutationTable`] covers
/// the common gate pairs; anything left is settled by comparing `AB` and
/// `BA` on the combined wires.
#[derive(Debug, Clone)]
pub struct CommutationChecker {
    config: CommutationConfig,
    table: &'static CommutationTable,
}

impl Default for CommutationChecker {
    fn default() -> Self {
        Self {
            config: CommutationConfig::default(),
            table: CommutationTable::standard(),
        }
    }
}

static DEFAULT_CHECKER: LazyLock<CommutationChecker> = LazyLock::new(CommutationChecker::default);

/// Whether `a` and `b` commute, with the default configuration.
///
/// # Errors
///
/// [`CommuteError::UnsupportedOperation`] or [`CommuteError::MultipleTargets`]
/// for operators outside the supported vocabulary, and
/// [`CommuteError::FallbackTooLarge`] when the matrix fallback would be
/// too wide.
pub fn commutes(a: &Operator, b: &Operator) -> CommuteResult<bool> {
    DEFAULT_CHECKER.commutes(a, b)
}

impl CommutationChecker {
    /// Checker with a validated configuration.
    pub fn new(config: CommutationConfig) -> CommuteResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            table: CommutationTable::standard(),
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &CommutationConfig {
        &self.config
    }

    /// The rule table.
    pub fn table(&self) -> &'static CommutationTable {
        self.table
    }

    /// Whether `a` and `b` commute.
    pub fn commutes(&self, a: &Operator, b: &Operator) -> CommuteResult<bool> {
        Ok(self.decide(a, b)?.commutes)
    }

    /// Decide commutation and report the rule that fired.
    pub fn decide(&self, a: &Operator, b: &Operator) -> CommuteResult<Decision> {
        ensure_supported(a)?;
        ensure_supported(b)?;

        let decision = self.decide_supported(a, b)?;
        debug!(
            a = %a.name(),
            b = %b.name(),
            commutes = decision.commutes,
            rule = ?decision.rule,
            "commutation decided"
        );
        Ok(decision)
    }

    fn decide_supported(&self, a: &Operator, b: &Operator) -> CommuteResult<Decision> {
        if a.wires().is_disjoint(b.wires()) {
            return Ok(Decision::new(true, Rule::DisjointWires));
        }
        if a == b {
            return Ok(Decision::new(true, Rule::Identical));
        }
        if is_kind(a, GateKind::Barrier) || is_kind(b, GateKind::Barrier) {
            return Ok(Decision::new(false, Rule::Barrier));
        }

        let ca = canonicalize(a, self.config.angle_atol)?;
        let cb = canonicalize(b, self.config.angle_atol)?;
        trace!(a = %ca.name(), b = %cb.name(), "canonical pair");

        if ca.wires().is_disjoint(cb.wires()) {
            return Ok(Decision::new(true, Rule::DisjointWires));
        }
        if is_kind(&ca, GateKind::Identity) || is_kind(&cb, GateKind::Identity) {
            return Ok(Decision::new(true, Rule::Identity));
        }
        if let Some(verdict) = self.table.lookup(&ca, &cb) {
            return Ok(Decision::new(verdict.commutes, verdict.rule));
        }

        let commutes = self.matrix_commutes(a, b)?;
        Ok(Decision::new(commutes, Rule::MatrixFallback))
    }

    /// Compare `AB` with `BA` on the union of both operators' wires.
    #[instrument(skip(self, a, b), fields(a = %a.name(), b = %b.name()))]
    pub fn matrix_commutes(&self, a: &Operator, b: &Operator) -> CommuteResult<bool> {
        let support = a.wires().union(b.wires());
        if support.len() > self.config.max_fallback_wires {
            return Err(CommuteError::FallbackTooLarge {
                wires: support.len(),
                max: self.config.max_fallback_wires,
            });
        }
        let ma = a.matrix_on(&support)?;
        let mb = b.matrix_on(&support)?;
        let result = linalg::allclose(&ma.dot(&mb), &mb.dot(&ma), self.config.atol);
        trace!(wires = support.len(), commutes = result, "matrix fallback");
        Ok(result)
    }
}

fn is_kind(op: &Operator, kind: GateKind) -> bool {
    op.gate_kind() == Some(kind)
}

/// Reject operators the engine has no rules for.
pub(crate) fn ensure_supported(op: &Operator) -> CommuteResult<()> {
    match op {
        Operator::Gate(g) => match g.kind() {
            GateKind::Identity
            | GateKind::PauliX
            | GateKind::PauliY
            | GateKind::PauliZ
            | GateKind::Hadamard
            | GateKind::S
            | GateKind::T
            | GateKind::SX
            | GateKind::RX
            | GateKind::RY
            | GateKind::RZ
            | GateKind::PhaseShift
            | GateKind::U1
            | GateKind::U2
            | GateKind::U3
            | GateKind::Rot
            | GateKind::CNOT
            | GateKind::CY
            | GateKind::CZ
            | GateKind::Swap
            | GateKind::ISwap
            | GateKind::SISwap
            | GateKind::ControlledPhaseShift
            | GateKind::CRX
            | GateKind::CRY
            | GateKind::CRZ
            | GateKind::CRot
            | GateKind::IsingXX
            | GateKind::IsingYY
            | GateKind::IsingZZ
            | GateKind::MultiRZ
            | GateKind::Toffoli
            | GateKind::CSwap
            | GateKind::MultiControlledX
            | GateKind::QFT
            | GateKind::QubitUnitary
            | GateKind::Barrier => Ok(()),
            GateKind::PauliRot
            | GateKind::Hermitian
            | GateKind::QubitDensityMatrix
            | GateKind::BasisState => Err(CommuteError::UnsupportedOperation(g.name())),
        },
        Operator::Controlled(c) => match c.body() {
            [body] if body.wires().len() == 1 => ensure_supported(body),
            _ => Err(CommuteError::MultipleTargets(c.name())),
        },
        Operator::Pow(p) => {
            ensure_supported(p.base())?;
            if p.base().has_matrix() {
                Ok(())
            } else {
                Err(CommuteError::UnsupportedOperation(p.name()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qsym_ir::{Controlled, Gate, Pow};

    fn op(kind: GateKind, wires: &[i64], params: &[f64]) -> Operator {
        Gate::new(kind, wires.iter().copied(), params.iter().copied())
            .unwrap()
            .into()
    }

    #[test]
    fn test_rule_order() {
        let checker = CommutationChecker::default();
        let x0 = op(GateKind::PauliX, &[0], &[]);

        let d = checker.decide(&x0, &op(GateKind::PauliZ, &[1], &[])).unwrap();
        assert_eq!(d, Decision::new(true, Rule::DisjointWires));

        let d = checker.decide(&x0, &x0.clone()).unwrap();
        assert_eq!(d.rule, Rule::Identical);

        let barrier = op(GateKind::Barrier, &[0], &[]);
        let u3 = op(GateKind::U3, &[0], &[0.0, 0.0, 0.0]);
        assert_eq!(checker.decide(&u3, &barrier).unwrap(), Decision::new(false, Rule::Barrier));

        let d = checker.decide(&u3, &x0).unwrap();
        assert_eq!(d, Decision::new(true, Rule::Identity));

        let d = checker.decide(&x0, &op(GateKind::QFT, &[1, 0], &[])).unwrap();
        assert_eq!(d, Decision::new(false, Rule::MatrixFallback));
    }

    #[test]
    fn test_canonical_disjoint() {
        // CRX(2π) is Z on the control only
        let crx = op(GateKind::CRX, &[0, 1], &[std::f64::consts::TAU]);
        let d = commutes(&crx, &op(GateKind::PauliX, &[1], &[])).unwrap();
        assert!(d);
    }

    #[test]
    fn test_unsupported_kinds() {
        let rot = Operator::from(Gate::pauli_rot(0.3, "XY", [0, 1]).unwrap());
        let x = op(GateKind::PauliX, &[0], &[]);
        assert!(matches!(
            commutes(&rot, &x),
            Err(CommuteError::UnsupportedOperation(_))
        ));

        let body = vec![op(GateKind::CNOT, &[1, 2], &[])];
        let c: Operator = Controlled::new(body, [0]).unwrap().into();
        let err = commutes(&x, &c).unwrap_err();
        assert!(matches!(err, CommuteError::MultipleTargets(_)));
        assert!(err.is_unsupported());

        let p: Operator = Pow::new(op(GateKind::Barrier, &[0], &[]), 2).into();
        assert!(matches!(
            commutes(&p, &x),
            Err(CommuteError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn test_fallback_limit() {
        let config = CommutationConfig {
            max_fallback_wires: 2,
            ..CommutationConfig::default()
        };
        let checker = CommutationChecker::new(config).unwrap();
        let qft = op(GateKind::QFT, &[0, 1, 2], &[]);
        let err = checker.decide(&qft, &op(GateKind::PauliX, &[0], &[])).unwrap_err();
        assert!(matches!(err, CommuteError::FallbackTooLarge { wires: 3, max: 2 }));

        let bad = CommutationConfig {
            atol: 0.0,
            ..CommutationConfig::default()
        };
        assert!(matches!(
            CommutationChecker::new(bad),
            Err(CommuteError::Config(_))
        ));
    }

    #[test]
    fn test_pow_goes_through_fallback() {
        let sqrt_x: Operator = Pow::new(op(GateKind::PauliX, &[0], &[]), 0.5).into();
        let d = CommutationChecker::default()
            .decide(&sqrt_x, &op(GateKind::RX, &[0], &[0.4]))
            .unwrap();
        assert_eq!(d, Decision::new(true, Rule::MatrixFallback));
    }
}
