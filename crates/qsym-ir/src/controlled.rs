//! Generic controlled operations.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::gate::Basis;
use crate::linalg::{self, Matrix};
use crate::operator::{Capabilities, Operator};
use crate::wire::{Wire, Wires};

/// A body of operations applied when every control wire is `|1⟩`.
///
/// Wires are the control wires followed by the body's wires in first
/// appearance order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Controlled {
    control_wires: Wires,
    body: Vec<Operator>,
    wires: Wires,
    #[serde(default)]
    inverse: bool,
}

impl Controlled {
    /// Attach `control_wires` to `body`.
    pub fn new<W: Into<Wire>>(
        body: Vec<Operator>,
        control_wires: impl IntoIterator<Item = W>,
    ) -> IrResult<Self> {
        let control_wires = Wires::new(control_wires);
        if control_wires.is_empty() {
            return Err(IrError::InvalidInput(
                "controlled operation needs at least one control wire".into(),
            ));
        }
        if body.is_empty() {
            return Err(IrError::InvalidInput(
                "controlled operation needs a non-empty body".into(),
            ));
        }
        let targets = body
            .iter()
            .fold(Wires::empty(), |acc, op| acc.union(op.wires()));
        let wires = control_wires.union(&targets);
        if wires.len() != control_wires.len() + targets.len() {
            control_wires.ensure_unique("Controlled")?;
            let clash = control_wires.shared(&targets);
            return Err(IrError::DuplicateWire {
                wire: clash.get(0).cloned().unwrap_or(Wire::Int(0)),
                name: Some("Controlled".into()),
            });
        }
        Ok(Self {
            control_wires,
            body,
            wires,
            inverse: false,
        })
    }

    /// Name built from the body, e.g. `C(RX)`.
    pub fn name(&self) -> String {
        let inner: Vec<String> = self.body.iter().map(Operator::name).collect();
        let base = format!("C({})", inner.join(", "));
        if self.inverse {
            format!("{base}.inv")
        } else {
            base
        }
    }

    /// All wires.
    pub fn wires(&self) -> &Wires {
        &self.wires
    }

    /// Control wires.
    pub fn control_wires(&self) -> &Wires {
        &self.control_wires
    }

    /// Wires acted on by the body.
    pub fn target_wires(&self) -> Wires {
        self.wires.slice(self.control_wires.len()..self.wires.len())
    }

    /// The controlled body.
    pub fn body(&self) -> &[Operator] {
        &self.body
    }

    pub(crate) fn parameters(&self) -> Vec<f64> {
        self.body.iter().flat_map(Operator::parameters).collect()
    }

    pub(crate) fn set_parameters(&mut self, params: &[f64]) -> IrResult<()> {
        let total: usize = self.body.iter().map(|op| op.parameters().len()).sum();
        if total != params.len() {
            return Err(IrError::ParameterCountMismatch {
                name: self.name(),
                expected: total,
                got: params.len(),
            });
        }
        let mut rest = params;
        for op in &mut self.body {
            let n = op.parameters().len();
            let (head, tail) = rest.split_at(n);
            op.set_parameters(head)?;
            rest = tail;
        }
        Ok(())
    }

    pub(crate) fn capabilities(&self) -> Capabilities {
        Capabilities {
            has_matrix: self.body.iter().all(Operator::has_matrix),
            is_observable: false,
            is_operation: true,
        }
    }

    /// Whether the inverse flag is set.
    pub fn is_inverse(&self) -> bool {
        self.inverse
    }

    /// Set the inverse flag.
    pub fn set_inverse(&mut self, inverse: bool) {
        self.inverse = inverse;
    }

    /// Product of the body matrices on the target wires, later operations
    /// applied on the left.
    pub fn body_matrix(&self) -> IrResult<Matrix> {
        let targets = self.target_wires();
        let mut acc = linalg::identity(1 << targets.len());
        for op in &self.body {
            acc = op.matrix_on(&targets)?.dot(&acc);
        }
        Ok(acc)
    }

    pub(crate) fn matrix(&self) -> IrResult<Matrix> {
        let m = linalg::controlled(&self.body_matrix()?, self.control_wires.len());
        Ok(if self.inverse { linalg::dagger(&m) } else { m })
    }

    pub(crate) fn eigvals(&self) -> IrResult<Vec<Complex64>> {
        linalg::eigenvalues(&self.matrix()?).ok_or_else(|| IrError::EigvalsUndefined(self.name()))
    }

    pub(crate) fn basis(&self) -> Option<Basis> {
        match self.body.as_slice() {
            [single] => single.basis(),
            _ => None,
        }
    }

    pub(crate) fn label(&self, decimals: Option<usize>) -> String {
        let inner: Vec<String> = self.body.iter().map(|op| op.label(decimals)).collect();
        let mut out = inner.join("·");
        if self.inverse {
            out.push_str("⁻¹");
        }
        out
    }
}

impl From<Controlled> for Operator {
    fn from(c: Controlled) -> Self {
        Operator::Controlled(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::{Gate, GateKind};
    use crate::linalg::allclose;

    fn rx(w: i64, theta: f64) -> Operator {
        Gate::new(GateKind::RX, [w], [theta]).unwrap().into()
    }

    #[test]
    fn test_controlled_matches_native_gate() {
        let c = Controlled::new(vec![rx(1, 0.3)], [0]).unwrap();
        let crx = Gate::new(GateKind::CRX, [0, 1], [0.3]).unwrap();
        assert!(allclose(&c.matrix().unwrap(), &crx.matrix().unwrap(), 1e-12));
        assert_eq!(c.name(), "C(RX)");
        assert_eq!(c.wires(), &Wires::new([0, 1]));
        assert_eq!(c.basis(), Some(Basis::X));
    }

    #[test]
    fn test_overlapping_controls_rejected() {
        assert!(matches!(
            Controlled::new(vec![rx(0, 0.1)], [0]),
            Err(IrError::DuplicateWire { .. })
        ));
        assert!(matches!(
            Controlled::new(vec![], [0]),
            Err(IrError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_parameters_spread_over_body() {
        let mut c = Controlled::new(vec![rx(1, 0.1), rx(2, 0.2)], [0]).unwrap();
        assert_eq!(c.parameters(), vec![0.1, 0.2]);
        c.set_parameters(&[0.5, 0.6]).unwrap();
        assert_eq!(c.parameters(), vec![0.5, 0.6]);
        assert_eq!(c.target_wires(), Wires::new([1, 2]));
    }
}
