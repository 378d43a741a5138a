//! Circuit tapes: an ordered list of operations plus terminal measurements.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::IrResult;
use crate::operator::Operator;
use crate::wire::Wires;

/// What a measurement returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReturnType {
    /// Expectation value of an observable.
    #[serde(rename = "expval")]
    Expectation,
    /// Variance of an observable.
    #[serde(rename = "var")]
    Variance,
    /// Samples of an observable or of the computational basis.
    #[serde(rename = "sample")]
    Sample,
    /// Computational basis probabilities.
    #[serde(rename = "probs")]
    Probability,
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReturnType::Expectation => "expval",
            ReturnType::Variance => "var",
            ReturnType::Sample => "sample",
            ReturnType::Probability => "probs",
        };
        f.write_str(s)
    }
}

/// A terminal measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Kind of result.
    pub return_type: ReturnType,
    /// Observable being measured, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observable: Option<Operator>,
    /// Wires measured.
    pub wires: Wires,
}

impl Measurement {
    fn of(return_type: ReturnType, observable: Operator) -> Self {
        let wires = observable.wires().clone();
        Self {
            return_type,
            observable: Some(observable),
            wires,
        }
    }

    /// `expval(obs)`.
    pub fn expval(observable: impl Into<Operator>) -> Self {
        Self::of(ReturnType::Expectation, observable.into())
    }

    /// `var(obs)`.
    pub fn var(observable: impl Into<Operator>) -> Self {
        Self::of(ReturnType::Variance, observable.into())
    }

    /// `sample(obs)`.
    pub fn sample(observable: impl Into<Operator>) -> Self {
        Self::of(ReturnType::Sample, observable.into())
    }

    /// Computational basis samples on `wires`.
    pub fn sample_wires(wires: Wires) -> Self {
        Self {
            return_type: ReturnType::Sample,
            observable: None,
            wires,
        }
    }

    /// `probs(wires)`.
    pub fn probs(wires: Wires) -> Self {
        Self {
            return_type: ReturnType::Probability,
            observable: None,
            wires,
        }
    }
}

/// An ordered list of operations followed by measurements.
///
/// Operators are only recorded when explicitly applied; constructing one
/// has no side effect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tape {
    operations: Vec<Operator>,
    measurements: Vec<Measurement>,
}

impl Tape {
    /// An empty tape.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tape by running a recording closure.
    pub fn record<F>(f: F) -> IrResult<Self>
    where
        F: FnOnce(&mut Tape) -> IrResult<()>,
    {
        let mut tape = Tape::new();
        f(&mut tape)?;
        Ok(tape)
    }

    /// Append an operation.
    pub fn apply(&mut self, op: impl Into<Operator>) -> &mut Self {
        self.operations.push(op.into());
        self
    }

    /// Append a measurement.
    pub fn measure(&mut self, m: Measurement) -> &mut Self {
        self.measurements.push(m);
        self
    }

    /// Recorded operations.
    pub fn operations(&self) -> &[Operator] {
        &self.operations
    }

    /// Recorded measurements.
    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty() && self.measurements.is_empty()
    }

    /// All wires in first-appearance order: operations, then measurements.
    pub fn wires(&self) -> Wires {
        let ops = self.operations.iter().map(Operator::wires);
        let meas = self.measurements.iter().map(|m| &m.wires);
        ops.chain(meas).fold(Wires::empty(), |acc, w| acc.union(w))
    }

    /// JSON snapshot.
    pub fn to_json(&self) -> IrResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::{Gate, GateKind};

    #[test]
    fn test_record_and_wires() {
        let tape = Tape::record(|t| {
            t.apply(Gate::new(GateKind::CNOT, [3, 0], [])?);
            t.apply(Gate::new(GateKind::PauliX, [4], [])?);
            t.measure(Measurement::expval(Gate::new(GateKind::PauliZ, [7], [])?));
            Ok(())
        })
        .unwrap();
        assert_eq!(tape.operations().len(), 2);
        assert_eq!(tape.measurements().len(), 1);
        assert_eq!(tape.wires(), Wires::new([3, 0, 4, 7]));
    }

    #[test]
    fn test_record_propagates_errors() {
        let result = Tape::record(|t| {
            t.apply(Gate::new(GateKind::CNOT, [0], [])?);
            Ok(())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_json_uses_short_return_types() {
        let mut tape = Tape::new();
        tape.apply(Gate::new(GateKind::Hadamard, [0], []).unwrap())
            .measure(Measurement::probs(Wires::new([0])));
        let json = tape.to_json().unwrap();
        assert!(json.contains("\"probs\""));
        assert!(json.contains("Hadamard"));
        let back: Tape = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tape);
    }
}
