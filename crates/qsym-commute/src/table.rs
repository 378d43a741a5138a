//! Static commutation facts keyed by gate kind.
//!
//! Two kinds of data live here:
//!
//! - a **wire signature** per gate kind: for every wire, the Bloch axis in
//!   whose eigenbasis the gate is block-diagonal on that wire, or opaque;
//! - **pair rules**: explicit verdicts for pairs of kinds under a placement
//!   condition.
//!
//! Signatures give two rules. If every shared wire carries the same axis in
//! both operators, they commute. If exactly one wire is shared and the axes
//! there differ, they do not: canonical operators act nontrivially on every
//! wire, and two nontrivial blocks in different bases never commute.

use std::sync::LazyLock;

use qsym_ir::{GateKind, Operator};
use rustc_hash::FxHashMap;

use crate::checker::Rule;

/// Bloch axis of a block-diagonal action on one wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Pauli-X eigenbasis.
    X,
    /// Pauli-Y eigenbasis.
    Y,
    /// Computational basis.
    Z,
    /// Hadamard eigenbasis.
    H,
}

/// Per-wire axes of a gate kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireAxes {
    /// The same axis on every wire.
    All(Axis),
    /// One entry per wire; `None` is opaque.
    PerWire(Vec<Option<Axis>>),
    /// `Z` on every leading (control) wire, the given axis on the last wire.
    ControlsThen(Axis),
    /// No block structure.
    Opaque,
}

impl WireAxes {
    fn expand(&self, num_wires: usize) -> Vec<Option<Axis>> {
        match self {
            WireAxes::All(axis) => vec![Some(*axis); num_wires],
            WireAxes::PerWire(axes) if axes.len() == num_wires => axes.clone(),
            WireAxes::ControlsThen(axis) => {
                let mut out = vec![Some(Axis::Z); num_wires.saturating_sub(1)];
                out.push(Some(*axis));
                out
            }
            WireAxes::PerWire(_) | WireAxes::Opaque => vec![None; num_wires],
        }
    }
}

/// Where two operators must sit relative to each other for a pair rule to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Any overlap.
    Any,
    /// Both act on exactly the same set of wires.
    SameWireSet,
}

/// A verdict for a pair of gate kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairRule {
    /// When the rule applies.
    pub placement: Placement,
    /// Whether the pair commutes.
    pub commutes: bool,
}

/// A table verdict with the rule that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableVerdict {
    /// Whether the pair commutes.
    pub commutes: bool,
    /// [`Rule::PairRule`] or [`Rule::Signature`].
    pub rule: Rule,
}

/// Signatures and pair rules.
#[derive(Debug, Clone, Default)]
pub struct CommutationTable {
    signatures: FxHashMap<GateKind, WireAxes>,
    pairs: FxHashMap<(GateKind, GateKind), PairRule>,
}

/// Assembles a [`CommutationTable`].
#[derive(Debug, Default)]
pub struct CommutationTableBuilder {
    table: CommutationTable,
}

impl CommutationTableBuilder {
    /// Empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the signature of each kind in `kinds`.
    #[must_use]
    pub fn signature(mut self, kinds: &[GateKind], axes: WireAxes) -> Self {
        for kind in kinds {
            self.table.signatures.insert(*kind, axes.clone());
        }
        self
    }

    /// Add a rule for every pair from `left × right`, in both orders.
    #[must_use]
    pub fn pair(mut self, left: &[GateKind], right: &[GateKind], placement: Placement, commutes: bool) -> Self {
        let rule = PairRule { placement, commutes };
        for a in left {
            for b in right {
                self.table.pairs.insert((*a, *b), rule);
                self.table.pairs.insert((*b, *a), rule);
            }
        }
        self
    }

    /// Finish.
    pub fn build(self) -> CommutationTable {
        self.table
    }
}

const SINGLE_QUBIT_NON_IDENTITY: &[GateKind] = &[
    GateKind::PauliX,
    GateKind::PauliY,
    GateKind::PauliZ,
    GateKind::Hadamard,
    GateKind::S,
    GateKind::T,
    GateKind::SX,
    GateKind::RX,
    GateKind::RY,
    GateKind::RZ,
    GateKind::PhaseShift,
    GateKind::U1,
    GateKind::U2,
    GateKind::U3,
    GateKind::Rot,
];

const SWAP_FAMILY: &[GateKind] = &[GateKind::Swap, GateKind::ISwap, GateKind::SISwap];

const ISING: &[GateKind] = &[GateKind::IsingXX, GateKind::IsingYY, GateKind::IsingZZ];

const SYMMETRIC_DIAGONAL: &[GateKind] = &[
    GateKind::CZ,
    GateKind::ControlledPhaseShift,
    GateKind::IsingZZ,
    GateKind::MultiRZ,
];

static STANDARD: LazyLock<CommutationTable> = LazyLock::new(CommutationTable::build_standard);

impl CommutationTable {
    /// The built-in table, built once.
    pub fn standard() -> &'static CommutationTable {
        &STANDARD
    }

    fn build_standard() -> CommutationTable {
        use GateKind as K;
        CommutationTableBuilder::new()
            .signature(&[K::PauliX, K::SX, K::RX], WireAxes::All(Axis::X))
            .signature(&[K::PauliY, K::RY], WireAxes::All(Axis::Y))
            .signature(
                &[K::PauliZ, K::S, K::T, K::RZ, K::PhaseShift, K::U1],
                WireAxes::All(Axis::Z),
            )
            .signature(&[K::Hadamard], WireAxes::All(Axis::H))
            .signature(&[K::CNOT, K::CRX, K::Toffoli, K::MultiControlledX], WireAxes::ControlsThen(Axis::X))
            .signature(&[K::CY, K::CRY], WireAxes::ControlsThen(Axis::Y))
            .signature(
                &[K::CZ, K::ControlledPhaseShift, K::CRZ, K::IsingZZ, K::MultiRZ],
                WireAxes::All(Axis::Z),
            )
            .signature(&[K::IsingXX], WireAxes::All(Axis::X))
            .signature(&[K::IsingYY], WireAxes::All(Axis::Y))
            .signature(&[K::CRot], WireAxes::PerWire(vec![Some(Axis::Z), None]))
            .signature(&[K::CSwap], WireAxes::PerWire(vec![Some(Axis::Z), None, None]))
            .pair(&[K::Swap, K::ISwap], SINGLE_QUBIT_NON_IDENTITY, Placement::Any, false)
            .pair(SWAP_FAMILY, SWAP_FAMILY, Placement::SameWireSet, true)
            .pair(ISING, ISING, Placement::SameWireSet, true)
            .pair(ISING, SWAP_FAMILY, Placement::SameWireSet, true)
            .pair(SYMMETRIC_DIAGONAL, SWAP_FAMILY, Placement::SameWireSet, true)
            .build()
    }

    /// Number of kinds with a signature.
    pub fn num_signatures(&self) -> usize {
        self.signatures.len()
    }

    /// Number of ordered kind pairs with a rule.
    pub fn num_pair_rules(&self) -> usize {
        self.pairs.len()
    }

    /// Per-wire axes of `op`, aligned with `op.wires()`.
    pub fn signature(&self, op: &Operator) -> Vec<Option<Axis>> {
        let n = op.wires().len();
        match op {
            Operator::Gate(g) => self
                .signatures
                .get(&g.kind())
                .map_or_else(|| vec![None; n], |axes| axes.expand(n)),
            Operator::Controlled(c) => {
                let body_axis = match c.body() {
                    [body] if body.wires().len() == 1 => {
                        self.signature(body).first().copied().flatten()
                    }
                    _ => None,
                };
                match body_axis {
                    Some(axis) => WireAxes::ControlsThen(axis).expand(n),
                    None => vec![None; n],
                }
            }
            Operator::Pow(_) => vec![None; n],
        }
    }

    /// The pair rule for two gate kinds, if any.
    pub fn pair_rule(&self, a: GateKind, b: GateKind) -> Option<PairRule> {
        self.pairs.get(&(a, b)).copied()
    }

    /// Look up a verdict for two canonical operators sharing at least one wire.
    pub fn lookup(&self, a: &Operator, b: &Operator) -> Option<TableVerdict> {
        if let (Some(ka), Some(kb)) = (a.gate_kind(), b.gate_kind()) {
            if let Some(rule) = self.pair_rule(ka, kb) {
                let applies = match rule.placement {
                    Placement::Any => true,
                    Placement::SameWireSet => a.wires().same_set(b.wires()),
                };
                if applies {
                    return Some(TableVerdict {
                        commutes: rule.commutes,
                        rule: Rule::PairRule,
                    });
                }
            }
        }

        let sig_a = self.signature(a);
        let sig_b = self.signature(b);
        let shared = a.wires().shared(b.wires());
        let axes: Vec<(Option<Axis>, Option<Axis>)> = shared
            .iter()
            .filter_map(|w| {
                let ia = a.wires().index_of(w)?;
                let ib = b.wires().index_of(w)?;
                Some((sig_a[ia], sig_b[ib]))
            })
            .collect();
        if axes.is_empty() {
            return None;
        }

        if axes.iter().all(|(x, y)| x.is_some() && x == y) {
            return Some(TableVerdict {
                commutes: true,
                rule: Rule::Signature,
            });
        }
        if let [(Some(x), Some(y))] = axes.as_slice() {
            if x != y {
                return Some(TableVerdict {
                    commutes: false,
                    rule: Rule::Signature,
                });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qsym_ir::{Controlled, Gate};

    fn op(kind: GateKind, wires: &[i64], params: &[f64]) -> Operator {
        Gate::new(kind, wires.iter().copied(), params.iter().copied())
            .unwrap()
            .into()
    }

    #[test]
    fn test_pair_rules_are_symmetric() {
        let table = CommutationTable::standard();
        for ((a, b), rule) in &table.pairs {
            assert_eq!(table.pair_rule(*b, *a), Some(*rule), "{a:?} / {b:?}");
        }
        assert!(table.num_pair_rules() > 0);
    }

    #[test]
    fn test_signatures() {
        let table = CommutationTable::standard();
        assert_eq!(
            table.signature(&op(GateKind::Toffoli, &[0, 1, 2], &[])),
            vec![Some(Axis::Z), Some(Axis::Z), Some(Axis::X)]
        );
        assert_eq!(
            table.signature(&op(GateKind::MultiControlledX, &[0, 1, 2, 3], &[])),
            vec![Some(Axis::Z), Some(Axis::Z), Some(Axis::Z), Some(Axis::X)]
        );
        assert_eq!(
            table.signature(&op(GateKind::QFT, &[0, 1], &[])),
            vec![None, None]
        );

        let body = op(GateKind::PauliY, &[5], &[]);
        let c: Operator = Controlled::new(vec![body], [1, 2]).unwrap().into();
        assert_eq!(
            table.signature(&c),
            vec![Some(Axis::Z), Some(Axis::Z), Some(Axis::Y)]
        );
    }

    #[test]
    fn test_lookup_rules() {
        let table = CommutationTable::standard();
        let cnot = op(GateKind::CNOT, &[0, 1], &[]);

        let hit = table.lookup(&cnot, &op(GateKind::PauliX, &[1], &[])).unwrap();
        assert!(hit.commutes);
        assert_eq!(hit.rule, Rule::Signature);

        let hit = table.lookup(&cnot, &op(GateKind::PauliX, &[0], &[])).unwrap();
        assert!(!hit.commutes);

        // two shared wires with mismatched axes: undecided
        assert!(table.lookup(&cnot, &op(GateKind::CNOT, &[1, 0], &[])).is_none());

        let swap = op(GateKind::Swap, &[0, 1], &[]);
        let hit = table.lookup(&swap, &op(GateKind::RZ, &[1], &[0.3])).unwrap();
        assert_eq!(hit.rule, Rule::PairRule);
        assert!(!hit.commutes);

        let hit = table.lookup(&swap, &op(GateKind::IsingXX, &[1, 0], &[0.3])).unwrap();
        assert!(hit.commutes);

        // SameWireSet rule does not fire on a partial overlap
        let zz = op(GateKind::IsingZZ, &[1, 2], &[0.3]);
        assert!(table.lookup(&swap, &zz).is_none());
    }
}
