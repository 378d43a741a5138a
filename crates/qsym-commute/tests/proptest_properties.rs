//! Property-based tests for the rule engine and the commutation DAG.
//!
//! Operators are drawn from the supported vocabulary on a handful of wires.
//! Random angles stay away from the special values so that every shortcut
//! taken by the engine can be compared against the matrix fallback.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use proptest::prelude::*;
use proptest::sample::select;
use qsym_commute::{CommutationChecker, CommutationDag, commutes};
use qsym_ir::{Controlled, Gate, GateKind, Operator, Pow};

const WIRES: i64 = 4;

fn gate(kind: GateKind, wires: &[i64], params: &[f64]) -> Operator {
    Gate::new(kind, wires.iter().copied(), params.iter().copied())
        .unwrap()
        .into()
}

fn shift(op: &Operator, offset: i64) -> Operator {
    let g = op.as_gate().unwrap();
    let wires: Vec<i64> = g
        .wires()
        .iter()
        .map(|w| match w {
            qsym_ir::Wire::Int(i) => i + offset,
            qsym_ir::Wire::Label(_) => unreachable!(),
        })
        .collect();
    gate(g.kind(), &wires, g.params())
}

fn wires(n: usize) -> impl Strategy<Value = Vec<i64>> {
    Just((0..WIRES).collect::<Vec<i64>>())
        .prop_shuffle()
        .prop_map(move |v| v[..n].to_vec())
}

/// A generic angle, or one of the values canonicalization folds.
fn angle() -> impl Strategy<Value = f64> {
    prop_oneof![
        4 => 0.1..3.0_f64,
        4 => -3.0..-0.1_f64,
        1 => Just(0.0),
        1 => Just(TAU),
    ]
}

fn generic_angle() -> impl Strategy<Value = f64> {
    prop_oneof![0.1..3.0_f64, -3.0..-0.1_f64]
}

/// `Rot` parameters, including the patterns that reduce to a single gate.
fn rot_params() -> impl Strategy<Value = [f64; 3]> {
    prop_oneof![
        (generic_angle(), generic_angle(), generic_angle()).prop_map(|(a, b, c)| [a, b, c]),
        generic_angle().prop_map(|t| [FRAC_PI_2, t, -FRAC_PI_2]),
        generic_angle().prop_map(|t| [0.0, t, 0.0]),
        (generic_angle(), generic_angle()).prop_map(|(a, c)| [a, 0.0, c]),
        Just([PI, FRAC_PI_2, 0.0]),
    ]
}

fn arb_op() -> BoxedStrategy<Operator> {
    use GateKind as K;
    prop_oneof![
        (wires(1), select(vec![K::PauliX, K::PauliY, K::PauliZ, K::Hadamard, K::S, K::T, K::SX]))
            .prop_map(|(w, k)| gate(k, &w, &[])),
        (wires(1), select(vec![K::RX, K::RY, K::RZ, K::PhaseShift]), angle())
            .prop_map(|(w, k, t)| gate(k, &w, &[t])),
        (wires(1), rot_params()).prop_map(|(w, p)| gate(K::Rot, &w, &p)),
        (wires(1), generic_angle(), generic_angle(), generic_angle())
            .prop_map(|(w, a, b, c)| gate(K::U3, &w, &[a, b, c])),
        (wires(2), select(vec![K::CNOT, K::CY, K::CZ, K::Swap, K::ISwap, K::SISwap]))
            .prop_map(|(w, k)| gate(k, &w, &[])),
        (
            wires(2),
            select(vec![
                K::CRX,
                K::CRY,
                K::CRZ,
                K::ControlledPhaseShift,
                K::IsingXX,
                K::IsingYY,
                K::IsingZZ,
            ]),
            angle()
        )
            .prop_map(|(w, k, t)| gate(k, &w, &[t])),
        (wires(2), rot_params()).prop_map(|(w, p)| gate(K::CRot, &w, &p)),
        (wires(3), select(vec![K::Toffoli, K::CSwap])).prop_map(|(w, k)| gate(k, &w, &[])),
        (wires(2), select(vec![K::RX, K::RY, K::RZ, K::PauliZ]), angle()).prop_map(|(w, k, t)| {
            let body = if k == K::PauliZ {
                gate(k, &w[1..], &[])
            } else {
                gate(k, &w[1..], &[t])
            };
            Operator::from(Controlled::new(vec![body], [w[0]]).unwrap())
        }),
        (wires(1), select(vec![0.5, 2.0, -0.25]))
            .prop_map(|(w, z)| Operator::from(Pow::new(gate(K::PauliX, &w, &[]), z))),
    ]
    .boxed()
}

fn arb_gate_op() -> BoxedStrategy<Operator> {
    arb_op()
        .prop_filter("plain gates only", |op| op.as_gate().is_some())
        .boxed()
}

proptest! {
    #[test]
    fn prop_commutation_is_symmetric(a in arb_op(), b in arb_op()) {
        prop_assert_eq!(commutes(&a, &b).unwrap(), commutes(&b, &a).unwrap());
    }

    #[test]
    fn prop_disjoint_wires_commute(a in arb_gate_op(), b in arb_gate_op()) {
        let far = shift(&b, WIRES);
        prop_assert!(commutes(&a, &far).unwrap());
    }

    #[test]
    fn prop_operator_commutes_with_itself(a in arb_op()) {
        prop_assert!(commutes(&a, &a.clone()).unwrap());
    }

    #[test]
    fn prop_rules_agree_with_matrix_fallback(a in arb_op(), b in arb_op()) {
        let checker = CommutationChecker::default();
        let decision = checker.decide(&a, &b).unwrap();
        let ground_truth = checker.matrix_commutes(&a, &b).unwrap();
        prop_assert_eq!(
            decision.commutes,
            ground_truth,
            "{} on {} / {} on {} via {:?}",
            a.name(),
            a.wires(),
            b.name(),
            b.wires(),
            decision.rule
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_dag_orders_every_non_commuting_pair(ops in prop::collection::vec(arb_op(), 0..10)) {
        let dag = CommutationDag::build(&ops, &[]).unwrap();
        prop_assert_eq!(dag.num_nodes(), ops.len());
        prop_assert!(dag.verify_integrity().is_ok());

        for i in 0..ops.len() {
            let successors = dag.successors(i).unwrap();
            prop_assert!(!successors.contains(&i));
            prop_assert!(!dag.predecessors(i).unwrap().contains(&i));
            for j in (i + 1)..ops.len() {
                if !commutes(&ops[i], &ops[j]).unwrap() {
                    prop_assert!(successors.contains(&j), "{} must precede {}", i, j);
                }
            }
        }
    }

    #[test]
    fn prop_closures_mirror_each_other(ops in prop::collection::vec(arb_op(), 0..10)) {
        let dag = CommutationDag::build(&ops, &[]).unwrap();
        for i in 0..dag.num_nodes() {
            for j in 0..dag.num_nodes() {
                let forward = dag.successors(i).unwrap().contains(&j);
                let backward = dag.predecessors(j).unwrap().contains(&i);
                prop_assert_eq!(forward, backward);
            }
        }
        for (s, t, edge) in dag.edges() {
            prop_assert!(s < t);
            prop_assert!(!edge.commute);
            prop_assert!(!commutes(&ops[s], &ops[t]).unwrap());
        }
    }
}
