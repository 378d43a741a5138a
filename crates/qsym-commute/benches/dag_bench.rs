//! Benchmarks for commutation checks and DAG construction
//!
//! Run with: cargo bench -p qsym-commute

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use qsym_commute::{CommutationChecker, CommutationDag};
use qsym_ir::{Gate, GateKind, Operator};

fn op(kind: GateKind, wires: &[i64], params: &[f64]) -> Operator {
    Gate::new(kind, wires.iter().copied(), params.iter().copied())
        .unwrap()
        .into()
}

/// Layers of H, CNOT ladder and RZ over `num_wires` wires.
fn layered_circuit(num_wires: i64, layers: usize) -> Vec<Operator> {
    let mut ops = Vec::new();
    for layer in 0..layers {
        for w in 0..num_wires {
            ops.push(op(GateKind::Hadamard, &[w], &[]));
        }
        for w in 0..num_wires - 1 {
            ops.push(op(GateKind::CNOT, &[w, w + 1], &[]));
        }
        for w in 0..num_wires {
            ops.push(op(GateKind::RZ, &[w], &[0.1 * (layer as f64 + 1.0)]));
        }
    }
    ops
}

/// Table lookups against the matrix fallback.
fn bench_checker(c: &mut Criterion) {
    let mut group = c.benchmark_group("commutes");
    let checker = CommutationChecker::default();

    let cnot = op(GateKind::CNOT, &[0, 1], &[]);
    let x = op(GateKind::PauliX, &[1], &[]);
    group.bench_function("signature", |b| {
        b.iter(|| checker.commutes(black_box(&cnot), black_box(&x)).unwrap());
    });

    let rot = op(GateKind::Rot, &[0], &[0.1, 0.2, 0.3]);
    let z = op(GateKind::PauliZ, &[0], &[]);
    group.bench_function("fallback_single", |b| {
        b.iter(|| checker.commutes(black_box(&rot), black_box(&z)).unwrap());
    });

    let toffoli = op(GateKind::Toffoli, &[0, 1, 2], &[]);
    let cswap = op(GateKind::CSwap, &[4, 3, 2], &[]);
    group.bench_function("fallback_five_wires", |b| {
        b.iter(|| checker.commutes(black_box(&toffoli), black_box(&cswap)).unwrap());
    });

    group.finish();
}

fn bench_dag_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("dag_build");

    for num_wires in &[4i64, 8, 16] {
        let ops = layered_circuit(*num_wires, 4);
        group.bench_with_input(BenchmarkId::new("layered", num_wires), &ops, |b, ops| {
            b.iter(|| CommutationDag::build(black_box(ops), &[]).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_checker, bench_dag_build);
criterion_main!(benches);
