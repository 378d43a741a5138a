//! Benchmarks for symbolic power matrices
//!
//! Run with: cargo bench -p qsym-ir

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use qsym_ir::{Gate, GateKind, Operator, Pow};

fn qft(n: usize) -> Operator {
    Gate::new(GateKind::QFT, 0..n, []).unwrap().into()
}

/// Integer powers go through repeated squaring.
fn bench_integer_power(c: &mut Criterion) {
    let mut group = c.benchmark_group("pow_integer");

    for num_wires in &[1usize, 2, 3, 4] {
        let base = qft(*num_wires);
        group.bench_with_input(BenchmarkId::new("qft", num_wires), &base, |b, base| {
            b.iter(|| Pow::new(black_box(base.clone()), 7).matrix().unwrap());
        });
    }

    group.finish();
}

/// Fractional powers need an eigendecomposition.
fn bench_fractional_power(c: &mut Criterion) {
    let mut group = c.benchmark_group("pow_fractional");

    for num_wires in &[1usize, 2, 3] {
        let base = qft(*num_wires);
        group.bench_with_input(BenchmarkId::new("qft", num_wires), &base, |b, base| {
            b.iter(|| Pow::new(black_box(base.clone()), 0.37).matrix().ok());
        });
    }

    let iswap: Operator = Gate::new(GateKind::ISwap, [0, 1], []).unwrap().into();
    group.bench_function("iswap_sqrt", |b| {
        b.iter(|| Pow::new(black_box(iswap.clone()), 0.5).matrix().unwrap());
    });

    group.finish();
}

fn bench_sparse_power(c: &mut Criterion) {
    let mut group = c.benchmark_group("pow_sparse");

    let toffoli: Operator = Gate::new(GateKind::Toffoli, [0, 1, 2], []).unwrap().into();
    for z in &[2i64, 5, -5] {
        group.bench_with_input(BenchmarkId::new("toffoli", z), z, |b, &z| {
            b.iter(|| Pow::new(black_box(toffoli.clone()), z).sparse_matrix().unwrap());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_integer_power,
    bench_fractional_power,
    bench_sparse_power
);
criterion_main!(benches);
