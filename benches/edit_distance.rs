//! Cyclic edit distance benchmark
//!
//! The similarity-threshold comparison scores every source path against
//! every pattern path, so the distance kernel dominates `compare` on large
//! graphs. Paths are rarely longer than a few dozen statements.
//!
//! # Run Instructions
//!
//! ```bash
//! cargo bench --bench edit_distance
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use loggraph::matching::{cyclic_edit_distance, edit_distance};

/// Deterministic pseudo-random path over a small id alphabet
fn path(len: usize, seed: u32) -> Vec<u32> {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state % 32
        })
        .collect()
}

fn bench_edit_distance(c: &mut Criterion) {
    let mut group = c.benchmark_group("edit_distance");
    for len in [4usize, 16, 64] {
        let a = path(len, 1);
        let b = path(len, 2);
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |bench, _| {
            bench.iter(|| edit_distance(black_box(&a), black_box(&b)))
        });
    }
    group.finish();
}

fn bench_cyclic_edit_distance(c: &mut Criterion) {
    let mut group = c.benchmark_group("cyclic_edit_distance");
    for len in [4usize, 16, 64] {
        let long = path(len, 3);
        let short = path(len / 2, 4);
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |bench, _| {
            bench.iter(|| cyclic_edit_distance(black_box(&long), black_box(&short)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_edit_distance, bench_cyclic_edit_distance);
criterion_main!(benches);
