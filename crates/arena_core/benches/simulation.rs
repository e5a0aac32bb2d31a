//! Simulation benchmarks for arena_core.
//!
//! Run with: `cargo bench -p arena_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use arena_test_utils::fixtures::{clash, skirmish};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Full four-player skirmish ticks and dense two-squad clashes.
pub fn simulation_benchmark(c: &mut Criterion) {
    c.bench_function("skirmish_600_ticks", |b| {
        b.iter(|| {
            let mut sim = skirmish(1);
            for _ in 0..600 {
                black_box(sim.tick());
            }
            black_box(sim.state_hash())
        })
    });

    let mut group = c.benchmark_group("clash_tick");
    for per_side in [10u32, 40, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(per_side), &per_side, |b, &n| {
            let base = clash(n, 7);
            b.iter(|| {
                let mut sim = base.clone();
                for _ in 0..60 {
                    black_box(sim.tick());
                }
            })
        });
    }
    group.finish();
}

criterion_group!(benches, simulation_benchmark);
criterion_main!(benches);
