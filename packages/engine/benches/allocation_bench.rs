// packages/engine/benches/allocation_bench.rs
use atc_sim_engine::runway::allocator::best_fit;
use atc_sim_engine::runway::{AllocationEngine, RunwayPool, ServiceTimes};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use std::sync::Arc;

fn capacities(n: usize) -> Vec<u32> {
    (0..n).map(|i| 1000 + (i as u32 * 1100) % 11000).collect()
}

fn bench_best_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("best_fit");

    for &n in &[2usize, 4, 6, 8, 10] {
        let pool = RunwayPool::new(1, &capacities(n)).unwrap();

        group.bench_with_input(BenchmarkId::new("scan", n), &pool, |b, pool| {
            b.iter(|| best_fit(pool.runways(), black_box(5500)));
        });
    }

    group.finish();
}

fn bench_claim_release(c: &mut Criterion) {
    let mut group = c.benchmark_group("claim_release");

    for &n in &[2usize, 10] {
        let pool = Arc::new(RunwayPool::new(1, &capacities(n)).unwrap());
        let engine = AllocationEngine::new(pool, ServiceTimes::instant());

        group.bench_with_input(BenchmarkId::new("regular", n), &engine, |b, engine| {
            b.iter(|| engine.claim(1, black_box(3000)).unwrap().release());
        });

        group.bench_with_input(BenchmarkId::new("backup", n), &engine, |b, engine| {
            b.iter(|| engine.claim(1, black_box(14000)).unwrap().release());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_best_fit, bench_claim_release);
criterion_main!(benches);
