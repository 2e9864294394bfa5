//! Criterion benchmarks for the zoner.
//!
//! Benchmarks:
//!   - k-means zoning of one, seven and fourteen simulated days into 8 zones
//!   - precomputed-zone centre computation (clustering skipped)
//!
//! Run with: cargo bench -p demand --bench zoning_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use demand::config::KMeansParams;
use demand::simulate::{simulate, SimulationParams};
use demand::zoning::{assign_zones_with, precomputed_centers};

const SEED: u64 = 42;

fn simulated(days: u32) -> Vec<demand::RawEvent> {
    let params = SimulationParams {
        n_days: days,
        ..Default::default()
    };
    simulate(&params, SEED).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Benchmark: k-means zoning at increasing event counts
// ---------------------------------------------------------------------------

fn bench_kmeans_zoning(c: &mut Criterion) {
    let mut group = c.benchmark_group("zoning_kmeans");
    group.sample_size(10);

    let params = KMeansParams::default();
    for days in [1u32, 7, 14] {
        let events = simulated(days);
        group.bench_with_input(BenchmarkId::new("days", days), &events, |b, events| {
            b.iter(|| {
                black_box(assign_zones_with(
                    black_box(events.clone()),
                    8,
                    SEED,
                    &params,
                ))
            });
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: skip path
// ---------------------------------------------------------------------------

fn bench_precomputed_centers(c: &mut Criterion) {
    let mut group = c.benchmark_group("zoning_precomputed");

    let labelled = assign_zones_with(simulated(7), 8, SEED, &KMeansParams::default())
        .map(|o| o.events)
        .unwrap_or_default();

    group.bench_function("centres_7_days", |b| {
        b.iter(|| black_box(precomputed_centers(black_box(&labelled))));
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Register groups
// ---------------------------------------------------------------------------

criterion_group!(benches, bench_kmeans_zoning, bench_precomputed_centers);
criterion_main!(benches);
