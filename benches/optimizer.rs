//! Optimizer step benchmarks - per-algorithm update cost.
//!
//! Tests:
//! - Full step cost per algorithm at several parameter sizes
//! - Coefficient cache hit vs uncached recomputation
//! - Optimizer initialization cost

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::{rngs::StdRng, Rng, SeedableRng};
use ranger_optim::cache::{compute_coefficients, Fallback, RectifyPolicy};
use ranger_optim::{
    create_optimizer, CoefficientCache, Grad, Optimizer, OptimizerOptions, RangerConfig,
};

fn make_data(len: usize, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen_range(-1.0f32..1.0)).collect()
}

/// Full step cost per algorithm at several parameter sizes.
fn bench_step(c: &mut Criterion) {
    let sizes = [1_024_usize, 16_384, 262_144];
    let mut group = c.benchmark_group("optimizer_step");

    for name in ["sgd", "adam", "radam", "ranger"] {
        for &size in &sizes {
            let mut opt = create_optimizer(name, 1, OptimizerOptions::default()).unwrap();
            let mut params = vec![make_data(size, 42)];
            let grad = make_data(size, 123);

            group.throughput(Throughput::Elements(size as u64));
            group.bench_with_input(
                BenchmarkId::new(name, size),
                &size,
                |b, &_size| {
                    b.iter(|| {
                        let grads = vec![Some(Grad::Dense(black_box(&grad)))];
                        opt.step(black_box(&mut params), &grads).unwrap();
                    });
                },
            );
        }
    }

    group.finish();
}

/// Cache hit vs recomputing the step coefficients from scratch.
fn bench_coefficient_cache(c: &mut Criterion) {
    let policy = RectifyPolicy {
        threshold: 5.0,
        exclusive: true,
        fallback: Fallback::Momentum,
    };

    let mut group = c.benchmark_group("step_coefficients");

    group.bench_function("uncached", |b| {
        b.iter(|| {
            black_box(compute_coefficients(black_box(1_000), 0.95, 0.999, policy));
        });
    });

    group.bench_function("cached", |b| {
        let mut cache = CoefficientCache::new();
        cache.coefficients(1_000, 0.95, 0.999, policy);
        b.iter(|| {
            black_box(cache.coefficients(black_box(1_000), 0.95, 0.999, policy));
        });
    });

    group.finish();
}

/// Construction cost; state allocation is lazy so this should be flat.
fn bench_init(c: &mut Criterion) {
    let mut group = c.benchmark_group("optimizer_init");

    group.bench_function("ranger_new", |b| {
        b.iter(|| {
            black_box(Optimizer::ranger(64, RangerConfig::default()).unwrap());
        });
    });

    group.bench_function("factory_radam", |b| {
        b.iter(|| {
            black_box(create_optimizer("radam", 64, OptimizerOptions::default()).unwrap());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_step, bench_coefficient_cache, bench_init);
criterion_main!(benches);
