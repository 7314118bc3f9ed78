//! Benchmarks for scrypt derivations
//!
//! Covers the cost parameters the tuner picks from and the overhead of the
//! async runner over a direct call.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use kdfbridge_scrypt::{DerivationRequest, Kdf, ScryptKdf};
use tokio::runtime::Runtime;

/// Derivation time as `N` doubles at `r = 8, p = 1`
fn benchmark_cost_scaling(c: &mut Criterion) {
    let kdf = ScryptKdf::new();
    let mut group = c.benchmark_group("scrypt_cost");
    group.sample_size(10);

    for log_n in [10u32, 12, 14, 16] {
        let n = 1u64 << log_n;
        // Working set of one derivation
        group.throughput(Throughput::Bytes(128 * 8 * (n + 3)));

        group.bench_with_input(BenchmarkId::new("N", n), &n, |b, &n| {
            b.iter(|| {
                let key = kdf
                    .derive(&DerivationRequest::new(
                        b"1reallyJunkiePasswordToCheck",
                        b"salt",
                        n,
                        8,
                        1,
                        32,
                    ))
                    .expect("valid parameters");
                std::hint::black_box(key);
            });
        });
    }
    group.finish();
}

/// Cost of raising `p` at the tuner's minimum `N`
fn benchmark_parallelization(c: &mut Criterion) {
    let kdf = ScryptKdf::new();
    let mut group = c.benchmark_group("scrypt_parallelization");
    group.sample_size(10);

    for p in [1u32, 2, 4] {
        group.bench_with_input(BenchmarkId::new("p", p), &p, |b, &p| {
            b.iter(|| {
                let key = kdf
                    .derive(&DerivationRequest::new(b"password", b"salt", 16384, 8, p, 32))
                    .expect("valid parameters");
                std::hint::black_box(key);
            });
        });
    }
    group.finish();
}

/// Runner and builder overhead against a direct call
fn benchmark_async_overhead(c: &mut Criterion) {
    let rt = Runtime::new().expect("tokio runtime");
    let kdf = ScryptKdf::new();
    let mut group = c.benchmark_group("scrypt_async_overhead");

    group.bench_function("direct", |b| {
        b.iter(|| {
            let key = kdf
                .derive(&DerivationRequest::new(b"password", b"salt", 1024, 1, 1, 32))
                .expect("valid parameters");
            std::hint::black_box(key);
        });
    });

    group.bench_function("builder", |b| {
        b.iter(|| {
            rt.block_on(async {
                let key = Kdf::scrypt()
                    .with_salt(b"salt".to_vec())
                    .with_cost(1024, 1, 1)
                    .derive(b"password".to_vec())
                    .await
                    .expect("valid parameters");
                std::hint::black_box(key);
            });
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_cost_scaling,
    benchmark_parallelization,
    benchmark_async_overhead
);
criterion_main!(benches);
