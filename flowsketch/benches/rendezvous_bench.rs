//! Benchmarks for the rendezvous assignment tables
//!
//! Table generation cost grows with size × members, so the generation
//! benchmarks sweep the member count; lookups are a single hash plus an
//! index regardless of size.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use flowsketch::{RendezvousTable, WeightedRendezvousTable};
use std::net::IpAddr;

fn members(n: usize) -> Vec<IpAddr> {
    (0..n)
        .map(|i| format!("192.0.{}.{}", i / 256, i % 256).parse().unwrap())
        .collect()
}

/// Benchmark 1: full table generation at increasing member counts
fn benchmark_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("rendezvous_generate");

    for n in [1usize, 10, 100].iter() {
        group.bench_with_input(BenchmarkId::new("members", n), n, |b, &n| {
            let set = members(n);
            b.iter(|| {
                black_box(RendezvousTable::new(1234, &set).unwrap());
            });
        });
    }

    group.finish();
}

/// Benchmark 2: weighted table generation
fn benchmark_generate_weighted(c: &mut Criterion) {
    let mut group = c.benchmark_group("rendezvous_generate");

    for n in [1usize, 10, 100].iter() {
        group.bench_with_input(BenchmarkId::new("weighted_members", n), n, |b, &n| {
            let set: Vec<(IpAddr, f64)> =
                members(n).into_iter().map(|a| (a, 10.0)).collect();
            b.iter(|| {
                black_box(WeightedRendezvousTable::new(1234, &set).unwrap());
            });
        });
    }

    group.finish();
}

/// Benchmark 3: lookup against a generated table
fn benchmark_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("rendezvous_lookup");

    let table = RendezvousTable::new(1234, &members(3)).unwrap();
    let probe: IpAddr = "192.0.2.200".parse().unwrap();
    group.bench_function("get", |b| {
        b.iter(|| {
            black_box(table.get(black_box(probe)));
        });
    });

    let weighted: Vec<(IpAddr, f64)> = members(3)
        .into_iter()
        .zip([10.0, 20.0, 30.0])
        .collect();
    let weighted_table = WeightedRendezvousTable::new(1234, &weighted).unwrap();
    group.bench_function("get_weighted", |b| {
        b.iter(|| {
            black_box(weighted_table.get(black_box(probe)));
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_generate,
    benchmark_generate_weighted,
    benchmark_lookup
);
criterion_main!(benches);
