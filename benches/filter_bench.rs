//! Cuckoo filter benchmarks using criterion.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ferric_cuckoo::{CuckooConfig, CuckooFilter};

const ITEMS: usize = 100_000;

fn filled_filter(config: CuckooConfig) -> CuckooFilter {
    let mut filter = CuckooFilter::with_config(ITEMS, config).unwrap();
    for key in 0..ITEMS as u64 {
        filter.insert(key).unwrap();
    }
    filter
}

fn bench_insert(c: &mut Criterion) {
    c.bench_function("insert_100k_fp16", |b| {
        b.iter(|| filled_filter(CuckooConfig::fp16()));
    });
}

fn bench_contains(c: &mut Criterion) {
    for (name, config) in [
        ("contains_hit_fp8", CuckooConfig::fp8()),
        ("contains_hit_fp16", CuckooConfig::fp16()),
        ("contains_hit_fp32", CuckooConfig::fp32()),
    ] {
        let filter = filled_filter(config);
        let mut key = 0u64;
        c.bench_function(name, |b| {
            b.iter(|| {
                key = (key + 1) % ITEMS as u64;
                black_box(filter.contains(black_box(key)))
            });
        });
    }

    let filter = filled_filter(CuckooConfig::fp16());
    let mut key = u64::MAX;
    c.bench_function("contains_miss_fp16", |b| {
        b.iter(|| {
            key = key.wrapping_sub(1);
            black_box(filter.contains(black_box(key)))
        });
    });
}

fn bench_delete_reinsert(c: &mut Criterion) {
    let mut filter = filled_filter(CuckooConfig::fp16());
    let mut key = 0u64;
    c.bench_function("delete_reinsert_fp16", |b| {
        b.iter(|| {
            key = (key + 1) % ITEMS as u64;
            filter.delete(key);
            filter.insert(key).unwrap();
        });
    });
}

criterion_group!(benches, bench_insert, bench_contains, bench_delete_reinsert);
criterion_main!(benches);
