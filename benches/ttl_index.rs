// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Benchmarks for TTL index operations.

use chrono::{DateTime, TimeDelta, Utc};
use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use memindex::ttl::{Record, TtlIndex};

fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

fn populated_index(n: i64) -> TtlIndex {
    let index = TtlIndex::default();
    for i in 0..n {
        index.upsert(Record::with_value(format!("key{:05}", i), vec![0u8; 32]), at(i));
    }
    index
}

fn bench_upsert(c: &mut Criterion) {
    let index = populated_index(10_000);

    let mut group = c.benchmark_group("ttl_index");
    group.throughput(Throughput::Elements(1));

    group.bench_function("upsert_existing", |b| {
        b.iter_batched(
            || Record::filter(format!("key{:05}", rand::random::<u32>() % 10_000)),
            |record| index.upsert(record, at(20_000)),
            BatchSize::SmallInput,
        )
    });

    group.bench_function("upsert_many_100", |b| {
        b.iter_batched(
            || {
                (0..100)
                    .map(|_| Record::filter(format!("new{}", rand::random::<u32>())))
                    .collect::<Vec<_>>()
            },
            |records| index.upsert_many(records, at(20_000)),
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let index = populated_index(10_000);

    let mut group = c.benchmark_group("ttl_index");
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_last_write_unix", |b| {
        b.iter_batched(
            || format!("key{:05}", rand::random::<u32>() % 10_000),
            |key| index.get_last_write_unix(key.as_bytes()),
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

fn bench_expiry(c: &mut Criterion) {
    let mut group = c.benchmark_group("ttl_index");

    let index = populated_index(10_000);
    group.bench_function("list_expired_100", |b| {
        b.iter(|| index.list_expired_at(at(10_000), TimeDelta::seconds(1), 100))
    });

    group.throughput(Throughput::Elements(1_000));
    group.bench_function("purge_expired_1000", |b| {
        b.iter_batched(
            || populated_index(10_000),
            |index| index.purge_expired_at(at(10_000), TimeDelta::seconds(1), 1_000),
            BatchSize::LargeInput,
        )
    });

    group.finish();
}

fn bench_for_each(c: &mut Criterion) {
    let index = populated_index(10_000);

    let mut group = c.benchmark_group("ttl_index");
    group.throughput(Throughput::Elements(10_000));

    group.bench_function("for_each_10000", |b| {
        b.iter(|| {
            let mut total = 0i64;
            index.for_each(|_, expiration| {
                total += expiration;
                true
            });
            total
        })
    });

    group.finish();
}

criterion_group!(benches, bench_upsert, bench_lookup, bench_expiry, bench_for_each);

criterion_main!(benches);
