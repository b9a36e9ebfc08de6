//! Benchmarks for notification record classification.
//!
//! Every readable event on the control device goes through header parsing
//! and, for lock status records, a typed view. These benchmarks track the
//! per-record cost on the reactor thread.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench record_bench
//! ```

use bytes::Bytes;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use fwsnd_protocol::{EfwResponse, LockStatus, NotificationRecord, RecordBuilder};
use std::hint::black_box;

fn bench_classify_lock_status(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify_lock_status");
    group.throughput(Throughput::Elements(1));

    let record = RecordBuilder::lock_status(true);

    group.bench_function("parse_and_view", |b| {
        b.iter(|| {
            let parsed = NotificationRecord::parse(black_box(&record)).unwrap();
            black_box(LockStatus::parse(&parsed).unwrap());
        });
    });

    group.finish();
}

fn bench_efw_response_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("efw_response");

    for quadlets in [6usize, 64, 1000] {
        let frame: Vec<u32> = (0..quadlets as u32).collect();
        let record: Bytes = RecordBuilder::efw_response(&frame);
        group.throughput(Throughput::Bytes(record.len() as u64));

        group.bench_with_input(BenchmarkId::from_parameter(quadlets), &record, |b, record| {
            b.iter(|| {
                let parsed = NotificationRecord::parse(black_box(record)).unwrap();
                black_box(EfwResponse::parse(&parsed).unwrap());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_classify_lock_status, bench_efw_response_sizes);
criterion_main!(benches);
