//! Criterion benchmarks for whole-session write and read.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use genrep_bench::{encode_session, session_profile};
use genrep_replay::{CommandLogReader, ReplayHeader};

/// Benchmark: Write 1000 frames × 8 commands to memory.
fn bench_write_session(c: &mut Criterion) {
    let records = session_profile(1000, 8, 42);
    let header = ReplayHeader::default();

    c.bench_function("session_write_1000x8", |b| {
        b.iter(|| {
            let buf = encode_session(&header, &records).unwrap();
            black_box(buf);
        });
    });
}

/// Benchmark: Read the same session back, frame by frame via the lookahead.
fn bench_read_session(c: &mut Criterion) {
    let records = session_profile(1000, 8, 42);
    let encoded = encode_session(&ReplayHeader::default(), &records).unwrap();

    c.bench_function("session_read_1000x8", |b| {
        b.iter(|| {
            let mut reader = CommandLogReader::open(encoded.as_slice()).unwrap();
            let mut count = 0usize;
            while let Some(record) = reader.next_record().unwrap() {
                black_box(&record);
                count += 1;
            }
            black_box(count);
        });
    });
}

criterion_group!(benches, bench_write_session, bench_read_session);
criterion_main!(benches);
