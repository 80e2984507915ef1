//! UTF-8 decoder benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use uniterm::text::Utf8Decoder;

fn bench_decode_ascii(c: &mut Criterion) {
    let mut group = c.benchmark_group("utf8");

    let ascii = "Hello, World! ".repeat(1000);
    group.throughput(Throughput::Bytes(ascii.len() as u64));

    group.bench_function("ascii", |b| {
        b.iter(|| {
            let mut decoder = Utf8Decoder::new();
            black_box(decoder.decode_stream(black_box(ascii.as_bytes())))
        })
    });

    group.finish();
}

fn bench_decode_mixed(c: &mut Criterion) {
    let mut group = c.benchmark_group("utf8");

    let mixed = "naïve 日本語 ∑ 🦀 ".repeat(500);
    group.throughput(Throughput::Bytes(mixed.len() as u64));

    group.bench_function("mixed_widths", |b| {
        b.iter(|| {
            let mut decoder = Utf8Decoder::new();
            black_box(decoder.decode_stream(black_box(mixed.as_bytes())))
        })
    });

    group.finish();
}

fn bench_decode_garbage(c: &mut Criterion) {
    let mut group = c.benchmark_group("utf8");

    let garbage: Vec<u8> = (0..10_000u32).map(|i| (i.wrapping_mul(2_654_435_761) >> 24) as u8).collect();
    group.throughput(Throughput::Bytes(garbage.len() as u64));

    group.bench_function("invalid_bytes", |b| {
        b.iter(|| {
            let mut decoder = Utf8Decoder::new();
            black_box(decoder.decode_stream(black_box(&garbage)))
        })
    });

    group.finish();
}

criterion_group!(benches, bench_decode_ascii, bench_decode_mixed, bench_decode_garbage);
criterion_main!(benches);
