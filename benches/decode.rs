//! Frame decoding benchmarks.
//!
//! Measures the per-frame cost on the client's receive path:
//! - Decoding inbound records of increasing size
//! - Rendering a decoded record into a log line
//! - Building and encoding an echo reply
//!
//! Run with: cargo bench --bench decode
//! Results saved to: target/criterion/

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

use socket_feed::protocol::decode_inbound;
use socket_feed::{EchoReply, InboundMessage};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const PAYLOAD_SIZES: &[usize] = &[16, 256, 4096];

fn record(size: usize) -> String {
    let formatted = "X".repeat(size);
    format!(
        r#"{{"formatted":"{formatted}","received":"2024-05-01T12:00:01Z","original":"x"}}"#
    )
}

// ============================================================================
// Benchmark: Decode
// ============================================================================

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_inbound");

    for &size in PAYLOAD_SIZES {
        let frame = record(size);
        group.throughput(Throughput::Bytes(frame.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &frame, |b, frame| {
            b.iter(|| decode_inbound(black_box(frame)));
        });
    }

    group.bench_function("malformed", |b| {
        b.iter(|| decode_inbound(black_box("{not json")));
    });

    group.finish();
}

// ============================================================================
// Benchmark: Render
// ============================================================================

fn bench_render(c: &mut Criterion) {
    let message = InboundMessage::new("Message A", "12:00:01");
    c.bench_function("render", |b| b.iter(|| black_box(&message).render()));
}

// ============================================================================
// Benchmark: Echo
// ============================================================================

fn bench_echo(c: &mut Criterion) {
    c.bench_function("echo_reply", |b| {
        b.iter(|| EchoReply::from_frame(black_box(r#""hello world""#)).encode());
    });
}

criterion_group!(benches, bench_decode, bench_render, bench_echo);
criterion_main!(benches);
