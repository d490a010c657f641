//! Benchmarks for frame encoding and inbound decoding.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench frame_bench
//! ```

use bytes::BytesMut;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use tapkiosk_protocol::{FrameCodec, InboundMessage, OutboundMessage};
use tokio_util::codec::{Decoder, Encoder};

/// Benchmark encoding each outbound message into a frame.
fn bench_outbound_to_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("outbound_to_frame");
    group.throughput(Throughput::Elements(3));

    group.bench_function("all_messages", |b| {
        b.iter(|| {
            for message in [
                OutboundMessage::Countdown,
                OutboundMessage::Success,
                OutboundMessage::Failed,
            ] {
                black_box(black_box(message).to_frame());
            }
        });
    });

    group.finish();
}

/// Benchmark inbound decoding of padded, bare and unknown payloads.
fn bench_inbound_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("inbound_decode");
    group.throughput(Throughput::Elements(1));

    let padded = InboundMessage::finish_frame().to_bytes();
    group.bench_function("finish_padded", |b| {
        b.iter(|| black_box(InboundMessage::decode(black_box(&padded))));
    });
    group.bench_function("finish_bare", |b| {
        b.iter(|| black_box(InboundMessage::decode(black_box(b"FINISH"))));
    });
    group.bench_function("unknown", |b| {
        b.iter(|| black_box(InboundMessage::decode(black_box(b"STATUS?"))));
    });

    group.finish();
}

/// Benchmark a codec round through a datagram buffer.
fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");
    group.throughput(Throughput::Elements(1));

    let frame = OutboundMessage::Success.to_frame();
    group.bench_function("encode_decode", |b| {
        b.iter(|| {
            let mut codec = FrameCodec::new();
            let mut buffer = BytesMut::with_capacity(16);
            codec.encode(black_box(frame), &mut buffer).unwrap();
            black_box(codec.decode(&mut buffer).unwrap());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_outbound_to_frame, bench_inbound_decode, bench_codec);
criterion_main!(benches);
