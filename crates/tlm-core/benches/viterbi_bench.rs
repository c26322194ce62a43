//! Encoder and Viterbi decoder throughput
//!
//! Run with: cargo bench -p tlm-core --bench viterbi_bench
//! Add `--features parallel` to measure the rayon add-compare-select.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tlm_core::prelude::*;

/// Deterministic pseudo-random payload (xorshift).
fn payload(len: usize) -> Vec<bool> {
    let mut x: u32 = 0x1234_5678;
    (0..len)
        .map(|_| {
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            x & 1 == 1
        })
        .collect()
}

// ============================================================================
// Encoder
// ============================================================================

fn bench_encoder(c: &mut Criterion) {
    let mut group = c.benchmark_group("encoder");
    let bits = payload(4096);
    group.throughput(Throughput::Elements(bits.len() as u64));

    for (name, params) in [
        ("k3", CodeParams::k3_rate_half()),
        ("k7", CodeParams::nasa_k7_rate_half()),
    ] {
        let mut encoder = ConvolutionalEncoder::new(&params).unwrap();
        group.bench_function(name, |b| {
            b.iter(|| {
                encoder.reset();
                encoder.encode(black_box(&bits))
            })
        });
    }

    group.finish();
}

// ============================================================================
// Decoder
// ============================================================================

fn bench_decoder_constraint_length(c: &mut Criterion) {
    let mut group = c.benchmark_group("viterbi_decode");
    let bits = payload(4096);

    for params in [
        CodeParams::k3_rate_half(),
        CodeParams::gsm_k5_rate_half(),
        CodeParams::nasa_k7_rate_half(),
    ] {
        let symbols = ConvolutionalEncoder::new(&params).unwrap().encode(&bits);
        let mut decoder = ViterbiDecoder::new(&params).unwrap();
        group.throughput(Throughput::Elements(symbols.len() as u64));

        group.bench_with_input(
            BenchmarkId::new("constraint_length", params.constraint_length),
            &symbols,
            |b, symbols| {
                b.iter(|| {
                    decoder.reset();
                    decoder.decode(black_box(symbols))
                })
            },
        );
    }

    group.finish();
}

fn bench_decoder_tb_len(c: &mut Criterion) {
    let mut group = c.benchmark_group("viterbi_tb_len");
    let bits = payload(4096);

    for tb_len in [12, 32, 64, 128] {
        let params = CodeParams::builder().tb_len(tb_len).build().unwrap();
        let symbols = ConvolutionalEncoder::new(&params).unwrap().encode(&bits);
        let mut decoder = ViterbiDecoder::new(&params).unwrap();
        group.throughput(Throughput::Elements(symbols.len() as u64));

        group.bench_with_input(BenchmarkId::from_parameter(tb_len), &symbols, |b, symbols| {
            b.iter(|| {
                decoder.reset();
                decoder.decode(black_box(symbols))
            })
        });
    }

    group.finish();
}

// ============================================================================
// Full chain
// ============================================================================

fn bench_chain_tick(c: &mut Criterion) {
    let params = CodeParams::builder().total_bits(4096).build().unwrap();
    let bits = payload(4096);

    c.bench_function("chain_tick_k3", |b| {
        let mut encoder = ConvolutionalEncoder::new(&params).unwrap();
        let mut decoder = ViterbiDecoder::new(&params).unwrap();
        let mut tracker = ErrorTracker::new(&params).unwrap();
        b.iter(|| {
            encoder.reset();
            decoder.reset();
            tracker.reset();
            for &bit in &bits {
                let symbol = encoder.tick(Some(bit)).symbol;
                let decoded = decoder.tick(Some(symbol)).bit();
                tracker.tick(TrackerInput {
                    reference: Some(bit),
                    advance: true,
                    decoded,
                });
            }
            black_box(tracker.status())
        })
    });
}

criterion_group!(
    benches,
    bench_encoder,
    bench_decoder_constraint_length,
    bench_decoder_tb_len,
    bench_chain_tick,
);
criterion_main!(benches);
