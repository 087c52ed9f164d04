//! Benchmarks for frame downscaling and JPEG encoding
//!
//! Covers the per-cycle image cost at common headset camera resolutions:
//! - Bilinear resampling alone
//! - Encoding at native resolution
//! - Encoding with a 640px bound on the larger dimension, reusing the
//!   resample scratch the way the scheduler does

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use framecast::encoder::{ImageEncoder, resample_bilinear, target_dimensions};
use framecast::test_utils::gradient_frame;
use std::hint::black_box;

const RESOLUTIONS: [(u32, u32); 3] = [(640, 480), (1280, 720), (1920, 1080)];

fn bench_resample(c: &mut Criterion) {
    let mut group = c.benchmark_group("resample_bilinear");

    for (width, height) in RESOLUTIONS {
        let sample = gradient_frame(width, height);
        let (dw, dh) = target_dimensions(width, height, Some(640));
        group.throughput(Throughput::Bytes(sample.pixels.len() as u64));
        group.bench_function(BenchmarkId::new("to_640", format!("{}x{}", width, height)), |b| {
            b.iter(|| resample_bilinear(black_box(&sample.pixels), width, height, dw, dh))
        });
    }

    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("jpeg_encode");

    for (width, height) in RESOLUTIONS {
        let sample = gradient_frame(width, height);
        let label = format!("{}x{}", width, height);
        group.throughput(Throughput::Bytes(sample.pixels.len() as u64));

        let native = ImageEncoder::new(75, None);
        group.bench_function(BenchmarkId::new("native_q75", &label), |b| {
            b.iter(|| native.encode(black_box(&sample)).unwrap())
        });

        let bounded = ImageEncoder::new(75, Some(640));
        let mut scratch = Vec::new();
        group.bench_function(BenchmarkId::new("max640_q75", &label), |b| {
            b.iter(|| bounded.encode_with_scratch(black_box(&sample), &mut scratch).unwrap())
        });
    }

    group.finish();
}

fn bench_quality(c: &mut Criterion) {
    let mut group = c.benchmark_group("jpeg_quality");
    let sample = gradient_frame(1280, 720);

    for quality in [25u8, 50, 75, 95] {
        let encoder = ImageEncoder::new(quality, Some(640));
        group.bench_function(BenchmarkId::from_parameter(quality), |b| {
            b.iter(|| encoder.encode(black_box(&sample)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_resample, bench_encode, bench_quality);
criterion_main!(benches);
