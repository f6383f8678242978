//! Benchmarks for zero-shot scoring and image intake.
//!
//! Run with: cargo bench -p specimen-core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use specimen_core::config::LimitsConfig;
use specimen_core::pipeline::ImageDecoder;
use specimen_core::zeroshot::{ClassBank, ZeroShotClassifier};

const EMBEDDING_DIM: usize = 512;

/// Deterministic pseudo-random unit vectors.
fn synthetic_columns(count: usize, dim: usize) -> Vec<Vec<f32>> {
    let mut state = 0x2545_f491_u32;
    (0..count)
        .map(|_| {
            let mut v: Vec<f32> = (0..dim)
                .map(|_| {
                    state ^= state << 13;
                    state ^= state >> 17;
                    state ^= state << 5;
                    (state as f32 / u32::MAX as f32) - 0.5
                })
                .collect();
            specimen_core::math::l2_normalize_in_place(&mut v);
            v
        })
        .collect()
}

fn benchmark_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");
    for classes in [3usize, 500, 5000] {
        let columns = synthetic_columns(classes + 1, EMBEDDING_DIM);
        let image = columns[classes].clone();
        let bank = ClassBank::from_columns(columns[..classes].to_vec()).unwrap();
        let labels = (0..classes).map(|i| format!("species {i}")).collect();
        let classifier = ZeroShotClassifier::new(labels, bank, 100.0).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(classes), &image, |b, img| {
            b.iter(|| classifier.classify(black_box(img)))
        });
    }
    group.finish();
}

fn benchmark_decode(c: &mut Criterion) {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(1024, 768, Rgb([40, 120, 60])));
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    let bytes = buf.into_inner();

    let decoder = ImageDecoder::new(LimitsConfig::default());
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("decode_png_1024x768", |b| {
        b.iter(|| {
            let _ = rt.block_on(decoder.decode_from_bytes(black_box(bytes.clone()), "bench.png"));
        })
    });
}

criterion_group!(benches, benchmark_classify, benchmark_decode);
criterion_main!(benches);
