//! Benchmarks for SO2 map generation performance

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{GrayImage, Luma};
use rand::rngs::StdRng;
use rand::SeedableRng;
use so2_core::{MaskConfig, MaskProcessor, So2Generator};

fn create_vessel_image(size: u32) -> GrayImage {
    let mut img = GrayImage::new(size, size);

    // Diagonal stripes stand in for vessel structure
    for y in 0..size {
        for x in 0..size {
            if (x + y) % 16 < 3 {
                img.put_pixel(x, y, Luma([255]));
            }
        }
    }

    img
}

fn benchmark_mask_extraction(c: &mut Criterion) {
    let processor = MaskProcessor::new(MaskConfig::default());
    let img_small = create_vessel_image(320);
    let img_medium = create_vessel_image(640);

    c.bench_function("extract_320x320", |b| {
        b.iter(|| processor.extract(black_box(&img_small)))
    });

    c.bench_function("extract_640x640", |b| {
        b.iter(|| processor.extract(black_box(&img_medium)))
    });
}

fn benchmark_generation(c: &mut Criterion) {
    let generator = So2Generator::new();
    let img_small = create_vessel_image(320);
    let img_medium = create_vessel_image(640);

    c.bench_function("generate_320x320", |b| {
        let mut rng = StdRng::seed_from_u64(0);
        b.iter(|| generator.generate_image(black_box(&img_small), &mut rng))
    });

    c.bench_function("generate_640x640", |b| {
        let mut rng = StdRng::seed_from_u64(0);
        b.iter(|| generator.generate_image(black_box(&img_medium), &mut rng))
    });
}

criterion_group!(benches, benchmark_mask_extraction, benchmark_generation);
criterion_main!(benches);
