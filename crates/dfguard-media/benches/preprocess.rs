//! Preprocessing Benchmarks
//!
//! # Running Benchmarks
//! ```bash
//! cargo bench --package dfguard-media --bench preprocess
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dfguard_media::{crop_faces, AudioWindow, FaceBox, FrameSampleSet};
use image::{Rgb, RgbImage};

/// Synthetic frame with some texture so resizing does real work.
fn create_test_frame(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            ((x * 7 + y * 11) % 256) as u8,
            ((x * 13 + y * 17) % 256) as u8,
            ((x * 19 + y * 23) % 256) as u8,
        ])
    })
}

fn bench_audio_window(c: &mut Criterion) {
    let mut group = c.benchmark_group("audio_window_fit");

    for (name, len) in [("3s", 48_000usize), ("8s", 128_000), ("60s", 960_000)] {
        let samples: Vec<f32> = (0..len).map(|i| (i as f32 * 0.01).sin()).collect();
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("fit", name), &samples, |b, s| {
            b.iter(|| AudioWindow::fit(black_box(s.clone())))
        });
    }

    group.finish();
}

fn bench_crop_faces(c: &mut Criterion) {
    let mut group = c.benchmark_group("crop_faces");

    for (width, height) in [(1920u32, 1080u32), (1280, 720), (640, 360)] {
        let frame = create_test_frame(width, height);
        let boxes = [
            FaceBox::new(100, 80, 300, 320),
            FaceBox::new(400, 60, 520, 200),
        ];
        group.throughput(Throughput::Elements(boxes.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("crop", format!("{}x{}", width, height)),
            &frame,
            |b, f| b.iter(|| crop_faces(black_box(f), black_box(&boxes))),
        );
    }

    group.finish();
}

fn bench_frame_sampling(c: &mut Criterion) {
    c.bench_function("evenly_spaced_10k_frames", |b| {
        b.iter(|| FrameSampleSet::evenly_spaced(black_box(10_000), black_box(32)))
    });
}

criterion_group!(benches, bench_audio_window, bench_crop_faces, bench_frame_sampling);
criterion_main!(benches);
