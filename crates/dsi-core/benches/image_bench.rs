//! Criterion benchmarks for pixel buffer access.
//!
//! Measures per-pixel reads and the BGRA → RGBA conversion on a full-HD
//! capture-sized buffer, the two operations callers run on every frame.
//!
//! Run with:
//! ```bash
//! cargo bench --package dsi-core --bench image_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dsi_core::{ChannelOrder, Image};

/// Capture sizes covering a small widget, a typical window and a full screen.
const BENCH_SIZES: &[(u32, u32)] = &[(64, 64), (800, 600), (1920, 1080)];

fn make_image(width: u32, height: u32) -> Image {
    let data = (0..width as usize * height as usize * 4)
        .map(|i| (i % 256) as u8)
        .collect();
    Image::new(data, width, height, ChannelOrder::Bgra).expect("bench image")
}

fn bench_get_pixel(c: &mut Criterion) {
    let img = make_image(1920, 1080);
    c.bench_function("image/get_pixel_center", |b| {
        b.iter(|| img.get_pixel(black_box(960), black_box(540)))
    });
}

fn bench_full_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("image/full_scan");
    for &(w, h) in BENCH_SIZES {
        let img = make_image(w, h);
        group.bench_with_input(BenchmarkId::from_parameter(format!("{w}x{h}")), &img, |b, img| {
            b.iter(|| {
                let mut sum = 0u64;
                for y in 0..img.height() {
                    for x in 0..img.width() {
                        if let Some(px) = img.get_pixel(x, y) {
                            sum += u64::from(px[1]);
                        }
                    }
                }
                black_box(sum)
            })
        });
    }
    group.finish();
}

fn bench_to_rgba(c: &mut Criterion) {
    let mut group = c.benchmark_group("image/to_rgba");
    for &(w, h) in BENCH_SIZES {
        let img = make_image(w, h);
        group.bench_with_input(BenchmarkId::from_parameter(format!("{w}x{h}")), &img, |b, img| {
            b.iter(|| black_box(img.to_rgba()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_get_pixel, bench_full_scan, bench_to_rgba);
criterion_main!(benches);
