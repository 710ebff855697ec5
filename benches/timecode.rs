//! Timecode and layout benchmarks
//!
//! One overlay render per tick runs the classifier, drop-frame arithmetic,
//! formatter and layout; these measure each step.

use bcmon::config::OverlayGeometry;
use bcmon::host::{SafeMargins, Viewport};
use bcmon::overlay::layout::compute_layout;
use bcmon::overlay::DisplayMode;
use bcmon::timecode::format::format_with_profile;
use bcmon::timecode::{format_timecode, FramerateProfile};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const RATES: &[f64] = &[23.976, 25.0, 29.97, 59.94, 119.88];

fn bench_format(c: &mut Criterion) {
    let mut group = c.benchmark_group("format_timecode");

    for &fps in RATES {
        let profile = FramerateProfile::classify(Some(fps));

        group.bench_with_input(BenchmarkId::new("classified", fps), &fps, |b, _| {
            b.iter(|| format_with_profile(black_box(Some(5025.125)), &profile))
        });

        group.bench_with_input(BenchmarkId::new("with_classify", fps), &fps, |b, &fps| {
            b.iter(|| format_timecode(black_box(Some(5025.125)), Some(fps)))
        });
    }

    group.finish();
}

fn bench_layout(c: &mut Criterion) {
    let geometry = OverlayGeometry::default();
    let margins = SafeMargins::default();

    c.bench_function("compute_layout_full_1080p", |b| {
        b.iter(|| {
            compute_layout(
                black_box(Viewport::new(1920, 1080)),
                &margins,
                DisplayMode::Full,
                &geometry,
                4,
            )
        })
    });
}

criterion_group!(benches, bench_format, bench_layout);
criterion_main!(benches);
