//! Benchmarks for scoring, selection, normalization, and full extraction.
//!
//! Run with: cargo bench
//!
//! The file-backed benchmark requires fixture files from
//! `tests/fixtures/generate_fixtures.sh`.

use std::{hint::black_box, path::Path, time::Duration};

use criterion::{BenchmarkId, Criterion};
use framepick::{
    ChangeMetric, ChangeScorer, DecoderLogLevel, ExtractionConfig, Frame, FrameCount,
    InMemorySource, PayloadEncoding, Resolution, ScoredCandidate, extract_keyframes,
    extract_keyframes_from_path, normalize_candidates, select_top_k, set_decoder_log_level,
};

const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";

fn gradient_frame(index: u64, width: u32, height: u32) -> Frame {
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            let shade = ((u64::from(x + y) + index * 3) % 256) as u8;
            data.extend_from_slice(&[shade, shade / 2, 255 - shade]);
        }
    }
    let timestamp = Duration::from_secs_f64(index as f64 / 30.0);
    Frame::from_rgb(width, height, data, timestamp, index).unwrap()
}

fn synthetic_video(count: u64) -> InMemorySource {
    let frames = (0..count).map(|index| gradient_frame(index, 320, 240)).collect();
    InMemorySource::new(frames, Duration::from_secs_f64(count as f64 / 30.0)).with_frame_rate(30.0)
}

fn benchmark_scoring(criterion: &mut Criterion) {
    let frames: Vec<Frame> = (0..2).map(|index| gradient_frame(index, 1280, 720)).collect();
    let mut group = criterion.benchmark_group("score 720p frame pair");

    for metric in [
        ChangeMetric::PixelDelta,
        ChangeMetric::Histogram,
        ChangeMetric::PerceptualHash,
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(metric), &metric, |bencher, &metric| {
            bencher.iter(|| {
                let mut scorer = ChangeScorer::new(metric);
                scorer.score(&frames[0]);
                black_box(scorer.score(&frames[1]))
            });
        });
    }

    group.finish();
}

fn benchmark_selection(criterion: &mut Criterion) {
    let candidates: Vec<ScoredCandidate> = (0..10_000u64)
        .map(|index| {
            let score = ((index * 7_919) % 1_000) as f64 / 10.0;
            ScoredCandidate::new(Duration::from_millis(index * 33), index, score)
        })
        .collect();

    criterion.bench_function("select top 15 of 10k candidates", |bencher| {
        bencher.iter(|| black_box(select_top_k(candidates.clone(), 15)));
    });
}

fn benchmark_normalization(criterion: &mut Criterion) {
    let candidates: Vec<ScoredCandidate> = (0..8u64)
        .map(|index| {
            let frame = gradient_frame(index, 1920, 1080);
            ScoredCandidate::new(frame.timestamp(), index, 1.0).with_raster(frame.into_image())
        })
        .collect();
    let mut group = criterion.benchmark_group("normalize 8 1080p keyframes to 360p");

    for encoding in [PayloadEncoding::Raw, PayloadEncoding::Base64] {
        let config = ExtractionConfig::new()
            .with_resolution(Resolution::P360)
            .with_encoding(encoding);
        group.bench_function(format!("{encoding:?}"), |bencher| {
            bencher.iter(|| black_box(normalize_candidates(candidates.clone(), &config)));
        });
    }

    group.finish();
}

fn benchmark_in_memory_extraction(criterion: &mut Criterion) {
    let source = synthetic_video(300);
    let config = ExtractionConfig::new().with_frame_count(FrameCount::Fixed(5));

    let mut group = criterion.benchmark_group("extract 300 in-memory frames");
    for skip in [1u32, 5] {
        let config = config.clone().with_frame_skip(skip);
        group.bench_with_input(BenchmarkId::new("frame_skip", skip), &skip, |bencher, _| {
            bencher.iter(|| black_box(extract_keyframes(source.clone(), &config).unwrap()));
        });
    }
    group.finish();
}

fn benchmark_file_extraction(criterion: &mut Criterion) {
    set_decoder_log_level(DecoderLogLevel::Error);

    if !Path::new(SAMPLE_VIDEO).exists() {
        eprintln!("Skipping benchmark: fixture not found");
        return;
    }

    let config = ExtractionConfig::new()
        .with_frame_count(FrameCount::Fixed(5))
        .with_frame_skip(5);
    let mut group = criterion.benchmark_group("extract from file");
    group.sample_size(10);
    group.bench_function("10s 480p, skip 5", |bencher| {
        bencher.iter(|| extract_keyframes_from_path(SAMPLE_VIDEO, &config).unwrap());
    });
    group.finish();
}

criterion::criterion_group!(
    benches,
    benchmark_scoring,
    benchmark_selection,
    benchmark_normalization,
    benchmark_in_memory_extraction,
    benchmark_file_extraction,
);
criterion::criterion_main!(benches);
