//! Stride sampling tests over synthetic in-memory videos.

use std::{collections::HashSet, time::Duration};

use framepick::{
    ExtractionConfig, Frame, FrameCount, FrameSource, FramepickError, InMemorySource, Sampler,
    extract_keyframes,
};

const FPS: f64 = 30.0;

fn synthetic_source(count: u64) -> InMemorySource {
    let frames = (0..count)
        .map(|index| {
            let data = vec![(index % 256) as u8; 4 * 4 * 3];
            let timestamp = Duration::from_secs_f64(index as f64 / FPS);
            Frame::from_rgb(4, 4, data, timestamp, index).expect("Failed to build frame")
        })
        .collect();
    InMemorySource::new(frames, Duration::from_secs_f64(count as f64 / FPS)).with_frame_rate(FPS)
}

/// Source whose `grab` fails on the given 1-based calls without advancing,
/// the way a corrupt packet does in a real container.
struct CorruptPackets {
    inner: InMemorySource,
    failing_calls: HashSet<u64>,
    calls: u64,
}

impl CorruptPackets {
    fn new(inner: InMemorySource, failing_calls: impl IntoIterator<Item = u64>) -> Self {
        Self {
            inner,
            failing_calls: failing_calls.into_iter().collect(),
            calls: 0,
        }
    }
}

impl FrameSource for CorruptPackets {
    fn duration(&self) -> Duration {
        self.inner.duration()
    }

    fn native_resolution(&self) -> (u32, u32) {
        self.inner.native_resolution()
    }

    fn frame_rate(&self) -> Option<f64> {
        self.inner.frame_rate()
    }

    fn grab(&mut self) -> Result<bool, FramepickError> {
        self.calls += 1;
        if self.failing_calls.contains(&self.calls) {
            return Err(FramepickError::FrameDecodeError(format!(
                "corrupt packet on call {}",
                self.calls
            )));
        }
        self.inner.grab()
    }

    fn retrieve(&mut self) -> Result<Frame, FramepickError> {
        self.inner.retrieve()
    }
}

fn sampled_indices(count: u64, stride: u32) -> Vec<u64> {
    Sampler::new(synthetic_source(count), stride)
        .expect("Failed to create sampler")
        .map(|frame| frame.index())
        .collect()
}

// ── Stride runs ────────────────────────────────────────────────────

#[test]
fn stride_one_emits_every_frame() {
    assert_eq!(sampled_indices(10, 1), (0..10).collect::<Vec<_>>());
}

#[test]
fn stride_emits_last_frame_of_each_run() {
    assert_eq!(sampled_indices(10, 3), vec![0, 3, 6, 9]);
}

#[test]
fn partial_run_still_emits_its_last_frame() {
    assert_eq!(sampled_indices(10, 4), vec![0, 4, 8, 9]);
}

#[test]
fn stride_longer_than_video() {
    assert_eq!(sampled_indices(5, 100), vec![0, 4]);
}

#[test]
fn single_frame_video() {
    assert_eq!(sampled_indices(1, 3), vec![0]);
}

#[test]
fn empty_video_emits_nothing() {
    let mut sampler = Sampler::new(synthetic_source(0), 2).expect("Failed to create sampler");
    assert!(sampler.next_sample().is_none());
    assert_eq!(sampler.stats().frames_sampled, 0);
    assert_eq!(sampler.stats().frames_read, 0);
}

#[test]
fn zero_stride_is_rejected() {
    let result = Sampler::new(synthetic_source(3), 0);
    assert!(matches!(result, Err(FramepickError::InvalidFrameSkip)));
}

#[test]
fn sampler_is_fused_after_end_of_stream() {
    let mut sampler = Sampler::new(synthetic_source(3), 1).expect("Failed to create sampler");
    assert_eq!(sampler.by_ref().count(), 3);
    assert!(sampler.next_sample().is_none());
    assert!(sampler.next_sample().is_none());
}

// ── Stats ──────────────────────────────────────────────────────────

#[test]
fn stats_count_reads_and_samples() {
    let mut sampler = Sampler::new(synthetic_source(10), 3).expect("Failed to create sampler");
    let emitted = sampler.by_ref().count();
    let stats = sampler.stats();
    assert_eq!(emitted, 4);
    assert_eq!(stats.frames_read, 10);
    assert_eq!(stats.frames_sampled, 4);
    assert_eq!(stats.frames_failed, 0);
}

#[test]
fn into_source_returns_drained_source() {
    let mut sampler = Sampler::new(synthetic_source(6), 2).expect("Failed to create sampler");
    let _ = sampler.next_sample();
    let _ = sampler.next_sample();
    let source = sampler.into_source();
    assert_eq!(source.remaining(), 3);
}

// ── Unreadable frames ──────────────────────────────────────────────

#[test]
fn unreadable_frames_are_skipped_and_counted() {
    let source = synthetic_source(10).with_failures([3, 4]);
    let mut sampler = Sampler::new(source, 1).expect("Failed to create sampler");
    let indices: Vec<u64> = sampler.by_ref().map(|frame| frame.index()).collect();
    assert_eq!(indices, vec![0, 1, 2, 5, 6, 7, 8, 9]);
    assert_eq!(sampler.stats().frames_failed, 2);
}

#[test]
fn unreadable_baseline_does_not_end_the_stream() {
    let source = synthetic_source(7).with_failures([0]);
    let indices: Vec<u64> = Sampler::new(source, 3)
        .expect("Failed to create sampler")
        .map(|frame| frame.index())
        .collect();
    assert_eq!(indices, vec![3, 6]);
}

#[test]
fn long_failure_streak_ends_the_stream() {
    let source = synthetic_source(50).with_failures(0..40);
    let mut sampler = Sampler::new(source, 1).expect("Failed to create sampler");
    assert_eq!(sampler.by_ref().count(), 0);
    let stats = sampler.stats();
    assert_eq!(stats.frames_failed, 16);
    assert_eq!(stats.frames_read, 16);
}

#[test]
fn decode_failures_are_counted() {
    let source = CorruptPackets::new(synthetic_source(10), [3, 5]);
    let mut sampler = Sampler::new(source, 1).expect("Failed to create sampler");
    let indices: Vec<u64> = sampler.by_ref().map(|frame| frame.index()).collect();
    let stats = sampler.stats();

    assert_eq!(indices, (0..10).collect::<Vec<_>>());
    assert_eq!(stats.frames_failed, 2);
    assert_eq!(stats.frames_read, 10);
    assert_eq!(stats.frames_sampled, 10);
}

#[test]
fn decode_failure_streak_ends_the_stream() {
    let source = CorruptPackets::new(synthetic_source(10), 1..=40);
    let mut sampler = Sampler::new(source, 1).expect("Failed to create sampler");
    assert_eq!(sampler.by_ref().count(), 0);
    let stats = sampler.stats();
    assert_eq!(stats.frames_failed, 16);
    assert_eq!(stats.frames_read, 0);
}

#[test]
fn decode_failures_reach_the_result() {
    let source = CorruptPackets::new(synthetic_source(10), [3, 5]);
    let config = ExtractionConfig::new().with_frame_count(FrameCount::Fixed(2));
    let result = extract_keyframes(source, &config).expect("Extraction failed");

    assert_eq!(result.skipped_frames, 2);
    assert_eq!(result.total_frames_analyzed, 10);
    assert_eq!(result.keyframes.len(), 2);
}
