//! Keyframe count resolution tests.

use std::time::Duration;

use framepick::{CountMode, ExtractionConfig, FrameCount, adaptive_frame_count, resolve_frame_count};

fn seconds(value: f64) -> Duration {
    Duration::from_secs_f64(value)
}

// ── Fixed ──────────────────────────────────────────────────────────

#[test]
fn fixed_mode_returns_explicit_count() {
    let config = ExtractionConfig::new().with_frame_count(FrameCount::Fixed(7));
    assert_eq!(resolve_frame_count(&config, seconds(3.0)), 7);
    assert_eq!(resolve_frame_count(&config, seconds(3600.0)), 7);
}

#[test]
fn fixed_mode_is_not_capped_by_max_frames() {
    let config = ExtractionConfig::new()
        .with_frame_count(FrameCount::Fixed(40))
        .with_frame_bounds(1, 10);
    assert_eq!(resolve_frame_count(&config, seconds(60.0)), 40);
}

// ── Interval ───────────────────────────────────────────────────────

#[test]
fn interval_mode_divides_duration() {
    let config = ExtractionConfig::new()
        .with_mode(CountMode::Interval)
        .with_interval(2.0);
    assert_eq!(resolve_frame_count(&config, seconds(10.0)), 5);
}

#[test]
fn interval_mode_is_capped_by_max_frames() {
    let config = ExtractionConfig::new()
        .with_mode(CountMode::Interval)
        .with_interval(2.0)
        .with_frame_bounds(1, 3);
    assert_eq!(resolve_frame_count(&config, seconds(10.0)), 3);
}

#[test]
fn interval_mode_rounds_up_partial_intervals() {
    let config = ExtractionConfig::new()
        .with_mode(CountMode::Interval)
        .with_interval(4.0);
    assert_eq!(resolve_frame_count(&config, seconds(10.0)), 3);
}

#[test]
fn interval_mode_floors_at_one() {
    let config = ExtractionConfig::new()
        .with_mode(CountMode::Interval)
        .with_interval(60.0);
    assert_eq!(resolve_frame_count(&config, seconds(0.5)), 1);
}

// ── Adaptive ───────────────────────────────────────────────────────

#[test]
fn adaptive_mapping_reference_points() {
    assert_eq!(adaptive_frame_count(10.0, 1, 100), 2);
    assert_eq!(adaptive_frame_count(60.0, 1, 100), 5);
    assert_eq!(adaptive_frame_count(300.0, 1, 100), 11);
    assert_eq!(adaptive_frame_count(3600.0, 1, 100), 38);
}

#[test]
fn adaptive_mode_stays_within_bounds() {
    let config = ExtractionConfig::new()
        .with_frame_count(FrameCount::Auto)
        .with_mode(CountMode::Adaptive)
        .with_frame_bounds(3, 12);
    for duration in [0.1, 1.0, 10.0, 45.0, 120.0, 600.0, 7200.0, 86_400.0] {
        let count = resolve_frame_count(&config, seconds(duration));
        assert!((3..=12).contains(&count), "{duration}s resolved to {count}");
    }
}

#[test]
fn adaptive_mode_is_monotonic_in_duration() {
    let config = ExtractionConfig::new()
        .with_frame_count(FrameCount::Auto)
        .with_mode(CountMode::Adaptive)
        .with_frame_bounds(1, 50);
    let mut previous = 0;
    for step in 1..2_000 {
        let count = resolve_frame_count(&config, seconds(f64::from(step) * 3.7));
        assert!(count >= previous, "count dropped at step {step}");
        previous = count;
    }
    assert_eq!(previous, 50);
}

#[test]
fn adaptive_mode_ignores_explicit_count() {
    let config = ExtractionConfig::new()
        .with_frame_count(FrameCount::Fixed(99))
        .with_mode(CountMode::Adaptive)
        .with_frame_bounds(3, 15);
    assert_eq!(resolve_frame_count(&config, seconds(60.0)), 5);
}

// ── Zero duration ──────────────────────────────────────────────────

#[test]
fn zero_duration_resolves_to_zero_in_every_mode() {
    for mode in [CountMode::Fixed, CountMode::Adaptive, CountMode::Interval] {
        let config = ExtractionConfig::new().with_mode(mode);
        assert_eq!(resolve_frame_count(&config, Duration::ZERO), 0, "{mode}");
    }
}
