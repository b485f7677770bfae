//! Keyframe count resolution.
//!
//! Turns an [`ExtractionConfig`] and the measured video duration into `K`,
//! the number of keyframes an extraction returns.

use std::time::Duration;

use crate::config::{CountMode, ExtractionConfig, FrameCount};

/// Seconds of footage that earn the adaptive mapping's base unit.
const ADAPTIVE_UNIT_SECONDS: f64 = 10.0;

/// Keyframes granted per square-root unit of footage.
const ADAPTIVE_SCALE: f64 = 2.0;

/// Resolve the number of keyframes to return.
///
/// - Fixed mode returns the explicit count, even above `max_frames`.
/// - Interval mode returns `min(max_frames, ceil(duration / interval))`,
///   floored at 1.
/// - Adaptive mode returns `ceil(2 × sqrt(duration / 10 s))` clamped to
///   `[min_frames, max_frames]`. An explicit count is ignored.
///
/// A zero duration always resolves to `0`.
///
/// The config is assumed valid; see [`ExtractionConfig::validate`].
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use framepick::{CountMode, ExtractionConfig, resolve_frame_count};
///
/// let config = ExtractionConfig::new()
///     .with_mode(CountMode::Interval)
///     .with_interval(2.0)
///     .with_frame_bounds(1, 3);
/// assert_eq!(resolve_frame_count(&config, Duration::from_secs(10)), 3);
/// ```
pub fn resolve_frame_count(config: &ExtractionConfig, duration: Duration) -> u32 {
    let seconds = duration.as_secs_f64();
    if seconds <= 0.0 {
        return 0;
    }

    let (min_frames, max_frames) = config.frame_bounds();
    match config.mode() {
        CountMode::Fixed => match config.frame_count() {
            FrameCount::Fixed(count) => count,
            // Rejected by validation; fall back to the lower bound.
            FrameCount::Auto => min_frames,
        },
        CountMode::Interval => {
            let raw = (seconds / config.interval_seconds()).ceil();
            saturating_u32(raw).min(max_frames).max(1)
        }
        CountMode::Adaptive => {
            if let FrameCount::Fixed(count) = config.frame_count() {
                log::debug!("Adaptive mode ignores the explicit keyframe count {count}");
            }
            adaptive_frame_count(seconds, min_frames, max_frames)
        }
    }
}

/// Monotonic duration-to-count mapping used by adaptive mode.
///
/// 10 s gives 2, one minute 5, five minutes 11, an hour 38, before clamping.
pub fn adaptive_frame_count(seconds: f64, min_frames: u32, max_frames: u32) -> u32 {
    let raw = (ADAPTIVE_SCALE * (seconds.max(0.0) / ADAPTIVE_UNIT_SECONDS).sqrt()).ceil();
    saturating_u32(raw).clamp(min_frames, max_frames.max(min_frames))
}

fn saturating_u32(value: f64) -> u32 {
    if value.is_nan() || value <= 0.0 {
        0
    } else if value >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        value as u32
    }
}
