//! Extraction results.

use serde::Serialize;

use crate::config::CountMode;
use crate::error::FramepickError;
use crate::normalizer::KeyframeRecord;
use crate::selector::ScoreStatistics;

/// Everything one extraction run produced.
///
/// `keyframes` is sorted by timestamp and holds `calculated_frame_count`
/// entries unless the video yielded fewer candidates.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    /// Selected keyframes in timestamp order.
    pub keyframes: Vec<KeyframeRecord>,
    /// Duration used to resolve the keyframe count, in seconds.
    pub video_duration: f64,
    /// Native `(width, height)` of the video.
    pub original_resolution: (u32, u32),
    /// `(width, height)` keyframes were normalized to.
    pub output_resolution: (u32, u32),
    /// Frames scored.
    pub total_frames_analyzed: u64,
    /// Frames read from the source, scored or not.
    pub total_frames_read: u64,
    /// Resolved keyframe count `K`.
    pub calculated_frame_count: u32,
    /// How `K` was resolved.
    pub mode: CountMode,
    /// Score statistics over every scored frame.
    pub statistics: ScoreStatistics,
    /// Frames that could not be decoded and were skipped.
    pub skipped_frames: u64,
    /// Keyframes whose normalization failed.
    pub failed_frames: u64,
    /// Why the run produced no keyframes, when it ended early.
    pub error: Option<String>,
}

impl ExtractionResult {
    /// Number of keyframes that were normalized without error.
    pub fn successful_keyframes(&self) -> usize {
        self.keyframes.iter().filter(|record| record.is_ok()).count()
    }

    /// Keyframe timestamps in seconds.
    pub fn timestamps(&self) -> Vec<f64> {
        self.keyframes
            .iter()
            .map(|record| record.timestamp.as_secs_f64())
            .collect()
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`FramepickError::Serialization`] if serialization fails.
    pub fn to_json(&self) -> Result<String, FramepickError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
