//! Extraction configuration.
//!
//! [`ExtractionConfig`] is an immutable-once-built value describing one
//! extraction call: how many keyframes to pick and how that number is derived,
//! how densely to sample the stream, and how selected frames are resized,
//! encoded, and persisted.
//!
//! Loosely-typed inputs such as `"auto"`, `"720p"` or `"interval"` are parsed
//! once at the boundary through the [`FromStr`] impls on [`FrameCount`],
//! [`CountMode`], [`Resolution`] and [`PayloadEncoding`].
//!
//! # Example
//!
//! ```
//! use framepick::{CountMode, ExtractionConfig, FrameCount, PayloadEncoding, Resolution};
//!
//! let config = ExtractionConfig::new()
//!     .with_frame_count(FrameCount::Auto)
//!     .with_mode(CountMode::Adaptive)
//!     .with_frame_bounds(3, 12)
//!     .with_frame_skip(2)
//!     .with_resolution(Resolution::P720)
//!     .with_encoding(PayloadEncoding::Base64);
//! assert!(config.validate().is_ok());
//! ```

use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

use crate::error::FramepickError;
use crate::progress::{NoOpProgress, ProgressCallback};
use crate::scorer::ChangeMetric;

/// How many keyframes the caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameCount {
    /// Exactly this many (or every candidate, if there are fewer).
    Fixed(u32),
    /// Let the video duration decide.
    Auto,
}

impl FromStr for FrameCount {
    type Err = FramepickError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("auto") {
            return Ok(FrameCount::Auto);
        }
        trimmed
            .parse::<u32>()
            .map(FrameCount::Fixed)
            .map_err(|_| FramepickError::InvalidOption(format!("frame count {trimmed:?}")))
    }
}

/// How the target keyframe count is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CountMode {
    /// Use the explicit [`FrameCount::Fixed`] value.
    #[default]
    Fixed,
    /// Derive the count from the video duration, within the frame bounds.
    Adaptive,
    /// One keyframe per `interval_seconds`, capped at `max_frames`.
    Interval,
}

impl FromStr for CountMode {
    type Err = FramepickError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(CountMode::Fixed),
            "adaptive" | "auto" => Ok(CountMode::Adaptive),
            "interval" => Ok(CountMode::Interval),
            other => Err(FramepickError::InvalidOption(format!("mode {other:?}"))),
        }
    }
}

impl Display for CountMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            CountMode::Fixed => "fixed",
            CountMode::Adaptive => "adaptive",
            CountMode::Interval => "interval",
        };
        f.write_str(name)
    }
}

/// Output resolution for selected keyframes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Resolution {
    /// Keep the decoded size.
    #[default]
    Original,
    /// 360 lines, aspect ratio preserved.
    P360,
    /// 480 lines, aspect ratio preserved.
    P480,
    /// 720 lines, aspect ratio preserved.
    P720,
    /// 1080 lines, aspect ratio preserved.
    P1080,
    /// An exact `width × height`, aspect ratio ignored.
    Exact(u32, u32),
}

impl FromStr for Resolution {
    type Err = FramepickError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let lowered = value.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "original" | "source" => return Ok(Resolution::Original),
            "360p" => return Ok(Resolution::P360),
            "480p" => return Ok(Resolution::P480),
            "720p" => return Ok(Resolution::P720),
            "1080p" => return Ok(Resolution::P1080),
            _ => {}
        }

        let (width, height) = lowered
            .split_once('x')
            .ok_or_else(|| FramepickError::InvalidResolution(value.to_string()))?;
        let width = width
            .trim()
            .parse::<u32>()
            .map_err(|_| FramepickError::InvalidResolution(value.to_string()))?;
        let height = height
            .trim()
            .parse::<u32>()
            .map_err(|_| FramepickError::InvalidResolution(value.to_string()))?;
        Ok(Resolution::Exact(width, height))
    }
}

impl Display for Resolution {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Resolution::Original => f.write_str("original"),
            Resolution::P360 => f.write_str("360p"),
            Resolution::P480 => f.write_str("480p"),
            Resolution::P720 => f.write_str("720p"),
            Resolution::P1080 => f.write_str("1080p"),
            Resolution::Exact(width, height) => write!(f, "{width}x{height}"),
        }
    }
}

/// How each keyframe's pixels are handed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayloadEncoding {
    /// Packed RGB8 bytes of the resized frame.
    #[default]
    Raw,
    /// JPEG-compressed and base64-encoded text, ready for JSON transport.
    Base64,
}

impl FromStr for PayloadEncoding {
    type Err = FramepickError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(PayloadEncoding::Raw),
            "base64" | "b64" => Ok(PayloadEncoding::Base64),
            other => Err(FramepickError::InvalidOption(format!("encoding {other:?}"))),
        }
    }
}

/// Configuration for one extraction call.
///
/// All fields have defaults; see [`ExtractionConfig::new`].
#[derive(Clone)]
pub struct ExtractionConfig {
    pub(crate) frame_count: FrameCount,
    pub(crate) mode: CountMode,
    pub(crate) min_frames: u32,
    pub(crate) max_frames: u32,
    pub(crate) interval_seconds: f64,
    pub(crate) frame_skip: u32,
    pub(crate) resolution: Resolution,
    pub(crate) encoding: PayloadEncoding,
    pub(crate) persist_dir: Option<PathBuf>,
    pub(crate) jpeg_quality: u8,
    pub(crate) metric: ChangeMetric,
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) batch_size: u64,
}

impl Debug for ExtractionConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ExtractionConfig")
            .field("frame_count", &self.frame_count)
            .field("mode", &self.mode)
            .field("min_frames", &self.min_frames)
            .field("max_frames", &self.max_frames)
            .field("interval_seconds", &self.interval_seconds)
            .field("frame_skip", &self.frame_skip)
            .field("resolution", &self.resolution)
            .field("encoding", &self.encoding)
            .field("persist_dir", &self.persist_dir)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("metric", &self.metric)
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionConfig {
    /// Create a configuration with default settings.
    ///
    /// Defaults: 5 keyframes in fixed mode, adaptive bounds 3..=15, a
    /// 10-second interval, every frame scored, original resolution, raw
    /// payloads, nothing persisted, JPEG quality 85, pixel-delta scoring.
    pub fn new() -> Self {
        Self {
            frame_count: FrameCount::Fixed(5),
            mode: CountMode::Fixed,
            min_frames: 3,
            max_frames: 15,
            interval_seconds: 10.0,
            frame_skip: 1,
            resolution: Resolution::Original,
            encoding: PayloadEncoding::Raw,
            persist_dir: None,
            jpeg_quality: 85,
            metric: ChangeMetric::default(),
            progress: Arc::new(NoOpProgress),
            batch_size: 1,
        }
    }

    /// Set the requested keyframe count.
    #[must_use]
    pub fn with_frame_count(mut self, count: FrameCount) -> Self {
        self.frame_count = count;
        self
    }

    /// Set how the keyframe count is resolved.
    #[must_use]
    pub fn with_mode(mut self, mode: CountMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the bounds used by adaptive and interval modes.
    #[must_use]
    pub fn with_frame_bounds(mut self, min_frames: u32, max_frames: u32) -> Self {
        self.min_frames = min_frames;
        self.max_frames = max_frames;
        self
    }

    /// Set the spacing used by interval mode, in seconds.
    #[must_use]
    pub fn with_interval(mut self, seconds: f64) -> Self {
        self.interval_seconds = seconds;
        self
    }

    /// Score only the last frame of every run of `skip` frames.
    ///
    /// `1` scores every frame.
    #[must_use]
    pub fn with_frame_skip(mut self, skip: u32) -> Self {
        self.frame_skip = skip;
        self
    }

    /// Set the output resolution.
    #[must_use]
    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set the payload encoding.
    #[must_use]
    pub fn with_encoding(mut self, encoding: PayloadEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Write every keyframe as a JPEG into `directory`.
    ///
    /// The directory is created if needed.
    #[must_use]
    pub fn with_persist_dir<P: AsRef<Path>>(mut self, directory: P) -> Self {
        self.persist_dir = Some(directory.as_ref().to_path_buf());
        self
    }

    /// Set the JPEG quality (1–100) used for base64 payloads and persisted files.
    #[must_use]
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    /// Set the change metric used to score consecutive sampled frames.
    #[must_use]
    pub fn with_metric(mut self, metric: ChangeMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Set how often the progress callback fires (every N items).
    ///
    /// Clamped to a minimum of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Requested keyframe count.
    pub fn frame_count(&self) -> FrameCount {
        self.frame_count
    }

    /// Count resolution mode.
    pub fn mode(&self) -> CountMode {
        self.mode
    }

    /// `(min_frames, max_frames)`.
    pub fn frame_bounds(&self) -> (u32, u32) {
        (self.min_frames, self.max_frames)
    }

    /// Interval-mode spacing in seconds.
    pub fn interval_seconds(&self) -> f64 {
        self.interval_seconds
    }

    /// Sampling stride.
    pub fn frame_skip(&self) -> u32 {
        self.frame_skip
    }

    /// Output resolution.
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Payload encoding.
    pub fn encoding(&self) -> PayloadEncoding {
        self.encoding
    }

    /// Directory keyframes are written to, if persisting.
    pub fn persist_dir(&self) -> Option<&Path> {
        self.persist_dir.as_deref()
    }

    /// JPEG quality.
    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    /// Change metric.
    pub fn metric(&self) -> ChangeMetric {
        self.metric
    }

    /// Check the configuration for values no extraction could honour.
    ///
    /// # Errors
    ///
    /// - [`FramepickError::InvalidFrameSkip`] for a zero stride.
    /// - [`FramepickError::InvalidFrameBounds`] if `min_frames` is zero or
    ///   above `max_frames`.
    /// - [`FramepickError::InvalidInterval`] for a non-positive interval in
    ///   interval mode.
    /// - [`FramepickError::InvalidFrameCount`] for `Auto` or `Fixed(0)` in
    ///   fixed mode.
    /// - [`FramepickError::InvalidResolution`] for an exact size with a zero
    ///   dimension.
    /// - [`FramepickError::InvalidOption`] for a JPEG quality outside 1–100.
    pub fn validate(&self) -> Result<(), FramepickError> {
        if self.frame_skip == 0 {
            return Err(FramepickError::InvalidFrameSkip);
        }
        if self.min_frames == 0 || self.min_frames > self.max_frames {
            return Err(FramepickError::InvalidFrameBounds {
                min: self.min_frames,
                max: self.max_frames,
            });
        }
        if self.mode == CountMode::Interval
            && !(self.interval_seconds.is_finite() && self.interval_seconds > 0.0)
        {
            return Err(FramepickError::InvalidInterval(self.interval_seconds));
        }
        if self.mode == CountMode::Fixed {
            match self.frame_count {
                FrameCount::Fixed(0) => {
                    return Err(FramepickError::InvalidFrameCount(
                        "fixed mode needs at least one keyframe".to_string(),
                    ));
                }
                FrameCount::Auto => {
                    return Err(FramepickError::InvalidFrameCount(
                        "\"auto\" requires adaptive or interval mode".to_string(),
                    ));
                }
                FrameCount::Fixed(_) => {}
            }
        }
        if let Resolution::Exact(width, height) = self.resolution {
            if width == 0 || height == 0 {
                return Err(FramepickError::InvalidResolution(format!(
                    "{width}x{height}"
                )));
            }
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(FramepickError::InvalidOption(format!(
                "JPEG quality {} is outside 1-100",
                self.jpeg_quality
            )));
        }
        Ok(())
    }
}
