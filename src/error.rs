//! Error types for the `framepick` crate.
//!
//! This module defines [`FramepickError`], the unified error type returned by
//! all fallible operations in the crate. Errors carry enough context (paths,
//! offending values, upstream messages) to diagnose a failure without extra
//! logging at the call site.
//!
//! Not every error ends an extraction run. [`FramepickError::category`] tells
//! the two apart: input, configuration, and internal errors are fatal for the
//! whole call, while scoring and normalization errors are confined to a single
//! frame and are only counted or recorded on the affected keyframe.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// Broad classification of a [`FramepickError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The video could not be opened, located, or read. Fatal.
    Input,
    /// The [`ExtractionConfig`](crate::ExtractionConfig) is invalid. Fatal.
    Config,
    /// A single frame could not be decoded for scoring. The frame is skipped.
    Scoring,
    /// A selected keyframe could not be resized, encoded, or written. The
    /// failure is recorded on that keyframe only.
    Normalization,
    /// The library itself failed: a worker crashed or a result could not be
    /// serialized. Fatal, and unrelated to the video or the configuration.
    Internal,
}

/// The unified error type for all `framepick` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FramepickError {
    /// The video file could not be opened.
    #[error("Failed to open video at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to the opener.
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// The location cannot be resolved by the configured locator.
    #[error("Unsupported video location: {0}")]
    UnsupportedLocation(String),

    /// Fetching a remote video into the local cache failed.
    #[error("Failed to fetch {location}: {reason}")]
    FetchFailed {
        /// The remote location that was requested.
        location: String,
        /// Reason reported by the fetcher.
        reason: String,
    },

    /// The requested keyframe count is not usable in the selected mode.
    #[error("Invalid keyframe count: {0}")]
    InvalidFrameCount(String),

    /// The interval between keyframes must be a positive, finite number of seconds.
    #[error("Interval must be a positive number of seconds (got {0})")]
    InvalidInterval(f64),

    /// `min_frames` must be at least 1 and not larger than `max_frames`.
    #[error("Invalid frame bounds: min_frames ({min}) must be between 1 and max_frames ({max})")]
    InvalidFrameBounds {
        /// Configured lower bound.
        min: u32,
        /// Configured upper bound.
        max: u32,
    },

    /// A frame skip (stride) of zero was provided.
    #[error("Frame skip must be at least 1")]
    InvalidFrameSkip,

    /// The output resolution is malformed or has a zero dimension.
    #[error("Invalid resolution: {0}")]
    InvalidResolution(String),

    /// A textual option could not be parsed.
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// A video frame could not be decoded or converted.
    #[error("Failed to decode video frame: {0}")]
    FrameDecodeError(String),

    /// A selected candidate no longer holds its raster.
    #[error("Frame {index} was not retained for output")]
    FrameNotRetained {
        /// Stream index of the candidate.
        index: u64,
    },

    /// An error from the `image` crate during resizing or encoding.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// A background extraction task panicked or was aborted.
    #[error("Extraction task failed: {0}")]
    WorkerFailed(String),

    /// A result could not be serialized to JSON.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FramepickError {
    /// Classify this error.
    ///
    /// Raw FFmpeg and I/O errors count as input errors: they surface when the
    /// container or the filesystem cannot be read.
    pub fn category(&self) -> ErrorCategory {
        match self {
            FramepickError::FileOpen { .. }
            | FramepickError::NoVideoStream
            | FramepickError::UnsupportedLocation(_)
            | FramepickError::FetchFailed { .. }
            | FramepickError::FfmpegError(_)
            | FramepickError::IoError(_) => ErrorCategory::Input,
            FramepickError::InvalidFrameCount(_)
            | FramepickError::InvalidInterval(_)
            | FramepickError::InvalidFrameBounds { .. }
            | FramepickError::InvalidFrameSkip
            | FramepickError::InvalidResolution(_)
            | FramepickError::InvalidOption(_) => ErrorCategory::Config,
            FramepickError::FrameDecodeError(_) => ErrorCategory::Scoring,
            FramepickError::FrameNotRetained { .. } | FramepickError::ImageError(_) => {
                ErrorCategory::Normalization
            }
            FramepickError::WorkerFailed(_) | FramepickError::Serialization(_) => {
                ErrorCategory::Internal
            }
        }
    }

    /// Returns `true` if this error aborts a whole extraction call.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Input | ErrorCategory::Config | ErrorCategory::Internal
        )
    }
}

impl From<FfmpegError> for FramepickError {
    fn from(error: FfmpegError) -> Self {
        FramepickError::FfmpegError(error.to_string())
    }
}
