//! # framepick
//!
//! Pick a small, representative set of keyframes from a video.
//!
//! `framepick` samples a video's decoded frames, scores how much each sampled
//! frame differs from the one before it, decides how many keyframes the video
//! deserves, and keeps the most distinct frames. The chosen frames come back
//! in timestamp order, resized and encoded for transport. Decoding is done by
//! FFmpeg via the [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate.
//!
//! ## Quick Start
//!
//! ### Fixed number of keyframes
//!
//! ```no_run
//! use framepick::{ExtractionConfig, FrameCount, extract_keyframes_from_path};
//!
//! let config = ExtractionConfig::new().with_frame_count(FrameCount::Fixed(6));
//! let result = extract_keyframes_from_path("input.mp4", &config).unwrap();
//! for keyframe in &result.keyframes {
//!     println!("{:.2}s  score {:.1}", keyframe.timestamp.as_secs_f64(), keyframe.change_score);
//! }
//! ```
//!
//! ### Let the duration decide
//!
//! ```no_run
//! use framepick::{
//!     CountMode, ExtractionConfig, FrameCount, PayloadEncoding, Resolution,
//!     extract_keyframes_from_path,
//! };
//!
//! let config = ExtractionConfig::new()
//!     .with_frame_count(FrameCount::Auto)
//!     .with_mode(CountMode::Adaptive)
//!     .with_frame_bounds(3, 12)
//!     .with_frame_skip(5)
//!     .with_resolution(Resolution::P720)
//!     .with_encoding(PayloadEncoding::Base64);
//! let result = extract_keyframes_from_path("input.mp4", &config).unwrap();
//! println!("{}", result.to_json().unwrap());
//! ```
//!
//! ### Bring your own decoder
//!
//! Anything implementing [`FrameSource`] can be fed to [`extract_keyframes`].
//! [`InMemorySource`] wraps frames decoded elsewhere.
//!
//! ## Features
//!
//! - **Stride sampling**: score every frame, or only the last of every run
//!   of `N` frames
//! - **Change metrics**: pixel delta, histogram distance, or perceptual hash
//! - **Count policies**: fixed `K`, one keyframe per interval, or a
//!   duration-adaptive count within bounds
//! - **Normalization**: named resolutions (360p to 1080p) or exact sizes, raw
//!   RGB or base64 JPEG payloads, optional JPEG files on disk
//! - **Location resolution**: local paths, plus a size-bounded download cache
//!   for remote videos behind a pluggable fetcher
//! - **Progress callbacks** for scoring and normalization
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `rayon` (default) | Parallel normalization and [`extract_batch`] |
//! | `async` | [`ExtractionFuture`] for awaiting extraction via Tokio |
//! | `full` | Enables all of the above |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

#[cfg(feature = "rayon")]
pub mod batch;
pub mod config;
pub mod decoder;
pub mod error;
pub mod extractor;
pub mod frame;
pub mod locator;
pub mod normalizer;
pub mod progress;
pub mod result;
pub mod sampler;
pub mod scorer;
pub mod selector;
pub mod source;
#[cfg(feature = "async")]
pub mod stream;
pub mod target;

#[cfg(feature = "rayon")]
pub use batch::{BatchOutcome, extract_batch, extract_batch_locations};
pub use config::{CountMode, ExtractionConfig, FrameCount, PayloadEncoding, Resolution};
pub use decoder::{DecoderLogLevel, VideoFileSource, set_decoder_log_level};
pub use error::{ErrorCategory, FramepickError};
pub use extractor::{
    KeyframeExtractor, extract_keyframes, extract_keyframes_from_location,
    extract_keyframes_from_path,
};
pub use frame::Frame;
pub use locator::{
    LocalLocator, StorageKind, VideoCache, VideoFetcher, VideoLocator, is_remote_url,
};
pub use normalizer::{KeyframePayload, KeyframeRecord, normalize_candidates, persisted_file_name};
pub use progress::{OperationType, ProgressCallback, ProgressInfo};
pub use result::ExtractionResult;
pub use sampler::{Sampler, SamplerStats};
pub use scorer::{CandidatePool, ChangeMetric, ChangeScorer, ScoredCandidate};
pub use selector::{ScoreStatistics, select_top_k};
pub use source::{FrameSource, InMemorySource};
#[cfg(feature = "async")]
pub use stream::{
    ExtractionFuture, extract_keyframes_async, extract_location_async, extract_source_async,
};
pub use target::{adaptive_frame_count, resolve_frame_count};
