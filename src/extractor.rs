//! The keyframe extraction pipeline.
//!
//! Frames flow through the stages in order:
//!
//! 1. [`Sampler`] picks which decoded frames are scored.
//! 2. [`ChangeScorer`] scores each sampled frame against the previous one and
//!    [`CandidatePool`] collects the results.
//! 3. [`resolve_frame_count`] turns the measured duration into `K`.
//! 4. [`select_top_k`] keeps the `K` best candidates.
//! 5. [`normalize_candidates`] resizes and encodes them.
//!
//! Scoring is strictly sequential. Normalization runs in parallel when the
//! `rayon` feature is enabled.

use std::path::Path;
use std::time::{Duration, Instant};

use crate::config::{CountMode, ExtractionConfig, FrameCount};
use crate::decoder::VideoFileSource;
use crate::error::FramepickError;
use crate::locator::VideoLocator;
use crate::normalizer::normalize_candidates;
use crate::progress::{OperationType, ProgressTracker};
use crate::result::ExtractionResult;
use crate::sampler::Sampler;
use crate::scorer::{CandidatePool, ChangeScorer};
use crate::selector::{ScoreStatistics, select_top_k};
use crate::source::FrameSource;
use crate::target::resolve_frame_count;

/// Extract keyframes from any [`FrameSource`].
///
/// # Errors
///
/// Returns a configuration error if `config` fails
/// [`ExtractionConfig::validate`]. Unreadable frames and failed keyframes
/// do not produce an `Err`; they are counted in the result. A video with no
/// readable frames or no measurable duration yields an empty result with
/// [`ExtractionResult::error`] set.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use framepick::{ExtractionConfig, Frame, InMemorySource, extract_keyframes};
///
/// let frames = (0..30u64)
///     .map(|i| {
///         let shade = if i < 15 { 20 } else { 220 };
///         let data = vec![shade; 8 * 8 * 3];
///         Frame::from_rgb(8, 8, data, Duration::from_millis(i * 100), i).unwrap()
///     })
///     .collect();
/// let source = InMemorySource::new(frames, Duration::from_secs(3));
///
/// let config = ExtractionConfig::new().with_frame_count(framepick::FrameCount::Fixed(2));
/// let result = extract_keyframes(source, &config).unwrap();
/// let indices: Vec<u64> = result.keyframes.iter().map(|k| k.index).collect();
/// assert_eq!(indices, vec![0, 15]);
/// ```
pub fn extract_keyframes<S: FrameSource>(
    source: S,
    config: &ExtractionConfig,
) -> Result<ExtractionResult, FramepickError> {
    config.validate()?;
    let started = Instant::now();

    let original_resolution = source.native_resolution();
    let reported_duration = source.duration();
    let frame_rate = source.frame_rate().filter(|fps| fps.is_finite() && *fps > 0.0);

    let mut sampler = Sampler::new(source, config.frame_skip)?;
    let mut scorer = ChangeScorer::new(config.metric);
    let mut pool = CandidatePool::new(retention_capacity(config));
    let mut tracker = ProgressTracker::new(
        config.progress.clone(),
        OperationType::Scoring,
        estimated_samples(reported_duration, frame_rate, config.frame_skip),
        config.batch_size,
    );

    let mut last_timestamp = Duration::ZERO;
    for frame in sampler.by_ref() {
        let score = scorer.score(&frame);
        tracker.advance(Some(frame.index()), Some(frame.timestamp()));
        last_timestamp = last_timestamp.max(frame.timestamp());
        pool.push(frame, score);
    }
    tracker.finish();
    let stats = sampler.stats();

    let mut result = ExtractionResult {
        keyframes: Vec::new(),
        video_duration: 0.0,
        original_resolution,
        output_resolution: config
            .resolution
            .target_dimensions(original_resolution.0, original_resolution.1),
        total_frames_analyzed: stats.frames_sampled,
        total_frames_read: stats.frames_read,
        calculated_frame_count: 0,
        mode: config.mode,
        statistics: ScoreStatistics::default(),
        skipped_frames: stats.frames_failed,
        failed_frames: 0,
        error: None,
    };

    if pool.is_empty() {
        log::warn!("No frames could be read from the video");
        result.error = Some("video contains no readable frames".to_string());
        return Ok(result);
    }

    let duration = measured_duration(reported_duration, last_timestamp, frame_rate);
    result.video_duration = duration.as_secs_f64();

    let candidates = pool.finish();
    result.statistics = ScoreStatistics::from_candidates(&candidates);

    let frame_count = resolve_frame_count(config, duration);
    log::debug!(
        "Resolved {frame_count} keyframes ({} mode, {:.3}s)",
        config.mode,
        result.video_duration
    );
    result.calculated_frame_count = frame_count;
    if frame_count == 0 {
        log::warn!("Video duration is zero; returning no keyframes");
        result.error = Some("video duration is zero".to_string());
        return Ok(result);
    }

    let selected = select_top_k(candidates, frame_count as usize);
    result.keyframes = normalize_candidates(selected, config);
    result.failed_frames = result
        .keyframes
        .iter()
        .filter(|record| !record.is_ok())
        .count() as u64;

    log::info!(
        "Extracted {} keyframes from {} scored frames in {:.2?}",
        result.keyframes.len(),
        result.total_frames_analyzed,
        started.elapsed()
    );
    Ok(result)
}

/// Open the video at `path` and extract keyframes from it.
///
/// # Errors
///
/// Returns [`FramepickError::FileOpen`] or [`FramepickError::NoVideoStream`]
/// if the file cannot be decoded, and any error of [`extract_keyframes`].
pub fn extract_keyframes_from_path<P: AsRef<Path>>(
    path: P,
    config: &ExtractionConfig,
) -> Result<ExtractionResult, FramepickError> {
    config.validate()?;
    let source = VideoFileSource::open(path)?;
    extract_keyframes(source, config)
}

/// Resolve `location` through `locator` and extract keyframes from the
/// resulting local file.
///
/// # Errors
///
/// Returns whatever the locator reports, then any error of
/// [`extract_keyframes_from_path`].
pub fn extract_keyframes_from_location<L: VideoLocator + ?Sized>(
    locator: &L,
    location: &str,
    config: &ExtractionConfig,
) -> Result<ExtractionResult, FramepickError> {
    config.validate()?;
    let path = locator.resolve_to_local_path(location)?;
    log::debug!("Resolved {location} to {}", path.display());
    extract_keyframes_from_path(path, config)
}

/// A reusable extractor bound to one configuration.
///
/// # Example
///
/// ```no_run
/// use framepick::{CountMode, ExtractionConfig, FrameCount, KeyframeExtractor};
///
/// let extractor = KeyframeExtractor::new(
///     ExtractionConfig::new()
///         .with_frame_count(FrameCount::Auto)
///         .with_mode(CountMode::Adaptive),
/// )
/// .unwrap();
///
/// for path in ["a.mp4", "b.mp4"] {
///     let result = extractor.extract_path(path).unwrap();
///     println!("{path}: {} keyframes", result.keyframes.len());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct KeyframeExtractor {
    config: ExtractionConfig,
}

impl KeyframeExtractor {
    /// Create an extractor after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error found.
    pub fn new(config: ExtractionConfig) -> Result<Self, FramepickError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration in use.
    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// See [`extract_keyframes`].
    pub fn extract<S: FrameSource>(&self, source: S) -> Result<ExtractionResult, FramepickError> {
        extract_keyframes(source, &self.config)
    }

    /// See [`extract_keyframes_from_path`].
    pub fn extract_path<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<ExtractionResult, FramepickError> {
        extract_keyframes_from_path(path, &self.config)
    }

    /// See [`extract_keyframes_from_location`].
    pub fn extract_location<L: VideoLocator + ?Sized>(
        &self,
        locator: &L,
        location: &str,
    ) -> Result<ExtractionResult, FramepickError> {
        extract_keyframes_from_location(locator, location, &self.config)
    }
}

/// How many candidates can possibly be selected, and so must keep rasters.
fn retention_capacity(config: &ExtractionConfig) -> usize {
    match (config.mode, config.frame_count) {
        (CountMode::Fixed, FrameCount::Fixed(count)) => count as usize,
        _ => config.max_frames as usize,
    }
}

fn estimated_samples(duration: Duration, frame_rate: Option<f64>, stride: u32) -> Option<u64> {
    let fps = frame_rate?;
    let seconds = duration.as_secs_f64();
    if seconds <= 0.0 {
        return None;
    }
    let frames = (seconds * fps).ceil() as u64;
    Some(1 + frames.saturating_sub(1).div_ceil(u64::from(stride.max(1))))
}

/// The reported duration, or the last sampled timestamp plus one frame
/// period when the source reports none.
fn measured_duration(
    reported: Duration,
    last_timestamp: Duration,
    frame_rate: Option<f64>,
) -> Duration {
    if !reported.is_zero() {
        return reported;
    }
    let period = frame_rate
        .and_then(|fps| Duration::try_from_secs_f64(1.0 / fps).ok())
        .unwrap_or_default();
    let measured = last_timestamp + period;
    if !measured.is_zero() {
        log::debug!(
            "Container reports no duration; using {:.3}s from sampled frames",
            measured.as_secs_f64()
        );
    }
    measured
}
