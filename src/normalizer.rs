//! Keyframe normalization.
//!
//! Selected candidates are resized to the requested [`Resolution`], encoded
//! into a [`KeyframePayload`], and optionally written to disk as JPEG files.
//! Each keyframe is handled independently: a failure is recorded on that
//! [`KeyframeRecord`] and the others carry on. With the `rayon` feature the
//! keyframes are processed on the rayon thread pool.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use base64::{Engine, engine::general_purpose::STANDARD};
use image::{DynamicImage, RgbImage, codecs::jpeg::JpegEncoder, imageops::FilterType};
#[cfg(feature = "rayon")]
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::{Serialize, Serializer, ser::SerializeStruct};

use crate::config::{ExtractionConfig, PayloadEncoding, Resolution};
use crate::error::FramepickError;
use crate::progress::{OperationType, ProgressTracker};
use crate::scorer::ScoredCandidate;

impl Resolution {
    /// Height targeted by a named tag, `None` for `Original` and `Exact`.
    pub fn target_height(&self) -> Option<u32> {
        match self {
            Resolution::P360 => Some(360),
            Resolution::P480 => Some(480),
            Resolution::P720 => Some(720),
            Resolution::P1080 => Some(1080),
            Resolution::Original | Resolution::Exact(..) => None,
        }
    }

    /// Output `(width, height)` for a `width × height` source.
    ///
    /// Named tags fix the height and derive an even width from the aspect
    /// ratio. Sources already at or below the target height keep their size.
    ///
    /// ```
    /// use framepick::Resolution;
    ///
    /// assert_eq!(Resolution::P720.target_dimensions(1920, 1080), (1280, 720));
    /// assert_eq!(Resolution::P1080.target_dimensions(1280, 720), (1280, 720));
    /// assert_eq!(Resolution::Exact(64, 64).target_dimensions(1920, 1080), (64, 64));
    /// ```
    pub fn target_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        if let Resolution::Exact(target_width, target_height) = *self {
            return (target_width, target_height);
        }
        let Some(target_height) = self.target_height() else {
            return (width, height);
        };
        if width == 0 || height == 0 || height <= target_height {
            return (width, height);
        }

        let scaled = f64::from(target_height) * f64::from(width) / f64::from(height);
        let even = ((scaled / 2.0).round() * 2.0).max(2.0);
        (even as u32, target_height)
    }
}

/// Encoded pixels of one keyframe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyframePayload {
    /// Packed RGB8 bytes, row-major, no padding.
    Raw(Vec<u8>),
    /// Base64 (standard alphabet) of a JPEG file.
    Base64(String),
}

impl KeyframePayload {
    /// Length in bytes of the encoded data.
    pub fn len(&self) -> usize {
        match self {
            KeyframePayload::Raw(bytes) => bytes.len(),
            KeyframePayload::Base64(text) => text.len(),
        }
    }

    /// Returns `true` if the payload holds no data.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The base64 text, if this is a base64 payload.
    pub fn as_base64(&self) -> Option<&str> {
        match self {
            KeyframePayload::Base64(text) => Some(text),
            KeyframePayload::Raw(_) => None,
        }
    }

    /// The raw RGB8 bytes, if this is a raw payload.
    pub fn as_raw(&self) -> Option<&[u8]> {
        match self {
            KeyframePayload::Raw(bytes) => Some(bytes),
            KeyframePayload::Base64(_) => None,
        }
    }
}

// Raw buffers are summarized by length; dumping them as JSON arrays helps no one.
impl Serialize for KeyframePayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("KeyframePayload", 2)?;
        match self {
            KeyframePayload::Raw(bytes) => {
                state.serialize_field("encoding", "raw")?;
                state.serialize_field("bytes", &bytes.len())?;
            }
            KeyframePayload::Base64(text) => {
                state.serialize_field("encoding", "base64")?;
                state.serialize_field("data", text)?;
            }
        }
        state.end()
    }
}

/// One output keyframe.
#[derive(Debug, Clone, Serialize)]
pub struct KeyframeRecord {
    /// Presentation time.
    #[serde(serialize_with = "serialize_seconds")]
    pub timestamp: Duration,
    /// Position in the decoded stream.
    pub index: u64,
    /// Change score the frame was selected with.
    pub change_score: f64,
    /// `(width, height)` of the payload.
    pub resolution: (u32, u32),
    /// The encoded pixels; `None` if normalization failed.
    pub payload: Option<KeyframePayload>,
    /// Where the JPEG was written, when persisting.
    pub persisted_path: Option<PathBuf>,
    /// Why normalization failed for this keyframe.
    pub error: Option<String>,
}

impl KeyframeRecord {
    /// Length of the payload in bytes, `0` when there is none.
    pub fn payload_len(&self) -> usize {
        self.payload.as_ref().map_or(0, KeyframePayload::len)
    }

    /// Returns `true` if the keyframe was normalized without error.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

pub(crate) fn serialize_seconds<S: Serializer>(
    value: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.as_secs_f64())
}

/// A selected candidate plus its 1-based position in the output.
struct Job {
    ordinal: usize,
    candidate: ScoredCandidate,
}

/// Resize, encode, and optionally persist the selected candidates.
///
/// The returned records are in timestamp order. A candidate that fails is
/// returned with [`KeyframeRecord::error`] set and no payload.
pub fn normalize_candidates(
    candidates: Vec<ScoredCandidate>,
    config: &ExtractionConfig,
) -> Vec<KeyframeRecord> {
    let tracker = Mutex::new(ProgressTracker::new(
        config.progress.clone(),
        OperationType::Normalization,
        Some(candidates.len() as u64),
        config.batch_size,
    ));

    let jobs: Vec<Job> = candidates
        .into_iter()
        .enumerate()
        .map(|(position, candidate)| Job {
            ordinal: position + 1,
            candidate,
        })
        .collect();

    #[cfg(feature = "rayon")]
    let jobs = jobs.into_par_iter();
    #[cfg(not(feature = "rayon"))]
    let jobs = jobs.into_iter();

    let mut records: Vec<KeyframeRecord> = jobs
        .map(|job| {
            let record = normalize_one(job, config);
            if let Ok(mut tracker) = tracker.lock() {
                tracker.advance(Some(record.index), Some(record.timestamp));
            }
            record
        })
        .collect();

    records.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.index.cmp(&b.index)));

    if let Ok(mut tracker) = tracker.lock() {
        tracker.finish();
    }
    records
}

fn normalize_one(job: Job, config: &ExtractionConfig) -> KeyframeRecord {
    let Job {
        ordinal,
        mut candidate,
    } = job;
    let mut record = KeyframeRecord {
        timestamp: candidate.timestamp,
        index: candidate.index,
        change_score: candidate.change_score,
        resolution: (0, 0),
        payload: None,
        persisted_path: None,
        error: None,
    };

    let outcome = candidate
        .take_raster()
        .ok_or(FramepickError::FrameNotRetained {
            index: candidate.index,
        })
        .and_then(|raster| encode_keyframe(raster, ordinal, candidate.timestamp, config));

    match outcome {
        Ok(encoded) => {
            record.resolution = encoded.resolution;
            record.payload = Some(encoded.payload);
            record.persisted_path = encoded.persisted_path;
        }
        Err(error) => {
            log::warn!(
                "Failed to normalize keyframe {} at {:.3}s: {error}",
                candidate.index,
                candidate.timestamp.as_secs_f64()
            );
            record.error = Some(error.to_string());
        }
    }
    record
}

struct Encoded {
    resolution: (u32, u32),
    payload: KeyframePayload,
    persisted_path: Option<PathBuf>,
}

fn encode_keyframe(
    raster: DynamicImage,
    ordinal: usize,
    timestamp: Duration,
    config: &ExtractionConfig,
) -> Result<Encoded, FramepickError> {
    let (width, height) = config
        .resolution
        .target_dimensions(raster.width(), raster.height());
    let resized = if (width, height) == (raster.width(), raster.height()) {
        raster
    } else {
        raster.resize_exact(width, height, FilterType::Triangle)
    };
    let rgb = resized.to_rgb8();

    let needs_jpeg = config.encoding == PayloadEncoding::Base64 || config.persist_dir.is_some();
    let jpeg = if needs_jpeg {
        Some(encode_jpeg(&rgb, config.jpeg_quality)?)
    } else {
        None
    };

    let persisted_path = match (&config.persist_dir, &jpeg) {
        (Some(directory), Some(bytes)) => {
            Some(persist_jpeg(directory, ordinal, timestamp, bytes)?)
        }
        _ => None,
    };

    let payload = match (config.encoding, jpeg) {
        (PayloadEncoding::Base64, Some(bytes)) => KeyframePayload::Base64(STANDARD.encode(bytes)),
        _ => KeyframePayload::Raw(rgb.into_raw()),
    };

    Ok(Encoded {
        resolution: (width, height),
        payload,
        persisted_path,
    })
}

fn encode_jpeg(rgb: &RgbImage, quality: u8) -> Result<Vec<u8>, FramepickError> {
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality).encode_image(rgb)?;
    Ok(bytes)
}

/// File name of a persisted keyframe: `<ordinal>_<seconds>.jpg`.
pub fn persisted_file_name(ordinal: usize, timestamp: Duration) -> String {
    format!("{ordinal:03}_{:.3}.jpg", timestamp.as_secs_f64())
}

fn persist_jpeg(
    directory: &Path,
    ordinal: usize,
    timestamp: Duration,
    bytes: &[u8],
) -> Result<PathBuf, FramepickError> {
    fs::create_dir_all(directory)?;
    let path = directory.join(persisted_file_name(ordinal, timestamp));
    fs::write(&path, bytes)?;
    log::debug!("Wrote keyframe to {}", path.display());
    Ok(path)
}
