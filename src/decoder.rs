//! FFmpeg-backed frame source.
//!
//! [`VideoFileSource`] opens a local video file, picks the best video stream,
//! and decodes it front to back. [`grab`](FrameSource::grab) only runs the
//! decoder; the RGB24 conversion through `swscale` happens in
//! [`retrieve`](FrameSource::retrieve), so frames skipped by the sampler never
//! pay for it.
//!
//! # Example
//!
//! ```no_run
//! use framepick::{FrameSource, FramepickError, VideoFileSource};
//!
//! let mut source = VideoFileSource::open("input.mp4")?;
//! println!("{:?} at {:?}", source.duration(), source.native_resolution());
//! while source.grab()? {
//!     let frame = source.retrieve()?;
//!     println!("frame {} at {:?}", frame.index(), frame.timestamp());
//! }
//! # Ok::<(), FramepickError>(())
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{
    Error as FfmpegError, Packet, Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
    util::log::Level,
};

use crate::error::FramepickError;
use crate::frame::Frame;
use crate::source::FrameSource;

/// FFmpeg's own console verbosity.
///
/// This only affects what the FFmpeg libraries print to stderr. Messages from
/// this crate go through the [`log`](https://crates.io/crates/log) facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecoderLogLevel {
    /// Print nothing.
    Quiet,
    /// Recoverable errors and worse.
    Error,
    /// Warnings and worse (FFmpeg's default).
    Warning,
    /// Informational messages.
    Info,
    /// Everything FFmpeg has to say.
    Debug,
}

impl DecoderLogLevel {
    fn to_ffmpeg_level(self) -> Level {
        match self {
            DecoderLogLevel::Quiet => Level::Quiet,
            DecoderLogLevel::Error => Level::Error,
            DecoderLogLevel::Warning => Level::Warning,
            DecoderLogLevel::Info => Level::Info,
            DecoderLogLevel::Debug => Level::Debug,
        }
    }
}

/// Set FFmpeg's console log level for the whole process.
pub fn set_decoder_log_level(level: DecoderLogLevel) {
    ffmpeg_next::util::log::set_level(level.to_ffmpeg_level());
}

/// A [`FrameSource`] that decodes a local video file with FFmpeg.
pub struct VideoFileSource {
    input_context: Input,
    decoder: VideoDecoder,
    video_stream_index: usize,
    time_base: Rational,
    start_pts: i64,
    frames_per_second: f64,
    duration: Duration,
    width: u32,
    height: u32,
    codec: String,
    path: PathBuf,
    scaler: Option<(ScalingContext, (Pixel, u32, u32))>,
    decoded_frame: VideoFrame,
    scratch_frame: VideoFrame,
    rgb_frame: VideoFrame,
    /// Index and timestamp of the frame sitting in `decoded_frame`.
    grabbed: Option<(u64, Duration)>,
    next_index: u64,
    last_timestamp: Duration,
    eof_sent: bool,
    finished: bool,
}

impl Debug for VideoFileSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoFileSource")
            .field("path", &self.path)
            .field("codec", &self.codec)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("frames_per_second", &self.frames_per_second)
            .field("duration", &self.duration)
            .field("next_index", &self.next_index)
            .finish_non_exhaustive()
    }
}

impl VideoFileSource {
    /// Open a video file for sequential decoding.
    ///
    /// Initializes FFmpeg (idempotent), opens the container, and prepares a
    /// decoder for the best video stream.
    ///
    /// # Errors
    ///
    /// Returns [`FramepickError::FileOpen`] if the file cannot be opened or
    /// its decoder cannot be created, and [`FramepickError::NoVideoStream`]
    /// if the container has no video.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FramepickError> {
        let path = path.as_ref().to_path_buf();
        log::debug!("Opening video file: {}", path.display());

        ffmpeg_next::init().map_err(|error| FramepickError::FileOpen {
            path: path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| FramepickError::FileOpen {
                path: path.clone(),
                reason: error.to_string(),
            })?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or(FramepickError::NoVideoStream)?;
        let video_stream_index = stream.index();
        let time_base = stream.time_base();
        let start_pts = match stream.start_time() {
            pts if pts == ffmpeg_next::ffi::AV_NOPTS_VALUE => 0,
            pts => pts,
        };

        let frames_per_second = rational_to_f64(stream.avg_frame_rate())
            .or_else(|| rational_to_f64(stream.rate()))
            .unwrap_or(0.0);

        // Prefer the container duration; some muxers only fill in the stream's.
        let container_micros = input_context.duration();
        let duration = if container_micros > 0 {
            Duration::from_micros(container_micros as u64)
        } else if stream.duration() > 0 && time_base.denominator() != 0 {
            Duration::try_from_secs_f64(pts_to_seconds(stream.duration(), time_base))
                .unwrap_or_default()
        } else {
            Duration::ZERO
        };

        let decoder_context =
            CodecContext::from_parameters(stream.parameters()).map_err(|error| {
                FramepickError::FileOpen {
                    path: path.clone(),
                    reason: format!("Failed to read video codec parameters: {error}"),
                }
            })?;
        let decoder =
            decoder_context
                .decoder()
                .video()
                .map_err(|error| FramepickError::FileOpen {
                    path: path.clone(),
                    reason: format!("Failed to create video decoder: {error}"),
                })?;

        let codec = decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let (width, height) = (decoder.width(), decoder.height());

        log::debug!(
            "Video stream {video_stream_index}: {codec} {width}x{height} @ {frames_per_second:.3} fps, {duration:?}"
        );

        Ok(Self {
            input_context,
            decoder,
            video_stream_index,
            time_base,
            start_pts,
            frames_per_second,
            duration,
            width,
            height,
            codec,
            path,
            scaler: None,
            decoded_frame: VideoFrame::empty(),
            scratch_frame: VideoFrame::empty(),
            rgb_frame: VideoFrame::empty(),
            grabbed: None,
            next_index: 0,
            last_timestamp: Duration::ZERO,
            eof_sent: false,
            finished: false,
        })
    }

    /// Codec name of the decoded stream (e.g. `"h264"`).
    pub fn codec(&self) -> &str {
        &self.codec
    }

    /// Path the source was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Estimated number of frames, from duration and frame rate.
    pub fn estimated_frame_count(&self) -> Option<u64> {
        (self.frames_per_second > 0.0)
            .then(|| (self.duration.as_secs_f64() * self.frames_per_second) as u64)
    }

    /// Presentation time of the frame in `decoded_frame`.
    ///
    /// Falls back to `index / fps` when the frame carries no PTS, and never
    /// goes backwards.
    fn current_timestamp(&self, index: u64) -> Duration {
        let seconds = match self
            .decoded_frame
            .pts()
            .or_else(|| self.decoded_frame.timestamp())
        {
            Some(pts) => pts_to_seconds(pts - self.start_pts, self.time_base),
            None if self.frames_per_second > 0.0 => index as f64 / self.frames_per_second,
            None => 0.0,
        };
        let timestamp = Duration::try_from_secs_f64(seconds.max(0.0)).unwrap_or_default();
        timestamp.max(self.last_timestamp)
    }
}

impl FrameSource for VideoFileSource {
    fn duration(&self) -> Duration {
        self.duration
    }

    fn native_resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn frame_rate(&self) -> Option<f64> {
        (self.frames_per_second > 0.0).then_some(self.frames_per_second)
    }

    fn grab(&mut self) -> Result<bool, FramepickError> {
        if self.finished {
            return Ok(false);
        }

        loop {
            // Drain frames the decoder has already produced. A failed receive
            // unrefs its target, so receive into scratch space and keep the
            // last grabbed frame retrievable at end of stream.
            if self.decoder.receive_frame(&mut self.scratch_frame).is_ok() {
                std::mem::swap(&mut self.decoded_frame, &mut self.scratch_frame);
                let index = self.next_index;
                let timestamp = self.current_timestamp(index);
                self.next_index += 1;
                self.last_timestamp = timestamp;
                self.grabbed = Some((index, timestamp));
                return Ok(true);
            }

            if self.eof_sent {
                self.finished = true;
                return Ok(false);
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input_context) {
                Ok(()) => {
                    if packet.stream() == self.video_stream_index {
                        self.decoder.send_packet(&packet).map_err(|error| {
                            FramepickError::FrameDecodeError(format!(
                                "packet after frame {} rejected: {error}",
                                self.next_index
                            ))
                        })?;
                    }
                }
                Err(FfmpegError::Eof) => {
                    self.decoder.send_eof()?;
                    self.eof_sent = true;
                }
                Err(error) => {
                    return Err(FramepickError::FrameDecodeError(format!(
                        "failed to read packet after frame {}: {error}",
                        self.next_index
                    )));
                }
            }
        }
    }

    fn retrieve(&mut self) -> Result<Frame, FramepickError> {
        let (index, timestamp) = self.grabbed.take().ok_or_else(|| {
            FramepickError::FrameDecodeError("no grabbed frame to retrieve".to_string())
        })?;
        let key = (
            self.decoded_frame.format(),
            self.decoded_frame.width(),
            self.decoded_frame.height(),
        );
        let (_, width, height) = key;

        let scaler = scaler_for(&mut self.scaler, key).map_err(|error| {
            FramepickError::FrameDecodeError(format!("frame {index}: {error}"))
        })?;
        scaler
            .run(&self.decoded_frame, &mut self.rgb_frame)
            .map_err(|error| {
                FramepickError::FrameDecodeError(format!("frame {index} conversion failed: {error}"))
            })?;

        let buffer = frame_to_buffer(&self.rgb_frame, width, height);
        Frame::from_rgb(width, height, buffer, timestamp, index)
    }
}

/// Return a scaler for frames of the given format and size, rebuilding it when
/// the decoded format or size changes mid-stream.
fn scaler_for(
    slot: &mut Option<(ScalingContext, (Pixel, u32, u32))>,
    key: (Pixel, u32, u32),
) -> Result<&mut ScalingContext, FfmpegError> {
    if slot.as_ref().is_none_or(|(_, existing)| *existing != key) {
        let (format, width, height) = key;
        let context = ScalingContext::get(
            format,
            width,
            height,
            Pixel::RGB24,
            width,
            height,
            ScalingFlags::BILINEAR,
        )?;
        *slot = Some((context, key));
    }
    match slot {
        Some((context, _)) => Ok(context),
        None => Err(FfmpegError::Bug),
    }
}

fn rational_to_f64(rational: Rational) -> Option<f64> {
    (rational.denominator() != 0 && rational.numerator() > 0)
        .then(|| rational.numerator() as f64 / rational.denominator() as f64)
}

/// Rescale a PTS value from stream time base to seconds.
fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

/// Copy an RGB24 plane into a tightly-packed buffer, dropping row padding.
fn frame_to_buffer(video_frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_bytes = (width as usize) * 3;
    let data = video_frame.data(0);

    if stride == row_bytes {
        data[..row_bytes * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(row_bytes * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + row_bytes]);
        }
        buffer
    }
}
