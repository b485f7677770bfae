//! Frame sources.
//!
//! [`FrameSource`] is the boundary between the keyframe engine and whatever
//! decodes the video. The engine only ever reads forward. Reading is split in
//! two steps, mirroring how decoders are cheapest to drive when most frames
//! are thrown away:
//!
//! 1. [`grab`](FrameSource::grab) advances past one decoded frame without
//!    converting it to RGB.
//! 2. [`retrieve`](FrameSource::retrieve) converts the most recently grabbed
//!    frame into a [`Frame`].
//!
//! [`VideoFileSource`](crate::VideoFileSource) implements this over FFmpeg.
//! [`InMemorySource`] serves frames that were decoded elsewhere and is what
//! the test-suite uses to build synthetic videos.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use crate::error::FramepickError;
use crate::frame::Frame;

/// A sequential stream of decoded frames.
pub trait FrameSource {
    /// Estimated total duration of the stream. May be [`Duration::ZERO`] when
    /// the container does not report one.
    fn duration(&self) -> Duration;

    /// Native `(width, height)` of the decoded frames.
    fn native_resolution(&self) -> (u32, u32);

    /// Average frame rate, if known.
    fn frame_rate(&self) -> Option<f64> {
        None
    }

    /// Advance to the next decoded frame.
    ///
    /// Returns `Ok(false)` once the stream is exhausted. An `Err` means this
    /// one frame was unreadable; callers may keep grabbing.
    fn grab(&mut self) -> Result<bool, FramepickError>;

    /// Convert the most recently grabbed frame.
    ///
    /// # Errors
    ///
    /// Returns [`FramepickError::FrameDecodeError`] if nothing has been
    /// grabbed yet or the frame cannot be converted.
    fn retrieve(&mut self) -> Result<Frame, FramepickError>;
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    fn duration(&self) -> Duration {
        (**self).duration()
    }

    fn native_resolution(&self) -> (u32, u32) {
        (**self).native_resolution()
    }

    fn frame_rate(&self) -> Option<f64> {
        (**self).frame_rate()
    }

    fn grab(&mut self) -> Result<bool, FramepickError> {
        (**self).grab()
    }

    fn retrieve(&mut self) -> Result<Frame, FramepickError> {
        (**self).retrieve()
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn duration(&self) -> Duration {
        (**self).duration()
    }

    fn native_resolution(&self) -> (u32, u32) {
        (**self).native_resolution()
    }

    fn frame_rate(&self) -> Option<f64> {
        (**self).frame_rate()
    }

    fn grab(&mut self) -> Result<bool, FramepickError> {
        (**self).grab()
    }

    fn retrieve(&mut self) -> Result<Frame, FramepickError> {
        (**self).retrieve()
    }
}

/// A [`FrameSource`] over frames that are already decoded.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use framepick::{Frame, FrameSource, InMemorySource};
///
/// let frames = (0..3)
///     .map(|i| {
///         let data = vec![i as u8 * 40; 4 * 4 * 3];
///         Frame::from_rgb(4, 4, data, Duration::from_millis(i * 40), i).unwrap()
///     })
///     .collect();
/// let mut source = InMemorySource::new(frames, Duration::from_millis(120));
/// assert!(source.grab().unwrap());
/// assert_eq!(source.retrieve().unwrap().index(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct InMemorySource {
    pending: VecDeque<Frame>,
    current: Option<Frame>,
    duration: Duration,
    resolution: (u32, u32),
    frame_rate: Option<f64>,
    failing: HashSet<u64>,
}

impl InMemorySource {
    /// Create a source that yields `frames` in order.
    ///
    /// The native resolution is taken from the first frame.
    pub fn new(frames: Vec<Frame>, duration: Duration) -> Self {
        let resolution = frames
            .first()
            .map(|frame| (frame.width(), frame.height()))
            .unwrap_or((0, 0));
        Self {
            pending: frames.into(),
            current: None,
            duration,
            resolution,
            frame_rate: None,
            failing: HashSet::new(),
        }
    }

    /// Report a frame rate to consumers.
    #[must_use]
    pub fn with_frame_rate(mut self, frames_per_second: f64) -> Self {
        self.frame_rate = Some(frames_per_second);
        self
    }

    /// Make [`retrieve`](FrameSource::retrieve) fail for the given frame
    /// indices, as if those frames were corrupt.
    #[must_use]
    pub fn with_failures<I: IntoIterator<Item = u64>>(mut self, indices: I) -> Self {
        self.failing.extend(indices);
        self
    }

    /// Number of frames not yet grabbed.
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl FrameSource for InMemorySource {
    fn duration(&self) -> Duration {
        self.duration
    }

    fn native_resolution(&self) -> (u32, u32) {
        self.resolution
    }

    fn frame_rate(&self) -> Option<f64> {
        self.frame_rate
    }

    fn grab(&mut self) -> Result<bool, FramepickError> {
        // At end of stream the last grabbed frame stays retrievable.
        match self.pending.pop_front() {
            Some(frame) => {
                self.current = Some(frame);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn retrieve(&mut self) -> Result<Frame, FramepickError> {
        // Each grabbed frame is handed out once.
        let frame = self.current.take().ok_or_else(|| {
            FramepickError::FrameDecodeError("no grabbed frame to retrieve".to_string())
        })?;
        if self.failing.contains(&frame.index()) {
            return Err(FramepickError::FrameDecodeError(format!(
                "frame {} is corrupt",
                frame.index()
            )));
        }
        Ok(frame)
    }
}
