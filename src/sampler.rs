//! Stride-based frame sampling.
//!
//! The [`Sampler`] decides which decoded frames get scored. The first frame of
//! the stream is always emitted so scoring has a baseline. After that the
//! stream is consumed in runs of `stride` frames, and only the last frame of
//! each run is converted and emitted; the others are grabbed and dropped. A
//! run cut short by the end of the stream still emits its last frame.
//!
//! With ten frames `0..=9`:
//!
//! | stride | emitted |
//! |--------|---------------|
//! | 1 | 0 1 2 3 4 5 6 7 8 9 |
//! | 3 | 0 3 6 9 |
//! | 4 | 0 4 8 9 |
//!
//! Frames that fail to decode or convert are skipped and counted in
//! [`SamplerStats`]; they do not end the run. After 16 unreadable frames in a row the stream
//! is treated as ended.

use crate::error::FramepickError;
use crate::frame::Frame;
use crate::source::FrameSource;

/// Consecutive read failures after which the stream is treated as ended.
const MAX_CONSECUTIVE_FAILURES: u32 = 16;

/// Counters describing what the sampler read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SamplerStats {
    /// Frames successfully advanced past in the source.
    pub frames_read: u64,
    /// Frames emitted for scoring.
    pub frames_sampled: u64,
    /// Frames skipped because they could not be decoded or converted.
    pub frames_failed: u64,
}

/// Pull-based cursor over a [`FrameSource`] that emits one frame per stride run.
pub struct Sampler<S: FrameSource> {
    source: S,
    stride: u64,
    /// Frames grabbed so far in the current run.
    position: u64,
    baseline_done: bool,
    exhausted: bool,
    failed_grabs: u32,
    failed_retrieves: u32,
    stats: SamplerStats,
}

impl<S: FrameSource> Sampler<S> {
    /// Wrap `source`, emitting the last frame of every run of `stride` frames.
    ///
    /// # Errors
    ///
    /// Returns [`FramepickError::InvalidFrameSkip`] if `stride` is zero.
    pub fn new(source: S, stride: u32) -> Result<Self, FramepickError> {
        if stride == 0 {
            return Err(FramepickError::InvalidFrameSkip);
        }
        log::debug!("Sampling with stride {stride}");
        Ok(Self {
            source,
            stride: u64::from(stride),
            position: 0,
            baseline_done: false,
            exhausted: false,
            failed_grabs: 0,
            failed_retrieves: 0,
            stats: SamplerStats::default(),
        })
    }

    /// What has been read so far.
    pub fn stats(&self) -> SamplerStats {
        self.stats
    }

    /// The wrapped source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Consume the sampler and return the wrapped source.
    pub fn into_source(self) -> S {
        self.source
    }

    /// Advance one frame. `Ok(false)` at end of stream.
    fn grab(&mut self) -> Option<bool> {
        loop {
            match self.source.grab() {
                Ok(true) => {
                    self.stats.frames_read += 1;
                    self.failed_grabs = 0;
                    return Some(true);
                }
                Ok(false) => return Some(false),
                Err(error) => {
                    self.stats.frames_failed += 1;
                    self.failed_grabs += 1;
                    if !self.note_failure(&error, self.failed_grabs) {
                        return None;
                    }
                }
            }
        }
    }

    /// Record a failure that is the `streak`-th in a row. Returns `false`
    /// once the failure budget is spent.
    fn note_failure(&mut self, error: &FramepickError, streak: u32) -> bool {
        log::warn!("Skipping unreadable frame: {error}");
        if streak >= MAX_CONSECUTIVE_FAILURES {
            log::warn!("Giving up after {streak} consecutive unreadable frames");
            self.exhausted = true;
            return false;
        }
        true
    }

    fn retrieve(&mut self) -> Option<Frame> {
        match self.source.retrieve() {
            Ok(frame) => {
                self.failed_retrieves = 0;
                self.stats.frames_sampled += 1;
                Some(frame)
            }
            Err(error) => {
                self.stats.frames_failed += 1;
                self.failed_retrieves += 1;
                self.note_failure(&error, self.failed_retrieves);
                None
            }
        }
    }

    /// Emit the next sampled frame, or `None` at end of stream.
    pub fn next_sample(&mut self) -> Option<Frame> {
        while !self.exhausted {
            if !self.baseline_done {
                self.baseline_done = true;
                match self.grab() {
                    Some(true) => match self.retrieve() {
                        Some(frame) => return Some(frame),
                        None => continue,
                    },
                    _ => {
                        self.exhausted = true;
                        return None;
                    }
                }
            }

            // Advance through one run; `position` counts grabbed frames in it.
            self.position = 0;
            while self.position < self.stride {
                match self.grab() {
                    Some(true) => self.position += 1,
                    _ => {
                        self.exhausted = true;
                        break;
                    }
                }
            }

            if self.position == 0 {
                return None;
            }
            // A full run, or the tail of a partial one.
            if let Some(frame) = self.retrieve() {
                return Some(frame);
            }
        }
        None
    }
}

impl<S: FrameSource> Iterator for Sampler<S> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        self.next_sample()
    }
}
