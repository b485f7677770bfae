//! Decoded video frames.
//!
//! A [`Frame`] is an immutable RGB raster paired with its presentation
//! timestamp and its ordinal position in the decoded stream. Frames are moved
//! from stage to stage; no stage mutates a frame after it has been scored.

use std::time::Duration;

use image::{DynamicImage, RgbImage};

use crate::error::FramepickError;

/// A single decoded video frame.
#[derive(Debug, Clone)]
pub struct Frame {
    image: DynamicImage,
    timestamp: Duration,
    index: u64,
}

impl Frame {
    /// Wrap an already-decoded image.
    pub fn new(image: DynamicImage, timestamp: Duration, index: u64) -> Self {
        Self {
            image,
            timestamp,
            index,
        }
    }

    /// Build a frame from tightly-packed RGB24 bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FramepickError::FrameDecodeError`] if `data` does not hold
    /// exactly `width × height × 3` bytes.
    pub fn from_rgb(
        width: u32,
        height: u32,
        data: Vec<u8>,
        timestamp: Duration,
        index: u64,
    ) -> Result<Self, FramepickError> {
        let image = RgbImage::from_raw(width, height, data).ok_or_else(|| {
            FramepickError::FrameDecodeError(format!(
                "RGB buffer does not match {width}x{height} frame {index}"
            ))
        })?;
        Ok(Self::new(DynamicImage::ImageRgb8(image), timestamp, index))
    }

    /// The frame raster.
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the frame and return its raster.
    pub fn into_image(self) -> DynamicImage {
        self.image
    }

    /// Presentation timestamp.
    pub fn timestamp(&self) -> Duration {
        self.timestamp
    }

    /// Ordinal position in the decoded stream (0-based).
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }
}
