// SPDX-License-Identifier: GPL-3.0-only

//! Camera frame acquisition
//!
//! Frames are delivered as packed RGB rasters regardless of what the device
//! produces; format conversion happens at capture time so every downstream
//! consumer (detector, overlay, display) works on the same representation.

pub mod convert;
pub mod v4l2;

use image::RgbImage;
use std::time::Instant;

pub use v4l2::V4l2Camera;

/// A single frame from the camera
///
/// Owned exclusively by the current loop iteration; the overlay draws onto
/// `image` in place before display.
#[derive(Debug, Clone)]
pub struct CameraFrame {
    /// Packed RGB pixel data
    pub image: RgbImage,
    /// Frame sequence number reported by the driver (0 for synthetic frames)
    pub sequence: u32,
    /// Timestamp when the frame was captured
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Create a frame from an RGB image
    pub fn new(image: RgbImage) -> Self {
        Self {
            image,
            sequence: 0,
            captured_at: Instant::now(),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// A source of camera frames
///
/// `grab` blocks until a frame is available and returns `None` when the
/// stream has ended; there is no way to resume a source after that.
pub trait FrameSource {
    fn grab(&mut self) -> Option<CameraFrame>;
}
