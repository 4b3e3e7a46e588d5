// SPDX-License-Identifier: GPL-3.0-only

//! QR code detection
//!
//! Detection and decoding are delegated to the rqrr crate. Frames are
//! converted to grayscale and downscaled before detection, and corner
//! coordinates are scaled back to full-frame space afterwards.

use crate::camera::CameraFrame;
use image::imageops::{self, FilterType};
use tracing::{debug, trace};

/// A detected QR code: decoded payload plus boundary polygon
///
/// `payload` is empty for a code that was located but could not be decoded.
/// `corners` holds the polygon corner points in image coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub payload: String,
    pub corners: Vec<(f32, f32)>,
}

/// Per-frame detection output
///
/// Pairing each payload with its polygon keeps the two sequences the same
/// length by construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionResult {
    pub detections: Vec<Detection>,
}

impl DetectionResult {
    /// True when at least one code (decoded or not) was found
    pub fn found(&self) -> bool {
        !self.detections.is_empty()
    }
}

/// Capability to locate and decode QR codes within a frame
pub trait Detector {
    fn detect(&mut self, frame: &CameraFrame) -> DetectionResult;
}

/// QR code detector backed by rqrr
///
/// Optimized for real-time processing with frame downscaling.
pub struct QrDetector {
    /// Maximum dimension for processing (frames are downscaled to this)
    max_dimension: u32,
}

impl Default for QrDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl QrDetector {
    /// Create a new QR detector with default settings
    pub fn new() -> Self {
        Self {
            // Process at 640px max for better performance
            // QR codes are typically large enough to be detected at this resolution
            max_dimension: 640,
        }
    }

    /// Create a QR detector with custom max dimension
    pub fn with_max_dimension(max_dimension: u32) -> Self {
        Self { max_dimension }
    }
}

impl Detector for QrDetector {
    fn detect(&mut self, frame: &CameraFrame) -> DetectionResult {
        let start = std::time::Instant::now();
        let width = frame.width();
        let height = frame.height();
        if width == 0 || height == 0 {
            return DetectionResult::default();
        }

        let gray = imageops::grayscale(&frame.image);

        let (gray, scale) = if width.max(height) > self.max_dimension {
            let scale = width.max(height) as f32 / self.max_dimension as f32;
            let new_width = ((width as f32 / scale) as u32).max(1);
            let new_height = ((height as f32 / scale) as u32).max(1);
            (
                imageops::resize(&gray, new_width, new_height, FilterType::Triangle),
                scale,
            )
        } else {
            (gray, 1.0)
        };

        let mut prepared = rqrr::PreparedImage::prepare(gray);
        let grids = prepared.detect_grids();

        trace!(
            count = grids.len(),
            detection_ms = start.elapsed().as_millis(),
            "QR detection complete"
        );

        let mut detections = Vec::with_capacity(grids.len());
        for grid in grids {
            let corners: Vec<(f32, f32)> = grid
                .bounds
                .iter()
                .map(|p| (p.x as f32 * scale, p.y as f32 * scale))
                .collect();

            // A grid that fails error correction still counts as detected;
            // it just carries no payload.
            let payload = match grid.decode() {
                Ok((_meta, content)) => {
                    debug!(content = %content, "Decoded QR code");
                    content
                }
                Err(e) => {
                    debug!(error = %e, "Failed to decode QR code");
                    String::new()
                }
            };

            detections.push(Detection { payload, corners });
        }

        DetectionResult { detections }
    }
}
