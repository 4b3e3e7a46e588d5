// SPDX-License-Identifier: GPL-3.0-only

//! Pixel format conversion for raw capture buffers
//!
//! V4L2 devices deliver RGB3, YUYV or MJPG depending on the hardware; all
//! three are converted to tightly packed RGB here. Row strides may include
//! driver padding, so every converter walks the buffer row by row.

use image::RgbImage;
use tracing::debug;

/// Convert YUYV (YUV 4:2:2) to packed RGB
///
/// YUYV format: Y0 U Y1 V - each 4-byte group encodes 2 pixels.
/// Uses BT.601 coefficients for YUV to RGB conversion.
pub fn yuyv_to_rgb(data: &[u8], width: u32, height: u32, stride: u32) -> Vec<u8> {
    let w = width as usize;
    let h = height as usize;
    let stride = stride as usize;
    let mut rgb = Vec::with_capacity(w * h * 3);

    for y in 0..h {
        let row = data.get(y * stride..).unwrap_or_default();
        let mut written = 0;
        for chunk in row.chunks_exact(4) {
            let y0 = chunk[0];
            let u = chunk[1];
            let y1 = chunk[2];
            let v = chunk[3];

            for luma in [y0, y1] {
                if written >= w {
                    break;
                }
                let (r, g, b) = yuv_to_rgb(luma, u, v);
                rgb.push(r);
                rgb.push(g);
                rgb.push(b);
                written += 1;
            }
            if written >= w {
                break;
            }
        }
        // Short row from a misbehaving driver; pad with black
        while written < w {
            rgb.extend_from_slice(&[0, 0, 0]);
            written += 1;
        }
    }

    rgb
}

/// Repack an RGB3 buffer, dropping any per-row stride padding
pub fn rgb3_to_rgb(data: &[u8], width: u32, height: u32, stride: u32) -> Vec<u8> {
    let w = width as usize;
    let h = height as usize;
    let stride = stride as usize;
    let mut rgb = Vec::with_capacity(w * h * 3);

    for y in 0..h {
        let row_start = y * stride;
        let row_end = row_start + w * 3;
        if row_end <= data.len() {
            rgb.extend_from_slice(&data[row_start..row_end]);
        } else {
            rgb.resize((y + 1) * w * 3, 0);
        }
    }

    rgb
}

/// Decode an MJPEG buffer to an RGB image
///
/// Returns `None` for a corrupt frame; MJPEG streams drop the occasional
/// frame and the capture loop simply skips it.
pub fn decode_mjpeg(data: &[u8]) -> Option<RgbImage> {
    match image::load_from_memory(data) {
        Ok(img) => Some(img.to_rgb8()),
        Err(e) => {
            debug!(error = %e, "Skipping corrupt MJPEG frame");
            None
        }
    }
}

/// Convert YUV (BT.601) to RGB
pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
    let g = (y - 0.344136 * u - 0.714136 * v).clamp(0.0, 255.0) as u8;
    let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;

    (r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yuv_to_rgb_grey() {
        // Neutral chroma maps to a pure grey
        assert_eq!(yuv_to_rgb(0, 128, 128), (0, 0, 0));
        assert_eq!(yuv_to_rgb(128, 128, 128), (128, 128, 128));
        assert_eq!(yuv_to_rgb(255, 128, 128), (255, 255, 255));
    }

    #[test]
    fn test_yuyv_to_rgb_dimensions() {
        // 2x2 YUYV frame, neutral chroma, luma gradient
        let data = vec![
            10, 128, 20, 128, // row 0: Y=10, Y=20
            30, 128, 40, 128, // row 1: Y=30, Y=40
        ];
        let rgb = yuyv_to_rgb(&data, 2, 2, 4);
        assert_eq!(rgb.len(), 2 * 2 * 3);
        assert_eq!(&rgb[0..3], &[10, 10, 10]);
        assert_eq!(&rgb[3..6], &[20, 20, 20]);
        assert_eq!(&rgb[6..9], &[30, 30, 30]);
        assert_eq!(&rgb[9..12], &[40, 40, 40]);
    }

    #[test]
    fn test_rgb3_strips_stride_padding() {
        // 2x2 RGB frame with 2 bytes of padding per row
        let data = vec![
            255, 0, 0, 0, 255, 0, 9, 9, // red, green, padding
            0, 0, 255, 255, 255, 255, 9, 9, // blue, white, padding
        ];
        let rgb = rgb3_to_rgb(&data, 2, 2, 8);
        assert_eq!(rgb.len(), 12);
        assert_eq!(&rgb[0..3], &[255, 0, 0]);
        assert_eq!(&rgb[3..6], &[0, 255, 0]);
        assert_eq!(&rgb[6..9], &[0, 0, 255]);
        assert_eq!(&rgb[9..12], &[255, 255, 255]);
    }

    #[test]
    fn test_decode_mjpeg_rejects_garbage() {
        assert!(decode_mjpeg(&[0, 1, 2, 3]).is_none());
    }
}
