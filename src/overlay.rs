// SPDX-License-Identifier: GPL-3.0-only

//! Polygon annotation drawn onto frames

use crate::detector::Detection;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;

/// Outline color for detected codes
pub const OUTLINE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Outline stroke width in pixels
pub const STROKE_WIDTH: i32 = 3;

/// Draw a closed outline over every detection, in place
///
/// Corner coordinates are rounded to integers before drawing. Polygons with
/// fewer than two corners are ignored.
pub fn draw_detections(image: &mut RgbImage, detections: &[Detection]) {
    for detection in detections {
        draw_polygon(image, &detection.corners);
    }
}

fn draw_polygon(image: &mut RgbImage, corners: &[(f32, f32)]) {
    if corners.len() < 2 {
        return;
    }

    let points: Vec<(i32, i32)> = corners
        .iter()
        .map(|&(x, y)| (x.round() as i32, y.round() as i32))
        .collect();

    for i in 0..points.len() {
        let start = points[i];
        let end = points[(i + 1) % points.len()];
        draw_thick_segment(image, start, end);
    }
}

/// Draw a line segment with STROKE_WIDTH thickness
///
/// imageproc only draws 1px segments, so the stroke is built by offsetting
/// the segment over the surrounding pixel neighborhood.
fn draw_thick_segment(image: &mut RgbImage, start: (i32, i32), end: (i32, i32)) {
    let half = STROKE_WIDTH / 2;
    for dy in -half..=half {
        for dx in -half..=half {
            draw_line_segment_mut(
                image,
                ((start.0 + dx) as f32, (start.1 + dy) as f32),
                ((end.0 + dx) as f32, (end.1 + dy) as f32),
                OUTLINE_COLOR,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::Detection;

    fn green_pixel_count(image: &RgbImage) -> usize {
        image.pixels().filter(|p| **p == OUTLINE_COLOR).count()
    }

    #[test]
    fn test_draws_closed_outline() {
        let mut image = RgbImage::new(64, 64);
        let detection = Detection {
            payload: "test".to_string(),
            corners: vec![(10.0, 10.0), (50.0, 10.0), (50.0, 50.0), (10.0, 50.0)],
        };
        draw_detections(&mut image, &[detection]);

        // All four edges present
        assert_eq!(image.get_pixel(30, 10), &OUTLINE_COLOR); // top
        assert_eq!(image.get_pixel(30, 50), &OUTLINE_COLOR); // bottom
        assert_eq!(image.get_pixel(10, 30), &OUTLINE_COLOR); // left
        assert_eq!(image.get_pixel(50, 30), &OUTLINE_COLOR); // right

        // Outline only, not a filled polygon
        assert_eq!(image.get_pixel(30, 30), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_stroke_is_thicker_than_one_pixel() {
        let mut image = RgbImage::new(64, 64);
        let detection = Detection {
            payload: String::new(),
            corners: vec![(10.0, 10.0), (50.0, 10.0), (50.0, 50.0), (10.0, 50.0)],
        };
        draw_detections(&mut image, &[detection]);

        // Rows adjacent to the top edge are painted too
        assert_eq!(image.get_pixel(30, 9), &OUTLINE_COLOR);
        assert_eq!(image.get_pixel(30, 11), &OUTLINE_COLOR);
    }

    #[test]
    fn test_fractional_corners_are_rounded() {
        let mut image = RgbImage::new(32, 32);
        let detection = Detection {
            payload: String::new(),
            corners: vec![(5.4, 5.4), (20.6, 5.4), (20.6, 20.6), (5.4, 20.6)],
        };
        draw_detections(&mut image, &[detection]);
        assert_eq!(image.get_pixel(12, 5), &OUTLINE_COLOR);
    }

    #[test]
    fn test_empty_and_degenerate_polygons_are_ignored() {
        let mut image = RgbImage::new(32, 32);
        let detections = [
            Detection {
                payload: String::new(),
                corners: vec![],
            },
            Detection {
                payload: String::new(),
                corners: vec![(5.0, 5.0)],
            },
        ];
        draw_detections(&mut image, &detections);
        assert_eq!(green_pixel_count(&image), 0);
    }
}
