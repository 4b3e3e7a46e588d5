// SPDX-License-Identifier: GPL-3.0-only

//! The scan loop
//!
//! Repeatedly grabs a frame, runs QR detection, draws polygons over any
//! detected codes, prints newly distinct payloads, renders the frame and
//! polls for the quit key. Runs until the source ends or the user quits.

use crate::camera::{CameraFrame, FrameSource};
use crate::detector::{DetectionResult, Detector};
use crate::errors::ScanResult;
use crate::overlay;
use std::io::Write;
use std::time::Duration;
use tracing::info;

/// Title shown by the display sink
pub const WINDOW_TITLE: &str = "Video capture";

/// Key that terminates the scan loop
pub const QUIT_KEY: char = 'q';

/// Diagnostic printed when the source stops yielding frames
const NO_FRAME_DIAGNOSTIC: &str = "Error: no frame grabbed";

/// Where the annotated feed is rendered and keys are read from
pub trait DisplaySink {
    /// Render one frame
    fn show(&mut self, frame: &CameraFrame) -> ScanResult<()>;

    /// Wait up to `timeout` for a key press
    fn poll_key(&mut self, timeout: Duration) -> ScanResult<Option<char>>;
}

/// Blocking scan loop over a frame source, detector and display sink
///
/// The camera and display are owned by the loop, so both are released when
/// it is dropped regardless of how `run` exited.
pub struct ScanLoop<S, D, V> {
    source: S,
    detector: D,
    display: V,
    key_poll_timeout: Duration,
}

impl<S, D, V> ScanLoop<S, D, V>
where
    S: FrameSource,
    D: Detector,
    V: DisplaySink,
{
    pub fn new(source: S, detector: D, display: V) -> Self {
        Self {
            source,
            detector,
            display,
            // Short poll keeps the display responsive without busy-waiting
            key_poll_timeout: Duration::from_millis(1),
        }
    }

    /// Run until the source ends or the quit key is pressed
    ///
    /// Newly distinct non-empty payloads are written to `out`, one per line,
    /// in detection order. Deduplication is against the single most recently
    /// printed payload: a payload that reappears after being displaced by a
    /// different one is printed again.
    pub fn run(&mut self, out: &mut impl Write) -> ScanResult<()> {
        let mut last_item: Option<String> = None;

        loop {
            let Some(mut frame) = self.source.grab() else {
                writeln!(out, "{}", NO_FRAME_DIAGNOSTIC)?;
                out.flush()?;
                info!("Frame source ended, stopping");
                break;
            };

            let result = self.detector.detect(&frame);

            if result.found() {
                overlay::draw_detections(&mut frame.image, &result.detections);
                print_new_payloads(&result, &mut last_item, out)?;
            }

            self.display.show(&frame)?;

            if let Some(key) = self.display.poll_key(self.key_poll_timeout)?
                && key == QUIT_KEY
            {
                info!("Quit key pressed, stopping");
                break;
            }
        }

        Ok(())
    }
}

/// Print every payload that differs from the last printed one
fn print_new_payloads(
    result: &DetectionResult,
    last_item: &mut Option<String>,
    out: &mut impl Write,
) -> ScanResult<()> {
    for detection in &result.detections {
        if detection.payload.is_empty() {
            continue;
        }

        if last_item.as_deref() != Some(detection.payload.as_str()) {
            writeln!(out, "{}", detection.payload)?;
            out.flush()?;
            *last_item = Some(detection.payload.clone());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::Detection;

    fn result_of(payloads: &[&str]) -> DetectionResult {
        DetectionResult {
            detections: payloads
                .iter()
                .map(|p| Detection {
                    payload: p.to_string(),
                    corners: vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)],
                })
                .collect(),
        }
    }

    #[test]
    fn test_repeated_payload_prints_once() {
        let mut last = None;
        let mut out = Vec::new();
        print_new_payloads(&result_of(&["ABC"]), &mut last, &mut out).unwrap();
        print_new_payloads(&result_of(&["ABC"]), &mut last, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "ABC\n");
    }

    #[test]
    fn test_multiple_distinct_payloads_in_one_frame() {
        let mut last = None;
        let mut out = Vec::new();
        print_new_payloads(&result_of(&["A", "B", "A"]), &mut last, &mut out).unwrap();
        // Dedup is against the single prior value, so the second "A" prints
        assert_eq!(String::from_utf8(out).unwrap(), "A\nB\nA\n");
        assert_eq!(last.as_deref(), Some("A"));
    }

    #[test]
    fn test_empty_payloads_do_not_touch_state() {
        let mut last = Some("A".to_string());
        let mut out = Vec::new();
        print_new_payloads(&result_of(&["", ""]), &mut last, &mut out).unwrap();
        assert!(out.is_empty());
        assert_eq!(last.as_deref(), Some("A"));
    }
}
