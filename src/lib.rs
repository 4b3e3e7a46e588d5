// SPDX-License-Identifier: GPL-3.0-only

//! scan-qr - a camera QR code scanner for the terminal
//!
//! Opens a camera device, detects QR codes frame by frame, draws green
//! bounding polygons over detected codes, renders the annotated feed to the
//! terminal, and prints each newly distinct decoded payload to stdout.
//!
//! # Architecture
//!
//! - [`camera`]: V4L2 frame acquisition
//! - [`detector`]: QR detection and decoding
//! - [`overlay`]: polygon annotation drawn onto frames
//! - [`scanner`]: the scan loop tying source, detector and display together
//! - [`terminal`]: terminal display sink

pub mod camera;
pub mod detector;
pub mod errors;
pub mod overlay;
pub mod scanner;
pub mod terminal;

// Re-export commonly used types
pub use camera::{CameraFrame, FrameSource};
pub use detector::{Detection, DetectionResult, Detector, QrDetector};
pub use errors::{CameraError, ScanError, ScanResult};
pub use scanner::{DisplaySink, QUIT_KEY, ScanLoop, WINDOW_TITLE};
