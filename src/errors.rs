// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the scanner

use std::fmt;

/// Result type alias using ScanError
pub type ScanResult<T> = Result<T, ScanError>;

/// Main scanner error type
#[derive(Debug)]
pub enum ScanError {
    /// Camera-related errors
    Camera(CameraError),
    /// Display or output I/O errors
    Io(std::io::Error),
}

/// Camera-specific errors
#[derive(Debug, Clone)]
pub enum CameraError {
    /// Failed to open the capture device
    OpenFailed(String),
    /// Device accepted none of the supported capture formats
    FormatNotSupported(String),
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::Camera(e) => write!(f, "Camera error: {}", e),
            ScanError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::OpenFailed(msg) => write!(f, "Failed to open device: {}", msg),
            CameraError::FormatNotSupported(msg) => {
                write!(f, "No supported capture format: {}", msg)
            }
        }
    }
}

impl std::error::Error for ScanError {}
impl std::error::Error for CameraError {}

impl From<CameraError> for ScanError {
    fn from(err: CameraError) -> Self {
        ScanError::Camera(err)
    }
}

impl From<std::io::Error> for ScanError {
    fn from(err: std::io::Error) -> Self {
        ScanError::Io(err)
    }
}
