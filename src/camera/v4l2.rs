// SPDX-License-Identifier: GPL-3.0-only

//! Direct V4L2 camera capture
//!
//! Uses the v4l crate to capture raw buffers from a capture device and
//! convert them to RGB frames. A dedicated capture thread owns the device
//! and streams frames over a bounded channel; dropping the camera closes
//! the channel and lets the thread release the device.

use super::convert;
use super::{CameraFrame, FrameSource};
use crate::errors::CameraError;
use image::RgbImage;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use v4l::buffer::Type;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;

/// Capture formats supported by the conversion path, in preference order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaptureFormat {
    Rgb3,
    Yuyv,
    Mjpg,
}

impl CaptureFormat {
    fn fourcc(self) -> v4l::FourCC {
        match self {
            CaptureFormat::Rgb3 => v4l::FourCC::new(b"RGB3"),
            CaptureFormat::Yuyv => v4l::FourCC::new(b"YUYV"),
            CaptureFormat::Mjpg => v4l::FourCC::new(b"MJPG"),
        }
    }
}

/// Camera source backed by a V4L2 capture device
///
/// Dropping the camera stops the capture thread and waits for it to exit,
/// which closes the device handle exactly once; the wait is bounded by a
/// single in-flight buffer read.
pub struct V4l2Camera {
    receiver: Option<Receiver<CameraFrame>>,
    running: Arc<AtomicBool>,
    thread_handle: Option<std::thread::JoinHandle<()>>,
}

impl V4l2Camera {
    /// Open `/dev/video<index>` and start streaming frames
    ///
    /// The device is opened and the format negotiated synchronously so
    /// failures surface here; the capture stream itself runs on a
    /// background thread.
    pub fn open(index: usize) -> Result<Self, CameraError> {
        let dev = Device::new(index)
            .map_err(|e| CameraError::OpenFailed(format!("/dev/video{}: {}", index, e)))?;

        let (format, kind) = negotiate_format(&dev, index)?;
        info!(
            index,
            width = format.width,
            height = format.height,
            fourcc = ?format.fourcc,
            "Opened camera"
        );

        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();
        let (sender, receiver) = sync_channel(4);

        let thread_handle = std::thread::spawn(move || {
            if let Err(e) = capture_loop(dev, format, kind, sender, running_clone) {
                error!(error = %e, "Capture loop failed");
            }
        });

        Ok(Self {
            receiver: Some(receiver),
            running,
            thread_handle: Some(thread_handle),
        })
    }
}

impl FrameSource for V4l2Camera {
    fn grab(&mut self) -> Option<CameraFrame> {
        // Blocks until the capture thread delivers a frame; Err means the
        // thread has exited and the stream is over.
        self.receiver.as_ref().and_then(|r| r.recv().ok())
    }
}

impl Drop for V4l2Camera {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        // Closing the channel first unblocks a capture thread waiting on a
        // full queue
        self.receiver.take();
        if let Some(handle) = self.thread_handle.take() {
            // The thread owns the device; joining here means the handle is
            // released by the time the camera is gone
            if handle.join().is_err() {
                warn!("Capture thread panicked");
            }
        }
    }
}

/// Try each supported fourcc until the device accepts one
fn negotiate_format(
    dev: &Device,
    index: usize,
) -> Result<(v4l::Format, CaptureFormat), CameraError> {
    for kind in [CaptureFormat::Rgb3, CaptureFormat::Yuyv, CaptureFormat::Mjpg] {
        let mut format = dev
            .format()
            .map_err(|e| CameraError::OpenFailed(format!("Failed to query format: {}", e)))?;
        format.fourcc = kind.fourcc();

        match dev.set_format(&format) {
            Ok(actual) if actual.fourcc == kind.fourcc() => return Ok((actual, kind)),
            Ok(actual) => {
                debug!(requested = ?kind.fourcc(), got = ?actual.fourcc, "Device substituted format");
            }
            Err(e) => {
                debug!(requested = ?kind.fourcc(), error = %e, "Device rejected format");
            }
        }
    }

    Err(CameraError::FormatNotSupported(format!(
        "/dev/video{} offers none of RGB3/YUYV/MJPG",
        index
    )))
}

/// Main capture loop running in a separate thread
fn capture_loop(
    mut dev: Device,
    format: v4l::Format,
    kind: CaptureFormat,
    sender: SyncSender<CameraFrame>,
    running: Arc<AtomicBool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let width = format.width;
    let height = format.height;
    // Some drivers report bytesperline as 0; fall back to a packed row
    let stride = |bytes_per_pixel: u32| {
        if format.stride == 0 {
            width * bytes_per_pixel
        } else {
            format.stride
        }
    };

    let mut stream = MmapStream::with_buffers(&mut dev, Type::VideoCapture, 4)
        .map_err(|e| format!("Failed to create buffer stream: {}", e))?;

    info!("V4L2 capture stream started");

    while running.load(Ordering::SeqCst) {
        let frame_start = Instant::now();

        let (buf, meta) = match stream.next() {
            Ok(x) => x,
            Err(e) => {
                error!(error = %e, "Capture read failed, ending stream");
                break;
            }
        };
        let sequence = meta.sequence;

        let image = match kind {
            CaptureFormat::Rgb3 => {
                RgbImage::from_raw(width, height, convert::rgb3_to_rgb(buf, width, height, stride(3)))
            }
            CaptureFormat::Yuyv => {
                RgbImage::from_raw(width, height, convert::yuyv_to_rgb(buf, width, height, stride(2)))
            }
            CaptureFormat::Mjpg => convert::decode_mjpeg(buf),
        };

        let Some(image) = image else {
            // Undecodable frame; skip it
            continue;
        };

        if sequence % 60 == 0 {
            debug!(
                sequence,
                convert_ms = frame_start.elapsed().as_millis(),
                "Captured frame"
            );
        }

        let frame = CameraFrame {
            image,
            sequence,
            captured_at: frame_start,
        };

        // Receiver gone means the scan loop has exited
        if sender.send(frame).is_err() {
            break;
        }
    }

    info!("V4L2 capture stream stopped");
    Ok(())
}
