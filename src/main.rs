// SPDX-License-Identifier: GPL-3.0-only

use clap::Parser;
use scan_qr::camera::V4l2Camera;
use scan_qr::detector::QrDetector;
use scan_qr::scanner::ScanLoop;
use scan_qr::terminal::TerminalDisplay;
use std::io::{self, Write};

#[derive(Parser)]
#[command(name = "scan-qr")]
#[command(about = "Scan QR codes from a camera feed")]
#[command(version)]
struct Cli {
    /// Camera device index (/dev/video<INDEX>)
    #[arg(short, long, default_value = "0")]
    device: usize,

    /// Maximum frame dimension used for detection processing
    #[arg(long, default_value = "640")]
    max_dimension: u32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=scan_qr=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    let camera = V4l2Camera::open(cli.device)?;
    let detector = QrDetector::with_max_dimension(cli.max_dimension);
    let display = TerminalDisplay::new()?;

    let mut scan_loop = ScanLoop::new(camera, detector, display);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = scan_loop.run(&mut out);

    // Release the camera and restore the terminal before reporting errors,
    // so a failure message lands on a usable screen
    drop(scan_loop);
    out.flush()?;

    result?;
    Ok(())
}
