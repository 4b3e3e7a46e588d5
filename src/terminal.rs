// SPDX-License-Identifier: GPL-3.0-only

//! Terminal display sink
//!
//! Renders camera frames to the terminal using Unicode half-block characters
//! for improved vertical resolution. The TUI is drawn on stderr so stdout
//! stays reserved for decoded payload lines.

use crate::camera::CameraFrame;
use crate::errors::ScanResult;
use crate::scanner::{DisplaySink, QUIT_KEY, WINDOW_TITLE};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal, backend::CrosstermBackend, buffer::Buffer, layout::Rect, style::Color,
    widgets::Widget,
};
use std::io;
use std::time::Duration;

/// Display sink rendering to the terminal
///
/// Raw mode and the alternate screen are entered on construction and
/// restored in `Drop`, so the terminal is recovered on every exit path.
pub struct TerminalDisplay {
    terminal: Terminal<CrosstermBackend<io::Stderr>>,
    status_line: String,
}

impl TerminalDisplay {
    pub fn new() -> ScanResult<Self> {
        let mut guard = SetupGuard::default();

        enable_raw_mode()?;
        guard.raw_mode = true;

        execute!(io::stderr(), EnterAlternateScreen)?;
        guard.alternate_screen = true;

        let terminal = Terminal::new(CrosstermBackend::new(io::stderr()))?;
        guard.disarm();

        Ok(Self {
            terminal,
            status_line: format!("{} | '{}' quit", WINDOW_TITLE, QUIT_KEY),
        })
    }
}

/// Rolls back raw mode and the alternate screen when construction fails
/// partway through; a half-initialized display must not leave the terminal
/// unusable.
#[derive(Default)]
struct SetupGuard {
    raw_mode: bool,
    alternate_screen: bool,
}

impl SetupGuard {
    /// Hand teardown responsibility over to `TerminalDisplay::drop`
    fn disarm(&mut self) {
        self.raw_mode = false;
        self.alternate_screen = false;
    }
}

impl Drop for SetupGuard {
    fn drop(&mut self) {
        if self.alternate_screen {
            let _ = execute!(io::stderr(), LeaveAlternateScreen);
        }
        if self.raw_mode {
            let _ = disable_raw_mode();
        }
    }
}

impl DisplaySink for TerminalDisplay {
    fn show(&mut self, frame: &CameraFrame) -> ScanResult<()> {
        let widget = FrameWidget { frame };
        let status = StatusBar {
            message: &self.status_line,
        };

        self.terminal.draw(|f| {
            let area = f.area();

            // Reserve bottom line for status
            let camera_area = Rect {
                x: area.x,
                y: area.y,
                width: area.width,
                height: area.height.saturating_sub(1),
            };
            f.render_widget(widget, camera_area);

            let status_area = Rect {
                x: area.x,
                y: area.height.saturating_sub(1),
                width: area.width,
                height: 1,
            };
            f.render_widget(status, status_area);
        })?;

        Ok(())
    }

    fn poll_key(&mut self, timeout: Duration) -> ScanResult<Option<char>> {
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            // Ctrl+C arrives as a key event in raw mode; treat it as quit
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                return Ok(Some(QUIT_KEY));
            }
            if let KeyCode::Char(c) = key.code {
                return Ok(Some(c));
            }
        }

        Ok(None)
    }
}

impl Drop for TerminalDisplay {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Widget that renders a camera frame using half-block characters
struct FrameWidget<'a> {
    frame: &'a CameraFrame,
}

impl Widget for FrameWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let frame = self.frame;
        if frame.width() == 0 || frame.height() == 0 || area.width == 0 || area.height == 0 {
            return;
        }

        // Calculate display dimensions maintaining aspect ratio.
        // Each terminal cell displays 2 vertical pixels using half-blocks.
        let frame_aspect = frame.width() as f64 / frame.height() as f64;
        let term_width = area.width as f64;
        let term_height = (area.height * 2) as f64;

        let (display_width, display_height) = if term_width / term_height > frame_aspect {
            // Terminal is wider - fit to height
            let h = term_height;
            let w = h * frame_aspect;
            (w as u16, (h / 2.0) as u16)
        } else {
            // Terminal is taller - fit to width
            let w = term_width;
            let h = w / frame_aspect;
            (w as u16, (h / 2.0) as u16)
        };

        if display_width == 0 || display_height == 0 {
            return;
        }

        // Center the image
        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = frame.width() as f64 / display_width as f64;
        let y_scale = frame.height() as f64 / (display_height * 2) as f64;

        // Each terminal cell represents 2 vertical pixels:
        // - Upper half (▀) colored with fg
        // - Lower half colored with bg
        for ty in 0..display_height {
            for tx in 0..display_width {
                let term_x = x_offset + tx;
                let term_y = y_offset + ty;

                if term_x >= area.x + area.width || term_y >= area.y + area.height {
                    continue;
                }

                let src_x = (tx as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                let top_color = sample_pixel(frame, src_x, src_y_top);
                let bottom_color = sample_pixel(frame, src_x, src_y_bottom);

                if let Some(cell) = buf.cell_mut((term_x, term_y)) {
                    cell.set_char('▀');
                    cell.set_fg(top_color);
                    cell.set_bg(bottom_color);
                }
            }
        }
    }
}

fn sample_pixel(frame: &CameraFrame, x: u32, y: u32) -> Color {
    let x = x.min(frame.width() - 1);
    let y = y.min(frame.height() - 1);
    let p = frame.image.get_pixel(x, y);
    Color::Rgb(p[0], p[1], p[2])
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        let text = truncate_to_width(self.message, area.width as usize);

        buf.set_string(
            area.x,
            area.y,
            text,
            ratatui::style::Style::default()
                .fg(Color::White)
                .bg(Color::DarkGray),
        );
    }
}

/// Truncate a string to at most `width` bytes without splitting a character
fn truncate_to_width(message: &str, width: usize) -> &str {
    if message.len() <= width {
        return message;
    }
    let mut end = width;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    &message[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_keeps_short_messages() {
        assert_eq!(truncate_to_width("abc", 10), "abc");
        assert_eq!(truncate_to_width("abcd", 4), "abcd");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        // Byte 4 falls inside the second 'é'; truncation must back up to
        // the previous boundary instead of panicking
        assert_eq!(truncate_to_width("épée", 4), "ép");
        assert_eq!(truncate_to_width("épée", 5), "épé");
    }

    #[test]
    fn test_status_bar_renders_narrow_area_with_multibyte_text() {
        let area = Rect::new(0, 0, 4, 1);
        let mut buf = Buffer::empty(area);
        StatusBar { message: "épée fencing" }.render(area, &mut buf);
    }

    #[test]
    fn test_disarmed_setup_guard_skips_teardown() {
        let mut guard = SetupGuard {
            raw_mode: true,
            alternate_screen: true,
        };
        guard.disarm();
        assert!(!guard.raw_mode);
        assert!(!guard.alternate_screen);
    }
}
