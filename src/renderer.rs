use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{self, Event, KeyEventKind},
    execute, queue,
    style::{Print, ResetColor},
    terminal::{disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{debug, warn};
use std::io::{self, Write};
use std::ops::{Deref, DerefMut};

/// Exclusive hold on the output surface for one playback.
///
/// Construction switches to the alternate screen and hides the cursor; dropping the
/// guard reverses both, so every exit path (errors, early returns, unwinding)
/// leaves the terminal as it was found.
pub struct SurfaceGuard<'a, W: Write> {
    out: &'a mut W,
}

impl<'a, W: Write> SurfaceGuard<'a, W> {
    pub fn acquire(out: &'a mut W) -> io::Result<Self> {
        execute!(out, EnterAlternateScreen, Hide)?;
        debug!("Terminal switched to alternate screen");
        Ok(Self { out })
    }
}

impl<W: Write> Deref for SurfaceGuard<'_, W> {
    type Target = W;

    fn deref(&self) -> &W {
        self.out
    }
}

impl<W: Write> DerefMut for SurfaceGuard<'_, W> {
    fn deref_mut(&mut self) -> &mut W {
        self.out
    }
}

impl<W: Write> Drop for SurfaceGuard<'_, W> {
    fn drop(&mut self) {
        match execute!(self.out, ResetColor, Show, LeaveAlternateScreen) {
            Ok(()) => debug!("Terminal restored to normal state"),
            Err(e) => warn!("Failed to restore terminal: {}", e),
        }
    }
}

/// Draw a rendered frame over the previous one, followed by the status line.
///
/// The cursor is returned to the origin instead of clearing the screen, so the old
/// frame is overwritten in place without flicker.
pub fn present_frame<W: Write>(out: &mut W, frame: &str, status: &str, width: u16) -> io::Result<()> {
    queue!(out, MoveTo(0, 0), Print(frame), ResetColor)?;

    // Truncate status to the available columns
    let status: String = status.chars().take(width as usize).collect();
    queue!(out, Print(status), Clear(ClearType::UntilNewLine))?;

    out.flush()
}

/// Columns available to the status line: the terminal's width when known, but
/// never narrower than the frame drawn above it.
pub fn status_columns(terminal_columns: Option<u16>, frame_width: u16) -> u16 {
    terminal_columns.unwrap_or(0).max(frame_width)
}

/// Block until a key is pressed. Returns immediately when stdin is not a terminal.
pub fn wait_for_keypress() -> io::Result<()> {
    if !atty::is(atty::Stream::Stdin) {
        debug!("stdin is not a terminal, skipping key wait");
        return Ok(());
    }

    enable_raw_mode()?;
    let result = loop {
        match event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => break Ok(()),
            Ok(_) => continue,
            Err(e) => break Err(e),
        }
    };
    disable_raw_mode()?;
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_enters_and_restores() {
        let mut out = Vec::new();
        {
            let mut guard = SurfaceGuard::acquire(&mut out).unwrap();
            guard.write_all(b"frame").unwrap();
        }
        let text = String::from_utf8(out).unwrap();

        let enter = text.find("\x1b[?1049h").unwrap();
        let hide = text.find("\x1b[?25l").unwrap();
        let body = text.find("frame").unwrap();
        let show = text.find("\x1b[?25h").unwrap();
        let leave = text.find("\x1b[?1049l").unwrap();
        assert!(enter < body && hide < body);
        assert!(body < show && body < leave);
    }

    #[test]
    fn test_guard_restores_on_error_path() {
        fn failing(out: &mut Vec<u8>) -> io::Result<()> {
            let _guard = SurfaceGuard::acquire(out)?;
            Err(io::Error::new(io::ErrorKind::Other, "boom"))
        }

        let mut out = Vec::new();
        assert!(failing(&mut out).is_err());
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with("\x1b[?1049l"));
    }

    #[test]
    fn test_present_frame_homes_cursor_without_clearing() {
        let mut out = Vec::new();
        present_frame(&mut out, "ab\n", "Frame: 1", 80).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("\x1b[1;1Hab\n"));
        assert!(text.contains("Frame: 1"));
        assert!(!text.contains("\x1b[2J"));
    }

    #[test]
    fn test_status_columns() {
        assert_eq!(status_columns(Some(80), 4), 80);
        assert_eq!(status_columns(None, 4), 4);
        assert_eq!(status_columns(Some(30), 48), 48);
    }

    #[test]
    fn test_status_truncated_to_width() {
        let mut out = Vec::new();
        present_frame(&mut out, "", "Frame: 12345", 5).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Frame"));
        assert!(!text.contains("Frame:"));
    }
}
