use std::fmt;
use std::io;

use log::debug;

/// Size used when the terminal cannot be queried
pub const DEFAULT_GEOMETRY: Geometry = Geometry { width: 160, height: 50 };

/// Rows kept free below the frame for the status line
pub const STATUS_MARGIN: u16 = 2;

/// Pixel geometry of one playback session, in terminal cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: u16,
    pub height: u16,
}

impl Geometry {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// Number of pixels in one frame
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Exact byte length of one rgb24 frame
    pub fn frame_len(&self) -> usize {
        self.pixel_count() * 3
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Query the terminal and derive the frame geometry, falling back to
/// [`DEFAULT_GEOMETRY`] when there is no usable terminal.
pub fn resolve() -> Geometry {
    from_query(query_terminal())
}

/// Column count of the attached terminal, if stdout is one
pub fn terminal_columns() -> Option<u16> {
    query_terminal().ok().map(|(width, _)| width).filter(|&width| width > 0)
}

fn query_terminal() -> io::Result<(u16, u16)> {
    if !atty::is(atty::Stream::Stdout) {
        return Err(io::Error::new(io::ErrorKind::Unsupported, "stdout is not a terminal"));
    }
    crossterm::terminal::size()
}

/// Turn a raw size query into a frame geometry.
pub fn from_query(query: io::Result<(u16, u16)>) -> Geometry {
    match query {
        Ok((width, height)) if width > 0 && height > 0 => {
            Geometry::new(width, height.saturating_sub(STATUS_MARGIN).max(1))
        }
        Ok((width, height)) => {
            debug!("Terminal reported empty size {}x{}, using default", width, height);
            DEFAULT_GEOMETRY
        }
        Err(e) => {
            debug!("Terminal size query failed ({}), using default {}", e, DEFAULT_GEOMETRY);
            DEFAULT_GEOMETRY
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserves_status_rows() {
        let geometry = from_query(Ok((120, 40)));
        assert_eq!(geometry, Geometry::new(120, 38));
    }

    #[test]
    fn test_query_failure_falls_back() {
        let err = io::Error::new(io::ErrorKind::Other, "no tty");
        assert_eq!(from_query(Err(err)), DEFAULT_GEOMETRY);
    }

    #[test]
    fn test_degenerate_sizes() {
        assert_eq!(from_query(Ok((0, 40))), DEFAULT_GEOMETRY);
        assert_eq!(from_query(Ok((80, 0))), DEFAULT_GEOMETRY);
        // A two-row terminal still gets one pixel row
        assert_eq!(from_query(Ok((80, 2))), Geometry::new(80, 1));
    }

    #[test]
    fn test_frame_len() {
        let geometry = Geometry::new(4, 2);
        assert_eq!(geometry.pixel_count(), 8);
        assert_eq!(geometry.frame_len(), 24);
        assert_eq!(geometry.to_string(), "4x2");
    }
}
