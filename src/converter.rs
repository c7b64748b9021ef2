use crate::frame::{PixelGrid, Rgb};
use crate::ASCII_RAMP;
use crossterm::style::{Color, ResetColor, SetForegroundColor};
use std::fmt::{self, Write};

/// Map a luminance in `[0.0, 1.0]` to an index into a ramp of `levels` glyphs.
///
/// `floor(L * (levels - 1))`, clamped so that `L == 1.0` (or anything above) lands on
/// the last glyph rather than one past it.
pub fn glyph_index(luminance: f64, levels: usize) -> usize {
    let last = levels.saturating_sub(1);
    let index = (luminance * last as f64).floor();
    if index <= 0.0 {
        0
    } else {
        (index as usize).min(last)
    }
}

/// Converts pixel grids into color-annotated glyph text
pub struct FrameConverter {
    ramp: &'static [char],
    text: String,
}

impl Default for FrameConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameConverter {
    /// Create a converter over the default ramp
    pub fn new() -> Self {
        Self {
            ramp: ASCII_RAMP,
            text: String::new(),
        }
    }

    /// Glyph for a single pixel
    pub fn glyph(&self, pixel: Rgb) -> char {
        self.ramp[glyph_index(pixel.luminance(), self.ramp.len())]
    }

    /// Render `grid` into text: one line per pixel row, each pixel a 24-bit
    /// foreground color escape followed by its glyph, each row closed by a reset.
    ///
    /// The returned text borrows an internal buffer reused across frames.
    pub fn convert_frame(&mut self, grid: &PixelGrid) -> Result<&str, fmt::Error> {
        self.text.clear();
        // Roughly 20 bytes of escape per cell
        self.text.reserve(grid.geometry().pixel_count() * 20);

        for row in grid.rows() {
            for pixel in row {
                let glyph = self.glyph(pixel);
                let color = Color::Rgb {
                    r: pixel.r,
                    g: pixel.g,
                    b: pixel.b,
                };
                write!(self.text, "{}{}", SetForegroundColor(color), glyph)?;
            }
            writeln!(self.text, "{}", ResetColor)?;
        }

        Ok(&self.text)
    }
}

/// Convenience function to convert a grid with a fresh converter
pub fn frame_to_ascii(grid: &PixelGrid) -> Result<String, fmt::Error> {
    FrameConverter::new().convert_frame(grid).map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;

    fn create_test_grid(width: u16, height: u16, r: u8, g: u8, b: u8) -> PixelGrid {
        let geometry = Geometry::new(width, height);
        PixelGrid::from_bytes(geometry, [r, g, b].repeat(geometry.pixel_count())).unwrap()
    }

    #[test]
    fn test_glyph_index_bounds() {
        let levels = ASCII_RAMP.len();
        assert_eq!(glyph_index(0.0, levels), 0);
        assert_eq!(glyph_index(1.0, levels), levels - 1);

        for step in 0..=1000 {
            let luminance = step as f64 / 1000.0;
            assert!(glyph_index(luminance, levels) < levels);
        }
    }

    #[test]
    fn test_glyph_index_floors() {
        assert_eq!(glyph_index(0.5, 10), 4);
        assert_eq!(glyph_index(0.999, 10), 8);
        assert_eq!(glyph_index(1.5, 10), 9);
        assert_eq!(glyph_index(-0.1, 10), 0);
    }

    #[test]
    fn test_brighter_never_maps_lower() {
        let converter = FrameConverter::new();
        let position = |c: char| ASCII_RAMP.iter().position(|&g| g == c).unwrap();

        for fixed in [0u8, 128, 255] {
            let mut last = 0;
            for v in 0..=255u8 {
                let index = position(converter.glyph(Rgb::new(fixed, v, fixed)));
                assert!(index >= last);
                last = index;
            }
        }
    }

    #[test]
    fn test_white_and_black_pixels() {
        let converter = FrameConverter::new();
        assert_eq!(converter.glyph(Rgb::new(255, 255, 255)), '@');
        assert_eq!(converter.glyph(Rgb::new(0, 0, 0)), ' ');
    }

    #[test]
    fn test_row_layout() {
        let geometry = Geometry::new(2, 1);
        let grid = PixelGrid::from_bytes(geometry, vec![0, 0, 0, 255, 255, 255]).unwrap();

        assert_eq!(
            frame_to_ascii(&grid).unwrap(),
            "\x1b[38;2;0;0;0m \x1b[38;2;255;255;255m@\x1b[0m\n"
        );
    }

    #[test]
    fn test_frame_conversion() {
        let grid = create_test_grid(4, 2, 255, 255, 255);
        let text = frame_to_ascii(&grid).unwrap();

        assert_eq!(text.lines().count(), 2);
        assert_eq!(text.matches('@').count(), 8);
        assert_eq!(text.matches("\x1b[0m\n").count(), 2);
        assert!(text.starts_with("\x1b[38;2;255;255;255m@"));
    }

    #[test]
    fn test_conversion_is_deterministic() {
        let geometry = Geometry::new(3, 3);
        let data: Vec<u8> = (0..geometry.frame_len()).map(|i| (i * 37 % 256) as u8).collect();
        let grid = PixelGrid::from_bytes(geometry, data).unwrap();

        let mut converter = FrameConverter::new();
        let first = converter.convert_frame(&grid).unwrap().to_owned();
        let second = converter.convert_frame(&grid).unwrap().to_owned();
        assert_eq!(first, second);
        assert_eq!(first, frame_to_ascii(&grid).unwrap());
    }
}
