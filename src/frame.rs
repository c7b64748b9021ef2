use crate::geometry::Geometry;
use crate::{PlayerError, Result};
use log::debug;
use std::io::ErrorKind;
use tokio::io::{AsyncRead, AsyncReadExt};

/// One pixel of an rgb24 frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Perceptual luminance in `[0.0, 1.0]` using the Rec. 601 weights
    /// `0.299 R + 0.587 G + 0.114 B`.
    pub fn luminance(&self) -> f64 {
        // Integer weights keep pure white at exactly 1.0
        let weighted = 299 * self.r as u32 + 587 * self.g as u32 + 114 * self.b as u32;
        weighted as f64 / 255_000.0
    }
}

/// A decoded frame: `width * height` RGB triplets, row-major, top-left origin.
///
/// The backing buffer is allocated once and overwritten by every
/// [`read_frame`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    geometry: Geometry,
    data: Vec<u8>,
}

impl PixelGrid {
    /// Create a black grid sized for `geometry`
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            data: vec![0; geometry.frame_len()],
        }
    }

    /// Wrap an existing rgb24 buffer, which must be exactly one frame long
    pub fn from_bytes(geometry: Geometry, data: Vec<u8>) -> Result<Self> {
        if data.len() != geometry.frame_len() {
            return Err(PlayerError::InvalidConfig(format!(
                "frame buffer is {} bytes, {} needs {}",
                data.len(),
                geometry,
                geometry.frame_len()
            )));
        }
        Ok(Self { geometry, data })
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Iterate over pixel rows, top to bottom
    pub fn rows(&self) -> impl Iterator<Item = impl Iterator<Item = Rgb> + '_> + '_ {
        let stride = (self.geometry.width as usize * 3).max(1);
        self.data
            .chunks_exact(stride)
            .map(|row| row.chunks_exact(3).map(|p| Rgb::new(p[0], p[1], p[2])))
    }
}

/// Result of one frame read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRead {
    /// The grid now holds a full new frame
    Complete,
    /// The stream ended (or failed) after `received` bytes of the frame
    EndOfStream { received: usize },
}

/// Read exactly one frame from `reader` into `grid`.
///
/// Pipes may deliver partial writes of any size, so reads keep accumulating into
/// the same buffer until it is full. Exhaustion or a read error before that point
/// is reported as [`FrameRead::EndOfStream`]; there is no resynchronization.
pub async fn read_frame<R>(reader: &mut R, grid: &mut PixelGrid) -> FrameRead
where
    R: AsyncRead + Unpin + ?Sized,
{
    let buf = grid.data.as_mut_slice();
    let mut filled = 0;

    while filled < buf.len() {
        match reader.read(&mut buf[filled..]).await {
            Ok(0) => return FrameRead::EndOfStream { received: filled },
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                debug!("Frame read failed after {} bytes: {}", filled, e);
                return FrameRead::EndOfStream { received: filled };
            }
        }
    }

    FrameRead::Complete
}
