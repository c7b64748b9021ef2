//! termvid - a true-color ASCII video player for the terminal
//!
//! Frames come from an external decoder (ffmpeg) as a raw rgb24 pipe, are cut into
//! fixed-size pixel grids, mapped to luminance-ranked glyphs that keep their original
//! color, and drawn in place at a fixed frame rate.

pub mod cli;
pub mod converter;
pub mod decoder;
pub mod frame;
pub mod geometry;
pub mod player;
pub mod renderer;

pub use cli::Cli;
pub use converter::{frame_to_ascii, glyph_index, FrameConverter};
pub use decoder::{DecodeRequest, Decoder, FfmpegDecoder, FfmpegProcess, FrameSource, ReaderSource};
pub use frame::{read_frame, FrameRead, PixelGrid, Rgb};
pub use geometry::Geometry;
pub use player::{Phase, PlaybackOutcome, PlaybackSession};
pub use renderer::SurfaceGuard;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Frame rate the decoder is asked to resample to
pub const DEFAULT_FPS: u32 = 24;

/// Glyphs of increasing visual density, indexed by luminance
pub const ASCII_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Error types used throughout the application
#[derive(thiserror::Error, Debug)]
pub enum PlayerError {
    #[error("failed to start decoder `{program}`; make sure ffmpeg is installed and on PATH")]
    DecoderSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to capture decoder {0} pipe")]
    DecoderPipe(&'static str),

    #[error("could not read any frames; check that the video file is valid")]
    NoFrames,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Frame formatting error: {0}")]
    Format(#[from] std::fmt::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, PlayerError>;

/// Utility functions
pub mod utils {
    /// Format duration in a human-readable way
    pub fn format_duration(seconds: f64) -> String {
        let total_seconds = seconds as u64;
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let secs = total_seconds % 60;

        if hours > 0 {
            format!("{}:{:02}:{:02}", hours, minutes, secs)
        } else {
            format!("{}:{:02}", minutes, secs)
        }
    }

    /// Wall-clock length of `frames` frames played at `fps`
    pub fn playback_seconds(frames: u64, fps: u32) -> f64 {
        if fps == 0 {
            0.0
        } else {
            frames as f64 / fps as f64
        }
    }
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        frame_to_ascii, glyph_index, read_frame, utils::*, Cli, DecodeRequest, Decoder,
        FfmpegDecoder, FrameConverter, FrameRead, FrameSource, Geometry, PixelGrid,
        PlaybackOutcome, PlaybackSession, PlayerError, ReaderSource, Result, Rgb, ASCII_RAMP,
    };
}
