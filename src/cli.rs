use crate::geometry::{self, Geometry};
use crate::DEFAULT_FPS;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the video file to play
    #[arg(required = true)]
    pub file_path: PathBuf,

    /// Frame rate the video is resampled to
    #[arg(short, long, default_value_t = DEFAULT_FPS)]
    pub fps: u32,

    /// Set frame width in columns (override automatic detection)
    #[arg(short, long)]
    pub width: Option<u16>,

    /// Set frame height in rows (override automatic detection)
    #[arg(long)]
    pub height: Option<u16>,

    /// Decoder program to run (must accept ffmpeg arguments)
    #[arg(long, default_value = "ffmpeg", value_name = "PROGRAM")]
    pub decoder: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Validate command line arguments
    pub fn validate(&self) -> Result<(), String> {
        if self.fps == 0 {
            return Err("FPS must be greater than 0".to_string());
        }

        if let Some(width) = self.width {
            if width == 0 {
                return Err("Frame width must be greater than 0".to_string());
            }
        }

        if let Some(height) = self.height {
            if height == 0 {
                return Err("Frame height must be greater than 0".to_string());
            }
        }

        Ok(())
    }

    /// Resolve the session geometry, letting explicit sizes win over the
    /// terminal query
    pub fn geometry(&self) -> Geometry {
        match (self.width, self.height) {
            (Some(w), Some(h)) => Geometry::new(w, h),
            (w, h) => {
                let detected = geometry::resolve();
                Geometry::new(w.unwrap_or(detected.width), h.unwrap_or(detected.height))
            }
        }
    }
}
