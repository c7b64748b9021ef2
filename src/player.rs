use crate::converter::FrameConverter;
use crate::decoder::FrameSource;
use crate::frame::{read_frame, FrameRead, PixelGrid};
use crate::geometry::Geometry;
use crate::geometry;
use crate::renderer::{present_frame, status_columns, SurfaceGuard};
use crate::{PlayerError, Result};
use log::{debug, info};
use std::future::Future;
use std::io::Write;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Where a playback session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the first frame
    Priming,
    /// At least one frame shown, more expected
    Rendering,
    /// Stream ended, tearing down
    Draining,
    Done,
}

/// How a playback ended without a fatal error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// The stream ran out after `frames` frames
    Completed { frames: u64 },
    /// The interrupt signal fired after `frames` frames
    Interrupted { frames: u64 },
}

impl PlaybackOutcome {
    pub fn frames(&self) -> u64 {
        match *self {
            PlaybackOutcome::Completed { frames } | PlaybackOutcome::Interrupted { frames } => frames,
        }
    }
}

/// Target interval between frame starts
pub fn frame_interval(fps: u32) -> Duration {
    Duration::from_micros(1_000_000 / fps.max(1) as u64)
}

/// Time left to sleep once a frame took `elapsed`, if any
pub fn remaining_interval(interval: Duration, elapsed: Duration) -> Option<Duration> {
    interval.checked_sub(elapsed).filter(|rest| !rest.is_zero())
}

/// State of one playback: geometry, pacing and the running frame count
#[derive(Debug)]
pub struct PlaybackSession {
    geometry: Geometry,
    fps: u32,
    frame_interval: Duration,
    frame_count: u64,
    phase: Phase,
}

impl PlaybackSession {
    pub fn new(geometry: Geometry, fps: u32) -> Self {
        Self {
            geometry,
            fps,
            frame_interval: frame_interval(fps),
            frame_count: 0,
            phase: Phase::Priming,
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn status_line(&self) -> String {
        format!(
            "Frame: {} | FPS: {} | Press Ctrl+C to exit",
            self.frame_count, self.fps
        )
    }

    /// Play `source` onto `out` until the stream ends or `interrupt` resolves.
    ///
    /// `out` is held in the alternate screen for the duration and restored before
    /// this returns, on every path. The source is terminated before returning.
    /// A stream that ends before the first complete frame is
    /// [`PlayerError::NoFrames`].
    pub async fn play<S, W, F>(&mut self, source: &mut S, out: &mut W, interrupt: F) -> Result<PlaybackOutcome>
    where
        S: FrameSource,
        W: Write,
        F: Future<Output = ()>,
    {
        let outcome = self.run(source, out, interrupt).await;
        source.terminate();
        self.phase = Phase::Done;

        if let Ok(outcome) = &outcome {
            info!("Playback finished. Total frames: {}", outcome.frames());
        }
        outcome
    }

    async fn run<S, W, F>(&mut self, source: &mut S, out: &mut W, interrupt: F) -> Result<PlaybackOutcome>
    where
        S: FrameSource,
        W: Write,
        F: Future<Output = ()>,
    {
        let mut screen = SurfaceGuard::acquire(out)?;
        let mut grid = PixelGrid::new(self.geometry);
        let mut converter = FrameConverter::new();
        let columns = status_columns(geometry::terminal_columns(), self.geometry.width);
        tokio::pin!(interrupt);

        loop {
            let started = Instant::now();

            let read = tokio::select! {
                biased;
                _ = &mut interrupt => {
                    info!("Interrupted after {} frames", self.frame_count);
                    return Ok(PlaybackOutcome::Interrupted { frames: self.frame_count });
                }
                read = read_frame(source.reader(), &mut grid) => read,
            };

            if let FrameRead::EndOfStream { received } = read {
                if self.phase == Phase::Priming {
                    debug!("Stream ended after {} bytes, before the first frame", received);
                    return Err(PlayerError::NoFrames);
                }
                if received > 0 {
                    debug!("Discarding {} trailing bytes of a partial frame", received);
                }
                self.phase = Phase::Draining;
                return Ok(PlaybackOutcome::Completed { frames: self.frame_count });
            }

            self.phase = Phase::Rendering;
            let text = converter.convert_frame(&grid)?;
            let status = self.status_line();
            present_frame(&mut *screen, text, &status, columns)?;
            self.frame_count += 1;

            // Running late is absorbed: no catch-up and no skipped frames
            if let Some(rest) = remaining_interval(self.frame_interval, started.elapsed()) {
                tokio::select! {
                    biased;
                    _ = &mut interrupt => {
                        info!("Interrupted after {} frames", self.frame_count);
                        return Ok(PlaybackOutcome::Interrupted { frames: self.frame_count });
                    }
                    _ = sleep(rest) => {}
                }
            }
        }
    }
}
