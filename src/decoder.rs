use crate::geometry::Geometry;
use crate::{PlayerError, Result};
use log::{debug, info, warn};
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncRead;
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;

/// What a decoder is asked to produce: `source` resampled to `fps` and scaled to
/// exactly `geometry`, as unframed rgb24.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeRequest {
    pub source: PathBuf,
    pub geometry: Geometry,
    pub fps: u32,
}

impl DecodeRequest {
    pub fn new(source: impl Into<PathBuf>, geometry: Geometry, fps: u32) -> Self {
        Self {
            source: source.into(),
            geometry,
            fps,
        }
    }

    /// Filter graph selecting the frame rate and output scale
    pub fn filter(&self) -> String {
        format!(
            "fps={},scale={}:{}",
            self.fps, self.geometry.width, self.geometry.height
        )
    }

    /// Full ffmpeg argument list writing raw frames to stdout
    pub fn ffmpeg_args(&self) -> Vec<OsString> {
        let filter = self.filter();
        let mut args: Vec<OsString> = ["-hide_banner", "-nostdin", "-i"]
            .into_iter()
            .map(OsString::from)
            .collect();
        args.push(self.source.clone().into_os_string());
        for arg in ["-vf", filter.as_str(), "-f", "rawvideo", "-pix_fmt", "rgb24", "-"] {
            args.push(arg.into());
        }
        args
    }
}

/// A running stream of raw frames
pub trait FrameSource {
    type Reader: AsyncRead + Unpin;

    /// The raw byte stream; it has exactly one consumer
    fn reader(&mut self) -> &mut Self::Reader;

    /// Release the producer unconditionally. Must be safe to call more than once.
    fn terminate(&mut self);
}

/// Something that can start a [`FrameSource`] for a request
pub trait Decoder {
    type Source: FrameSource;

    fn spawn(&self, request: &DecodeRequest) -> Result<Self::Source>;
}

/// Decoder backed by an ffmpeg-compatible subprocess
#[derive(Debug, Clone)]
pub struct FfmpegDecoder {
    program: PathBuf,
}

impl FfmpegDecoder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Decoder for FfmpegDecoder {
    type Source = FfmpegProcess;

    /// Launch the decoder. Must be called from within a tokio runtime, which also
    /// hosts the stderr drain task.
    fn spawn(&self, request: &DecodeRequest) -> Result<FfmpegProcess> {
        let args = request.ffmpeg_args();
        debug!("Spawning {} {:?}", self.program.display(), args);

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| PlayerError::DecoderSpawn {
                program: self.program.display().to_string(),
                source,
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or(PlayerError::DecoderPipe("stdout"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or(PlayerError::DecoderPipe("stderr"))?;

        // Nobody reads the diagnostics, but a full stderr pipe would stall the decoder
        let drain = tokio::spawn(async move {
            match tokio::io::copy(&mut stderr, &mut tokio::io::sink()).await {
                Ok(bytes) => debug!("Decoder stderr closed after {} bytes", bytes),
                Err(e) => debug!("Decoder stderr drain stopped: {}", e),
            }
        });

        info!(
            "Decoder started (pid {:?}) for '{}' at {} / {} fps",
            child.id(),
            request.source.display(),
            request.geometry,
            request.fps
        );

        Ok(FfmpegProcess {
            child,
            stdout,
            drain,
            terminated: false,
        })
    }
}

/// A live decoder subprocess. Killed on [`FrameSource::terminate`] or drop.
pub struct FfmpegProcess {
    child: Child,
    stdout: ChildStdout,
    drain: JoinHandle<()>,
    terminated: bool,
}

impl FfmpegProcess {
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }
}

impl FrameSource for FfmpegProcess {
    type Reader = ChildStdout;

    fn reader(&mut self) -> &mut ChildStdout {
        &mut self.stdout
    }

    fn terminate(&mut self) {
        if self.terminated {
            return;
        }
        self.terminated = true;

        match self.child.try_wait() {
            Ok(Some(status)) => debug!("Decoder already exited: {}", status),
            _ => {
                if let Err(e) = self.child.start_kill() {
                    warn!("Failed to kill decoder: {}", e);
                } else {
                    debug!("Decoder killed");
                }
            }
        }
        self.drain.abort();
    }
}

impl Drop for FfmpegProcess {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// Frame source over any async reader, e.g. a file of concatenated rgb24 frames
/// or an in-memory buffer.
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: R,
    terminated: bool,
}

impl<R: AsyncRead + Unpin> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            terminated: false,
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }
}

impl<R: AsyncRead + Unpin> FrameSource for ReaderSource<R> {
    type Reader = R;

    fn reader(&mut self) -> &mut R {
        &mut self.reader
    }

    fn terminate(&mut self) {
        self.terminated = true;
    }
}
