use anyhow::Result;
use clap::Parser;
use log::{error, info};
use std::io::{self, BufWriter, Write};
use termvid::decoder::{DecodeRequest, Decoder, FfmpegDecoder};
use termvid::player::{PlaybackOutcome, PlaybackSession};
use termvid::renderer::wait_for_keypress;
use termvid::utils::{format_duration, playback_seconds};
use termvid::Cli;

/// Exit status after Ctrl+C, as a shell would report SIGINT
const INTERRUPTED_EXIT_CODE: i32 = 130;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Log lines share the terminal with the frames, so stay quiet unless asked
    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    // Validate CLI arguments
    if let Err(e) = cli.validate() {
        error!("Invalid arguments: {}", e);
        std::process::exit(1);
    }

    info!("Starting termvid v{}", termvid::VERSION);
    info!("Playing: {}", cli.file_path.display());

    // Geometry is fixed for the whole session; resizes are not followed
    let geometry = cli.geometry();
    let request = DecodeRequest::new(&cli.file_path, geometry, cli.fps);
    let mut source = FfmpegDecoder::new(&cli.decoder).spawn(&request)?;

    let mut session = PlaybackSession::new(geometry, cli.fps);
    let outcome = {
        let stdout = io::stdout();
        let mut out = BufWriter::with_capacity(geometry.frame_len() * 8, stdout.lock());
        let interrupt = async {
            if tokio::signal::ctrl_c().await.is_err() {
                // Without a handler the default SIGINT action still applies
                std::future::pending::<()>().await;
            }
        };
        let outcome = session.play(&mut source, &mut out, interrupt).await;
        out.flush()?;
        outcome
    };
    drop(source);

    match outcome? {
        PlaybackOutcome::Completed { frames } => {
            let played = format_duration(playback_seconds(frames, cli.fps));
            println!("Video complete! {} frames played ({}).", frames, played);
            print!("Press any key to exit...");
            io::stdout().flush()?;
            wait_for_keypress()?;
            println!();
        }
        PlaybackOutcome::Interrupted { frames } => {
            println!("Interrupted after {} frames.", frames);
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
    }

    Ok(())
}
