/// monovox - play a PCM or WAV file with interactive transport control
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use monovox_bridge::{Bridge, BridgeConfig, DEFAULT_LOG_FILTER};
use monovox_cli::{Clip, ClipSource, Command, Outcome};
use monovox_cpal::{CpalBackend, ResamplingQuality};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "monovox")]
#[command(about = "Play a PCM or WAV file through the default output device", long_about = None)]
struct Cli {
    /// Audio file (.wav, or raw signed 16-bit little-endian PCM)
    file: PathBuf,

    /// Sample rate of raw input
    #[arg(short = 'r', long, default_value_t = 44_100)]
    sample_rate: u32,

    /// Channel count of raw input
    #[arg(short, long, default_value_t = 2)]
    channels: u16,

    /// Request HRTF rendering (overrides configuration)
    #[arg(long, conflicts_with = "no_hrtf")]
    hrtf: bool,

    /// Do not request HRTF rendering (overrides configuration)
    #[arg(long)]
    no_hrtf: bool,

    /// Resampling quality (overrides configuration)
    #[arg(short, long, value_enum)]
    quality: Option<Quality>,

    /// Play once and exit when the clip ends instead of reading commands
    #[arg(long)]
    once: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Quality {
    Fast,
    Balanced,
    High,
    Maximum,
}

impl From<Quality> for ResamplingQuality {
    fn from(quality: Quality) -> Self {
        match quality {
            Quality::Fast => Self::Fast,
            Quality::Balanced => Self::Balanced,
            Quality::High => Self::High,
            Quality::Maximum => Self::Maximum,
        }
    }
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("monovox_cli=info,{}", DEFAULT_LOG_FILTER).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = BridgeConfig::load()?;
    if cli.hrtf {
        config.default_hrtf = true;
    }
    if cli.no_hrtf {
        config.default_hrtf = false;
    }
    if let Some(quality) = cli.quality {
        config.backend.resampling_quality = quality.into();
    }
    config.validate()?;

    let source = ClipSource::detect(&cli.file, cli.sample_rate, cli.channels);
    let clip = Clip::load(&cli.file, source)?;
    tracing::info!(
        "Loaded {} ({} frames, {} Hz, {} channels)",
        cli.file.display(),
        clip.frames(),
        clip.sample_rate,
        clip.channels
    );

    let enable_hrtf = config.default_hrtf;
    let bridge = Bridge::with_default_hrtf(CpalBackend::with_config(config.backend), enable_hrtf);

    let info = bridge
        .try_play(
            Some(&clip.pcm),
            i32::try_from(clip.sample_rate).unwrap_or(i32::MAX),
            i32::from(clip.channels),
            enable_hrtf,
        )
        .context("Failed to start playback")?;
    println!(
        "playing {} ms, hrtf: {:?}",
        info.duration_ms,
        bridge.hrtf()
    );

    if cli.once {
        wait_for_end(&bridge);
        bridge.release();
        return Ok(());
    }

    run_commands(&bridge, &clip, enable_hrtf)
}

/// Block until the voice stops on its own
fn wait_for_end(bridge: &Bridge<CpalBackend>) {
    use monovox_core::SourceState;

    loop {
        let state = bridge.with_session(|session| session.source_state());
        if !matches!(state, Some(SourceState::Playing)) {
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(50));
    }
}

fn run_commands(bridge: &Bridge<CpalBackend>, clip: &Clip, enable_hrtf: bool) -> Result<()> {
    println!("{}", Command::HELP);
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line.context("Failed to read command")?;
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<Command>() {
            Ok(command) => match command.apply(bridge, clip, enable_hrtf) {
                Outcome::Continue(Some(message)) => println!("{}", message),
                Outcome::Continue(None) => {}
                Outcome::Exit => return Ok(()),
            },
            Err(e) => println!("{}", e),
        }
        stdout.flush()?;
    }

    // EOF
    bridge.release();
    Ok(())
}
