//! Extract sync transitions from one channel of a `.dat` recording
//!
//! Usage:
//!   cargo run --release --bin dat-transitions -- \
//!       --file NlxCSG.dat \
//!       --channel 0 --channels 64 --sample-rate 32000 \
//!       -n 20
//!
//! Cross-check the streaming pass against a full in-memory scan:
//!   cargo run --release --bin dat-transitions -- \
//!       --file NlxCSG.dat --channel 0 --channels 64 --sample-rate 32000 --verify

use clap::Parser;
use dat_sync::{DatConfig, TransitionExtractor};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the .dat recording
    #[arg(short, long)]
    file: PathBuf,

    /// Channel carrying the sync waveform (0-based)
    #[arg(long)]
    channel: usize,

    /// Number of interleaved channels in the recording
    #[arg(long)]
    channels: usize,

    /// Sample rate in Hz; timestamps are reported in microseconds
    #[arg(long)]
    sample_rate: f64,

    /// Frames per bulk read
    #[arg(long, default_value_t = dat_sync::nodes::DEFAULT_CHUNK_FRAMES)]
    chunk_frames: usize,

    /// Stop after this many samples of the selected channel
    #[arg(long)]
    max_samples: Option<u64>,

    /// Number of transitions to print (0 = all)
    #[arg(short, long, default_value = "20")]
    n: usize,

    /// Compare the streaming pass against an in-memory scan
    #[arg(long)]
    verify: bool,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    info!("=== DAT Transition Extraction ===");
    info!("File: {}", args.file.display());
    info!(
        "Channel {} of {}, {} Hz, {} frames/chunk",
        args.channel, args.channels, args.sample_rate, args.chunk_frames
    );

    if !args.file.exists() {
        warn!("{} does not exist, no transitions will be found", args.file.display());
    }

    let config = DatConfig::from_sample_rate(args.channel, args.channels, args.sample_rate)
        .with_chunk_frames(args.chunk_frames);
    let extractor = TransitionExtractor::new(config)?.with_max_samples(args.max_samples);

    let limit = if args.n == 0 { usize::MAX } else { args.n };
    let mut count = 0usize;
    let mut on_count = 0usize;
    let mut stream = extractor.transitions(&args.file)?;
    for transition in stream.by_ref() {
        count += 1;
        if transition.is_on {
            on_count += 1;
        }
        if count <= limit {
            info!(
                "#{}: {} at t={}us (frame {})",
                count,
                if transition.is_on { "ON " } else { "OFF" },
                transition.timestamp,
                transition.frame
            );
        }
    }

    info!(
        "{} transitions ({} on, {} off) from {} samples",
        count,
        on_count,
        count - on_count,
        stream.samples_read()
    );

    if args.verify {
        let report = extractor.verify_equivalence(&args.file)?;
        if !report.is_equal() {
            error!("Verification failed: {:?}", report);
            return Ok(ExitCode::FAILURE);
        }
        info!("Verification passed");
    }

    Ok(ExitCode::SUCCESS)
}
