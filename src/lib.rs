//! Sync-edge extraction from interleaved multi-channel `.dat` recordings
//!
//! A recorder writes fixed-width signed 16-bit samples for N channels in
//! round-robin order. One channel carries a quasi-square sync waveform; this
//! library turns that channel into a time-ordered list of on/off transitions
//! while holding only one chunk of the file in memory.
//!
//! # Architecture
//!
//! - **DatFileSource**: Pulls frames in bulk and yields one channel's samples
//! - **EdgeDetector**: Two-phase inflection/peak state machine
//! - **TransitionExtractor**: Wires the two together, lazily or eagerly
//!
//! # Example
//!
//! ```no_run
//! use dat_sync::{DatConfig, TransitionExtractor};
//!
//! let config = DatConfig::from_sample_rate(0, 64, 32_000.0);
//! let transitions = TransitionExtractor::new(config)?.extract("NlxCSG.dat")?;
//! println!("{} transitions", transitions.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use thiserror::Error;

pub mod extractor;
pub mod nodes;
pub mod runtime;

// Re-export data types from runtime
pub use runtime::{INVALID_TIMESTAMP, MAX_TIMESTAMP, Sample, Transition};

// Re-export sources and decoders
pub use nodes::{
    ChunkedSampleSource, DatConfig, DatFileSource, DetectorPhase, EdgeDetector, read_samples,
    samples_from_bytes,
};

// Re-export the extraction entry points
pub use extractor::{EquivalenceReport, TransitionExtractor, Transitions, extract};

#[derive(Error, Debug)]
pub enum DatError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, DatError>;
