//! Sample sources and decoders
//!
//! - **Sources**: pull samples of one channel out of a recording file
//! - **Decoders**: turn samples into transition events
//!
//! # Examples
//!
//! ```no_run
//! use dat_sync::nodes::{DatConfig, DatFileSource, EdgeDetector};
//!
//! let config = DatConfig::new(0, 64, 31.25);
//! let mut detector = EdgeDetector::new();
//! for sample in DatFileSource::open("capture.dat", config)? {
//!     if let Some(edge) = detector.push(sample) {
//!         println!("{}", edge);
//!     }
//! }
//! # Ok::<(), dat_sync::DatError>(())
//! ```

mod config;
mod dat_file;
pub mod decoders;

pub use config::{BYTES_PER_VALUE, DEFAULT_CHUNK_FRAMES, DatConfig, MAX_CHUNK_BYTES};
pub use dat_file::{ChunkedSampleSource, DatFileSource, read_samples, samples_from_bytes};
pub use decoders::{DetectorPhase, EdgeDetector};

// Re-export data types from runtime
pub use crate::runtime::{Sample, Transition};

#[cfg(test)]
pub(crate) use dat_file::encode_frames;
