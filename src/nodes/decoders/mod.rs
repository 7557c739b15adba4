//! Edge decoders
//!
//! Decoders that turn a stream of samples into timing events.

pub mod edge_detector;
pub mod types;

// Re-export common types
pub use types::DetectorPhase;

// Re-export decoders
pub use edge_detector::{EdgeDetector, is_inflection, is_peak_confirmed};
