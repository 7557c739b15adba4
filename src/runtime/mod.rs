//! Runtime data types shared by sources and decoders

pub mod sample;

pub use sample::{INVALID_TIMESTAMP, MAX_TIMESTAMP, Sample, Transition, timestamp_for_index};
