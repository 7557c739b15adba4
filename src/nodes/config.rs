//! Sampling parameters for reading a `.dat` recording
//!
//! The file carries no header, so every value here must come from the
//! recording device's settings.

use crate::{DatError, Result};

/// Frames read per bulk read unless overridden
pub const DEFAULT_CHUNK_FRAMES: usize = 10_000;

/// Size in bytes of one raw channel value on disk
pub const BYTES_PER_VALUE: usize = std::mem::size_of::<i16>();

/// Largest decode buffer a config may ask for (256 MiB)
pub const MAX_CHUNK_BYTES: usize = 256 * 1024 * 1024;

/// Channel selection and timing for one decode pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatConfig {
    /// Channel to extract (0-based)
    pub channel_index: usize,
    /// Channels interleaved in each frame
    pub num_channels: usize,
    /// Duration of one sample, in the caller's time unit
    pub time_per_sample: f64,
    /// Frames decoded per bulk read
    pub chunk_frames: usize,
}

impl DatConfig {
    pub fn new(channel_index: usize, num_channels: usize, time_per_sample: f64) -> Self {
        Self {
            channel_index,
            num_channels,
            time_per_sample,
            chunk_frames: DEFAULT_CHUNK_FRAMES,
        }
    }

    /// Build a config with timestamps in microseconds from a sample rate in Hz
    pub fn from_sample_rate(channel_index: usize, num_channels: usize, sample_rate_hz: f64) -> Self {
        Self::new(channel_index, num_channels, 1_000_000.0 / sample_rate_hz)
    }

    /// Set the number of frames per bulk read (builder pattern)
    pub fn with_chunk_frames(mut self, chunk_frames: usize) -> Self {
        self.chunk_frames = chunk_frames;
        self
    }

    /// Bytes in one complete frame
    pub fn frame_bytes(&self) -> usize {
        self.num_channels.saturating_mul(BYTES_PER_VALUE)
    }

    /// Bytes in one full chunk. Only meaningful for a validated config.
    pub fn chunk_bytes(&self) -> usize {
        self.frame_bytes().saturating_mul(self.chunk_frames)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_channels == 0 {
            return Err(DatError::InvalidConfig(
                "num_channels must be at least 1".to_string(),
            ));
        }
        if self.channel_index >= self.num_channels {
            return Err(DatError::InvalidConfig(format!(
                "channel_index {} out of range for {} channels",
                self.channel_index, self.num_channels
            )));
        }
        if self.chunk_frames == 0 {
            return Err(DatError::InvalidConfig(
                "chunk_frames must be at least 1".to_string(),
            ));
        }
        let chunk_bytes = self
            .num_channels
            .checked_mul(BYTES_PER_VALUE)
            .and_then(|frame| frame.checked_mul(self.chunk_frames));
        match chunk_bytes {
            Some(bytes) if bytes <= MAX_CHUNK_BYTES => {}
            _ => {
                return Err(DatError::InvalidConfig(format!(
                    "{} frames of {} channels exceeds the {} byte chunk limit",
                    self.chunk_frames, self.num_channels, MAX_CHUNK_BYTES
                )));
            }
        }
        if !self.time_per_sample.is_finite() || self.time_per_sample < 0.0 {
            return Err(DatError::InvalidConfig(format!(
                "time_per_sample must be finite and non-negative, got {}",
                self.time_per_sample
            )));
        }
        Ok(())
    }
}
