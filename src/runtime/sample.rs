//! Core data types for signal processing

use std::fmt;

/// Timestamp reserved to mark the end of a sample stream.
///
/// Computed timestamps are clamped to [`MAX_TIMESTAMP`], so no sample produced
/// by a source can ever carry this value.
pub const INVALID_TIMESTAMP: u64 = u64::MAX;

/// Largest timestamp a real sample can carry
pub const MAX_TIMESTAMP: u64 = INVALID_TIMESTAMP - 1;

/// Convert a sample ordinal into a timestamp.
///
/// The product is computed in `f64` and truncated toward zero. Results that
/// do not fit in a `u64` saturate at [`MAX_TIMESTAMP`].
#[inline]
pub fn timestamp_for_index(index: u64, time_per_sample: f64) -> u64 {
    let ts = index as f64 * time_per_sample;
    // `as` saturates on overflow, the clamp keeps the sentinel out of range
    (ts as u64).min(MAX_TIMESTAMP)
}

/// One reading of the selected channel at one recording instant
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sample {
    /// Time of this reading, in the unit of `time_per_sample`
    pub timestamp: u64,
    /// Raw signed channel value
    pub value: i16,
}

impl Sample {
    /// Create a new sample
    pub fn new(timestamp: u64, value: i16) -> Self {
        Self { timestamp, value }
    }

    /// The sentinel returned once a source has nothing left
    pub const fn end_of_stream() -> Self {
        Self {
            timestamp: INVALID_TIMESTAMP,
            value: 0,
        }
    }

    pub fn is_end_of_stream(&self) -> bool {
        self.timestamp == INVALID_TIMESTAMP
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Sample[v={}, t={}]", self.value, self.timestamp)
    }
}

/// A confirmed on/off edge
///
/// `timestamp` is the time of the peak sample that confirmed the edge, which is
/// the sample immediately before the one where the signal started to recede.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    /// True when the confirmed peak was positive
    pub is_on: bool,
    /// Time of the confirmed peak sample
    pub timestamp: u64,
    /// Channel the edge was detected on
    pub channel: usize,
    /// Ordinal of the sample that confirmed the peak
    pub frame: u64,
}

impl Transition {
    pub fn new(is_on: bool, timestamp: u64, channel: usize, frame: u64) -> Self {
        Self {
            is_on,
            timestamp,
            channel,
            frame,
        }
    }

    /// Compare only polarity and time, ignoring where the edge came from
    pub fn same_edge(&self, other: &Transition) -> bool {
        self.is_on == other.is_on && self.timestamp == other.timestamp
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Transition[{}, t={}, ch={}, frame={}]",
            if self.is_on { "on" } else { "off" },
            self.timestamp,
            self.channel,
            self.frame
        )
    }
}
