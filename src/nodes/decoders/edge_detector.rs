//! Sync edge detector — two-phase sign/peak state machine
//!
//! Consumes samples one at a time and reports a [`Transition`] each time a
//! half-cycle of the sync waveform is confirmed.
//!
//! Flow per half-cycle:
//!   1. Wait for the signal to cross (or touch) zero between two samples
//!   2. Wait for the signal to start receding from its extreme on the new side
//!   3. Emit the extreme sample as the edge, go back to step 1
//!
//! Requiring the peak after the crossing keeps noise wobbling around zero from
//! producing more than one edge per half-cycle.

use super::types::DetectorPhase;
use crate::runtime::sample::{Sample, Transition};
use tracing::trace;

/// True if the pair crosses or touches zero.
///
/// Zero counts as both signs, so `0 -> 5` and `0 -> -5` are both inflections
/// while `0 -> 0` is not.
#[inline]
pub fn is_inflection(prev: &Sample, next: &Sample) -> bool {
    let low_to_high = prev.value <= 0 && next.value > 0;
    let high_to_low = prev.value >= 0 && next.value < 0;
    low_to_high || high_to_low
}

/// True if `prev` is a local extreme that `next` has started to retreat from.
#[inline]
pub fn is_peak_confirmed(prev: &Sample, next: &Sample) -> bool {
    (prev.value > 0 && prev.value > next.value) || (prev.value < 0 && prev.value < next.value)
}

/// Two-phase edge detector
///
/// Holds only the previous sample and the current phase. The first sample
/// pushed seeds the previous sample and is never itself tested.
#[derive(Debug, Clone)]
pub struct EdgeDetector {
    channel: usize,
    phase: DetectorPhase,
    prev: Option<Sample>,
    /// Ordinal of the next sample to be pushed
    position: u64,
    edges_found: u64,
}

impl EdgeDetector {
    pub fn new() -> Self {
        Self {
            channel: 0,
            phase: DetectorPhase::SeekingInflection,
            prev: None,
            position: 0,
            edges_found: 0,
        }
    }

    /// Tag emitted transitions with a channel index
    pub fn with_channel(mut self, channel: usize) -> Self {
        self.channel = channel;
        self
    }

    pub fn phase(&self) -> DetectorPhase {
        self.phase
    }

    /// Number of transitions emitted so far
    pub fn edges_found(&self) -> u64 {
        self.edges_found
    }

    /// Forget all history, as if no sample had been pushed
    pub fn reset(&mut self) {
        self.phase = DetectorPhase::SeekingInflection;
        self.prev = None;
        self.position = 0;
        self.edges_found = 0;
    }

    /// Feed one sample. Returns a transition when this sample confirms a peak.
    pub fn push(&mut self, current: Sample) -> Option<Transition> {
        let frame = self.position;
        self.position += 1;

        // The first sample only seeds `prev`
        let prev = self.prev.replace(current)?;

        match self.phase {
            DetectorPhase::SeekingInflection => {
                if is_inflection(&prev, &current) {
                    trace!(
                        "Inflection {} -> {} at t={}",
                        prev.value, current.value, current.timestamp
                    );
                    self.phase = DetectorPhase::SeekingPeak;
                }
                None
            }
            DetectorPhase::SeekingPeak => {
                if !is_peak_confirmed(&prev, &current) {
                    return None;
                }
                self.phase = DetectorPhase::SeekingInflection;
                self.edges_found += 1;
                let transition =
                    Transition::new(prev.value > 0, prev.timestamp, self.channel, frame);
                trace!("Edge #{}: {}", self.edges_found, transition);
                Some(transition)
            }
        }
    }

    /// Run the detector over an in-memory sample array
    pub fn detect(&mut self, samples: &[Sample]) -> Vec<Transition> {
        samples.iter().filter_map(|&s| self.push(s)).collect()
    }
}

impl Default for EdgeDetector {
    fn default() -> Self {
        Self::new()
    }
}
