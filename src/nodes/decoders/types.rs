//! Common decoder types and enums

use std::fmt;

/// Phase of the two-step edge search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectorPhase {
    /// Waiting for consecutive samples to cross or touch zero
    #[default]
    SeekingInflection,
    /// Crossing seen, waiting for the signal to recede from its extreme
    SeekingPeak,
}

impl fmt::Display for DetectorPhase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DetectorPhase::SeekingInflection => write!(f, "seeking inflection"),
            DetectorPhase::SeekingPeak => write!(f, "seeking peak"),
        }
    }
}
