//! Word-level timing entries
//!
//! A timing table describes, for exactly one verse and one narrator, where
//! each word starts and ends inside the audio track. Offsets are seconds,
//! word indices are 0-based. Tables come from a remote API and live only in
//! memory.

use serde::{Deserialize, Serialize};

/// Start/end offsets of a single word within a verse's audio
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WordTiming {
    pub word_index: usize,
    /// Start offset in seconds (inclusive)
    pub start: f64,
    /// End offset in seconds (exclusive)
    pub end: f64,
}

impl WordTiming {
    pub fn new(word_index: usize, start: f64, end: f64) -> Self {
        Self {
            word_index,
            start,
            end,
        }
    }

    /// Checks whether an elapsed time falls inside `[start, end)`.
    pub fn contains(&self, elapsed: f64) -> bool {
        elapsed >= self.start && elapsed < self.end
    }
}

/// Ordered word timings for one verse
pub type TimingTable = Vec<WordTiming>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_half_open() {
        let timing = WordTiming::new(0, 0.5, 1.2);
        assert!(timing.contains(0.5));
        assert!(timing.contains(1.19));
        assert!(!timing.contains(1.2));
        assert!(!timing.contains(0.49));
    }
}
