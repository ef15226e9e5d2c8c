//! Recent production participation over a 128-slot window.

use serde::{Deserialize, Serialize};

/// One bit per recent slot, most recent in the low bit. A fresh tracker
/// reads as full participation so a starting node does not alarm on an
/// empty window.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ParticipationTracker {
    recent_slots_filled: u128,
}

impl Default for ParticipationTracker {
    fn default() -> Self {
        Self {
            recent_slots_filled: u128::MAX,
        }
    }
}

impl ParticipationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a produced block `slots_elapsed` slots after the previous
    /// one; the gap in between was missed.
    pub fn record(&mut self, slots_elapsed: u64) {
        if slots_elapsed >= 128 {
            self.recent_slots_filled = 0;
        } else {
            self.recent_slots_filled <<= slots_elapsed;
        }
        self.recent_slots_filled |= 1;
    }

    /// Filled slots over the window, in percent.
    pub fn rate_percent(&self) -> u32 {
        self.recent_slots_filled.count_ones() * 100 / 128
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_tracker_reads_full() {
        assert_eq!(ParticipationTracker::new().rate_percent(), 100);
    }

    #[test]
    fn consecutive_blocks_keep_full_participation() {
        let mut tracker = ParticipationTracker::new();
        for _ in 0..200 {
            tracker.record(1);
        }
        assert_eq!(tracker.rate_percent(), 100);
    }

    #[test]
    fn gaps_lower_the_rate() {
        let mut tracker = ParticipationTracker::new();
        for _ in 0..64 {
            tracker.record(2);
        }
        assert_eq!(tracker.rate_percent(), 50);
    }

    #[test]
    fn long_outage_zeroes_the_window() {
        let mut tracker = ParticipationTracker::new();
        tracker.record(500);
        // Only the newly produced block remains in the window.
        assert_eq!(tracker.rate_percent(), 0);
    }
}
