//! Consensus constants and the per-round schedule parameters.
//!
//! The fixed constants mirror the mainnet configuration. The slot counts
//! live in [`ScheduleParams`] rather than constants so tests and devnets can
//! run with small producer sets; mainnet uses [`ScheduleParams::default`].

use serde::{Deserialize, Serialize};

/// Raw token units per whole HLX.
pub const BLOCKCHAIN_PRECISION: u128 = 100_000_000;

/// Microseconds between block production slots.
pub const BLOCK_INTERVAL_MICROS: u64 = 788_400;

/// Blocks per hour at the configured block interval.
pub const BLOCKS_PER_HOUR: u64 = 3_600_000_000 / BLOCK_INTERVAL_MICROS;

/// Blocks per day at the configured block interval.
pub const BLOCKS_PER_DAY: u64 = 24 * BLOCKS_PER_HOUR;

/// Full lap of the weighted fair-queuing virtual schedule.
pub const VIRTUAL_SCHEDULE_LAP_LENGTH: u128 = u128::MAX;

/// Percentage of top producers whose verifications a commitment must carry.
pub const IRREVERSIBLE_THRESHOLD_PERCENT: u128 = 67;

/// Blocks between proof-of-work difficulty retargets (hourly).
pub const POW_UPDATE_BLOCK_INTERVAL: u64 = BLOCKS_PER_HOUR;

/// Blocks between transaction-stake reward distributions (hourly).
pub const TXN_STAKE_BLOCK_INTERVAL: u64 = BLOCKS_PER_HOUR;

/// Blocks between producer-activity reward distributions (eight-hourly).
pub const POA_BLOCK_INTERVAL: u64 = 8 * BLOCKS_PER_HOUR;

/// Blocks between full producer voting-power refreshes (daily).
pub const SET_UPDATE_BLOCK_INTERVAL: u64 = BLOCKS_PER_DAY;

/// Initial proof-of-work target for a new chain.
pub const INITIAL_POW_TARGET: u128 = u128::MAX / 1000;

/// Per-round producer slot counts.
///
/// The voted and mined sides are symmetric: each contributes the same number
/// of slots, and the two sequences interleave one-for-one into the shuffled
/// production order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleParams {
    /// Voted slots filled by highest voting power.
    pub top_voted: u32,
    /// Voted slots filled from the voting virtual-time lottery.
    pub additional_voted: u32,
    /// Mined slots filled by highest mining power.
    pub top_mined: u32,
    /// Mined slots filled from the mining virtual-time lottery.
    pub additional_mined: u32,
    /// Scheduled producers that must agree before a hardfork activates.
    pub hardfork_required_producers: u32,
}

impl Default for ScheduleParams {
    fn default() -> Self {
        Self {
            top_voted: 50,
            additional_voted: 10,
            top_mined: 50,
            additional_mined: 10,
            hardfork_required_producers: 90,
        }
    }
}

impl ScheduleParams {
    /// Total voted slots per round.
    pub fn max_voted(&self) -> u32 {
        self.top_voted + self.additional_voted
    }

    /// Total mined slots per round.
    pub fn max_mined(&self) -> u32 {
        self.top_mined + self.additional_mined
    }

    /// Total slots per round; also the rebuild cadence in blocks.
    pub fn total_producers(&self) -> u32 {
        self.max_voted() + self.max_mined()
    }

    /// Verification quorum for `commit_block`, derived from the top slot
    /// counts of both production regimes.
    pub fn commit_quorum(&self) -> usize {
        (IRREVERSIBLE_THRESHOLD_PERCENT * (self.top_voted as u128 + self.top_mined as u128) / 100)
            as usize
    }

    /// Symmetric lotteries with at least one slot per side.
    pub fn is_valid(&self) -> bool {
        self.max_voted() == self.max_mined()
            && self.max_voted() > 0
            && self.hardfork_required_producers <= self.total_producers()
    }
}
