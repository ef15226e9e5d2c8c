//! Proof-of-work for mined producer slots.
//!
//! Accepted proofs feed two places in consensus: the miner's `mining_power`
//! (entry into the mined half of the producer schedule) and the schedule's
//! `recent_pow` accumulator, which drives hourly difficulty retargeting.

pub mod difficulty;
pub mod error;
pub mod generator;
pub mod proof;

pub use difficulty::{retarget, target_pow_rate};
pub use error::WorkError;
pub use generator::WorkGenerator;
pub use proof::ProofOfWorkInput;
