//! Cadence-gated reward distributions.
//!
//! Four independent pools pay out on their own schedules: the work pool on
//! each accepted proof, the transaction-stake pool hourly, the validation
//! pool per newly-irreversible block, and the activity pool eight-hourly.
//! The driver in `helix-chain` decides when each runs; this crate only
//! moves value.

pub mod distribute;
pub mod fund;

pub use distribute::{
    claim_proof_of_work_reward, process_producer_activity_rewards, process_txn_stake_rewards,
    process_validation_rewards, VALIDATION_REWARD_MINIMUM_STAKE,
};
pub use fund::RewardFund;
