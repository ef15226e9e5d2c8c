//! The `proof_of_work` evaluator.
//!
//! An accepted proof credits the miner's mining power and the schedule's
//! `recent_pow` accumulator, and may create the miner's account: mining is
//! the only way onto the chain without paying an account-creation fee.

use tracing::{debug, info};

use helix_protocol::ProofOfWorkOp;
use helix_types::{AccountName, BLOCKCHAIN_PRECISION};

use crate::context::{AccountRegistry, BlockStore};
use crate::error::ConsensusError;
use crate::registry::Producer;
use crate::state::ConsensusState;

pub fn apply_proof_of_work(
    state: &mut ConsensusState,
    op: &ProofOfWorkOp,
    blocks: &impl BlockStore,
    accounts: &mut impl AccountRegistry,
) -> Result<(), ConsensusError> {
    op.validate()?;

    // A proof must extend the head block; anything else is recycled work.
    if op.work.prev_block != blocks.head_block_id() {
        return Err(ConsensusError::StaleWork);
    }
    op.work.validate(state.schedule.pow_target)?;

    let now = blocks.head_block_time();
    let miner = op.work.miner_account.clone();
    let median = state.median_props.clone();

    if accounts.account_exists(&miner) {
        if op.new_owner_key.is_some() {
            return Err(ConsensusError::UnexpectedOwnerKey(
                miner.as_str().to_string(),
            ));
        }
    } else {
        let Some(owner_key) = op.new_owner_key else {
            return Err(ConsensusError::MissingOwnerKey);
        };
        accounts.create_account(&miner, owner_key);
        info!(miner = %miner, "account created by proof of work");
    }

    if !state.registry.contains(&miner) {
        let signing_key = op.new_owner_key.or_else(|| accounts.account_key(&miner));
        let mut producer = Producer::new(miner.clone(), signing_key, now);
        producer.voting_virtual_scheduled_time = Producer::next_scheduled_time(
            state.schedule.current_voting_virtual_time,
            0,
        )
        .unwrap_or(u128::MAX);
        producer.mining_virtual_scheduled_time = Producer::next_scheduled_time(
            state.schedule.current_mining_virtual_time,
            0,
        )
        .unwrap_or(u128::MAX);
        state.registry.insert(producer)?;
    }

    state.registry.update(&miner, |p| {
        p.decay_weights(now, &median);
        p.mining_power = p.mining_power.saturating_add(BLOCKCHAIN_PRECISION);
        p.mining_count += 1;
        p.props = op.props.clone();
    })?;

    state.schedule.decay_pow(now, &median);
    state.schedule.recent_pow = state
        .schedule
        .recent_pow
        .saturating_add(BLOCKCHAIN_PRECISION);

    debug!(miner = %miner, nonce = op.work.nonce, "proof of work accepted");
    Ok(())
}

/// The miner names eligible for the mined half of the schedule, in mining
/// power order. Exposed for operator tooling.
pub fn top_miners(state: &ConsensusState, limit: usize) -> Vec<AccountName> {
    state
        .registry
        .iter_by_mining_power()
        .filter(|p| p.is_schedulable() && p.mining_power > 0)
        .take(limit)
        .map(|p| p.owner.clone())
        .collect()
}
