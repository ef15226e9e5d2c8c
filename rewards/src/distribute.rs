//! The four reward distributions.
//!
//! Each distribution drains (part of) one pool through the balance
//! interface and deducts the drained amount from the pending supply.
//! Splits use integer floor division with the residue retained by the
//! pool, so every node pays bit-identical amounts and value is conserved.

use tracing::{debug, info};

use helix_consensus::{Balances, ProducerRegistry, ValidationLedger};
use helix_types::{AccountName, Amount};

use crate::fund::RewardFund;

/// Minimum commitment stake for a validation to earn a share.
pub const VALIDATION_REWARD_MINIMUM_STAKE: Amount = Amount::ONE;

/// Pay the entire work pool to the miner of an accepted proof.
pub fn claim_proof_of_work_reward(
    fund: &mut RewardFund,
    miner: &AccountName,
    balances: &mut impl Balances,
) -> Amount {
    let reward = fund.work_reward_balance;
    if reward.is_zero() {
        return Amount::ZERO;
    }
    fund.work_reward_balance = Amount::ZERO;
    balances.add_reward_balance(miner, reward);
    balances.sub_pending_supply(reward);
    debug!(miner = %miner, reward = %reward, "proof of work reward claimed");
    reward
}

/// Hourly split of the transaction-stake pool, proportional to each
/// producer's decayed `recent_txn_stake_weight`.
pub fn process_txn_stake_rewards(
    fund: &mut RewardFund,
    registry: &ProducerRegistry,
    balances: &mut impl Balances,
) -> Amount {
    let pool = fund.txn_stake_reward_balance;
    if pool.is_zero() {
        return Amount::ZERO;
    }
    let total: u128 = registry
        .iter()
        .map(|p| p.recent_txn_stake_weight)
        .fold(0u128, u128::saturating_add);
    if total == 0 {
        return Amount::ZERO;
    }

    let mut distributed = Amount::ZERO;
    for producer in registry.iter_by_txn_stake() {
        if producer.recent_txn_stake_weight == 0 {
            break;
        }
        let share = pool.proportion(producer.recent_txn_stake_weight, total);
        if share.is_zero() {
            continue;
        }
        balances.add_reward_balance(&producer.owner, share);
        distributed = distributed.saturating_add(share);
    }

    fund.txn_stake_reward_balance = pool.saturating_sub(distributed);
    balances.sub_pending_supply(distributed);
    debug!(pool = %pool, distributed = %distributed, "transaction stake rewards distributed");
    distributed
}

/// Per-block split of the validation pool across the committed validations
/// at the newly-irreversible height, proportional to commitment stake.
pub fn process_validation_rewards(
    fund: &mut RewardFund,
    validations: &ValidationLedger,
    height: u64,
    balances: &mut impl Balances,
) -> Amount {
    let pool = fund.validation_reward_balance;
    if pool.is_zero() {
        return Amount::ZERO;
    }
    let eligible: Vec<(&AccountName, Amount)> = validations
        .at_height(height)
        .filter(|v| v.committed && v.commitment_stake >= VALIDATION_REWARD_MINIMUM_STAKE)
        .map(|v| (&v.producer, v.commitment_stake))
        .collect();
    let total: u128 = eligible
        .iter()
        .map(|(_, stake)| stake.raw())
        .fold(0u128, u128::saturating_add);
    if total == 0 {
        return Amount::ZERO;
    }

    let mut distributed = Amount::ZERO;
    for (producer, stake) in eligible {
        let share = pool.proportion(stake.raw(), total);
        if share.is_zero() {
            continue;
        }
        balances.add_reward_balance(producer, share);
        distributed = distributed.saturating_add(share);
    }

    fund.validation_reward_balance = pool.saturating_sub(distributed);
    balances.sub_pending_supply(distributed);
    debug!(height, pool = %pool, distributed = %distributed, "validation rewards distributed");
    distributed
}

/// Eight-hourly winner-take-all payout of the activity pool to the producer
/// with the highest accumulated activity stake. The winner's accumulator
/// resets so the race restarts each period.
pub fn process_producer_activity_rewards(
    fund: &mut RewardFund,
    registry: &mut ProducerRegistry,
    balances: &mut impl Balances,
) -> Amount {
    let pool = fund.producer_activity_reward_balance;
    if pool.is_zero() {
        return Amount::ZERO;
    }
    let Some(winner) = registry
        .iter_by_activity_stake()
        .next()
        .filter(|p| p.accumulated_activity_stake > 0)
        .map(|p| p.owner.clone())
    else {
        return Amount::ZERO;
    };

    fund.producer_activity_reward_balance = Amount::ZERO;
    balances.add_reward_balance(&winner, pool);
    balances.sub_pending_supply(pool);
    // The winner exists; it was just read out of the index.
    let _ = registry.update(&winner, |p| p.accumulated_activity_stake = 0);

    info!(winner = %winner, reward = %pool, "producer activity reward paid");
    pool
}
