//! The per-block driver.
//!
//! Applies signed operations through the consensus evaluators and, after
//! each block, runs the cadence-gated subsystems: production bookkeeping,
//! validation rewards at the newly-irreversible heights, the hourly
//! difficulty retarget and transaction-stake split, the eight-hourly
//! activity payout, the daily voting-power refresh, and the schedule
//! rebuild every full round.

use tracing::{debug, warn};

use helix_consensus::{
    apply_commit_block, apply_producer_update, apply_producer_violation, apply_proof_of_work,
    apply_verify_block, rebuild_schedule, AccountRegistry, Balances, BlockStore, ConsensusError,
    ConsensusState, StakeSource, TransactionStore,
};
use helix_protocol::{Operation, SignedTransaction};
use helix_rewards::{
    claim_proof_of_work_reward, process_producer_activity_rewards, process_txn_stake_rewards,
    process_validation_rewards, RewardFund,
};
use helix_types::{
    AccountName, BlockId, ScheduleParams, Timestamp, POA_BLOCK_INTERVAL,
    POW_UPDATE_BLOCK_INTERVAL, SET_UPDATE_BLOCK_INTERVAL, TXN_STAKE_BLOCK_INTERVAL,
};

use crate::participation::ParticipationTracker;
use crate::slots::{scheduled_producer, slot_at_time};

/// Header facts of a block the node has just applied.
#[derive(Clone, Debug)]
pub struct AppliedBlock {
    pub producer: AccountName,
    pub block_num: u64,
    pub block_id: BlockId,
    pub timestamp: Timestamp,
}

/// Consensus state plus the reward pools and production bookkeeping that
/// advance with every block.
#[derive(Clone, Debug)]
pub struct BlockDriver {
    pub state: ConsensusState,
    pub fund: RewardFund,
    pub participation: ParticipationTracker,
    last_aslot: u64,
    last_irreversible_processed: u64,
    /// Stake-weighted bytes of the transactions applied since the last
    /// block, credited to its signing producer in `process_block`.
    pending_txn_stake: u128,
}

impl BlockDriver {
    pub fn new(params: ScheduleParams) -> Self {
        Self {
            state: ConsensusState::new(params),
            fund: RewardFund::new(),
            participation: ParticipationTracker::new(),
            last_aslot: 0,
            last_irreversible_processed: 0,
            pending_txn_stake: 0,
        }
    }

    /// Evaluate one signed operation against the current state. Validation
    /// failures reject the transaction and leave state untouched. Each
    /// accepted transaction accrues its signer's staked balance times its
    /// serialized size toward the block producer's transaction-stake weight.
    pub fn apply_transaction<B, S>(
        &mut self,
        tx: &SignedTransaction,
        blocks: &B,
        store: &mut S,
    ) -> Result<(), ConsensusError>
    where
        B: BlockStore + TransactionStore,
        S: Balances + AccountRegistry,
    {
        tx.verify()?;
        check_authority(&self.state, tx, store)?;
        match &tx.operation {
            Operation::ProducerUpdate(op) => {
                apply_producer_update(&mut self.state, op, &*store, blocks.head_block_time())?;
            }
            Operation::ProofOfWork(op) => {
                apply_proof_of_work(&mut self.state, op, blocks, store)?;
                claim_proof_of_work_reward(&mut self.fund, &op.work.miner_account, store);
            }
            Operation::VerifyBlock(op) => {
                apply_verify_block(&mut self.state, op, tx.id(), blocks)?;
            }
            Operation::CommitBlock(op) => {
                apply_commit_block(&mut self.state, op, blocks, blocks, &*store)?;
            }
            Operation::ProducerViolation(op) => {
                apply_producer_violation(&mut self.state, op, store)?;
            }
        }

        let signer = tx.operation.signatory_account();
        let weight = store
            .staked_balance(signer)
            .raw()
            .saturating_mul(tx.to_bytes().len() as u128);
        self.pending_txn_stake = self.pending_txn_stake.saturating_add(weight);
        Ok(())
    }

    /// Advance bookkeeping and run every cadence due at this block. Called
    /// once per applied block, after its transactions.
    pub fn process_block<B, S>(
        &mut self,
        block: &AppliedBlock,
        blocks: &B,
        store: &mut S,
        stake: &impl StakeSource,
    ) -> Result<(), ConsensusError>
    where
        B: BlockStore,
        S: Balances,
    {
        let aslot = slot_at_time(block.timestamp);
        // The first block this driver sees has no predecessor to measure a
        // gap against.
        let elapsed = if self.last_aslot == 0 {
            1
        } else {
            aslot.saturating_sub(self.last_aslot).max(1)
        };

        if self.last_aslot != 0 {
            for slot in (self.last_aslot + 1)..aslot {
                let missed = scheduled_producer(&self.state.schedule, slot).cloned();
                if let Some(name) = missed {
                    if self.state.registry.contains(&name) {
                        self.state.registry.update(&name, |p| p.total_missed += 1)?;
                        warn!(producer = %name, slot, "scheduled producer missed its slot");
                    }
                }
            }
        }
        self.participation.record(elapsed);
        self.last_aslot = aslot;

        let accrued = std::mem::take(&mut self.pending_txn_stake);
        if self.state.registry.contains(&block.producer) {
            let props = self.state.median_props.clone();
            self.state.registry.update(&block.producer, |p| {
                p.total_blocks += 1;
                p.last_aslot = aslot;
                p.last_confirmed_block_num = block.block_num;
                if accrued > 0 {
                    p.decay_weights(block.timestamp, &props);
                    p.recent_txn_stake_weight =
                        p.recent_txn_stake_weight.saturating_add(accrued);
                }
            })?;
        }

        let irreversible = blocks.last_irreversible_block_num();
        if irreversible > self.last_irreversible_processed {
            for height in (self.last_irreversible_processed + 1)..=irreversible {
                process_validation_rewards(&mut self.fund, &self.state.validations, height, store);
            }
            self.last_irreversible_processed = irreversible;
        }

        let num = block.block_num;
        if num > 0 && num % POW_UPDATE_BLOCK_INTERVAL == 0 {
            let props = self.state.median_props.clone();
            self.state.schedule.update_pow_target(block.timestamp, &props);
        }
        if num > 0 && num % TXN_STAKE_BLOCK_INTERVAL == 0 {
            process_txn_stake_rewards(&mut self.fund, &self.state.registry, store);
        }
        if num > 0 && num % POA_BLOCK_INTERVAL == 0 {
            process_producer_activity_rewards(&mut self.fund, &mut self.state.registry, store);
        }
        if num > 0 && num % SET_UPDATE_BLOCK_INTERVAL == 0 {
            let props = self.state.median_props.clone();
            self.state.votes.refresh_producer_powers(
                &mut self.state.registry,
                &mut self.state.schedule,
                stake,
                block.timestamp,
                &props,
            );
            debug!("producer voting powers refreshed");
        }

        let round = self.state.schedule.params.total_producers() as u64;
        if round > 0 && num > 0 && num % round == 0 {
            self.state.median_props = rebuild_schedule(
                &mut self.state.registry,
                &mut self.state.schedule,
                &mut self.state.hardfork,
                block.timestamp,
            )?;
        }
        Ok(())
    }
}

/// The envelope signatory must hold authority over the operation's account:
/// the account's owner key for identity and report operations, the
/// producer's signing key for finality operations, and the declared owner
/// key for account-creating proofs of work.
fn check_authority<S: AccountRegistry>(
    state: &ConsensusState,
    tx: &SignedTransaction,
    accounts: &S,
) -> Result<(), ConsensusError> {
    let signer = tx.operation.signatory_account();
    let authorized = match &tx.operation {
        Operation::ProducerUpdate(_) | Operation::ProducerViolation(_) => {
            accounts.account_key(signer) == Some(tx.signatory)
        }
        Operation::ProofOfWork(op) => match accounts.account_key(signer) {
            Some(key) => key == tx.signatory,
            None => op.new_owner_key == Some(tx.signatory),
        },
        Operation::VerifyBlock(_) | Operation::CommitBlock(_) => state
            .registry
            .get(signer)
            .is_some_and(|p| p.signing_key == Some(tx.signatory)),
    };
    if authorized {
        Ok(())
    } else {
        Err(ConsensusError::UnauthorizedSignatory(
            signer.as_str().to_string(),
        ))
    }
}
