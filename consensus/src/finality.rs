//! Two-phase block finality: verify, then commit under stake.
//!
//! Verification is free and broadens visibility of what the top producers
//! consider the canonical block at a height. Commitment requires staking
//! and a quorum of independently re-validated verifications; a committed
//! record is immutable from then on.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use helix_protocol::{CommitBlockOp, Operation, VerifyBlockOp, MINIMUM_STAKE};
use helix_types::{AccountName, Amount, BlockId, Timestamp, TxId};

use crate::context::{Balances, BlockStore, TransactionStore};
use crate::error::ConsensusError;
use crate::state::ConsensusState;

/// One producer's verification (and possibly commitment) of a block at a
/// height. Keyed by `(producer, height)`; one record per pair.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockValidation {
    pub producer: AccountName,
    pub block_height: u64,
    pub block_id: BlockId,
    /// Transaction that carried the (latest) verification.
    pub verify_txn: TxId,
    pub committed: bool,
    /// Head-block time when the commitment landed; zero until then.
    pub commit_time: Timestamp,
    pub commitment_stake: Amount,
    /// Verification transactions the commitment referenced.
    pub verifications: Vec<TxId>,
    /// Producers whose referenced verifications checked out at commit time.
    pub verifiers: BTreeSet<AccountName>,
}

/// Validation records indexed by `(producer, height)` and by height for the
/// per-block validation-reward walk. Records are never deleted; they are the
/// audit trail equivocation reports are checked against.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ValidationLedger {
    records: BTreeMap<(AccountName, u64), BlockValidation>,
    by_height: BTreeSet<(u64, AccountName)>,
}

impl ValidationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn get(&self, producer: &AccountName, height: u64) -> Option<&BlockValidation> {
        self.records.get(&(producer.clone(), height))
    }

    pub fn insert(&mut self, validation: BlockValidation) {
        self.by_height
            .insert((validation.block_height, validation.producer.clone()));
        self.records.insert(
            (validation.producer.clone(), validation.block_height),
            validation,
        );
    }

    pub fn update(
        &mut self,
        producer: &AccountName,
        height: u64,
        f: impl FnOnce(&mut BlockValidation),
    ) -> Result<(), ConsensusError> {
        let record = self
            .records
            .get_mut(&(producer.clone(), height))
            .ok_or_else(|| ConsensusError::MissingVerification {
                producer: producer.as_str().to_string(),
                height,
            })?;
        f(record);
        Ok(())
    }

    /// All validations at one height, producer-name order.
    pub fn at_height(&self, height: u64) -> impl Iterator<Item = &BlockValidation> + '_ {
        self.by_height
            .range((height, AccountName::empty())..)
            .take_while(move |(h, _)| *h == height)
            .map(|(h, producer)| &self.records[&(producer.clone(), *h)])
    }
}

/// Evaluate a `verify_block` operation.
pub fn apply_verify_block(
    state: &mut ConsensusState,
    op: &VerifyBlockOp,
    tx_id: TxId,
    blocks: &impl BlockStore,
) -> Result<(), ConsensusError> {
    op.validate()?;
    if !state.registry.contains(&op.producer) {
        return Err(ConsensusError::UnknownProducer(
            op.producer.as_str().to_string(),
        ));
    }
    if !state.schedule.is_top_producer(&op.producer) {
        return Err(ConsensusError::NotTopProducer(
            op.producer.as_str().to_string(),
        ));
    }

    let height = op.block_id.block_num();
    check_height_open(state, &op.producer, height, blocks)?;
    if !blocks.contains_block(&op.block_id) {
        return Err(ConsensusError::UnknownBlock(op.block_id.to_string()));
    }

    match state.validations.get(&op.producer, height) {
        Some(existing) if existing.committed => {
            if existing.block_id != op.block_id {
                return Err(ConsensusError::FatalCommittedMutation {
                    producer: op.producer.as_str().to_string(),
                    height,
                });
            }
            Err(ConsensusError::DuplicateVerification)
        }
        Some(existing) if existing.block_id == op.block_id => {
            Err(ConsensusError::DuplicateVerification)
        }
        Some(_) => {
            // Re-verification: the producer corrects which fork it attests.
            state.validations.update(&op.producer, height, |record| {
                record.block_id = op.block_id;
                record.verify_txn = tx_id;
            })?;
            debug!(producer = %op.producer, height, block = %op.block_id, "block re-verified");
            Ok(())
        }
        None => {
            state.validations.insert(BlockValidation {
                producer: op.producer.clone(),
                block_height: height,
                block_id: op.block_id,
                verify_txn: tx_id,
                committed: false,
                commit_time: Timestamp::ZERO,
                commitment_stake: Amount::ZERO,
                verifications: Vec::new(),
                verifiers: BTreeSet::new(),
            });
            debug!(producer = %op.producer, height, block = %op.block_id, "block verified");
            Ok(())
        }
    }
}

/// Evaluate a `commit_block` operation.
pub fn apply_commit_block(
    state: &mut ConsensusState,
    op: &CommitBlockOp,
    blocks: &impl BlockStore,
    transactions: &impl TransactionStore,
    balances: &impl Balances,
) -> Result<(), ConsensusError> {
    op.validate()?;
    if !state.registry.contains(&op.producer) {
        return Err(ConsensusError::UnknownProducer(
            op.producer.as_str().to_string(),
        ));
    }
    if !state.schedule.is_top_producer(&op.producer) {
        return Err(ConsensusError::NotTopProducer(
            op.producer.as_str().to_string(),
        ));
    }

    let height = op.block_id.block_num();
    check_height_open(state, &op.producer, height, blocks)?;
    if !blocks.contains_block(&op.block_id) {
        return Err(ConsensusError::UnknownBlock(op.block_id.to_string()));
    }

    let record = state.validations.get(&op.producer, height).ok_or_else(|| {
        ConsensusError::MissingVerification {
            producer: op.producer.as_str().to_string(),
            height,
        }
    })?;
    if record.committed {
        if record.block_id != op.block_id {
            return Err(ConsensusError::FatalCommittedMutation {
                producer: op.producer.as_str().to_string(),
                height,
            });
        }
        return Err(ConsensusError::AlreadyCommitted {
            producer: op.producer.as_str().to_string(),
            height,
        });
    }
    if record.block_id != op.block_id {
        return Err(ConsensusError::VerificationMismatch);
    }

    let staked = balances.staked_balance(&op.producer);
    if staked < op.commitment_stake || op.commitment_stake < MINIMUM_STAKE {
        return Err(ConsensusError::InsufficientStake {
            have: staked,
            need: op.commitment_stake.max(MINIMUM_STAKE),
        });
    }

    let verifiers = valid_verifiers(state, op, transactions);
    let verifier_count = verifiers.len();
    let quorum = state.schedule.params.commit_quorum();
    if verifier_count < quorum {
        return Err(ConsensusError::QuorumNotMet {
            have: verifier_count,
            need: quorum,
        });
    }

    let commit_time = blocks.head_block_time();
    state.validations.update(&op.producer, height, |record| {
        record.committed = true;
        record.commit_time = commit_time;
        record.commitment_stake = op.commitment_stake;
        record.verifications = op.verifications.clone();
        record.verifiers = verifiers;
    })?;
    state.registry.update(&op.producer, |p| {
        p.last_commit_height = height;
        p.last_commit_id = op.block_id;
        p.accumulated_activity_stake = p
            .accumulated_activity_stake
            .saturating_add(op.commitment_stake.raw());
    })?;

    info!(
        producer = %op.producer,
        height,
        block = %op.block_id,
        stake = %op.commitment_stake,
        verifiers = verifier_count,
        "block committed"
    );
    Ok(())
}

/// The distinct top producers whose referenced verification transactions
/// independently check out for the committed block id.
fn valid_verifiers(
    state: &ConsensusState,
    op: &CommitBlockOp,
    transactions: &impl TransactionStore,
) -> BTreeSet<AccountName> {
    let mut verifiers: BTreeSet<AccountName> = BTreeSet::new();
    let unique: BTreeSet<&TxId> = op.verifications.iter().collect();
    for tx_id in unique {
        let Some(tx) = transactions.fetch_transaction(tx_id) else {
            continue;
        };
        if tx.verify().is_err() {
            continue;
        }
        let Operation::VerifyBlock(verify) = &tx.operation else {
            continue;
        };
        if verify.block_id != op.block_id {
            continue;
        }
        if !state.schedule.is_top_producer(&verify.producer) {
            continue;
        }
        // The envelope must be signed with the verifying producer's key.
        let Some(producer) = state.registry.get(&verify.producer) else {
            continue;
        };
        if producer.signing_key != Some(tx.signatory) {
            continue;
        }
        verifiers.insert(verify.producer.clone());
    }
    verifiers
}

/// Blocks at or below the last irreversible height, or at or below the
/// producer's own last commitment, are closed for further finality traffic.
fn check_height_open(
    state: &ConsensusState,
    producer: &AccountName,
    height: u64,
    blocks: &impl BlockStore,
) -> Result<(), ConsensusError> {
    if height <= blocks.last_irreversible_block_num() {
        return Err(ConsensusError::BlockAlreadyFinal(height));
    }
    if let Some(p) = state.registry.get(producer) {
        if height <= p.last_commit_height {
            return Err(ConsensusError::BlockAlreadyFinal(height));
        }
    }
    Ok(())
}
