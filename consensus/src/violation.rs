//! Equivocation reports: two signed commitments for the same height with
//! different block ids.
//!
//! Anyone may report. The evidence is two complete raw transactions, each
//! signature-checked independently here, so the report stands on its own
//! even if neither commitment was ever applied on this chain.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use helix_protocol::{CommitBlockOp, Operation, ProducerViolationOp, SignedTransaction, MINIMUM_STAKE};
use helix_types::{AccountName, Amount, BlockId};

use crate::context::Balances;
use crate::error::ConsensusError;
use crate::state::ConsensusState;

/// A proven conflicting commitment, recorded at most once per
/// `(producer, height)`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommitViolation {
    pub reporter: AccountName,
    pub producer: AccountName,
    pub height: u64,
    pub first_block_id: BlockId,
    pub second_block_id: BlockId,
    /// Stake moved from the producer to the reporter.
    pub forfeited: Amount,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ViolationLedger {
    violations: BTreeMap<(AccountName, u64), CommitViolation>,
}

impl ViolationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn get(&self, producer: &AccountName, height: u64) -> Option<&CommitViolation> {
        self.violations.get(&(producer.clone(), height))
    }

    pub fn contains(&self, producer: &AccountName, height: u64) -> bool {
        self.violations.contains_key(&(producer.clone(), height))
    }

    fn insert(&mut self, violation: CommitViolation) {
        self.violations.insert(
            (violation.producer.clone(), violation.height),
            violation,
        );
    }
}

/// Evaluate a `producer_violation` operation.
pub fn apply_producer_violation(
    state: &mut ConsensusState,
    op: &ProducerViolationOp,
    balances: &mut impl Balances,
) -> Result<(), ConsensusError> {
    op.validate()?;

    let first = extract_commit(state, &op.first_trx)?;
    let second = extract_commit(state, &op.second_trx)?;

    if first.producer != second.producer {
        return Err(ConsensusError::EvidenceNotConflicting);
    }
    let height = first.block_id.block_num();
    if second.block_id.block_num() != height || first.block_id == second.block_id {
        return Err(ConsensusError::EvidenceNotConflicting);
    }
    if first.commitment_stake < MINIMUM_STAKE || second.commitment_stake < MINIMUM_STAKE {
        return Err(ConsensusError::InsufficientStake {
            have: first.commitment_stake.min(second.commitment_stake),
            need: MINIMUM_STAKE,
        });
    }

    let producer = first.producer.clone();
    if state.violations.contains(&producer, height) {
        return Err(ConsensusError::ViolationAlreadyClaimed {
            producer: producer.as_str().to_string(),
            height,
        });
    }

    let available = balances.staked_balance(&producer);
    let forfeited = first
        .commitment_stake
        .max(second.commitment_stake)
        .min(available);
    balances.sub_staked_balance(&producer, forfeited);
    balances.add_staked_balance(&op.reporter, forfeited);

    warn!(
        producer = %producer,
        height,
        reporter = %op.reporter,
        forfeited = %forfeited,
        "conflicting commitments proven, stake forfeited"
    );

    state.violations.insert(CommitViolation {
        reporter: op.reporter.clone(),
        producer,
        height,
        first_block_id: first.block_id,
        second_block_id: second.block_id,
        forfeited,
    });
    Ok(())
}

/// Decode one raw evidence transaction, check its signature against the
/// accused producer's signing key, and pull out the commit payload.
fn extract_commit(
    state: &ConsensusState,
    raw: &[u8],
) -> Result<CommitBlockOp, ConsensusError> {
    let tx = SignedTransaction::from_bytes(raw)?;
    tx.verify()?;
    let Operation::CommitBlock(commit) = tx.operation else {
        return Err(ConsensusError::EvidenceNotConflicting);
    };
    let producer = state
        .registry
        .get(&commit.producer)
        .ok_or_else(|| ConsensusError::UnknownProducer(commit.producer.as_str().to_string()))?;
    if producer.signing_key != Some(tx.signatory) {
        return Err(ConsensusError::EvidenceNotConflicting);
    }
    Ok(commit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{top_producer_state, TestChain};
    use helix_crypto::keypair_from_seed;
    use helix_types::{KeyPair, ScheduleParams, TxId};

    fn params() -> ScheduleParams {
        ScheduleParams {
            top_voted: 2,
            additional_voted: 0,
            top_mined: 2,
            additional_mined: 0,
            hardfork_required_producers: 2,
        }
    }

    fn commit_tx(producer: &str, block_id: BlockId, stake: Amount, kp: &KeyPair) -> Vec<u8> {
        SignedTransaction::sign(
            Operation::CommitBlock(CommitBlockOp {
                producer: AccountName::new(producer),
                block_id,
                verifications: vec![TxId::new([1; 32])],
                commitment_stake: stake,
            }),
            kp,
        )
        .to_bytes()
    }

    fn setup() -> (ConsensusState, TestChain, KeyPair) {
        let (mut state, mut chain) = top_producer_state(params(), 4);
        let kp = keypair_from_seed(&[42; 32]);
        chain.set_producer_key(&mut state, "prod0", kp.public);
        chain.fund_stake("prod0", Amount::whole(5));
        (state, chain, kp)
    }

    #[test]
    fn violation_moves_stake_to_reporter() {
        let (mut state, mut chain, kp) = setup();
        let block_a = BlockId::new(7, [0xA; 32]);
        let block_b = BlockId::new(7, [0xB; 32]);
        let op = ProducerViolationOp {
            reporter: AccountName::new("reporter"),
            first_trx: commit_tx("prod0", block_a, Amount::whole(10), &kp),
            second_trx: commit_tx("prod0", block_b, Amount::whole(10), &kp),
        };

        apply_producer_violation(&mut state, &op, &mut chain).unwrap();

        // min(max(10, 10), available 5) = the full available stake.
        assert_eq!(chain.staked("prod0"), Amount::ZERO);
        assert_eq!(chain.staked("reporter"), Amount::whole(5));
        let violation = state
            .violations
            .get(&AccountName::new("prod0"), 7)
            .unwrap();
        assert_eq!(violation.forfeited, Amount::whole(5));
        assert_eq!(violation.first_block_id, block_a);
        assert_eq!(violation.second_block_id, block_b);
    }

    #[test]
    fn second_claim_for_same_height_rejected() {
        let (mut state, mut chain, kp) = setup();
        let block_a = BlockId::new(7, [0xA; 32]);
        let block_b = BlockId::new(7, [0xB; 32]);
        let op = ProducerViolationOp {
            reporter: AccountName::new("reporter"),
            first_trx: commit_tx("prod0", block_a, Amount::whole(1), &kp),
            second_trx: commit_tx("prod0", block_b, Amount::whole(1), &kp),
        };
        apply_producer_violation(&mut state, &op, &mut chain).unwrap();

        let late = ProducerViolationOp {
            reporter: AccountName::new("latecomer"),
            ..op
        };
        let err = apply_producer_violation(&mut state, &late, &mut chain).unwrap_err();
        assert!(matches!(
            err,
            ConsensusError::ViolationAlreadyClaimed { height: 7, .. }
        ));
        assert_eq!(chain.staked("latecomer"), Amount::ZERO);
    }

    #[test]
    fn same_block_id_is_not_a_violation() {
        let (mut state, mut chain, kp) = setup();
        let block = BlockId::new(7, [0xA; 32]);
        let op = ProducerViolationOp {
            reporter: AccountName::new("reporter"),
            first_trx: commit_tx("prod0", block, Amount::whole(1), &kp),
            second_trx: commit_tx("prod0", block, Amount::whole(2), &kp),
        };
        let err = apply_producer_violation(&mut state, &op, &mut chain).unwrap_err();
        assert!(matches!(err, ConsensusError::EvidenceNotConflicting));
    }

    #[test]
    fn different_heights_are_not_a_violation() {
        let (mut state, mut chain, kp) = setup();
        let op = ProducerViolationOp {
            reporter: AccountName::new("reporter"),
            first_trx: commit_tx("prod0", BlockId::new(7, [0xA; 32]), Amount::whole(1), &kp),
            second_trx: commit_tx("prod0", BlockId::new(8, [0xB; 32]), Amount::whole(1), &kp),
        };
        let err = apply_producer_violation(&mut state, &op, &mut chain).unwrap_err();
        assert!(matches!(err, ConsensusError::EvidenceNotConflicting));
    }

    #[test]
    fn wrong_signing_key_rejected() {
        let (mut state, mut chain, kp) = setup();
        let stranger = keypair_from_seed(&[99; 32]);
        let op = ProducerViolationOp {
            reporter: AccountName::new("reporter"),
            first_trx: commit_tx("prod0", BlockId::new(7, [0xA; 32]), Amount::whole(1), &stranger),
            second_trx: commit_tx("prod0", BlockId::new(7, [0xB; 32]), Amount::whole(1), &kp),
        };
        let err = apply_producer_violation(&mut state, &op, &mut chain).unwrap_err();
        assert!(matches!(err, ConsensusError::EvidenceNotConflicting));
        assert_eq!(chain.staked("prod0"), Amount::whole(5));
    }

    #[test]
    fn garbage_evidence_rejected() {
        let (mut state, mut chain, _) = setup();
        let op = ProducerViolationOp {
            reporter: AccountName::new("reporter"),
            first_trx: vec![1, 2, 3],
            second_trx: vec![4, 5, 6],
        };
        let err = apply_producer_violation(&mut state, &op, &mut chain).unwrap_err();
        assert!(matches!(err, ConsensusError::Protocol(_)));
    }
}
