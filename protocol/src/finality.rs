//! Block verification, commitment, and equivocation-report operations.

use serde::{Deserialize, Serialize};

use helix_types::{AccountName, Amount, BlockId, TxId};

use crate::error::ProtocolError;

/// Minimum stake for commitments and violation evidence: one raw token unit.
pub const MINIMUM_STAKE: Amount = Amount::new(1);

/// A top producer attests that `block_id` is the block it saw at that
/// height. Free of stake; re-verification with a different id corrects a
/// wrong-fork attestation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyBlockOp {
    pub producer: AccountName,
    pub block_id: BlockId,
}

impl VerifyBlockOp {
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if !self.producer.is_valid() {
            return Err(ProtocolError::InvalidAccountName(
                self.producer.as_str().to_string(),
            ));
        }
        if self.block_id.is_zero() {
            return Err(ProtocolError::ZeroBlockId);
        }
        Ok(())
    }
}

/// A top producer stakes on a verified block becoming final.
///
/// `verifications` references previously broadcast [`VerifyBlockOp`]
/// transactions by id; the evaluator re-checks each one independently and
/// requires a quorum before the commitment is accepted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitBlockOp {
    pub producer: AccountName,
    pub block_id: BlockId,
    pub verifications: Vec<TxId>,
    pub commitment_stake: Amount,
}

impl CommitBlockOp {
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if !self.producer.is_valid() {
            return Err(ProtocolError::InvalidAccountName(
                self.producer.as_str().to_string(),
            ));
        }
        if self.block_id.is_zero() {
            return Err(ProtocolError::ZeroBlockId);
        }
        if self.commitment_stake < MINIMUM_STAKE {
            return Err(ProtocolError::InsufficientStake);
        }
        if self.verifications.is_empty() {
            return Err(ProtocolError::EmptyVerificationSet);
        }
        Ok(())
    }
}

/// Report of a producer signing two conflicting commitments for the same
/// height. Carries both raw signed transactions so the evaluator can verify
/// each signature independently of anything already on chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerViolationOp {
    pub reporter: AccountName,
    pub first_trx: Vec<u8>,
    pub second_trx: Vec<u8>,
}

impl ProducerViolationOp {
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if !self.reporter.is_valid() {
            return Err(ProtocolError::InvalidAccountName(
                self.reporter.as_str().to_string(),
            ));
        }
        if self.first_trx.is_empty() || self.second_trx.is_empty() {
            return Err(ProtocolError::MalformedTransaction(
                "empty evidence transaction".into(),
            ));
        }
        if self.first_trx == self.second_trx {
            return Err(ProtocolError::IdenticalEvidence);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_requires_concrete_block() {
        let op = VerifyBlockOp {
            producer: AccountName::new("alice"),
            block_id: BlockId::ZERO,
        };
        assert!(matches!(op.validate(), Err(ProtocolError::ZeroBlockId)));
    }

    #[test]
    fn commit_requires_minimum_stake() {
        let op = CommitBlockOp {
            producer: AccountName::new("alice"),
            block_id: BlockId::new(5, [1; 32]),
            verifications: vec![TxId::new([2; 32])],
            commitment_stake: Amount::ZERO,
        };
        assert!(matches!(
            op.validate(),
            Err(ProtocolError::InsufficientStake)
        ));
    }

    #[test]
    fn commit_requires_verifications() {
        let op = CommitBlockOp {
            producer: AccountName::new("alice"),
            block_id: BlockId::new(5, [1; 32]),
            verifications: vec![],
            commitment_stake: Amount::ONE,
        };
        assert!(matches!(
            op.validate(),
            Err(ProtocolError::EmptyVerificationSet)
        ));
    }

    #[test]
    fn violation_rejects_identical_evidence() {
        let op = ProducerViolationOp {
            reporter: AccountName::new("reporter"),
            first_trx: vec![1, 2, 3],
            second_trx: vec![1, 2, 3],
        };
        assert!(matches!(
            op.validate(),
            Err(ProtocolError::IdenticalEvidence)
        ));
    }
}
