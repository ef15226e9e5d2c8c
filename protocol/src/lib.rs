//! Signed operations accepted by the producer-scheduling core.
//!
//! Operation types:
//! - **ProducerUpdate**: register a producer, set its signing key and
//!   declared network-parameter proposal
//! - **ProofOfWork**: submit mined work, optionally creating the miner's
//!   account
//! - **VerifyBlock**: stake-free attestation of a block by a top producer
//! - **CommitBlock**: staked commitment referencing a quorum of
//!   verifications
//! - **ProducerViolation**: report two conflicting commitments by the same
//!   producer at the same height

pub mod error;
pub mod finality;
pub mod producer;
pub mod transaction;

use serde::{Deserialize, Serialize};

use helix_types::AccountName;

pub use error::ProtocolError;
pub use finality::{CommitBlockOp, ProducerViolationOp, VerifyBlockOp, MINIMUM_STAKE};
pub use producer::{ProducerUpdateOp, ProofOfWorkOp};
pub use transaction::SignedTransaction;

/// The unified operation enum.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Operation {
    ProducerUpdate(ProducerUpdateOp),
    ProofOfWork(ProofOfWorkOp),
    VerifyBlock(VerifyBlockOp),
    CommitBlock(CommitBlockOp),
    ProducerViolation(ProducerViolationOp),
}

impl Operation {
    /// The account whose authority must sign this operation.
    pub fn signatory_account(&self) -> &AccountName {
        match self {
            Self::ProducerUpdate(op) => &op.owner,
            Self::ProofOfWork(op) => &op.work.miner_account,
            Self::VerifyBlock(op) => &op.producer,
            Self::CommitBlock(op) => &op.producer,
            Self::ProducerViolation(op) => &op.reporter,
        }
    }

    /// Stateless structural validation. Stateful checks (stake balances,
    /// producer membership, quorums) are done by the consensus evaluators.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        match self {
            Self::ProducerUpdate(op) => op.validate(),
            Self::ProofOfWork(op) => op.validate(),
            Self::VerifyBlock(op) => op.validate(),
            Self::CommitBlock(op) => op.validate(),
            Self::ProducerViolation(op) => op.validate(),
        }
    }
}
