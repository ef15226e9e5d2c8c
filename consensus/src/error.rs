use thiserror::Error;

use helix_types::Amount;

/// Errors raised while evaluating consensus operations.
///
/// Two families: plain validation failures reject the offending transaction
/// and leave state untouched, while `Fatal*` variants signal an
/// internal-consistency break that must abort block processing entirely.
#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error("unknown account {0}")]
    UnknownAccount(String),

    #[error("unknown producer {0}")]
    UnknownProducer(String),

    #[error("producer {0} already registered")]
    ProducerExists(String),

    #[error("producer {0} is not in the current top producer set")]
    NotTopProducer(String),

    #[error("block {0} is unknown to this node")]
    UnknownBlock(String),

    #[error("block at height {0} is already final")]
    BlockAlreadyFinal(u64),

    #[error("re-verification with an identical block id")]
    DuplicateVerification,

    #[error("block at height {height} is already committed by {producer}")]
    AlreadyCommitted { producer: String, height: u64 },

    #[error("no verification by {producer} at height {height}")]
    MissingVerification { producer: String, height: u64 },

    #[error("commitment block id does not match the prior verification")]
    VerificationMismatch,

    #[error("verification quorum not met: {have} of {need} top producers")]
    QuorumNotMet { have: usize, need: usize },

    #[error("insufficient staked balance: have {have}, need {need}")]
    InsufficientStake { have: Amount, need: Amount },

    #[error("violation already claimed for {producer} at height {height}")]
    ViolationAlreadyClaimed { producer: String, height: u64 },

    #[error("evidence transactions do not prove conflicting commitments")]
    EvidenceNotConflicting,

    #[error("proof of work does not extend the current head block")]
    StaleWork,

    #[error("new miner account requires an owner key")]
    MissingOwnerKey,

    #[error("owner key supplied for existing account {0}")]
    UnexpectedOwnerKey(String),

    #[error("transaction signatory holds no authority over {0}")]
    UnauthorizedSignatory(String),

    #[error(transparent)]
    Work(#[from] helix_work::WorkError),

    #[error(transparent)]
    Protocol(#[from] helix_protocol::ProtocolError),

    #[error("fatal: committed validation for {producer} at height {height} would change block id")]
    FatalCommittedMutation { producer: String, height: u64 },

    #[error("fatal: schedule invariant violated: {0}")]
    FatalScheduleInvariant(String),
}

impl ConsensusError {
    /// Fatal errors abort block processing; everything else rejects only the
    /// offending transaction.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::FatalCommittedMutation { .. } | Self::FatalScheduleInvariant(_)
        )
    }
}
