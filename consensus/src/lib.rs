//! Producer scheduling and block finality.
//!
//! The crate owns the consensus-critical state between blocks: the producer
//! registry and its vote ledger, the interleaved voted/mined production
//! schedule with its virtual-time lotteries and proof-of-work target, and
//! the two-phase (verify, then commit) finality records with equivocation
//! slashing.
//!
//! Everything external (blocks, balances, accounts, stored transactions) is
//! reached through the traits in [`context`], supplied by the surrounding
//! node.

pub mod context;
pub mod error;
pub mod finality;
pub mod median;
pub mod producer_update;
pub mod proof_of_work;
pub mod registry;
pub mod schedule;
pub mod state;
pub mod version;
pub mod violation;
pub mod vote;

mod shuffle;
#[cfg(test)]
pub(crate) mod testing;

pub use context::{AccountRegistry, Balances, BlockStore, StakeSource, TransactionStore};
pub use error::ConsensusError;
pub use finality::{apply_commit_block, apply_verify_block, BlockValidation, ValidationLedger};
pub use median::median_properties;
pub use producer_update::apply_producer_update;
pub use proof_of_work::{apply_proof_of_work, top_miners};
pub use registry::{Producer, ProducerRegistry};
pub use schedule::{rebuild_schedule, ProducerSchedule};
pub use state::ConsensusState;
pub use version::{hardfork_vote, majority_version, HardforkState};
pub use violation::{apply_producer_violation, CommitViolation, ViolationLedger};
pub use vote::{ProducerVote, VoteLedger};
