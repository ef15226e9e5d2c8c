//! Fundamental types for the Helix protocol.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: account names, block and transaction identifiers, key and
//! signature wrappers, token amounts, timestamps, producer-proposed chain
//! properties, protocol versions, and the consensus constants.

pub mod account;
pub mod amount;
pub mod block;
pub mod error;
pub mod keys;
pub mod params;
pub mod properties;
pub mod time;
pub mod version;

pub use account::AccountName;
pub use amount::Amount;
pub use block::{BlockId, TxId};
pub use error::TypeError;
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature};
pub use params::{
    ScheduleParams, BLOCKCHAIN_PRECISION, BLOCKS_PER_DAY, BLOCKS_PER_HOUR, BLOCK_INTERVAL_MICROS,
    INITIAL_POW_TARGET, IRREVERSIBLE_THRESHOLD_PERCENT, POA_BLOCK_INTERVAL,
    POW_UPDATE_BLOCK_INTERVAL, SET_UPDATE_BLOCK_INTERVAL, TXN_STAKE_BLOCK_INTERVAL,
    VIRTUAL_SCHEDULE_LAP_LENGTH,
};
pub use properties::ChainProperties;
pub use time::Timestamp;
pub use version::ProtocolVersion;
