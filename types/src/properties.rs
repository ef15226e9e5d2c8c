//! Producer-proposed network parameters.
//!
//! Every producer declares a `ChainProperties` proposal in its
//! `producer_update` operation. After each schedule rebuild the network
//! adopts the component-wise median of the scheduled producers' proposals,
//! so no single producer can move a parameter alone.

use serde::{Deserialize, Serialize};

use crate::amount::Amount;

/// Adjustable network parameters, voted on by block producers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainProperties {
    /// Fee charged to register a new account.
    pub account_creation_fee: Amount,

    /// Maximum serialized block size in bytes.
    pub maximum_block_size: u32,

    /// Desired average seconds between accepted proofs of work.
    pub pow_target_time_secs: u64,

    /// Averaging window, in seconds, for decaying recent proof-of-work.
    pub pow_decay_time_secs: u64,

    /// Averaging window, in seconds, for decaying transaction-stake weight.
    pub txn_stake_decay_time_secs: u64,

    /// Annualized credit interest rate, in basis points.
    pub credit_interest_rate: u16,

    /// Floor on per-transaction fees.
    pub minimum_transaction_fee: Amount,

    /// Maximum number of price-feed publishers per asset.
    pub maximum_asset_feed_publishers: u16,
}

impl Default for ChainProperties {
    fn default() -> Self {
        Self {
            account_creation_fee: Amount::ONE,
            maximum_block_size: 65_536,
            pow_target_time_secs: 600,
            pow_decay_time_secs: 7 * 24 * 3600,
            txn_stake_decay_time_secs: 7 * 24 * 3600,
            credit_interest_rate: 200,
            minimum_transaction_fee: Amount::ZERO,
            maximum_asset_feed_publishers: 10,
        }
    }
}

impl ChainProperties {
    /// Basic sanity bounds checked when a producer submits a proposal.
    pub fn is_valid(&self) -> bool {
        self.maximum_block_size >= 1024
            && self.pow_target_time_secs > 0
            && self.pow_decay_time_secs >= self.pow_target_time_secs
            && self.txn_stake_decay_time_secs > 0
    }
}
