//! Collaborator interfaces consumed by the evaluators.
//!
//! Consensus never owns blocks, balances, or accounts; it reads and adjusts
//! them through these traits so the surrounding node (and tests) can supply
//! any backing store.

use helix_protocol::SignedTransaction;
use helix_types::{AccountName, Amount, BlockId, PublicKey, Timestamp, TxId};

/// Read access to the chain the node has assembled so far.
pub trait BlockStore {
    fn head_block_num(&self) -> u64;
    fn head_block_id(&self) -> BlockId;
    fn head_block_time(&self) -> Timestamp;
    /// Height below which blocks can no longer be reorganized.
    fn last_irreversible_block_num(&self) -> u64;
    /// Whether this node holds the block with the given id.
    fn contains_block(&self, id: &BlockId) -> bool;
}

/// Lookup of previously applied transactions, used to re-validate the
/// verification set referenced by a commitment.
pub trait TransactionStore {
    fn fetch_transaction(&self, id: &TxId) -> Option<SignedTransaction>;
}

/// Staked, reward, and pending-supply balance adjustments.
pub trait Balances {
    fn staked_balance(&self, account: &AccountName) -> Amount;
    fn add_staked_balance(&mut self, account: &AccountName, amount: Amount);
    /// Clamped at zero; callers check sufficiency first.
    fn sub_staked_balance(&mut self, account: &AccountName, amount: Amount);
    fn add_reward_balance(&mut self, account: &AccountName, amount: Amount);
    /// Tokens leaving reward pools are deducted from the pending supply.
    fn sub_pending_supply(&mut self, amount: Amount);
}

/// Account existence, keys, and creation for mined accounts.
pub trait AccountRegistry {
    fn account_exists(&self, name: &AccountName) -> bool;
    fn account_key(&self, name: &AccountName) -> Option<PublicKey>;
    fn create_account(&mut self, name: &AccountName, owner_key: PublicKey);
}

/// Per-account vote weight (own stake plus stake proxied to it).
pub trait StakeSource {
    fn vote_weight(&self, account: &AccountName) -> u128;
}
