//! In-memory backing stores implementing the consensus collaborator traits.
//!
//! Block data and account state are separate stores because the driver
//! reads the former while mutating the latter. Anything durable would
//! implement the same traits over its own storage.

use std::collections::{BTreeMap, BTreeSet};

use helix_consensus::{AccountRegistry, Balances, BlockStore, StakeSource, TransactionStore};
use helix_protocol::SignedTransaction;
use helix_types::{AccountName, Amount, BlockId, PublicKey, Timestamp, TxId};

/// Blocks and applied transactions, append-only.
#[derive(Clone, Debug, Default)]
pub struct BlockLog {
    head_num: u64,
    head_id: BlockId,
    head_time: Timestamp,
    last_irreversible: u64,
    blocks: BTreeSet<BlockId>,
    transactions: BTreeMap<TxId, SignedTransaction>,
}

impl BlockLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a block and point the head at it.
    pub fn append_block(&mut self, height: u64, digest: [u8; 32], time: Timestamp) -> BlockId {
        let id = BlockId::new(height, digest);
        self.blocks.insert(id);
        self.head_num = height;
        self.head_id = id;
        self.head_time = time;
        id
    }

    pub fn set_last_irreversible(&mut self, height: u64) {
        self.last_irreversible = height;
    }

    pub fn insert_transaction(&mut self, tx: SignedTransaction) {
        self.transactions.insert(tx.id(), tx);
    }
}

impl BlockStore for BlockLog {
    fn head_block_num(&self) -> u64 {
        self.head_num
    }

    fn head_block_id(&self) -> BlockId {
        self.head_id
    }

    fn head_block_time(&self) -> Timestamp {
        self.head_time
    }

    fn last_irreversible_block_num(&self) -> u64 {
        self.last_irreversible
    }

    fn contains_block(&self, id: &BlockId) -> bool {
        self.blocks.contains(id)
    }
}

impl TransactionStore for BlockLog {
    fn fetch_transaction(&self, id: &TxId) -> Option<SignedTransaction> {
        self.transactions.get(id).cloned()
    }
}

/// Accounts, balances, and the pending token supply.
#[derive(Clone, Debug, Default)]
pub struct StateStore {
    accounts: BTreeMap<AccountName, PublicKey>,
    staked: BTreeMap<AccountName, Amount>,
    rewards: BTreeMap<AccountName, Amount>,
    pending_supply: Amount,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_staked(&mut self, name: &AccountName, amount: Amount) {
        self.staked.insert(name.clone(), amount);
    }

    pub fn set_pending_supply(&mut self, amount: Amount) {
        self.pending_supply = amount;
    }

    pub fn pending_supply(&self) -> Amount {
        self.pending_supply
    }

    pub fn reward_balance(&self, name: &AccountName) -> Amount {
        self.rewards.get(name).copied().unwrap_or(Amount::ZERO)
    }
}

impl Balances for StateStore {
    fn staked_balance(&self, account: &AccountName) -> Amount {
        self.staked.get(account).copied().unwrap_or(Amount::ZERO)
    }

    fn add_staked_balance(&mut self, account: &AccountName, amount: Amount) {
        let entry = self.staked.entry(account.clone()).or_insert(Amount::ZERO);
        *entry = entry.saturating_add(amount);
    }

    fn sub_staked_balance(&mut self, account: &AccountName, amount: Amount) {
        let entry = self.staked.entry(account.clone()).or_insert(Amount::ZERO);
        *entry = entry.saturating_sub(amount);
    }

    fn add_reward_balance(&mut self, account: &AccountName, amount: Amount) {
        let entry = self.rewards.entry(account.clone()).or_insert(Amount::ZERO);
        *entry = entry.saturating_add(amount);
    }

    fn sub_pending_supply(&mut self, amount: Amount) {
        self.pending_supply = self.pending_supply.saturating_sub(amount);
    }
}

impl AccountRegistry for StateStore {
    fn account_exists(&self, name: &AccountName) -> bool {
        self.accounts.contains_key(name)
    }

    fn account_key(&self, name: &AccountName) -> Option<PublicKey> {
        self.accounts.get(name).copied()
    }

    fn create_account(&mut self, name: &AccountName, owner_key: PublicKey) {
        self.accounts.insert(name.clone(), owner_key);
    }
}

impl StakeSource for StateStore {
    /// Vote weight is the voter's staked balance in raw units.
    fn vote_weight(&self, account: &AccountName) -> u128 {
        self.staked_balance(account).raw()
    }
}
