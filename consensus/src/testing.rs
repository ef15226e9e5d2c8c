//! In-memory chain fixture shared by the evaluator tests.

use std::collections::{BTreeMap, BTreeSet};

use helix_protocol::SignedTransaction;
use helix_types::{
    AccountName, Amount, BlockId, PublicKey, ScheduleParams, Timestamp, TxId,
};

use crate::context::{AccountRegistry, Balances, BlockStore, TransactionStore};
use crate::registry::Producer;
use crate::state::ConsensusState;

/// A minimal backing store implementing every collaborator trait. Blocks
/// and times are pushed explicitly; nothing advances on its own.
#[derive(Clone, Debug, Default)]
pub(crate) struct TestChain {
    head_num: u64,
    head_id: BlockId,
    head_time: Timestamp,
    last_irreversible: u64,
    blocks: BTreeSet<BlockId>,
    transactions: BTreeMap<TxId, SignedTransaction>,
    accounts: BTreeMap<AccountName, PublicKey>,
    staked: BTreeMap<AccountName, Amount>,
    rewards: BTreeMap<AccountName, Amount>,
    pending_supply: Amount,
}

impl TestChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a block at `height` with a digest derived from the height,
    /// and point the head at it.
    pub fn push_block(&mut self, height: u64) -> BlockId {
        self.push_block_with_digest(height, [height as u8; 32])
    }

    pub fn push_block_with_digest(&mut self, height: u64, digest: [u8; 32]) -> BlockId {
        let id = BlockId::new(height, digest);
        self.blocks.insert(id);
        self.head_num = height;
        self.head_id = id;
        id
    }

    pub fn set_head_time(&mut self, time: Timestamp) {
        self.head_time = time;
    }

    pub fn set_last_irreversible(&mut self, height: u64) {
        self.last_irreversible = height;
    }

    pub fn store_transaction(&mut self, tx: SignedTransaction) {
        self.transactions.insert(tx.id(), tx);
    }

    pub fn register_account(&mut self, name: &str, key: PublicKey) {
        self.accounts.insert(AccountName::new(name), key);
    }

    pub fn fund_stake(&mut self, name: &str, amount: Amount) {
        self.staked.insert(AccountName::new(name), amount);
    }

    pub fn staked(&self, name: &str) -> Amount {
        self.staked_balance(&AccountName::new(name))
    }

    /// Register `name` as an account and a schedulable producer outside the
    /// current schedule.
    pub fn add_producer(&mut self, state: &mut ConsensusState, name: &str) {
        let key = PublicKey([0xEE; 32]);
        self.register_account(name, key);
        state
            .registry
            .insert(Producer::new(AccountName::new(name), Some(key), self.head_time))
            .unwrap();
    }

    /// Point an existing producer (creating it if needed) at a signing key,
    /// mirroring the key into the account table.
    pub fn set_producer_key(&mut self, state: &mut ConsensusState, name: &str, key: PublicKey) {
        let owner = AccountName::new(name);
        self.accounts.insert(owner.clone(), key);
        if state.registry.contains(&owner) {
            state
                .registry
                .update(&owner, |p| p.signing_key = Some(key))
                .unwrap();
        } else {
            state
                .registry
                .insert(Producer::new(owner, Some(key), self.head_time))
                .unwrap();
        }
    }
}

impl BlockStore for TestChain {
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

impl TransactionStore for TestChain {
    fn fetch_transaction(&self, id: &TxId) -> Option<SignedTransaction> {
        self.transactions.get(id).cloned()
    }
}

impl Balances for TestChain {
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

impl AccountRegistry for TestChain {
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

/// A state with `n` producers named `prod0..prodN`, the first `top_voted`
/// of them seated in the voted top slots and the next `top_mined` in the
/// mined top slots.
pub(crate) fn top_producer_state(
    params: ScheduleParams,
    n: usize,
) -> (ConsensusState, TestChain) {
    let mut state = ConsensusState::new(params);
    let mut chain = TestChain::new();
    let mut names = Vec::with_capacity(n);
    for i in 0..n {
        let name = format!("prod{i}");
        let key = PublicKey([i as u8 + 1; 32]);
        chain.register_account(&name, key);
        state
            .registry
            .insert(Producer::new(AccountName::new(&name), Some(key), Timestamp::ZERO))
            .unwrap();
        names.push(AccountName::new(&name));
    }

    let voted = (params.top_voted as usize).min(names.len());
    let mined = (params.top_mined as usize).min(names.len().saturating_sub(voted));
    state.schedule.top_voted = names[..voted].iter().cloned().collect();
    state.schedule.top_mined = names[voted..voted + mined].iter().cloned().collect();
    (state, chain)
}
