//! The producer set and its ordered secondary indices.
//!
//! Every mutation goes through [`ProducerRegistry::update`], which removes
//! the producer's index keys, applies the change, and reinserts them. The
//! indices are `BTreeSet`s over composite keys, so iteration order is always
//! explicit and identical on every node.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use helix_types::{
    AccountName, BlockId, ChainProperties, ProtocolVersion, PublicKey, Timestamp,
    VIRTUAL_SCHEDULE_LAP_LENGTH,
};

use crate::error::ConsensusError;

/// A registered block producer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Producer {
    pub owner: AccountName,
    /// `None` retires the producer from scheduling without deleting it.
    pub signing_key: Option<PublicKey>,
    pub created: Timestamp,

    // Stake-vote (DPoS) side.
    pub voting_power: u128,
    pub vote_count: u32,
    pub voting_virtual_scheduled_time: u128,

    // Proof-of-work side.
    pub mining_power: u128,
    pub mining_count: u64,
    pub last_mining_update: Timestamp,
    pub mining_virtual_scheduled_time: u128,

    // Stake-weighted transaction throughput, decayed like mining power.
    pub recent_txn_stake_weight: u128,
    pub last_txn_stake_update: Timestamp,

    // Commitment activity, drained by the winner-take-all activity reward.
    pub accumulated_activity_stake: u128,

    // Finality bookkeeping.
    pub last_commit_height: u64,
    pub last_commit_id: BlockId,

    // Production bookkeeping.
    pub total_blocks: u64,
    pub total_missed: u64,
    pub last_aslot: u64,
    pub last_confirmed_block_num: u64,

    // Declared network-parameter proposal and version votes.
    pub props: ChainProperties,
    pub running_version: ProtocolVersion,
    pub hardfork_version_vote: ProtocolVersion,
    pub hardfork_time_vote: Timestamp,

    // Informational metadata from `producer_update`.
    pub url: String,
    pub latitude: i64,
    pub longitude: i64,
    pub details: String,
    pub json: String,
}

impl Producer {
    pub fn new(owner: AccountName, signing_key: Option<PublicKey>, created: Timestamp) -> Self {
        Self {
            owner,
            signing_key,
            created,
            voting_power: 0,
            vote_count: 0,
            voting_virtual_scheduled_time: 0,
            mining_power: 0,
            mining_count: 0,
            last_mining_update: created,
            mining_virtual_scheduled_time: 0,
            recent_txn_stake_weight: 0,
            last_txn_stake_update: created,
            accumulated_activity_stake: 0,
            last_commit_height: 0,
            last_commit_id: BlockId::ZERO,
            total_blocks: 0,
            total_missed: 0,
            last_aslot: 0,
            last_confirmed_block_num: 0,
            props: ChainProperties::default(),
            running_version: ProtocolVersion::default(),
            hardfork_version_vote: ProtocolVersion::default(),
            hardfork_time_vote: Timestamp::ZERO,
            url: String::new(),
            latitude: 0,
            longitude: 0,
            details: String::new(),
            json: String::new(),
        }
    }

    /// Whether this producer can appear in a schedule.
    pub fn is_schedulable(&self) -> bool {
        self.signing_key.is_some()
    }

    /// Linear decay of mining power and transaction-stake weight toward
    /// zero over their respective windows.
    pub fn decay_weights(&mut self, now: Timestamp, props: &ChainProperties) {
        self.mining_power = decay(
            self.mining_power,
            now.secs_since(self.last_mining_update),
            props.pow_decay_time_secs,
        );
        self.last_mining_update = now;

        self.recent_txn_stake_weight = decay(
            self.recent_txn_stake_weight,
            now.secs_since(self.last_txn_stake_update),
            props.txn_stake_decay_time_secs,
        );
        self.last_txn_stake_update = now;
    }

    /// The next virtual-time lottery slot for the given power: sooner for
    /// more power, a full lap for none. `None` signals overflow, which the
    /// scheduler answers with a full-population reset.
    pub fn next_scheduled_time(virtual_time: u128, power: u128) -> Option<u128> {
        virtual_time.checked_add(VIRTUAL_SCHEDULE_LAP_LENGTH / (power + 1))
    }
}

pub(crate) fn decay(weight: u128, elapsed_secs: u64, window_secs: u64) -> u128 {
    if weight == 0 || elapsed_secs == 0 {
        return weight;
    }
    if window_secs == 0 || elapsed_secs >= window_secs {
        return 0;
    }
    let decayed = weight.saturating_mul(elapsed_secs as u128) / window_secs as u128;
    weight - decayed.min(weight)
}

type PowerKey = (Reverse<u128>, AccountName);
type TimeKey = (u128, AccountName);

/// All registered producers plus the ordered indices the scheduler and
/// reward passes iterate.
#[derive(Clone, Debug, Default)]
pub struct ProducerRegistry {
    producers: BTreeMap<AccountName, Producer>,
    by_voting_power: BTreeSet<PowerKey>,
    by_mining_power: BTreeSet<PowerKey>,
    by_voting_schedule: BTreeSet<TimeKey>,
    by_mining_schedule: BTreeSet<TimeKey>,
    by_txn_stake: BTreeSet<PowerKey>,
    by_activity_stake: BTreeSet<PowerKey>,
}

impl ProducerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.producers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.producers.is_empty()
    }

    pub fn contains(&self, name: &AccountName) -> bool {
        self.producers.contains_key(name)
    }

    pub fn get(&self, name: &AccountName) -> Option<&Producer> {
        self.producers.get(name)
    }

    pub fn insert(&mut self, producer: Producer) -> Result<(), ConsensusError> {
        if self.producers.contains_key(&producer.owner) {
            return Err(ConsensusError::ProducerExists(
                producer.owner.as_str().to_string(),
            ));
        }
        self.index(&producer);
        self.producers.insert(producer.owner.clone(), producer);
        Ok(())
    }

    /// The single write path: unindex, mutate, reindex.
    pub fn update(
        &mut self,
        name: &AccountName,
        f: impl FnOnce(&mut Producer),
    ) -> Result<(), ConsensusError> {
        let mut producer = self
            .producers
            .remove(name)
            .ok_or_else(|| ConsensusError::UnknownProducer(name.as_str().to_string()))?;
        self.unindex(&producer);
        f(&mut producer);
        debug_assert_eq!(&producer.owner, name);
        self.index(&producer);
        self.producers.insert(producer.owner.clone(), producer);
        Ok(())
    }

    /// Apply `f` to every producer and rebuild all indices. Used for the
    /// virtual-time overflow reset, which must touch the full population in
    /// one step.
    pub fn update_all(&mut self, mut f: impl FnMut(&mut Producer)) {
        for producer in self.producers.values_mut() {
            f(producer);
        }
        self.rebuild_indices();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Producer> {
        self.producers.values()
    }

    /// Descending voting power, name-ascending within ties.
    pub fn iter_by_voting_power(&self) -> impl Iterator<Item = &Producer> + '_ {
        self.by_voting_power.iter().map(|(_, name)| &self.producers[name])
    }

    /// Descending mining power.
    pub fn iter_by_mining_power(&self) -> impl Iterator<Item = &Producer> + '_ {
        self.by_mining_power.iter().map(|(_, name)| &self.producers[name])
    }

    /// Ascending voting virtual scheduled time.
    pub fn iter_by_voting_schedule(&self) -> impl Iterator<Item = &Producer> + '_ {
        self.by_voting_schedule.iter().map(|(_, name)| &self.producers[name])
    }

    /// Ascending mining virtual scheduled time.
    pub fn iter_by_mining_schedule(&self) -> impl Iterator<Item = &Producer> + '_ {
        self.by_mining_schedule.iter().map(|(_, name)| &self.producers[name])
    }

    /// Descending recent transaction-stake weight.
    pub fn iter_by_txn_stake(&self) -> impl Iterator<Item = &Producer> + '_ {
        self.by_txn_stake.iter().map(|(_, name)| &self.producers[name])
    }

    /// Descending accumulated activity stake.
    pub fn iter_by_activity_stake(&self) -> impl Iterator<Item = &Producer> + '_ {
        self.by_activity_stake.iter().map(|(_, name)| &self.producers[name])
    }

    fn index(&mut self, p: &Producer) {
        self.by_voting_power.insert((Reverse(p.voting_power), p.owner.clone()));
        self.by_mining_power.insert((Reverse(p.mining_power), p.owner.clone()));
        self.by_voting_schedule.insert((p.voting_virtual_scheduled_time, p.owner.clone()));
        self.by_mining_schedule.insert((p.mining_virtual_scheduled_time, p.owner.clone()));
        self.by_txn_stake.insert((Reverse(p.recent_txn_stake_weight), p.owner.clone()));
        self.by_activity_stake.insert((Reverse(p.accumulated_activity_stake), p.owner.clone()));
    }

    fn unindex(&mut self, p: &Producer) {
        self.by_voting_power.remove(&(Reverse(p.voting_power), p.owner.clone()));
        self.by_mining_power.remove(&(Reverse(p.mining_power), p.owner.clone()));
        self.by_voting_schedule.remove(&(p.voting_virtual_scheduled_time, p.owner.clone()));
        self.by_mining_schedule.remove(&(p.mining_virtual_scheduled_time, p.owner.clone()));
        self.by_txn_stake.remove(&(Reverse(p.recent_txn_stake_weight), p.owner.clone()));
        self.by_activity_stake.remove(&(Reverse(p.accumulated_activity_stake), p.owner.clone()));
    }

    fn rebuild_indices(&mut self) {
        self.by_voting_power.clear();
        self.by_mining_power.clear();
        self.by_voting_schedule.clear();
        self.by_mining_schedule.clear();
        self.by_txn_stake.clear();
        self.by_activity_stake.clear();
        let producers: Vec<Producer> = self.producers.values().cloned().collect();
        for p in &producers {
            self.index(p);
        }
    }
}
