//! Producer votes with rank decay.
//!
//! A voter's influence on its Nth-ranked vote is its weight shifted right by
//! the rank, so spreading votes across many producers costs influence
//! geometrically. Ranks are kept contiguous (`1..=N`) per voter; both
//! re-ranking variants preserve the voter's relative order.

use std::collections::BTreeMap;

use crate::context::StakeSource;
use crate::registry::{Producer, ProducerRegistry};
use crate::schedule::ProducerSchedule;
use helix_types::{AccountName, ChainProperties, Timestamp};

/// One (voter, producer) edge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProducerVote {
    pub voter: AccountName,
    pub producer: AccountName,
    pub vote_rank: u16,
}

/// All votes, indexed both by voter (in rank order) and by producer.
#[derive(Clone, Debug, Default)]
pub struct VoteLedger {
    /// (voter, producer) → rank. The authoritative copy.
    votes: BTreeMap<(AccountName, AccountName), u16>,
    /// (voter, rank, producer), for rank-ordered walks per voter.
    by_voter_rank: BTreeMap<(AccountName, u16), AccountName>,
    /// (producer, voter), for per-producer aggregation.
    by_producer: BTreeMap<(AccountName, AccountName), u16>,
}

impl VoteLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.votes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }

    pub fn rank_of(&self, voter: &AccountName, producer: &AccountName) -> Option<u16> {
        self.votes.get(&(voter.clone(), producer.clone())).copied()
    }

    /// Append a vote at the end of the voter's ranking.
    pub fn add_vote(&mut self, voter: &AccountName, producer: &AccountName) {
        if self.rank_of(voter, producer).is_some() {
            return;
        }
        let next_rank = self.votes_by(voter).count() as u16 + 1;
        self.insert(voter, producer, next_rank);
    }

    /// Insert a vote at a specific rank, shifting lower-ranked votes down.
    /// The resulting sequence is contiguous `1..=N`.
    pub fn add_vote_at_rank(&mut self, voter: &AccountName, producer: &AccountName, rank: u16) {
        if self.rank_of(voter, producer).is_some() {
            return;
        }
        let mut ordered: Vec<AccountName> = self.votes_by(voter).map(|v| v.producer).collect();
        let position = (rank.max(1) as usize - 1).min(ordered.len());
        ordered.insert(position, producer.clone());
        self.replace_ranking(voter, ordered);
    }

    /// Remove a vote and close the gap it leaves.
    pub fn remove_vote(&mut self, voter: &AccountName, producer: &AccountName) {
        if self.rank_of(voter, producer).is_none() {
            return;
        }
        let ordered: Vec<AccountName> = self
            .votes_by(voter)
            .map(|v| v.producer)
            .filter(|p| p != producer)
            .collect();
        self.remove(voter, producer);
        self.replace_ranking(voter, ordered);
    }

    /// Re-linearize a voter's ranks to contiguous `1..=N`, preserving order.
    pub fn update_producer_votes(&mut self, voter: &AccountName) {
        let ordered: Vec<AccountName> = self.votes_by(voter).map(|v| v.producer).collect();
        self.replace_ranking(voter, ordered);
    }

    /// A voter's votes in ascending rank order.
    pub fn votes_by(&self, voter: &AccountName) -> impl Iterator<Item = ProducerVote> + '_ {
        let voter = voter.clone();
        self.by_voter_rank
            .range((voter.clone(), 0)..=(voter.clone(), u16::MAX))
            .map(move |((v, rank), producer)| ProducerVote {
                voter: v.clone(),
                producer: producer.clone(),
                vote_rank: *rank,
            })
    }

    /// All votes cast for a producer.
    pub fn votes_for(&self, producer: &AccountName) -> impl Iterator<Item = ProducerVote> + '_ {
        self.by_producer
            .range((producer.clone(), AccountName::empty())..)
            .take_while({
                let producer = producer.clone();
                move |((p, _), _)| *p == producer
            })
            .map(|((p, voter), rank)| ProducerVote {
                voter: voter.clone(),
                producer: p.clone(),
                vote_rank: *rank,
            })
    }

    /// Rank-decayed voting power and vote count for one producer:
    /// `Σ voter_weight >> rank`.
    pub fn voting_power(
        &self,
        producer: &AccountName,
        stake: &impl StakeSource,
    ) -> (u128, u32) {
        let mut power = 0u128;
        let mut count = 0u32;
        for vote in self.votes_for(producer) {
            let weight = stake.vote_weight(&vote.voter);
            power = power.saturating_add(weight >> vote.vote_rank.min(127));
            count += 1;
        }
        (power, count)
    }

    fn insert(&mut self, voter: &AccountName, producer: &AccountName, rank: u16) {
        self.votes.insert((voter.clone(), producer.clone()), rank);
        self.by_voter_rank.insert((voter.clone(), rank), producer.clone());
        self.by_producer.insert((producer.clone(), voter.clone()), rank);
    }

    fn remove(&mut self, voter: &AccountName, producer: &AccountName) {
        if let Some(rank) = self.votes.remove(&(voter.clone(), producer.clone())) {
            self.by_voter_rank.remove(&(voter.clone(), rank));
            self.by_producer.remove(&(producer.clone(), voter.clone()));
        }
    }

    /// Recompute every producer's voting power from current stake weights.
    /// The daily refresh pass; also decays the time-windowed weights,
    /// reschedules each producer's next voting lottery slot from the
    /// schedule's current virtual time at its new power (a slot that would
    /// overflow the virtual clock is clamped to `u128::MAX` until the next
    /// full reset), and refreshes the schedule's total voting power.
    pub fn refresh_producer_powers(
        &self,
        registry: &mut ProducerRegistry,
        schedule: &mut ProducerSchedule,
        stake: &impl StakeSource,
        now: Timestamp,
        props: &ChainProperties,
    ) {
        let virtual_time = schedule.current_voting_virtual_time;
        let mut total_power = 0u128;
        let props = props.clone();
        registry.update_all(|p| {
            p.decay_weights(now, &props);
            let (power, count) = self.voting_power(&p.owner, stake);
            p.voting_power = power;
            p.vote_count = count;
            p.voting_virtual_scheduled_time =
                Producer::next_scheduled_time(virtual_time, power).unwrap_or(u128::MAX);
            total_power = total_power.saturating_add(power);
        });
        schedule.total_producer_voting_power = total_power;
    }

    fn replace_ranking(&mut self, voter: &AccountName, ordered: Vec<AccountName>) {
        let existing: Vec<AccountName> = self.votes_by(voter).map(|v| v.producer).collect();
        for producer in existing {
            self.remove(voter, &producer);
        }
        for (i, producer) in ordered.iter().enumerate() {
            self.insert(voter, producer, i as u16 + 1);
        }
    }
}
