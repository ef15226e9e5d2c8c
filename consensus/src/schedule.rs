//! The producer schedule and its rebuild.
//!
//! Every `total_producers` blocks the schedule is rebuilt: the top producers
//! by voting and mining power take the top slots, the remaining slots go to
//! the virtual-time lotteries, both lists are shuffled deterministically and
//! interleaved voted/mined into the production order.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use helix_types::{
    AccountName, ChainProperties, ProtocolVersion, ScheduleParams, Timestamp, INITIAL_POW_TARGET,
};

use crate::error::ConsensusError;
use crate::median::median_properties;
use crate::registry::{decay, Producer, ProducerRegistry};
use crate::shuffle::DeterministicRng;
use crate::version::{hardfork_vote, majority_version, HardforkState};

/// The current production order plus the scheduling and proof-of-work
/// accumulators that persist between rebuilds.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProducerSchedule {
    pub params: ScheduleParams,

    /// Interleaved production order: even slots voted, odd slots mined.
    /// Vacant slots hold the empty name.
    pub current_shuffled_producers: Vec<AccountName>,

    pub top_voted: BTreeSet<AccountName>,
    pub top_mined: BTreeSet<AccountName>,
    pub additional_voted: BTreeSet<AccountName>,
    pub additional_mined: BTreeSet<AccountName>,

    pub current_voting_virtual_time: u128,
    pub current_mining_virtual_time: u128,

    /// Sum of all producers' rank-decayed voting power, refreshed by the
    /// periodic voting-power pass.
    pub total_producer_voting_power: u128,

    pub pow_target: u128,
    /// Decayed accumulator of accepted work.
    pub recent_pow: u128,
    pub last_pow_decay: Timestamp,

    pub majority_version: ProtocolVersion,
}

impl Default for ProducerSchedule {
    fn default() -> Self {
        Self::new(ScheduleParams::default())
    }
}

impl ProducerSchedule {
    pub fn new(params: ScheduleParams) -> Self {
        Self {
            params,
            current_shuffled_producers: Vec::new(),
            top_voted: BTreeSet::new(),
            top_mined: BTreeSet::new(),
            additional_voted: BTreeSet::new(),
            additional_mined: BTreeSet::new(),
            current_voting_virtual_time: 0,
            current_mining_virtual_time: 0,
            total_producer_voting_power: 0,
            pow_target: INITIAL_POW_TARGET,
            recent_pow: 0,
            last_pow_decay: Timestamp::ZERO,
            majority_version: ProtocolVersion::default(),
        }
    }

    /// Eligibility for verify/commit operations: membership in either top
    /// set. Lottery winners produce blocks but do not carry finality weight.
    pub fn is_top_producer(&self, name: &AccountName) -> bool {
        self.top_voted.contains(name) || self.top_mined.contains(name)
    }

    pub fn is_scheduled(&self, name: &AccountName) -> bool {
        self.is_top_producer(name)
            || self.additional_voted.contains(name)
            || self.additional_mined.contains(name)
    }

    /// Decay `recent_pow` toward zero over the configured window.
    pub fn decay_pow(&mut self, now: Timestamp, props: &ChainProperties) {
        self.recent_pow = decay(
            self.recent_pow,
            now.secs_since(self.last_pow_decay),
            props.pow_decay_time_secs,
        );
        self.last_pow_decay = now;
    }

    /// Hourly retarget: decay the accumulator, then rescale the target.
    pub fn update_pow_target(&mut self, now: Timestamp, props: &ChainProperties) {
        self.decay_pow(now, props);
        if self.recent_pow == 0 {
            debug!("pow retarget skipped: no recent work");
            return;
        }
        let previous = self.pow_target;
        self.pow_target = helix_work::retarget(
            self.pow_target,
            self.recent_pow,
            props.pow_target_time_secs,
            props.pow_decay_time_secs,
        );
        info!(
            previous = %format_args!("{previous:#x}"),
            target = %format_args!("{:#x}", self.pow_target),
            recent_pow = self.recent_pow,
            "pow target updated"
        );
    }
}

/// Rebuild the production order from current producer powers.
///
/// Returns the new median chain properties, recomputed from the producers
/// that made the schedule.
pub fn rebuild_schedule(
    registry: &mut ProducerRegistry,
    schedule: &mut ProducerSchedule,
    hardfork: &mut HardforkState,
    now: Timestamp,
) -> Result<ChainProperties, ConsensusError> {
    let params = schedule.params;
    if !params.is_valid() {
        return Err(ConsensusError::FatalScheduleInvariant(format!(
            "asymmetric slot counts: {} voted vs {} mined",
            params.max_voted(),
            params.max_mined()
        )));
    }

    let top_voted = select_top(
        registry.iter_by_voting_power(),
        params.top_voted as usize,
        &BTreeSet::new(),
    );
    let mut selected: BTreeSet<AccountName> = top_voted.iter().cloned().collect();

    let top_mined = select_top(
        registry.iter_by_mining_power(),
        params.top_mined as usize,
        &selected,
    );
    selected.extend(top_mined.iter().cloned());

    // The lotteries retry once after a full virtual-time reset on overflow.
    let (additional_voted, additional_mined) = loop {
        let mut attempt_selected = selected.clone();
        let voted = run_lottery(
            registry,
            &mut attempt_selected,
            params.additional_voted as usize,
            schedule.current_voting_virtual_time,
            Side::Voting,
        )?;
        let Some((additional_voted, voting_virtual_time)) = voted else {
            reset_virtual_schedule(registry, schedule);
            continue;
        };
        let mined = run_lottery(
            registry,
            &mut attempt_selected,
            params.additional_mined as usize,
            schedule.current_mining_virtual_time,
            Side::Mining,
        )?;
        let Some((additional_mined, mining_virtual_time)) = mined else {
            reset_virtual_schedule(registry, schedule);
            continue;
        };
        schedule.current_voting_virtual_time = voting_virtual_time;
        schedule.current_mining_virtual_time = mining_virtual_time;
        break (additional_voted, additional_mined);
    };

    let max_per_type = params.max_voted() as usize;
    let mut voted_list = top_voted.clone();
    voted_list.extend(additional_voted.iter().cloned());
    let mut mined_list = top_mined.clone();
    mined_list.extend(additional_mined.iter().cloned());
    if voted_list.len() > max_per_type || mined_list.len() > max_per_type {
        return Err(ConsensusError::FatalScheduleInvariant(format!(
            "selected {} voted and {} mined producers for {} slots per type",
            voted_list.len(),
            mined_list.len(),
            max_per_type
        )));
    }

    // One RNG shuffles both lists so the permutations stay coupled to a
    // single per-rebuild seed.
    let mut rng = DeterministicRng::from_seed(now.micros());
    rng.shuffle(&mut voted_list);
    rng.shuffle(&mut mined_list);
    voted_list.resize(max_per_type, AccountName::empty());
    mined_list.resize(max_per_type, AccountName::empty());

    let mut shuffled = Vec::with_capacity(max_per_type * 2);
    for i in 0..max_per_type {
        shuffled.push(voted_list[i].clone());
        shuffled.push(mined_list[i].clone());
    }

    schedule.top_voted = top_voted.into_iter().collect();
    schedule.top_mined = top_mined.into_iter().collect();
    schedule.additional_voted = additional_voted.into_iter().collect();
    schedule.additional_mined = additional_mined.into_iter().collect();
    schedule.current_shuffled_producers = shuffled;

    let scheduled: Vec<&Producer> = schedule
        .current_shuffled_producers
        .iter()
        .filter(|name| !name.is_empty())
        .filter_map(|name| registry.get(name))
        .collect();

    let median = median_properties(scheduled.iter().map(|p| &p.props));

    let required = params.hardfork_required_producers;
    schedule.majority_version =
        majority_version(scheduled.iter().map(|p| &p.running_version), required);
    match hardfork_vote(
        scheduled
            .iter()
            .map(|p| (&p.hardfork_version_vote, &p.hardfork_time_vote)),
        required,
    ) {
        Some((version, time)) if version > hardfork.current_version => {
            hardfork.next_version = version;
            hardfork.next_hardfork_time = time;
        }
        _ => hardfork.cancel(),
    }

    info!(
        top_voted = schedule.top_voted.len(),
        top_mined = schedule.top_mined.len(),
        additional_voted = schedule.additional_voted.len(),
        additional_mined = schedule.additional_mined.len(),
        majority_version = %schedule.majority_version,
        "producer schedule rebuilt"
    );

    Ok(median)
}

fn select_top<'a>(
    producers: impl Iterator<Item = &'a Producer>,
    slots: usize,
    excluded: &BTreeSet<AccountName>,
) -> Vec<AccountName> {
    producers
        .filter(|p| p.is_schedulable() && !excluded.contains(&p.owner))
        .take(slots)
        .map(|p| p.owner.clone())
        .collect()
}

#[derive(Clone, Copy)]
enum Side {
    Voting,
    Mining,
}

/// Walk the virtual-time queue, selecting up to `slots` eligible producers.
/// Every visited producer (selected or skipped) is rescheduled at
/// `new_virtual_time + LAP / (power + 1)`. Returns `None` on virtual-time
/// overflow; the caller resets the whole population and retries.
fn run_lottery(
    registry: &mut ProducerRegistry,
    selected: &mut BTreeSet<AccountName>,
    slots: usize,
    mut virtual_time: u128,
    side: Side,
) -> Result<Option<(Vec<AccountName>, u128)>, ConsensusError> {
    let queue: Vec<(AccountName, u128, u128, bool)> = match side {
        Side::Voting => registry
            .iter_by_voting_schedule()
            .map(|p| {
                (
                    p.owner.clone(),
                    p.voting_virtual_scheduled_time,
                    p.voting_power,
                    p.is_schedulable(),
                )
            })
            .collect(),
        Side::Mining => registry
            .iter_by_mining_schedule()
            .map(|p| {
                (
                    p.owner.clone(),
                    p.mining_virtual_scheduled_time,
                    p.mining_power,
                    p.is_schedulable(),
                )
            })
            .collect(),
    };

    let mut winners = Vec::new();
    let mut visited: Vec<(AccountName, u128)> = Vec::new();
    for (name, scheduled_time, power, schedulable) in queue {
        if winners.len() == slots {
            break;
        }
        virtual_time = virtual_time.max(scheduled_time);
        visited.push((name.clone(), power));
        if schedulable && !selected.contains(&name) {
            winners.push(name);
        }
    }

    // Compute every new scheduled time before mutating anything, so an
    // overflow leaves the queue untouched for the reset-and-retry.
    let mut rescheduled = Vec::with_capacity(visited.len());
    for (name, power) in visited {
        match Producer::next_scheduled_time(virtual_time, power) {
            Some(time) => rescheduled.push((name, time)),
            None => return Ok(None),
        }
    }
    for (name, time) in rescheduled {
        registry.update(&name, |p| match side {
            Side::Voting => p.voting_virtual_scheduled_time = time,
            Side::Mining => p.mining_virtual_scheduled_time = time,
        })?;
    }

    selected.extend(winners.iter().cloned());
    Ok(Some((winners, virtual_time)))
}

/// The mandatory full-population reset: every producer's virtual positions
/// and the schedule's virtual clocks return to zero in one step.
fn reset_virtual_schedule(registry: &mut ProducerRegistry, schedule: &mut ProducerSchedule) {
    info!("virtual schedule overflow: resetting all producer positions");
    registry.update_all(|p| {
        p.voting_virtual_scheduled_time = 0;
        p.mining_virtual_scheduled_time = 0;
    });
    schedule.current_voting_virtual_time = 0;
    schedule.current_mining_virtual_time = 0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use helix_types::PublicKey;

    fn small_params() -> ScheduleParams {
        ScheduleParams {
            top_voted: 2,
            additional_voted: 1,
            top_mined: 2,
            additional_mined: 1,
            hardfork_required_producers: 4,
        }
    }

    fn producer(name: &str, voting: u128, mining: u128) -> Producer {
        let mut p = Producer::new(
            AccountName::new(name),
            Some(PublicKey([1; 32])),
            Timestamp::ZERO,
        );
        p.voting_power = voting;
        p.mining_power = mining;
        p
    }

    fn rebuild(
        registry: &mut ProducerRegistry,
        schedule: &mut ProducerSchedule,
    ) -> ChainProperties {
        let mut hardfork = HardforkState::default();
        rebuild_schedule(registry, schedule, &mut hardfork, Timestamp::from_secs(1000)).unwrap()
    }

    #[test]
    fn top_slots_go_to_highest_power() {
        let mut registry = ProducerRegistry::new();
        for (name, voting) in [("p1", 50), ("p2", 40), ("p3", 30), ("p4", 20), ("p5", 10)] {
            registry.insert(producer(name, voting, 0)).unwrap();
        }
        let params = ScheduleParams {
            top_voted: 3,
            additional_voted: 0,
            top_mined: 3,
            additional_mined: 0,
            hardfork_required_producers: 4,
        };
        let mut schedule = ProducerSchedule::new(params);
        rebuild(&mut registry, &mut schedule);

        let expect: BTreeSet<AccountName> =
            ["p1", "p2", "p3"].map(AccountName::new).into_iter().collect();
        assert_eq!(schedule.top_voted, expect);
    }

    #[test]
    fn missing_signing_key_skips_to_next_highest() {
        let mut registry = ProducerRegistry::new();
        for (name, voting) in [("p1", 50), ("p2", 40), ("p3", 30), ("p4", 20), ("p5", 10)] {
            registry.insert(producer(name, voting, 0)).unwrap();
        }
        registry
            .update(&AccountName::new("p2"), |p| p.signing_key = None)
            .unwrap();
        let params = ScheduleParams {
            top_voted: 3,
            additional_voted: 0,
            top_mined: 3,
            additional_mined: 0,
            hardfork_required_producers: 4,
        };
        let mut schedule = ProducerSchedule::new(params);
        rebuild(&mut registry, &mut schedule);

        let expect: BTreeSet<AccountName> =
            ["p1", "p3", "p4"].map(AccountName::new).into_iter().collect();
        assert_eq!(schedule.top_voted, expect);
    }

    #[test]
    fn top_mined_excludes_top_voted() {
        let mut registry = ProducerRegistry::new();
        // p1 leads both rankings; it may hold only the voted slot.
        registry.insert(producer("p1", 100, 100)).unwrap();
        registry.insert(producer("p2", 50, 50)).unwrap();
        registry.insert(producer("p3", 10, 75)).unwrap();
        let params = ScheduleParams {
            top_voted: 1,
            additional_voted: 0,
            top_mined: 1,
            additional_mined: 0,
            hardfork_required_producers: 2,
        };
        let mut schedule = ProducerSchedule::new(params);
        rebuild(&mut registry, &mut schedule);

        assert!(schedule.top_voted.contains(&AccountName::new("p1")));
        assert!(schedule.top_mined.contains(&AccountName::new("p3")));
    }

    #[test]
    fn schedule_interleaves_voted_and_mined() {
        let mut registry = ProducerRegistry::new();
        for i in 0..8 {
            registry
                .insert(producer(&format!("prod{i}"), 100 - i as u128, i as u128 + 1))
                .unwrap();
        }
        let mut schedule = ProducerSchedule::new(small_params());
        rebuild(&mut registry, &mut schedule);

        assert_eq!(
            schedule.current_shuffled_producers.len(),
            small_params().total_producers() as usize
        );
        for (slot, name) in schedule.current_shuffled_producers.iter().enumerate() {
            if name.is_empty() {
                continue;
            }
            let voted = schedule.top_voted.contains(name)
                || schedule.additional_voted.contains(name);
            if slot % 2 == 0 {
                assert!(voted, "even slot {slot} must be voted");
            } else {
                assert!(!voted, "odd slot {slot} must be mined");
            }
        }
    }

    #[test]
    fn scarce_producers_pad_with_vacant_slots() {
        let mut registry = ProducerRegistry::new();
        registry.insert(producer("solo", 10, 10)).unwrap();
        let mut schedule = ProducerSchedule::new(small_params());
        rebuild(&mut registry, &mut schedule);

        assert_eq!(schedule.current_shuffled_producers.len(), 6);
        let filled = schedule
            .current_shuffled_producers
            .iter()
            .filter(|n| !n.is_empty())
            .count();
        assert_eq!(filled, 1);
    }

    #[test]
    fn lottery_rewards_low_virtual_time() {
        let mut registry = ProducerRegistry::new();
        for (name, time) in [("early", 100u128), ("late", 900u128), ("mid", 500u128)] {
            // Non-zero power keeps the rescheduling lap comfortably inside
            // the virtual clock's range.
            let mut p = producer(name, 3, 3);
            p.voting_virtual_scheduled_time = time;
            registry.insert(p).unwrap();
        }
        let params = ScheduleParams {
            top_voted: 0,
            additional_voted: 2,
            top_mined: 0,
            additional_mined: 2,
            hardfork_required_producers: 1,
        };
        let mut schedule = ProducerSchedule::new(params);
        rebuild(&mut registry, &mut schedule);

        let expect: BTreeSet<AccountName> =
            ["early", "mid"].map(AccountName::new).into_iter().collect();
        assert_eq!(schedule.additional_voted, expect);
        // The virtual clock advanced to the last visited scheduled time.
        assert_eq!(schedule.current_voting_virtual_time, 500);
    }

    #[test]
    fn visited_producers_are_rescheduled() {
        let mut registry = ProducerRegistry::new();
        let mut p = producer("winner", 0, 0);
        p.voting_power = 1;
        p.voting_virtual_scheduled_time = 10;
        registry.insert(p).unwrap();
        let params = ScheduleParams {
            top_voted: 0,
            additional_voted: 1,
            top_mined: 0,
            additional_mined: 1,
            hardfork_required_producers: 1,
        };
        let mut schedule = ProducerSchedule::new(params);
        rebuild(&mut registry, &mut schedule);

        let winner = registry.get(&AccountName::new("winner")).unwrap();
        // new_virtual_time = 10, lap / (power + 1) = u128::MAX / 2.
        assert_eq!(winner.voting_virtual_scheduled_time, 10 + u128::MAX / 2);
    }

    #[test]
    fn virtual_time_overflow_resets_whole_population() {
        let mut registry = ProducerRegistry::new();
        let mut near_max = producer("huge", 0, 0);
        near_max.voting_virtual_scheduled_time = u128::MAX - 5;
        registry.insert(near_max).unwrap();
        registry.insert(producer("other", 0, 0)).unwrap();
        let params = ScheduleParams {
            top_voted: 0,
            additional_voted: 1,
            top_mined: 0,
            additional_mined: 1,
            hardfork_required_producers: 1,
        };
        let mut schedule = ProducerSchedule::new(params);
        schedule.current_voting_virtual_time = u128::MAX - 5;
        rebuild(&mut registry, &mut schedule);

        // Power-zero producers land exactly one lap after the reset clock.
        for p in registry.iter() {
            assert!(p.voting_virtual_scheduled_time <= u128::MAX / 2 + u128::MAX / 2 + 1);
            assert_ne!(p.voting_virtual_scheduled_time, u128::MAX - 5);
        }
        assert!(schedule.current_voting_virtual_time < u128::MAX - 5);
    }

    #[test]
    fn asymmetric_params_are_fatal() {
        let mut registry = ProducerRegistry::new();
        let params = ScheduleParams {
            top_voted: 2,
            additional_voted: 0,
            top_mined: 1,
            additional_mined: 0,
            hardfork_required_producers: 1,
        };
        let mut schedule = ProducerSchedule::new(params);
        let mut hardfork = HardforkState::default();
        let err = rebuild_schedule(
            &mut registry,
            &mut schedule,
            &mut hardfork,
            Timestamp::from_secs(1),
        )
        .unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn median_props_follow_scheduled_producers() {
        let mut registry = ProducerRegistry::new();
        for (name, size) in [("p1", 20_000u32), ("p2", 40_000), ("p3", 60_000)] {
            let mut p = producer(name, 10, 10);
            p.props.maximum_block_size = size;
            registry.insert(p).unwrap();
        }
        let params = ScheduleParams {
            top_voted: 3,
            additional_voted: 0,
            top_mined: 3,
            additional_mined: 0,
            hardfork_required_producers: 1,
        };
        let mut schedule = ProducerSchedule::new(params);
        let median = rebuild(&mut registry, &mut schedule);
        assert_eq!(median.maximum_block_size, 40_000);
    }

    #[test]
    fn hardfork_cancelled_without_supermajority() {
        let mut registry = ProducerRegistry::new();
        registry.insert(producer("p1", 10, 0)).unwrap();
        registry.insert(producer("p2", 5, 0)).unwrap();
        let params = ScheduleParams {
            top_voted: 2,
            additional_voted: 0,
            top_mined: 2,
            additional_mined: 0,
            hardfork_required_producers: 2,
        };
        let mut schedule = ProducerSchedule::new(params);
        let mut hardfork = HardforkState {
            current_version: ProtocolVersion::new(1, 0, 0),
            next_version: ProtocolVersion::new(2, 0, 0),
            next_hardfork_time: Timestamp::from_secs(99),
        };
        rebuild_schedule(
            &mut registry,
            &mut schedule,
            &mut hardfork,
            Timestamp::from_secs(1),
        )
        .unwrap();
        assert!(!hardfork.hardfork_pending());
    }

    #[test]
    fn hardfork_scheduled_on_supermajority() {
        let mut registry = ProducerRegistry::new();
        let fork_time = Timestamp::from_secs(5_000_000);
        for name in ["p1", "p2"] {
            let mut p = producer(name, 10, 0);
            p.hardfork_version_vote = ProtocolVersion::new(2, 0, 0);
            p.hardfork_time_vote = fork_time;
            registry.insert(p).unwrap();
        }
        let params = ScheduleParams {
            top_voted: 2,
            additional_voted: 0,
            top_mined: 2,
            additional_mined: 0,
            hardfork_required_producers: 2,
        };
        let mut schedule = ProducerSchedule::new(params);
        let mut hardfork = HardforkState {
            current_version: ProtocolVersion::new(1, 0, 0),
            ..Default::default()
        };
        rebuild_schedule(
            &mut registry,
            &mut schedule,
            &mut hardfork,
            Timestamp::from_secs(1),
        )
        .unwrap();
        assert_eq!(hardfork.next_version, ProtocolVersion::new(2, 0, 0));
        assert_eq!(hardfork.next_hardfork_time, fork_time);
    }

    #[test]
    fn retarget_skips_without_recent_work() {
        let mut schedule = ProducerSchedule::new(small_params());
        let props = ChainProperties::default();
        schedule.update_pow_target(Timestamp::from_secs(3600), &props);
        assert_eq!(schedule.pow_target, INITIAL_POW_TARGET);
    }

    #[test]
    fn retarget_hardens_after_heavy_mining() {
        let mut schedule = ProducerSchedule::new(small_params());
        let props = ChainProperties::default();
        schedule.recent_pow = helix_work::target_pow_rate(
            props.pow_target_time_secs,
            props.pow_decay_time_secs,
        ) * 10;
        schedule.last_pow_decay = Timestamp::from_secs(3590);
        schedule.update_pow_target(Timestamp::from_secs(3600), &props);
        assert!(schedule.pow_target < INITIAL_POW_TARGET);
    }
}
