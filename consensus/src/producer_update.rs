//! The `producer_update` evaluator: register or reconfigure a producer.

use tracing::debug;

use helix_protocol::ProducerUpdateOp;
use helix_types::Timestamp;

use crate::context::AccountRegistry;
use crate::error::ConsensusError;
use crate::registry::Producer;
use crate::state::ConsensusState;

pub fn apply_producer_update(
    state: &mut ConsensusState,
    op: &ProducerUpdateOp,
    accounts: &impl AccountRegistry,
    now: Timestamp,
) -> Result<(), ConsensusError> {
    op.validate()?;
    if !accounts.account_exists(&op.owner) {
        return Err(ConsensusError::UnknownAccount(op.owner.as_str().to_string()));
    }

    if state.registry.contains(&op.owner) {
        state.registry.update(&op.owner, |p| {
            apply_fields(p, op);
        })?;
        debug!(producer = %op.owner, "producer updated");
    } else {
        let mut producer = Producer::new(op.owner.clone(), op.signing_key, now);
        apply_fields(&mut producer, op);
        // New entrants start a full lap out on both lotteries so they
        // cannot jump ahead of producers already waiting.
        producer.voting_virtual_scheduled_time = Producer::next_scheduled_time(
            state.schedule.current_voting_virtual_time,
            producer.voting_power,
        )
        .unwrap_or(u128::MAX);
        producer.mining_virtual_scheduled_time = Producer::next_scheduled_time(
            state.schedule.current_mining_virtual_time,
            producer.mining_power,
        )
        .unwrap_or(u128::MAX);
        state.registry.insert(producer)?;
        debug!(producer = %op.owner, "producer registered");
    }
    Ok(())
}

fn apply_fields(producer: &mut Producer, op: &ProducerUpdateOp) {
    producer.signing_key = op.signing_key;
    producer.props = op.props.clone();
    producer.url = op.url.clone();
    producer.latitude = op.latitude;
    producer.longitude = op.longitude;
    producer.details = op.details.clone();
    producer.json = op.json.clone();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{top_producer_state, TestChain};
    use helix_types::{AccountName, ChainProperties, PublicKey, ScheduleParams};

    fn op(owner: &str) -> ProducerUpdateOp {
        ProducerUpdateOp {
            owner: AccountName::new(owner),
            signing_key: Some(PublicKey([7; 32])),
            props: ChainProperties::default(),
            url: "https://example.org".into(),
            latitude: 0,
            longitude: 0,
            details: String::new(),
            json: String::new(),
        }
    }

    fn setup() -> (crate::state::ConsensusState, TestChain) {
        top_producer_state(ScheduleParams::default(), 0)
    }

    #[test]
    fn registers_new_producer() {
        let (mut state, mut chain) = setup();
        chain.register_account("alice", PublicKey([1; 32]));
        apply_producer_update(&mut state, &op("alice"), &chain, Timestamp::from_secs(5)).unwrap();

        let producer = state.registry.get(&AccountName::new("alice")).unwrap();
        assert_eq!(producer.signing_key, Some(PublicKey([7; 32])));
        assert_eq!(producer.created, Timestamp::from_secs(5));
        // Zero power lands exactly one full lap out.
        assert_eq!(producer.voting_virtual_scheduled_time, u128::MAX);
    }

    #[test]
    fn unknown_account_rejected() {
        let (mut state, chain) = setup();
        let err = apply_producer_update(&mut state, &op("ghost"), &chain, Timestamp::ZERO)
            .unwrap_err();
        assert!(matches!(err, ConsensusError::UnknownAccount(_)));
    }

    #[test]
    fn update_changes_key_without_resetting_power() {
        let (mut state, mut chain) = setup();
        chain.register_account("alice", PublicKey([1; 32]));
        apply_producer_update(&mut state, &op("alice"), &chain, Timestamp::ZERO).unwrap();
        state
            .registry
            .update(&AccountName::new("alice"), |p| p.voting_power = 500)
            .unwrap();

        let mut retire = op("alice");
        retire.signing_key = None;
        apply_producer_update(&mut state, &retire, &chain, Timestamp::from_secs(9)).unwrap();

        let producer = state.registry.get(&AccountName::new("alice")).unwrap();
        assert_eq!(producer.signing_key, None);
        assert!(!producer.is_schedulable());
        assert_eq!(producer.voting_power, 500);
    }
}
