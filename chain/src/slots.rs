//! Absolute production-slot arithmetic.
//!
//! Slots count whole block intervals since the Unix epoch, so every node
//! derives the same slot number from a block timestamp with no shared
//! clock state.

use helix_consensus::ProducerSchedule;
use helix_types::{AccountName, Timestamp, BLOCK_INTERVAL_MICROS};

/// The absolute slot containing `when`.
pub fn slot_at_time(when: Timestamp) -> u64 {
    when.micros() / BLOCK_INTERVAL_MICROS
}

/// The start of an absolute slot.
pub fn slot_time(slot: u64) -> Timestamp {
    Timestamp::from_micros(slot * BLOCK_INTERVAL_MICROS)
}

/// Slots elapsed strictly after the head block's slot up to `when`.
pub fn slots_since(head_time: Timestamp, when: Timestamp) -> u64 {
    slot_at_time(when).saturating_sub(slot_at_time(head_time))
}

/// The producer assigned to an absolute slot, walking the shuffled order
/// cyclically. `None` when no schedule exists yet or the slot is vacant.
pub fn scheduled_producer(schedule: &ProducerSchedule, slot: u64) -> Option<&AccountName> {
    let order = &schedule.current_shuffled_producers;
    if order.is_empty() {
        return None;
    }
    let name = &order[(slot % order.len() as u64) as usize];
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}
