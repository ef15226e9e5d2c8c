//! The chain layer around the consensus core.
//!
//! Owns what consensus deliberately does not: slot timing, production
//! participation, the per-block driver that sequences the cadence-gated
//! subsystems, and in-memory implementations of the collaborator traits
//! for the node.

pub mod driver;
pub mod memory;
pub mod participation;
pub mod slots;

pub use driver::{AppliedBlock, BlockDriver};
pub use memory::{BlockLog, StateStore};
pub use participation::ParticipationTracker;
pub use slots::{scheduled_producer, slot_at_time, slot_time, slots_since};
