//! Majority software-version and hardfork-vote tallying.
//!
//! Re-tallied on every schedule rebuild from the producers that actually
//! made the schedule, so version support tracks the set that is producing
//! blocks right now.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use helix_types::{ProtocolVersion, Timestamp};

/// Pending hardfork bookkeeping.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardforkState {
    pub current_version: ProtocolVersion,
    pub next_version: ProtocolVersion,
    pub next_hardfork_time: Timestamp,
}

impl HardforkState {
    pub fn hardfork_pending(&self) -> bool {
        self.next_version > self.current_version
    }

    /// Drop any scheduled hardfork.
    pub fn cancel(&mut self) {
        self.next_version = self.current_version;
        self.next_hardfork_time = Timestamp::from_micros(0);
    }
}

/// The highest version run by at least `required` of the scheduled
/// producers. Support for a version counts toward every lower version, so
/// the tally walks from the highest version down, accumulating.
pub fn majority_version<'a>(
    running_versions: impl Iterator<Item = &'a ProtocolVersion>,
    required: u32,
) -> ProtocolVersion {
    let mut counts: BTreeMap<ProtocolVersion, u32> = BTreeMap::new();
    for version in running_versions {
        *counts.entry(*version).or_insert(0) += 1;
    }

    let mut support = 0u32;
    for (version, count) in counts.iter().rev() {
        support += count;
        if support >= required {
            return *version;
        }
    }
    ProtocolVersion::default()
}

/// The hardfork `(version, time)` pair voted for by at least `required`
/// scheduled producers, if any. Votes must match exactly.
pub fn hardfork_vote<'a>(
    votes: impl Iterator<Item = (&'a ProtocolVersion, &'a Timestamp)>,
    required: u32,
) -> Option<(ProtocolVersion, Timestamp)> {
    let mut counts: BTreeMap<(ProtocolVersion, Timestamp), u32> = BTreeMap::new();
    for (version, time) in votes {
        *counts.entry((*version, *time)).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .filter(|(_, count)| *count >= required)
        .map(|(vote, _)| vote)
        .next_back()
}
