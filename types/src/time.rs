//! Chain timestamps.
//!
//! All consensus time values are microseconds since the Unix epoch, taken
//! from block headers. Nothing in the consensus path reads a wall clock.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Microseconds since the Unix epoch.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const ZERO: Self = Self(0);

    pub fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    pub fn from_secs(secs: u64) -> Self {
        Self(secs * 1_000_000)
    }

    pub fn micros(&self) -> u64 {
        self.0
    }

    pub fn secs(&self) -> u64 {
        self.0 / 1_000_000
    }

    /// Whole seconds elapsed since `earlier`. Zero if `earlier` is later.
    pub fn secs_since(&self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0) / 1_000_000
    }

    pub fn saturating_add_micros(&self, micros: u64) -> Self {
        Self(self.0.saturating_add(micros))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}us", self.0)
    }
}
