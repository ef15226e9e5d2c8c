//! Token amounts for the core HLX asset.
//!
//! Amounts are fixed-point integers (u128) to avoid floating-point errors.
//! One whole HLX is [`BLOCKCHAIN_PRECISION`](crate::params::BLOCKCHAIN_PRECISION)
//! raw units. All reward arithmetic is integer floor division with the
//! remainder retained by the payer, so distributions conserve value exactly
//! and every node computes bit-identical payouts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use crate::params::BLOCKCHAIN_PRECISION;

/// A raw HLX amount.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Self = Self(0);

    /// One whole HLX.
    pub const ONE: Self = Self(BLOCKCHAIN_PRECISION);

    pub const fn new(raw: u128) -> Self {
        Self(raw)
    }

    /// Construct from whole HLX units.
    pub fn whole(units: u128) -> Self {
        Self(units * BLOCKCHAIN_PRECISION)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Proportional share: floor of `self * numerator / denominator`,
    /// computed with a 256-bit intermediate so weight products cannot
    /// overflow. Returns zero when the denominator is zero. The share never
    /// exceeds `self` when `numerator <= denominator`.
    pub fn proportion(self, numerator: u128, denominator: u128) -> Self {
        if denominator == 0 {
            return Self::ZERO;
        }
        Self(mul_div(self.0, numerator, denominator))
    }

    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }

    pub fn max(self, other: Self) -> Self {
        Self(self.0.max(other.0))
    }
}

/// Floor of `a * b / d` via a 256-bit product and bitwise long division.
///
/// Saturates at `u128::MAX` if the quotient does not fit (impossible when
/// `b <= d`, the shape every reward split uses).
fn mul_div(a: u128, b: u128, d: u128) -> u128 {
    debug_assert!(d != 0);
    // 256-bit product in two u128 halves, built from 64-bit limbs.
    let (a1, a0) = (a >> 64, a & u64::MAX as u128);
    let (b1, b0) = (b >> 64, b & u64::MAX as u128);
    let ll = a0 * b0;
    let lh = a0 * b1;
    let hl = a1 * b0;
    let hh = a1 * b1;
    let mid = (ll >> 64) + (lh & u64::MAX as u128) + (hl & u64::MAX as u128);
    let lo = (ll & u64::MAX as u128) | (mid << 64);
    let hi = hh + (lh >> 64) + (hl >> 64) + (mid >> 64);

    if hi == 0 {
        return lo / d;
    }

    // Shift-subtract division of the 256-bit value (hi, lo) by d.
    let mut quo: u128 = 0;
    let mut rem: u128 = 0;
    for i in (0..256).rev() {
        if quo >> 127 != 0 {
            return u128::MAX;
        }
        quo <<= 1;
        let bit = if i >= 128 {
            (hi >> (i - 128)) & 1
        } else {
            (lo >> i) & 1
        };
        let carry = rem >> 127 != 0;
        let shifted = (rem << 1) | bit;
        if carry {
            // True remainder is 2^128 + shifted, which always exceeds d.
            rem = shifted.wrapping_sub(d);
            quo |= 1;
        } else if shifted >= d {
            rem = shifted - d;
            quo |= 1;
        } else {
            rem = shifted;
        }
    }
    quo
}

impl Add for Amount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Amount {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:08} HLX",
            self.0 / BLOCKCHAIN_PRECISION,
            self.0 % BLOCKCHAIN_PRECISION
        )
    }
}
