//! Proof-of-work difficulty retargeting.
//!
//! The schedule keeps `recent_pow`, a linearly decayed accumulator of
//! accepted work. Once per retarget interval the target is rescaled so that
//! the decayed inflow settles at one accepted proof per `pow_target_time`.
//! Lower target means harder work: a proof is valid iff its work value is
//! strictly below the target.

use helix_types::BLOCKCHAIN_PRECISION;

/// Compute the new proof-of-work target from the decayed `recent_pow`
/// accumulator.
///
/// All arithmetic is 128-bit unsigned with floor division, so every node
/// derives an identical target. Zero recent work leaves the target
/// unchanged.
pub fn retarget(
    current_target: u128,
    recent_pow: u128,
    pow_target_time_secs: u64,
    pow_decay_time_secs: u64,
) -> u128 {
    if recent_pow == 0 {
        return current_target;
    }

    let coefficient = (u128::MAX / current_target.max(1)).max(10);
    let target_pow_rate = target_pow_rate(pow_target_time_secs, pow_decay_time_secs);
    let mult = coefficient.saturating_mul(recent_pow).max(target_pow_rate);
    let div = (mult / target_pow_rate).max(10);
    u128::MAX / div
}

/// The desired amount of decayed work per decay window: one
/// `BLOCKCHAIN_PRECISION` unit of work per `pow_target_time`, scaled to the
/// decay window.
pub fn target_pow_rate(pow_target_time_secs: u64, pow_decay_time_secs: u64) -> u128 {
    (BLOCKCHAIN_PRECISION * pow_decay_time_secs as u128 / pow_target_time_secs.max(1) as u128)
        .max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use helix_types::INITIAL_POW_TARGET;

    const TARGET_SECS: u64 = 600;
    const DECAY_SECS: u64 = 7 * 24 * 3600;

    fn rate() -> u128 {
        target_pow_rate(TARGET_SECS, DECAY_SECS)
    }

    #[test]
    fn zero_recent_work_leaves_target_unchanged() {
        let t = retarget(INITIAL_POW_TARGET, 0, TARGET_SECS, DECAY_SECS);
        assert_eq!(t, INITIAL_POW_TARGET);
    }

    #[test]
    fn excess_work_hardens_target() {
        let t = retarget(INITIAL_POW_TARGET, rate() * 4, TARGET_SECS, DECAY_SECS);
        assert!(t < INITIAL_POW_TARGET);
    }

    #[test]
    fn scarce_work_eases_target() {
        let t = retarget(INITIAL_POW_TARGET, rate() / 4, TARGET_SECS, DECAY_SECS);
        assert!(t > INITIAL_POW_TARGET);
    }

    #[test]
    fn on_rate_work_holds_target_steady() {
        // coefficient = U128_MAX / target = 1000 for the initial target, so
        // recent_pow == rate lands within floor-division error of no change.
        let t = retarget(INITIAL_POW_TARGET, rate(), TARGET_SECS, DECAY_SECS);
        let drift = t.abs_diff(INITIAL_POW_TARGET);
        assert!(drift <= INITIAL_POW_TARGET / 100);
    }

    #[test]
    fn target_never_exceeds_divisor_floor() {
        // div is clamped at 10, so the easiest reachable target is U128_MAX/10.
        let t = retarget(u128::MAX / 10, 1, TARGET_SECS, DECAY_SECS);
        assert!(t <= u128::MAX / 10);
    }

    #[test]
    fn extreme_work_saturates_without_overflow() {
        let t = retarget(INITIAL_POW_TARGET, u128::MAX, TARGET_SECS, DECAY_SECS);
        assert!(t >= 1);
        assert!(t < INITIAL_POW_TARGET);
    }
}
