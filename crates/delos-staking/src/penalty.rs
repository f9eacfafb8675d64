//! Early-exit penalty calculator.
//!
//! Pure functions, no state. The penalty decays linearly by
//! [`PENALTY_DECAY_BPS_PER_WEEK`] basis points for every full week already
//! served: cutting immediately after opening pays the maximum, cutting at or
//! after `end` pays nothing.

use delos_types::{StakeAmount, Timestamp, BPS_DENOMINATOR, WEEK};

use crate::params::PENALTY_DECAY_BPS_PER_WEEK;

/// Whole weeks remaining until `end`, rounding up.
///
/// Any partial remaining week counts as a full week, so the penalty only
/// steps down at exact week boundaries.
pub fn weeks_remaining(end: Timestamp, now: Timestamp) -> u64 {
    if now >= end {
        return 0;
    }
    let remaining = end - now;
    remaining.div_ceil(WEEK)
}

/// Burn amount for cutting `amount` out of a position ending at `end`.
pub fn early_exit_penalty(end: Timestamp, now: Timestamp, amount: StakeAmount) -> StakeAmount {
    let bps = weeks_remaining(end, now) * PENALTY_DECAY_BPS_PER_WEEK;
    // bps is at most 52 * 30 = 1560, so the u128 product cannot overflow.
    (u128::from(amount) * u128::from(bps) / u128::from(BPS_DENOMINATOR)) as StakeAmount
}
