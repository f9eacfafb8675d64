//! Vesting position and top-up record state types.

use crate::primitives::{BasisPoints, EpochNumber, StakeAmount, Timestamp};

/// Maximum number of top-up records a single position may accumulate.
pub const MAX_TOP_UPS: usize = 52;

/// Lifecycle phase of a vesting position, derived from the stored timestamps.
///
/// The phase is never stored. It is a pure function of `start`, `end` and the
/// ambient timestamp, recomputed on every read, so it cannot desync from the
/// position itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PositionPhase {
    /// `now < end`: the lock is running; cutting pays the early-exit penalty.
    Active,
    /// `end <= now < end + duration`: the lock has ended but rewards are
    /// still settling; no penalty, bonus regime over.
    Maturing,
    /// `now >= end + duration`: fully settled.
    Matured,
    /// `start == 0`: no position (never opened, or fully cut).
    Closed,
}

/// A time-locked delegation through one validator.
///
/// `duration` is fixed at open. `end` starts at `start + duration` and only
/// grows through top-ups, capped at `start + 2 * duration`. The maturing
/// window keeps the original `duration` length regardless of extensions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VestingPosition {
    pub start: Timestamp,
    pub end: Timestamp,
    pub duration: u64,
    pub base_bps: BasisPoints,
    pub vest_bonus_bps: BasisPoints,
    pub rsi_bonus_bps: BasisPoints,
    pub delegated_amount: StakeAmount,
}

impl VestingPosition {
    pub fn phase(&self, now: Timestamp) -> PositionPhase {
        if self.start == 0 {
            PositionPhase::Closed
        } else if now < self.end {
            PositionPhase::Active
        } else if now < self.end + self.duration {
            PositionPhase::Maturing
        } else {
            PositionPhase::Matured
        }
    }

    pub fn is_active(&self, now: Timestamp) -> bool {
        self.phase(now) == PositionPhase::Active
    }

    pub fn is_maturing(&self, now: Timestamp) -> bool {
        self.phase(now) == PositionPhase::Maturing
    }

    pub fn is_matured(&self, now: Timestamp) -> bool {
        self.phase(now) == PositionPhase::Matured
    }

    pub fn is_closed(&self) -> bool {
        self.start == 0
    }

    /// Reset to the closed state. Called when the last unit is cut.
    pub fn close(&mut self) {
        *self = VestingPosition::default();
    }
}

/// Balance checkpoint appended on open and on every top-up.
///
/// Ordered by `epoch_num`, at most one per epoch, at most [`MAX_TOP_UPS`]
/// per position. Reward claims resolve against these to tell apart reward
/// earned by the original lock from reward earned by later additions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TopUpRecord {
    pub epoch_num: EpochNumber,
    pub balance_after: StakeAmount,
}
