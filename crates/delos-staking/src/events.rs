//! Typed event log.
//!
//! Every state-changing operation appends events here in execution order.
//! Off-chain indexers and the test harness consume the log; nothing inside
//! the core reads it back.

use delos_types::{AccountId, BlockNumber, EpochNumber, Hash32, StakeAmount};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StakingEvent {
    NewEpoch {
        epoch_id: EpochNumber,
        start_block: BlockNumber,
        end_block: BlockNumber,
        root: Hash32,
    },
    Staked {
        validator: AccountId,
        amount: StakeAmount,
    },
    Unstaked {
        validator: AccountId,
        amount: StakeAmount,
    },
    Delegated {
        account: AccountId,
        validator: AccountId,
        amount: StakeAmount,
    },
    Undelegated {
        account: AccountId,
        validator: AccountId,
        amount: StakeAmount,
    },
    PositionOpened {
        manager: AccountId,
        validator: AccountId,
        duration_weeks: u64,
        amount: StakeAmount,
    },
    PositionToppedUp {
        manager: AccountId,
        validator: AccountId,
        amount: StakeAmount,
    },
    PositionCut {
        manager: AccountId,
        validator: AccountId,
        amount: StakeAmount,
        penalty: StakeAmount,
    },
    PositionClosed {
        manager: AccountId,
        validator: AccountId,
    },
    ValidatorRewardClaimed {
        validator: AccountId,
        amount: StakeAmount,
    },
    DelegatorRewardClaimed {
        account: AccountId,
        validator: AccountId,
        amount: StakeAmount,
    },
    ValidatorSlashed {
        validator: AccountId,
        amount: StakeAmount,
    },
    WithdrawalRegistered {
        account: AccountId,
        amount: StakeAmount,
    },
    WithdrawalFinished {
        account: AccountId,
        amount: StakeAmount,
    },
}

/// Append-only log of emitted events.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<StakingEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: StakingEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StakingEvent> {
        self.events.iter()
    }

    /// Events appended since index `from`, for incremental consumers.
    pub fn since(&self, from: usize) -> &[StakingEvent] {
        &self.events[from.min(self.events.len())..]
    }
}
