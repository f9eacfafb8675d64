//! Counters for staking core activity.
//!
//! Exported by the node's metrics endpoint under the `delos_staking_*`
//! prefix. Counters only ever increase; gauges are read from state directly.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct StakingMetrics {
    epochs_committed: AtomicU64,
    validators_slashed: AtomicU64,
    stake_slashed_total: AtomicU64,
    positions_opened: AtomicU64,
    positions_closed: AtomicU64,
    penalty_burned_total: AtomicU64,
    rewards_delivered_total: AtomicU64,
    rewards_burned_total: AtomicU64,
}

impl StakingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_epochs_committed(&self) {
        self.epochs_committed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_slash(&self, amount: u64) {
        self.validators_slashed.fetch_add(1, Ordering::Relaxed);
        self.stake_slashed_total.fetch_add(amount, Ordering::Relaxed);
    }

    pub fn inc_positions_opened(&self) {
        self.positions_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_positions_closed(&self) {
        self.positions_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_penalty_burned(&self, amount: u64) {
        self.penalty_burned_total.fetch_add(amount, Ordering::Relaxed);
    }

    pub fn add_reward_delivered(&self, amount: u64) {
        self.rewards_delivered_total
            .fetch_add(amount, Ordering::Relaxed);
    }

    pub fn add_reward_burned(&self, amount: u64) {
        self.rewards_burned_total.fetch_add(amount, Ordering::Relaxed);
    }

    pub fn epochs_committed_total(&self) -> u64 {
        self.epochs_committed.load(Ordering::Relaxed)
    }

    pub fn validators_slashed_total(&self) -> u64 {
        self.validators_slashed.load(Ordering::Relaxed)
    }

    pub fn stake_slashed_total(&self) -> u64 {
        self.stake_slashed_total.load(Ordering::Relaxed)
    }

    pub fn positions_opened_total(&self) -> u64 {
        self.positions_opened.load(Ordering::Relaxed)
    }

    pub fn positions_closed_total(&self) -> u64 {
        self.positions_closed.load(Ordering::Relaxed)
    }

    pub fn penalty_burned_total(&self) -> u64 {
        self.penalty_burned_total.load(Ordering::Relaxed)
    }

    pub fn rewards_delivered_total(&self) -> u64 {
        self.rewards_delivered_total.load(Ordering::Relaxed)
    }

    pub fn rewards_burned_total(&self) -> u64 {
        self.rewards_burned_total.load(Ordering::Relaxed)
    }
}
