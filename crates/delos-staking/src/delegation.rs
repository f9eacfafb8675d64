//! Delegation reward bookkeeping.
//!
//! A [`DelegationAccount`] is the reward-debt ledger behind one delegation:
//! `rps_baseline` marks the cumulative reward-per-share value already
//! settled, `pending_raw` holds raw reward settled but not yet claimed.
//! Settling before every balance change keeps raw accrual exact across
//! top-ups and cuts; claims consume the baseline forward, which is what makes
//! a repeated claim pay zero.

use std::collections::HashMap;

use delos_types::{AccountId, StakeAmount};

use crate::rps::raw_reward;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DelegationAccount {
    pub balance: StakeAmount,
    /// Cumulative RPS value up to which reward has been settled or consumed.
    pub rps_baseline: u128,
    /// Raw reward settled out of the RPS stream but not yet claimed.
    pub pending_raw: StakeAmount,
    /// Index of the newest top-up record consumed by a claim.
    pub consumed_top_up: Option<usize>,
}

impl DelegationAccount {
    /// Move accrual since the baseline into `pending_raw`.
    ///
    /// Must run before any balance change so the old balance earns exactly
    /// up to the present cumulative value and no further.
    pub fn settle(&mut self, latest_cumulative: u128) {
        if latest_cumulative > self.rps_baseline {
            self.pending_raw += raw_reward(latest_cumulative - self.rps_baseline, self.balance);
            self.rps_baseline = latest_cumulative;
        }
    }

    /// Whether any raw reward is still unconsumed at `latest_cumulative`.
    pub fn has_outstanding(&self, latest_cumulative: u128) -> bool {
        if self.pending_raw > 0 {
            return true;
        }
        self.balance > 0 && latest_cumulative > self.rps_baseline
    }

    /// Raw reward accrued but not yet claimed, as of `latest_cumulative`.
    pub fn outstanding_raw(&self, latest_cumulative: u128) -> StakeAmount {
        let unsettled = if latest_cumulative > self.rps_baseline {
            raw_reward(latest_cumulative - self.rps_baseline, self.balance)
        } else {
            0
        };
        self.pending_raw + unsettled
    }
}

/// Plain (non-vested) delegations, keyed by (delegator, validator).
#[derive(Debug, Default)]
pub struct DelegationBook {
    accounts: HashMap<(AccountId, AccountId), DelegationAccount>,
}

impl DelegationBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, delegator: &AccountId, validator: &AccountId) -> Option<&DelegationAccount> {
        self.accounts.get(&(*delegator, *validator))
    }

    pub fn get_or_default(
        &mut self,
        delegator: &AccountId,
        validator: &AccountId,
    ) -> &mut DelegationAccount {
        self.accounts.entry((*delegator, *validator)).or_default()
    }

    pub fn balance_of(&self, delegator: &AccountId, validator: &AccountId) -> StakeAmount {
        self.get(delegator, validator).map(|a| a.balance).unwrap_or(0)
    }

    /// Sum of all delegated balances towards `validator`.
    pub fn delegated_towards(&self, validator: &AccountId) -> u128 {
        self.accounts
            .iter()
            .filter(|((_, v), _)| v == validator)
            .map(|(_, a)| u128::from(a.balance))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delos_types::RPS_SCALE;

    #[test]
    fn settle_accumulates_and_advances_the_baseline() {
        let mut account = DelegationAccount {
            balance: 1_000,
            ..Default::default()
        };
        account.settle(5 * RPS_SCALE);
        assert_eq!(account.pending_raw, 5_000);
        assert_eq!(account.rps_baseline, 5 * RPS_SCALE);

        // Settling again at the same value adds nothing.
        account.settle(5 * RPS_SCALE);
        assert_eq!(account.pending_raw, 5_000);
    }

    #[test]
    fn outstanding_tracks_settled_and_unsettled_reward() {
        let mut account = DelegationAccount {
            balance: 100,
            ..Default::default()
        };
        assert!(!account.has_outstanding(0));
        assert!(account.has_outstanding(RPS_SCALE));
        assert_eq!(account.outstanding_raw(RPS_SCALE), 100);

        account.settle(RPS_SCALE);
        account.balance = 0;
        assert!(account.has_outstanding(RPS_SCALE));
        assert_eq!(account.outstanding_raw(2 * RPS_SCALE), 100);
    }
}
