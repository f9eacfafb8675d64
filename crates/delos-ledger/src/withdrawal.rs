//! Per-account withdrawal queue.
//!
//! Unstaking, undelegating, cutting a position, and claiming a reward without
//! restaking all register a withdrawal entry that matures after a protocol
//! wait period measured in epochs. Withdrawing pays out every matured entry
//! at once and destroys the entries.

use std::collections::HashMap;

use delos_types::{AccountId, EpochNumber, StakeAmount};

use crate::error::LedgerError;

/// A single pending withdrawal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WithdrawalEntry {
    pub amount: StakeAmount,
    /// The entry becomes payable once the current epoch id exceeds this.
    pub available_after_epoch: EpochNumber,
}

/// All pending withdrawals, keyed by account.
#[derive(Debug, Default)]
pub struct WithdrawalQueue {
    entries: HashMap<AccountId, Vec<WithdrawalEntry>>,
}

impl WithdrawalQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new pending withdrawal for `account`.
    pub fn register(
        &mut self,
        account: &AccountId,
        amount: StakeAmount,
        available_after_epoch: EpochNumber,
    ) {
        self.entries.entry(*account).or_default().push(WithdrawalEntry {
            amount,
            available_after_epoch,
        });
    }

    /// Sum of entries payable at `current_epoch`.
    pub fn withdrawable(&self, account: &AccountId, current_epoch: EpochNumber) -> StakeAmount {
        self.entries
            .get(account)
            .map(|v| {
                v.iter()
                    .filter(|e| e.available_after_epoch < current_epoch)
                    .map(|e| e.amount)
                    .sum()
            })
            .unwrap_or(0)
    }

    /// Sum of entries still locked at `current_epoch`.
    pub fn pending(&self, account: &AccountId, current_epoch: EpochNumber) -> StakeAmount {
        self.entries
            .get(account)
            .map(|v| {
                v.iter()
                    .filter(|e| e.available_after_epoch >= current_epoch)
                    .map(|e| e.amount)
                    .sum()
            })
            .unwrap_or(0)
    }

    /// All entries for an account, in registration order.
    pub fn entries_of(&self, account: &AccountId) -> &[WithdrawalEntry] {
        self.entries.get(account).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Pay out and destroy every matured entry.
    ///
    /// Returns the total amount paid. Fails with
    /// [`LedgerError::NoWithdrawalAvailable`] when nothing has matured;
    /// locked entries are left untouched either way.
    pub fn withdraw(
        &mut self,
        account: &AccountId,
        current_epoch: EpochNumber,
    ) -> Result<StakeAmount, LedgerError> {
        let entries = self
            .entries
            .get_mut(account)
            .ok_or(LedgerError::NoWithdrawalAvailable { account: *account })?;

        let mut paid: StakeAmount = 0;
        entries.retain(|e| {
            if e.available_after_epoch < current_epoch {
                paid += e.amount;
                false
            } else {
                true
            }
        });
        if entries.is_empty() {
            self.entries.remove(account);
        }

        if paid == 0 {
            return Err(LedgerError::NoWithdrawalAvailable { account: *account });
        }
        Ok(paid)
    }
}
