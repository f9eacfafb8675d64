//! Stake-token ledger trait and in-memory implementation.
//!
//! The staking core mirrors every stake and delegation change 1:1 into a
//! fungible tokenized-stake ledger: stake/delegate mints, unstake/undelegate
//! burns, and slashing or penalty burns destroy tokens without a payout.
//! The core only depends on this trait; nodes wire in the real token module,
//! tests use [`InMemoryStakeToken`].

use std::collections::HashMap;

use delos_types::{AccountId, StakeAmount};

use crate::error::LedgerError;

/// Minimal mint/burn interface over the tokenized-stake ledger.
pub trait StakeTokenLedger {
    /// Credit `amount` tokens to `account`.
    fn mint(&mut self, account: &AccountId, amount: StakeAmount) -> Result<(), LedgerError>;

    /// Destroy `amount` tokens held by `account`.
    ///
    /// Fails with [`LedgerError::InsufficientTokenBalance`] if the account
    /// does not hold the full amount; partial burns are never performed.
    fn burn(&mut self, account: &AccountId, amount: StakeAmount) -> Result<(), LedgerError>;

    /// Current token balance of `account`.
    fn balance_of(&self, account: &AccountId) -> StakeAmount;
}

/// HashMap-backed stake-token ledger for tests and simulation.
#[derive(Debug, Default)]
pub struct InMemoryStakeToken {
    balances: HashMap<AccountId, StakeAmount>,
    total_minted: u128,
    total_burned: u128,
}

impl InMemoryStakeToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total tokens minted over the ledger's lifetime.
    pub fn total_minted(&self) -> u128 {
        self.total_minted
    }

    /// Total tokens burned over the ledger's lifetime.
    pub fn total_burned(&self) -> u128 {
        self.total_burned
    }

    /// Current circulating supply.
    pub fn total_supply(&self) -> u128 {
        self.total_minted - self.total_burned
    }
}

impl StakeTokenLedger for InMemoryStakeToken {
    fn mint(&mut self, account: &AccountId, amount: StakeAmount) -> Result<(), LedgerError> {
        let balance = self.balances.entry(*account).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow { account: *account })?;
        self.total_minted += u128::from(amount);
        Ok(())
    }

    fn burn(&mut self, account: &AccountId, amount: StakeAmount) -> Result<(), LedgerError> {
        let balance = self.balances.entry(*account).or_insert(0);
        if *balance < amount {
            return Err(LedgerError::InsufficientTokenBalance {
                account: *account,
                balance: *balance,
                required: amount,
            });
        }
        *balance -= amount;
        self.total_burned += u128::from(amount);
        Ok(())
    }

    fn balance_of(&self, account: &AccountId) -> StakeAmount {
        self.balances.get(account).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acct(idx: u8) -> AccountId {
        let mut id = [0u8; 32];
        id[0] = idx;
        id
    }

    #[test]
    fn mint_then_burn_round_trips() {
        let mut ledger = InMemoryStakeToken::new();
        ledger.mint(&acct(1), 500).unwrap();
        assert_eq!(ledger.balance_of(&acct(1)), 500);

        ledger.burn(&acct(1), 200).unwrap();
        assert_eq!(ledger.balance_of(&acct(1)), 300);
        assert_eq!(ledger.total_supply(), 300);
    }

    #[test]
    fn burn_beyond_balance_fails_without_partial_effect() {
        let mut ledger = InMemoryStakeToken::new();
        ledger.mint(&acct(1), 100).unwrap();

        let err = ledger.burn(&acct(1), 101).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientTokenBalance {
                account: acct(1),
                balance: 100,
                required: 101,
            }
        );
        assert_eq!(ledger.balance_of(&acct(1)), 100);
    }
}
