//! Error type for ledger-side operations.

use delos_types::{AccountId, StakeAmount};

/// Errors raised by the stake-token ledger and the withdrawal queue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LedgerError {
    /// Account holds fewer tokens than the burn requires.
    InsufficientTokenBalance {
        account: AccountId,
        balance: StakeAmount,
        required: StakeAmount,
    },
    /// Minting would overflow the account balance.
    BalanceOverflow { account: AccountId },
    /// No withdrawal entry has matured yet for this account.
    NoWithdrawalAvailable { account: AccountId },
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerError::InsufficientTokenBalance {
                account,
                balance,
                required,
            } => {
                write!(
                    f,
                    "account {} holds {} tokens, burn requires {}",
                    hex_prefix(account),
                    balance,
                    required
                )
            }
            LedgerError::BalanceOverflow { account } => {
                write!(f, "token balance overflow for account {}", hex_prefix(account))
            }
            LedgerError::NoWithdrawalAvailable { account } => {
                write!(
                    f,
                    "no matured withdrawal for account {}",
                    hex_prefix(account)
                )
            }
        }
    }
}

impl std::error::Error for LedgerError {}

/// Short hex rendering of an account id for error messages.
fn hex_prefix(id: &AccountId) -> String {
    let mut s = String::with_capacity(10);
    for b in &id[..4] {
        s.push_str(&format!("{:02x}", b));
    }
    s.push_str("..");
    s
}
