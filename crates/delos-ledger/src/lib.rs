//! Ledger-side collaborators of the delos staking core.
//!
//! This crate holds the seams between the pure staking state machine and the
//! rest of a node: the tokenized-stake ledger (mint/burn 1:1 with stake
//! changes), the per-account withdrawal queue, and the authorization gate
//! for privileged operations. Each seam is a small trait with an in-memory
//! implementation used by tests and simulation.

pub mod auth;
pub mod error;
pub mod token;
pub mod withdrawal;

pub use auth::{AuthorizationGate, StaticAuthorizationGate};
pub use error::LedgerError;
pub use token::{InMemoryStakeToken, StakeTokenLedger};
pub use withdrawal::{WithdrawalEntry, WithdrawalQueue};
