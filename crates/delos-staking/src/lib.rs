//! Economic core of the delos delegated proof-of-stake network.
//!
//! This crate implements epoch-based reward accrual, vesting-bonus
//! delegation positions, and double-signer slashing as pure accounting and
//! state-transition logic. Consensus, block production, transport, and BLS
//! cryptography live elsewhere; they reach this crate only through the
//! collaborator traits in `delos-ledger` and the [`SignatureOracle`].
//!
//! The [`StakingEngine`] is the single public surface: construct it with
//! protocol parameters and the three collaborators, then drive it with the
//! epoch-commit, staking, delegation, vesting, and withdrawal operations.

pub mod delegation;
pub mod engine;
pub mod epoch;
pub mod error;
pub mod events;
pub mod metrics;
pub mod params;
pub mod penalty;
pub mod registry;
pub mod rps;
pub mod slashing;
pub mod vesting;

pub use engine::StakingEngine;
pub use epoch::{Epoch, EpochLedger};
pub use error::StakingError;
pub use events::{EventLog, StakingEvent};
pub use metrics::StakingMetrics;
pub use params::{
    vesting_bonus_bps, ParamsError, ProtocolParams, VotingPowerExponent, DOUBLE_SIGN_SLASH_BPS,
    MAX_COMMISSION_BPS, MAX_VESTING_WEEKS, PENALTY_DECAY_BPS_PER_WEEK,
};
pub use penalty::{early_exit_penalty, weeks_remaining};
pub use registry::ValidatorRegistry;
pub use rps::{RpsBook, RpsHistory, RpsSnapshot};
pub use slashing::{
    AcceptAllOracle, DoubleSignEvidence, RejectAllOracle, SignatureOracle, SlashingCommitInput,
    MIN_IMPLICATING_EVIDENCE,
};
pub use vesting::{VestedDelegation, VestingBook};
