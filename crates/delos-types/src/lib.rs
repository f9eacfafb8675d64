//! Shared state types and primitives for the delos staking protocol.

pub mod primitives;
pub mod state_position;
pub mod state_validator;

pub use primitives::{
    AccountId, BasisPoints, BlockNumber, BlsKeyRef, ChainId, EpochNumber, Hash32, StakeAmount,
    Timestamp, BPS_DENOMINATOR, DELOS_DEVNET_CHAIN_ID, DELOS_MAINNET_CHAIN_ID, RPS_SCALE, WEEK,
};
pub use state_position::{PositionPhase, TopUpRecord, VestingPosition, MAX_TOP_UPS};
pub use state_validator::ValidatorRecord;
