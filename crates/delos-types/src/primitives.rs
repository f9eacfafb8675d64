//! Core primitives for the delos staking protocol.

use serde::{Deserialize, Serialize};

pub type AccountId = [u8; 32];
pub type Hash32 = [u8; 32];

/// Reference to a registered BLS public key, held by the external key registry.
pub type BlsKeyRef = [u8; 32];

/// Amount of stake in native units (microDLS).
pub type StakeAmount = u64;

/// Epoch sequence number.
pub type EpochNumber = u64;

/// Block height.
pub type BlockNumber = u64;

/// Ambient transaction timestamp, seconds since the unix epoch.
pub type Timestamp = u64;

/// Percentage in basis points (1 bps = 0.01%).
pub type BasisPoints = u16;

/// Denominator for all basis-point arithmetic.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Seconds in one week, the granularity of vesting durations.
pub const WEEK: u64 = 7 * 24 * 60 * 60;

/// Fixed-point scale for cumulative reward-per-share values.
pub const RPS_SCALE: u128 = 1_000_000_000_000_000_000;

// ============================================================================
// ChainId
// ============================================================================

/// Unique identifier for a delos network.
///
/// The chain id is part of the double-sign evidence signing preimage, so
/// signatures produced on one network cannot implicate validators on another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ChainId(pub u64);

impl ChainId {
    /// Create a new ChainId from a raw u64 value.
    pub const fn new(id: u64) -> Self {
        ChainId(id)
    }

    /// Get the raw u64 value.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "chain_{:016x}", self.0)
    }
}

/// ChainId constant for the delos development network.
pub const DELOS_DEVNET_CHAIN_ID: ChainId = ChainId(0x444C_5300_4445_5600);

/// ChainId constant for the delos main network.
pub const DELOS_MAINNET_CHAIN_ID: ChainId = ChainId(0x444C_5300_4D41_494E);
