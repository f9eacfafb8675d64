//! Protocol parameters for the staking core.
//!
//! All economic knobs live here: epoch geometry, the fixed per-epoch reward
//! budget, delegation minimums, APR basis points, and the two-phase committed
//! voting-power exponent. Parameters are deserialized from the node's genesis
//! configuration and validated before the engine is constructed.

use serde::{Deserialize, Serialize};

use delos_types::{BasisPoints, ChainId, StakeAmount, DELOS_DEVNET_CHAIN_ID};

/// Hard upper bound on validator commission.
pub const MAX_COMMISSION_BPS: BasisPoints = 1_500;

/// Flat slash applied to each validator implicated by double-sign evidence.
pub const DOUBLE_SIGN_SLASH_BPS: BasisPoints = 1_000;

/// Penalty decay rate: basis points forgiven per full week already served.
pub const PENALTY_DECAY_BPS_PER_WEEK: u64 = 30;

/// Week count at which the vesting bonus saturates.
pub const MAX_VESTING_WEEKS: u64 = 52;

/// Vesting bonus in basis points, indexed by `duration_weeks - 1`.
///
/// Monotonically increasing and concave: each additional locked week buys a
/// smaller marginal bonus, saturating at 52 weeks.
const VESTING_BONUS_BPS: [u16; MAX_VESTING_WEEKS as usize] = [
    6, 16, 30, 46, 65, 85, 108, 131, 157, 184, 212, 241, 272, 303, 335, 368, 401, 435, 470, 504,
    540, 575, 611, 647, 684, 720, 757, 793, 830, 867, 903, 940, 976, 1012, 1049, 1085, 1120, 1156,
    1191, 1226, 1260, 1294, 1328, 1361, 1394, 1426, 1457, 1488, 1519, 1548, 1577, 1606,
];

/// Bonus for locking `weeks` full weeks, saturating at [`MAX_VESTING_WEEKS`].
///
/// Zero-week durations earn no bonus; callers reject them before this point.
pub fn vesting_bonus_bps(weeks: u64) -> BasisPoints {
    if weeks == 0 {
        return 0;
    }
    let idx = weeks.min(MAX_VESTING_WEEKS) as usize - 1;
    VESTING_BONUS_BPS[idx]
}

/// Voting-power exponent with two-phase commit.
///
/// `value` applies to the distribution performed at the current epoch commit;
/// `pending_value` becomes `value` at that commit's boundary. Changing the
/// exponent therefore never reshapes the weighting of an epoch that is
/// already accruing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingPowerExponent {
    pub value: u32,
    pub pending_value: u32,
}

impl VotingPowerExponent {
    pub fn new(value: u32) -> Self {
        VotingPowerExponent {
            value,
            pending_value: value,
        }
    }

    /// Stage a new exponent; it takes effect from the next epoch commit.
    pub fn set_pending(&mut self, pending: u32) {
        self.pending_value = pending;
    }

    /// Promote the pending value at an epoch boundary.
    pub fn rotate(&mut self) {
        self.value = self.pending_value;
    }
}

impl Default for VotingPowerExponent {
    fn default() -> Self {
        VotingPowerExponent::new(1)
    }
}

/// Errors from protocol parameter validation.
#[derive(Debug, thiserror::Error)]
pub enum ParamsError {
    #[error("epoch_size must be nonzero")]
    ZeroEpochSize,

    #[error("epochs_per_year must be nonzero")]
    ZeroEpochsPerYear,

    #[error("min_delegation must be nonzero")]
    ZeroMinDelegation,

    #[error("rsi_bps {got} below default_rsi_bps {default}")]
    RsiBelowDefault {
        got: BasisPoints,
        default: BasisPoints,
    },

    #[error("voting power exponent must be in 1..=2, got {0}")]
    ExponentOutOfRange(u32),
}

/// The full parameter set of the staking protocol.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolParams {
    pub chain_id: ChainId,
    /// Every committed epoch must span a multiple of this many blocks.
    pub epoch_size: u64,
    /// Fixed reward budget distributed across validators at each commit.
    pub epoch_reward_budget: StakeAmount,
    /// Minimum amount for opening or keeping any delegation.
    pub min_delegation: StakeAmount,
    /// Minimum self-stake for a validator to be active.
    pub min_validator_stake: StakeAmount,
    /// Epochs a withdrawal entry stays locked after registration.
    pub withdrawal_wait_epochs: u64,
    /// Number of epochs in a year; APR basis points are divided by this to
    /// produce per-claim reward factors.
    pub epochs_per_year: u64,
    /// Base APR applied to every delegation.
    pub base_apr_bps: BasisPoints,
    /// Current global reward-stability-index, granted to the original lock
    /// commitment of a vesting position.
    pub rsi_bps: BasisPoints,
    /// Neutral reward-stability-index applied to topped-up balance.
    pub default_rsi_bps: BasisPoints,
    /// Two-phase committed voting-power exponent.
    pub exponent: VotingPowerExponent,
}

impl ProtocolParams {
    /// Development defaults; production networks deserialize their own.
    pub fn devnet() -> Self {
        ProtocolParams {
            chain_id: DELOS_DEVNET_CHAIN_ID,
            epoch_size: 64,
            epoch_reward_budget: 50_000_000,
            min_delegation: 100_000,
            min_validator_stake: 1_000_000,
            withdrawal_wait_epochs: 1,
            epochs_per_year: 31_500,
            base_apr_bps: 500,
            rsi_bps: 11_000,
            default_rsi_bps: 10_000,
            exponent: VotingPowerExponent::default(),
        }
    }

    /// Check internal consistency. Call once at construction.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.epoch_size == 0 {
            return Err(ParamsError::ZeroEpochSize);
        }
        if self.epochs_per_year == 0 {
            return Err(ParamsError::ZeroEpochsPerYear);
        }
        if self.min_delegation == 0 {
            return Err(ParamsError::ZeroMinDelegation);
        }
        if self.rsi_bps < self.default_rsi_bps {
            return Err(ParamsError::RsiBelowDefault {
                got: self.rsi_bps,
                default: self.default_rsi_bps,
            });
        }
        // The weight of a u64 stake raised to the exponent must fit u128,
        // so the curve is bounded at quadratic.
        if self.exponent.value == 0
            || self.exponent.value > 2
            || self.exponent.pending_value == 0
            || self.exponent.pending_value > 2
        {
            return Err(ParamsError::ExponentOutOfRange(
                self.exponent.value.max(self.exponent.pending_value),
            ));
        }
        Ok(())
    }
}
