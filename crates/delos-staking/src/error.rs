//! Error type for the staking core.
//!
//! One enum covers the whole state machine. Variants group into five kinds:
//! authorization, epoch sequencing, bounds, position/validator state, and
//! evidence integrity. Every operation surfaces its error synchronously and
//! leaves state untouched on failure.

use delos_types::{BasisPoints, BlockNumber, EpochNumber, StakeAmount};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StakingError {
    // -- authorization ------------------------------------------------------
    /// Caller is not the designated epoch committer or governance role.
    Unauthorized,
    /// Caller is not a registered position manager.
    NotManager,
    /// A position manager already exists for this owner.
    ManagerAlreadyExists,

    // -- epoch sequencing ---------------------------------------------------
    /// Commit id does not match the current epoch id.
    UnexpectedEpochId {
        expected: EpochNumber,
        got: EpochNumber,
    },
    /// The committed range does not advance past the previous epoch.
    NoBlocksCommitted,
    /// Block span is not a whole number of epoch_size blocks.
    EpochSizeMismatch {
        start_block: BlockNumber,
        end_block: BlockNumber,
        epoch_size: u64,
    },
    /// Start block is not previous end block + 1.
    InvalidStartBlock {
        expected: BlockNumber,
        got: BlockNumber,
    },

    // -- bounds -------------------------------------------------------------
    /// Amount below the protocol delegation minimum.
    DelegationTooLow {
        amount: StakeAmount,
        min: StakeAmount,
    },
    /// Validator self-stake would fall below the registration minimum.
    StakeTooLow {
        amount: StakeAmount,
        min: StakeAmount,
    },
    /// Commission above the protocol maximum.
    InvalidCommission { bps: BasisPoints, max: BasisPoints },
    /// Vesting duration outside 1..=52 weeks.
    InvalidDuration { weeks: u64 },
    /// Staged voting-power exponent outside the supported curve range.
    InvalidExponent { value: u32 },
    /// Cut or unstake larger than the held balance.
    InsufficientBalance {
        balance: StakeAmount,
        requested: StakeAmount,
    },

    // -- validator / position state -----------------------------------------
    /// Address not present in the registry.
    ValidatorNotFound,
    /// Address already registered.
    AlreadyRegistered,
    /// Address has not been whitelisted by governance.
    NotWhitelisted,
    /// An open operation found a position still in its lock period.
    PositionActive,
    /// An open operation found a position still maturing.
    PositionMaturing,
    /// A top-up requires an active position.
    PositionNotActive,
    /// Raw reward from the previous position is still unclaimed.
    RewardsNotClaimed,
    /// A claim on a position whose rewards have not started settling.
    NoRewardsToClaim,
    /// A top-up was already recorded for the current epoch.
    BalanceChangeAlreadyMade,
    /// The position reached its top-up record cap.
    TooManyTopUps,

    // -- reward lookup ------------------------------------------------------
    /// Queried epoch exceeds every recorded snapshot.
    InvalidEpoch { requested: EpochNumber },
    /// Caller-supplied snapshot index is out of bounds.
    InvalidIndex { index: usize, len: usize },
    /// Caller-supplied snapshot index does not bracket the target timestamp.
    WrongRps { index: usize },
    /// Caller-supplied top-up index is out of bounds.
    InvalidTopUpIndex { index: usize, len: usize },
    /// The named top-up is newer than the resolved snapshot's epoch.
    LaterTopUp { index: usize },
    /// A newer top-up also precedes the snapshot's epoch, or the index walks
    /// backwards past an already-consumed record.
    EarlierTopUp { index: usize },

    // -- evidence integrity -------------------------------------------------
    /// Fewer than two evidence items, or uptime vector length mismatch.
    InvalidLength,
    /// Two evidence items share a block hash; no fork is evidenced.
    BlockhashNotUnique,
    /// The signature oracle rejected an evidence item.
    SignatureVerificationFailed,

    // -- collaborator passthrough -------------------------------------------
    /// The stake-token ledger or withdrawal queue refused the operation.
    Ledger(delos_ledger::LedgerError),
}

impl std::fmt::Display for StakingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StakingError::Unauthorized => write!(f, "caller lacks the required role"),
            StakingError::NotManager => write!(f, "caller is not a registered position manager"),
            StakingError::ManagerAlreadyExists => {
                write!(f, "a position manager already exists for this owner")
            }
            StakingError::UnexpectedEpochId { expected, got } => {
                write!(f, "unexpected epoch id: expected {}, got {}", expected, got)
            }
            StakingError::NoBlocksCommitted => write!(f, "no new blocks committed"),
            StakingError::EpochSizeMismatch {
                start_block,
                end_block,
                epoch_size,
            } => write!(
                f,
                "blocks {}..={} are not a multiple of epoch size {}",
                start_block, end_block, epoch_size
            ),
            StakingError::InvalidStartBlock { expected, got } => {
                write!(f, "invalid start block: expected {}, got {}", expected, got)
            }
            StakingError::DelegationTooLow { amount, min } => {
                write!(f, "delegation {} below minimum {}", amount, min)
            }
            StakingError::StakeTooLow { amount, min } => {
                write!(f, "stake {} below minimum {}", amount, min)
            }
            StakingError::InvalidCommission { bps, max } => {
                write!(f, "commission {} bps above maximum {} bps", bps, max)
            }
            StakingError::InvalidDuration { weeks } => {
                write!(f, "vesting duration of {} weeks out of range", weeks)
            }
            StakingError::InvalidExponent { value } => {
                write!(f, "voting-power exponent {} out of range", value)
            }
            StakingError::InsufficientBalance { balance, requested } => {
                write!(f, "balance {} smaller than requested {}", balance, requested)
            }
            StakingError::ValidatorNotFound => write!(f, "validator not found"),
            StakingError::AlreadyRegistered => write!(f, "validator already registered"),
            StakingError::NotWhitelisted => write!(f, "address not whitelisted"),
            StakingError::PositionActive => write!(f, "position is still active"),
            StakingError::PositionMaturing => write!(f, "position is still maturing"),
            StakingError::PositionNotActive => write!(f, "position is not active"),
            StakingError::RewardsNotClaimed => {
                write!(f, "previous position rewards not yet claimed")
            }
            StakingError::NoRewardsToClaim => write!(f, "no rewards to claim"),
            StakingError::BalanceChangeAlreadyMade => {
                write!(f, "balance already changed this epoch")
            }
            StakingError::TooManyTopUps => write!(f, "top-up record limit reached"),
            StakingError::InvalidEpoch { requested } => {
                write!(f, "epoch {} exceeds recorded history", requested)
            }
            StakingError::InvalidIndex { index, len } => {
                write!(f, "snapshot index {} out of bounds (len {})", index, len)
            }
            StakingError::WrongRps { index } => {
                write!(f, "snapshot index {} does not bracket the target", index)
            }
            StakingError::InvalidTopUpIndex { index, len } => {
                write!(f, "top-up index {} out of bounds (len {})", index, len)
            }
            StakingError::LaterTopUp { index } => {
                write!(f, "top-up {} is later than the resolved snapshot", index)
            }
            StakingError::EarlierTopUp { index } => {
                write!(f, "top-up {} is not the latest eligible record", index)
            }
            StakingError::InvalidLength => write!(f, "evidence or uptime length invalid"),
            StakingError::BlockhashNotUnique => {
                write!(f, "evidence items share a block hash")
            }
            StakingError::SignatureVerificationFailed => {
                write!(f, "evidence signature verification failed")
            }
            StakingError::Ledger(e) => write!(f, "ledger error: {}", e),
        }
    }
}

impl std::error::Error for StakingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StakingError::Ledger(e) => Some(e),
            _ => None,
        }
    }
}

impl From<delos_ledger::LedgerError> for StakingError {
    fn from(e: delos_ledger::LedgerError) -> Self {
        StakingError::Ledger(e)
    }
}
