//! ValidatorRecord state type for the delos staking registry.

use crate::primitives::{AccountId, BasisPoints, BlsKeyRef, StakeAmount};

/// On-ledger record of a single validator.
///
/// The registry owns these records exclusively. `self_stake` is the
/// validator's own bond; `total_stake` additionally includes everything
/// delegated through it and is the value reward weighting and the active-set
/// ordering are derived from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatorRecord {
    pub address: AccountId,
    pub bls_key_ref: BlsKeyRef,
    pub self_stake: StakeAmount,
    pub total_stake: StakeAmount,
    pub commission_bps: BasisPoints,
    pub active: bool,
    pub whitelisted: bool,
    /// Commission accumulated from epoch reward distribution, withdrawable
    /// by the validator.
    pub commission_balance: StakeAmount,
}

impl ValidatorRecord {
    /// A freshly registered validator: whitelisted, no stake, inactive until
    /// it bonds at least the minimum self-stake.
    pub fn new(address: AccountId, bls_key_ref: BlsKeyRef, commission_bps: BasisPoints) -> Self {
        ValidatorRecord {
            address,
            bls_key_ref,
            self_stake: 0,
            total_stake: 0,
            commission_bps,
            active: false,
            whitelisted: true,
            commission_balance: 0,
        }
    }

    /// Stake delegated through this validator, excluding its own bond.
    pub fn delegated_stake(&self) -> StakeAmount {
        self.total_stake - self.self_stake
    }
}
