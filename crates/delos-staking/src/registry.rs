//! Validator registry and active-set view.
//!
//! The registry is the single authoritative owner of [`ValidatorRecord`]s,
//! modeled as an arena (address → slot index) with an explicitly ordered
//! active-set view recomputed on every stake change. Ordering is total stake
//! descending with ascending address as tiebreak, so the view is
//! deterministic for any input order.

use std::collections::HashMap;

use delos_types::{AccountId, BasisPoints, BlsKeyRef, StakeAmount, ValidatorRecord, BPS_DENOMINATOR};

use crate::error::StakingError;
use crate::params::MAX_COMMISSION_BPS;

#[derive(Debug, Default)]
pub struct ValidatorRegistry {
    slots: Vec<ValidatorRecord>,
    index: HashMap<AccountId, usize>,
    whitelist: HashMap<AccountId, bool>,
    /// Addresses of active validators, ordered by (total_stake desc, address asc).
    active_set: Vec<AccountId>,
    min_validator_stake: StakeAmount,
}

impl ValidatorRegistry {
    pub fn new(min_validator_stake: StakeAmount) -> Self {
        ValidatorRegistry {
            slots: Vec::new(),
            index: HashMap::new(),
            whitelist: HashMap::new(),
            active_set: Vec::new(),
            min_validator_stake,
        }
    }

    // ------------------------------------------------------------------
    // Whitelist administration (governance-gated by the caller)
    // ------------------------------------------------------------------

    pub fn add_to_whitelist(&mut self, address: AccountId) {
        self.whitelist.insert(address, true);
        if let Some(record) = self.get_mut(&address) {
            record.whitelisted = true;
        }
    }

    pub fn remove_from_whitelist(&mut self, address: AccountId) {
        self.whitelist.insert(address, false);
        if let Some(&slot) = self.index.get(&address) {
            self.slots[slot].whitelisted = false;
            self.slots[slot].active = false;
        }
        self.resort_active_set();
    }

    pub fn is_whitelisted(&self, address: &AccountId) -> bool {
        self.whitelist.get(address).copied().unwrap_or(false)
    }

    // ------------------------------------------------------------------
    // Registration and stake
    // ------------------------------------------------------------------

    pub fn register(
        &mut self,
        address: AccountId,
        bls_key_ref: BlsKeyRef,
        commission_bps: BasisPoints,
    ) -> Result<(), StakingError> {
        if !self.is_whitelisted(&address) {
            return Err(StakingError::NotWhitelisted);
        }
        if self.index.contains_key(&address) {
            return Err(StakingError::AlreadyRegistered);
        }
        if commission_bps > MAX_COMMISSION_BPS {
            return Err(StakingError::InvalidCommission {
                bps: commission_bps,
                max: MAX_COMMISSION_BPS,
            });
        }
        let slot = self.slots.len();
        self.slots.push(ValidatorRecord::new(address, bls_key_ref, commission_bps));
        self.index.insert(address, slot);
        Ok(())
    }

    /// Increase a validator's own bond. Activates it once the bond reaches
    /// the protocol minimum.
    pub fn stake(&mut self, address: &AccountId, amount: StakeAmount) -> Result<(), StakingError> {
        let min = self.min_validator_stake;
        let record = self.get_mut(address).ok_or(StakingError::ValidatorNotFound)?;
        if !record.whitelisted {
            return Err(StakingError::NotWhitelisted);
        }
        record.self_stake += amount;
        record.total_stake += amount;
        record.active = record.self_stake >= min;
        self.resort_active_set();
        Ok(())
    }

    /// Reduce a validator's own bond. Dropping below the minimum deactivates
    /// the validator but is otherwise allowed.
    pub fn unstake(&mut self, address: &AccountId, amount: StakeAmount) -> Result<(), StakingError> {
        let min = self.min_validator_stake;
        let record = self.get_mut(address).ok_or(StakingError::ValidatorNotFound)?;
        if record.self_stake < amount {
            return Err(StakingError::InsufficientBalance {
                balance: record.self_stake,
                requested: amount,
            });
        }
        record.self_stake -= amount;
        record.total_stake -= amount;
        record.active = record.self_stake >= min;
        self.resort_active_set();
        Ok(())
    }

    /// Reflect a delegation increase in the validator's total stake.
    pub fn delegation_increase(
        &mut self,
        address: &AccountId,
        amount: StakeAmount,
    ) -> Result<(), StakingError> {
        let record = self.get_mut(address).ok_or(StakingError::ValidatorNotFound)?;
        record.total_stake += amount;
        self.resort_active_set();
        Ok(())
    }

    /// Reflect a delegation decrease in the validator's total stake.
    pub fn delegation_decrease(
        &mut self,
        address: &AccountId,
        amount: StakeAmount,
    ) -> Result<(), StakingError> {
        let record = self.get_mut(address).ok_or(StakingError::ValidatorNotFound)?;
        debug_assert!(record.total_stake - record.self_stake >= amount);
        record.total_stake -= amount;
        self.resort_active_set();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Commission
    // ------------------------------------------------------------------

    /// Validator-only commission update, bounded by [`MAX_COMMISSION_BPS`].
    pub fn set_commission(
        &mut self,
        address: &AccountId,
        bps: BasisPoints,
    ) -> Result<(), StakingError> {
        if bps > MAX_COMMISSION_BPS {
            return Err(StakingError::InvalidCommission {
                bps,
                max: MAX_COMMISSION_BPS,
            });
        }
        let record = self.get_mut(address).ok_or(StakingError::ValidatorNotFound)?;
        record.commission_bps = bps;
        Ok(())
    }

    /// Credit epoch commission into the validator's withdrawable balance.
    pub fn credit_commission(&mut self, address: &AccountId, amount: StakeAmount) {
        if let Some(record) = self.get_mut(address) {
            record.commission_balance += amount;
        }
    }

    /// Drain the commission balance; returns the amount taken.
    pub fn take_commission_balance(
        &mut self,
        address: &AccountId,
    ) -> Result<StakeAmount, StakingError> {
        let record = self.get_mut(address).ok_or(StakingError::ValidatorNotFound)?;
        let amount = record.commission_balance;
        record.commission_balance = 0;
        Ok(amount)
    }

    // ------------------------------------------------------------------
    // Slashing
    // ------------------------------------------------------------------

    /// Burn `bps` of the validator's own bond. Returns the slashed amount.
    ///
    /// The active flag is re-derived afterwards: a slash that pushes the
    /// bond below the minimum drops the validator out of the active set.
    pub fn slash(&mut self, address: &AccountId, bps: BasisPoints) -> Result<StakeAmount, StakingError> {
        let min = self.min_validator_stake;
        let record = self.get_mut(address).ok_or(StakingError::ValidatorNotFound)?;
        let amount =
            (u128::from(record.self_stake) * u128::from(bps) / u128::from(BPS_DENOMINATOR)) as StakeAmount;
        record.self_stake -= amount;
        record.total_stake -= amount;
        record.active = record.self_stake >= min;
        self.resort_active_set();
        Ok(amount)
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    pub fn get(&self, address: &AccountId) -> Option<&ValidatorRecord> {
        self.index.get(address).map(|&slot| &self.slots[slot])
    }

    fn get_mut(&mut self, address: &AccountId) -> Option<&mut ValidatorRecord> {
        let slot = *self.index.get(address)?;
        Some(&mut self.slots[slot])
    }

    /// The ordered active-set view.
    pub fn active_set(&self) -> &[AccountId] {
        &self.active_set
    }

    /// Sum of total stake over the active set.
    pub fn total_active_stake(&self) -> u128 {
        self.active_set
            .iter()
            .map(|a| u128::from(self.get(a).map(|r| r.total_stake).unwrap_or(0)))
            .sum()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn resort_active_set(&mut self) {
        let mut active: Vec<AccountId> = self
            .slots
            .iter()
            .filter(|r| r.active)
            .map(|r| r.address)
            .collect();
        active.sort_by(|a, b| {
            let sa = self.get(a).map(|r| r.total_stake).unwrap_or(0);
            let sb = self.get(b).map(|r| r.total_stake).unwrap_or(0);
            sb.cmp(&sa).then_with(|| a.cmp(b))
        });
        self.active_set = active;
    }
}
