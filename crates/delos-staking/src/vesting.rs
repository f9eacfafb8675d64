//! Vesting position book and claim arithmetic.
//!
//! Each delegator acts through exactly one position manager, recorded as an
//! explicit owner → manager mapping. A manager holds at most one non-closed
//! position per validator. This module owns the position/top-up state and
//! the pure claim arithmetic; the engine sequences the operations and talks
//! to the registry, token ledger and withdrawal queue.

use std::collections::HashMap;

use delos_types::{
    AccountId, BasisPoints, EpochNumber, StakeAmount, TopUpRecord, VestingPosition,
    BPS_DENOMINATOR,
};

use crate::delegation::DelegationAccount;
use crate::error::StakingError;

/// One vested delegation: the position, its reward account, and its balance
/// checkpoints.
#[derive(Clone, Debug, Default)]
pub struct VestedDelegation {
    pub position: VestingPosition,
    pub account: DelegationAccount,
    pub top_ups: Vec<TopUpRecord>,
}

/// All vested delegations plus the owner → manager record.
#[derive(Debug, Default)]
pub struct VestingBook {
    /// manager → owner
    managers: HashMap<AccountId, AccountId>,
    /// owner → manager
    owners: HashMap<AccountId, AccountId>,
    delegations: HashMap<(AccountId, AccountId), VestedDelegation>,
}

impl VestingBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the one manager handle an owner may create.
    pub fn create_manager(
        &mut self,
        owner: AccountId,
        manager: AccountId,
    ) -> Result<(), StakingError> {
        if self.owners.contains_key(&owner) || self.managers.contains_key(&manager) {
            return Err(StakingError::ManagerAlreadyExists);
        }
        self.owners.insert(owner, manager);
        self.managers.insert(manager, owner);
        Ok(())
    }

    pub fn is_manager(&self, manager: &AccountId) -> bool {
        self.managers.contains_key(manager)
    }

    pub fn manager_of(&self, owner: &AccountId) -> Option<&AccountId> {
        self.owners.get(owner)
    }

    pub fn get(&self, manager: &AccountId, validator: &AccountId) -> Option<&VestedDelegation> {
        self.delegations.get(&(*manager, *validator))
    }

    pub fn get_mut(
        &mut self,
        manager: &AccountId,
        validator: &AccountId,
    ) -> Option<&mut VestedDelegation> {
        self.delegations.get_mut(&(*manager, *validator))
    }

    pub fn get_or_default(
        &mut self,
        manager: &AccountId,
        validator: &AccountId,
    ) -> &mut VestedDelegation {
        self.delegations.entry((*manager, *validator)).or_default()
    }

    /// Sum of all vested balances towards `validator`.
    pub fn delegated_towards(&self, validator: &AccountId) -> u128 {
        self.delegations
            .iter()
            .filter(|((_, v), _)| v == validator)
            .map(|(_, d)| u128::from(d.account.balance))
            .sum()
    }
}

// ============================================================================
// Claim arithmetic
// ============================================================================

/// Annualize a raw reward under an APR multiplier and a stability index.
///
/// `delivered = raw * apr_bps / 10_000 * rsi_bps / 10_000 / epochs_per_year`,
/// computed in one u128 expression so rounding happens exactly once.
pub fn annualized_reward(
    raw: StakeAmount,
    apr_bps: u64,
    rsi_bps: u64,
    epochs_per_year: u64,
) -> StakeAmount {
    let denominator =
        u128::from(BPS_DENOMINATOR) * u128::from(BPS_DENOMINATOR) * u128::from(epochs_per_year);
    (u128::from(raw) * u128::from(apr_bps) * u128::from(rsi_bps) / denominator) as StakeAmount
}

/// Extension of a position's `end` bought by a top-up: the original duration
/// scaled by the share the new amount takes of the new balance.
pub fn top_up_time_extension(duration: u64, amount: StakeAmount, new_balance: StakeAmount) -> u64 {
    if new_balance == 0 {
        return 0;
    }
    (u128::from(duration) * u128::from(amount) / u128::from(new_balance)) as u64
}

/// Re-validate a caller-supplied top-up index for a claim.
///
/// The index must name the record with the greatest `epoch_num` ≤ the
/// resolved snapshot's epoch, and must not walk backwards past a record an
/// earlier claim already consumed.
pub fn validate_top_up_index(
    top_ups: &[TopUpRecord],
    index: usize,
    snapshot_epoch: EpochNumber,
    consumed: Option<usize>,
) -> Result<(), StakingError> {
    let record = top_ups.get(index).ok_or(StakingError::InvalidTopUpIndex {
        index,
        len: top_ups.len(),
    })?;
    if record.epoch_num > snapshot_epoch {
        return Err(StakingError::LaterTopUp { index });
    }
    if let Some(next) = top_ups.get(index + 1) {
        if next.epoch_num <= snapshot_epoch {
            return Err(StakingError::EarlierTopUp { index });
        }
    }
    if let Some(consumed) = consumed {
        if index < consumed {
            return Err(StakingError::EarlierTopUp { index });
        }
    }
    Ok(())
}

/// Split a bonus-eligible raw reward between the original lock and the
/// topped-up balance, and apply the vesting multipliers to each part.
///
/// The first top-up record is the opening balance and earns the full
/// `(base + vest_bonus) × rsi` multiplier. Balance added later forgoes the
/// stability index earned by the original commitment and gets the default
/// index instead. Whatever the multipliers do not deliver is burned by the
/// caller.
#[allow(clippy::too_many_arguments)]
pub fn deliver_bonus_reward(
    raw: StakeAmount,
    top_ups: &[TopUpRecord],
    top_up_index: usize,
    base_bps: BasisPoints,
    vest_bonus_bps: BasisPoints,
    rsi_bps: BasisPoints,
    default_rsi_bps: BasisPoints,
    epochs_per_year: u64,
) -> StakeAmount {
    let apr = u64::from(base_bps) + u64::from(vest_bonus_bps);
    let opening_balance = top_ups.first().map(|t| t.balance_after).unwrap_or(0);
    let balance_at_index = top_ups
        .get(top_up_index)
        .map(|t| t.balance_after)
        .unwrap_or(opening_balance);

    if balance_at_index == 0 || opening_balance >= balance_at_index {
        // Never topped up (or fully cut back down): all original.
        return annualized_reward(raw, apr, u64::from(rsi_bps), epochs_per_year);
    }

    let original_share =
        (u128::from(raw) * u128::from(opening_balance) / u128::from(balance_at_index)) as StakeAmount;
    let topped_share = raw - original_share;
    annualized_reward(original_share, apr, u64::from(rsi_bps), epochs_per_year)
        + annualized_reward(topped_share, apr, u64::from(default_rsi_bps), epochs_per_year)
}
