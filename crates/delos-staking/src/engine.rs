//! The staking engine: every public operation of the economic core.
//!
//! One engine instance is the whole state machine. Execution is effectively
//! single-threaded per transition: each operation validates all of its
//! preconditions against current state, then mutates, so a failed call
//! leaves no partial effect. Ambient time and block context are passed in
//! once per operation and never re-read.
//!
//! Collaborators are generic parameters: the authorization gate, the
//! tokenized-stake ledger (minted/burned 1:1 with stake changes), and the
//! BLS signature oracle consumed by double-signer slashing.

use delos_ledger::{AuthorizationGate, StakeTokenLedger, WithdrawalQueue};
use delos_types::{
    AccountId, BasisPoints, BlsKeyRef, EpochNumber, PositionPhase, StakeAmount, Timestamp,
    TopUpRecord, ValidatorRecord, VestingPosition, BPS_DENOMINATOR, MAX_TOP_UPS, WEEK,
};

use crate::delegation::DelegationBook;
use crate::epoch::{Epoch, EpochLedger};
use crate::error::StakingError;
use crate::events::{EventLog, StakingEvent};
use crate::metrics::StakingMetrics;
use crate::params::{
    vesting_bonus_bps, ProtocolParams, MAX_VESTING_WEEKS, DOUBLE_SIGN_SLASH_BPS,
};
use crate::penalty::early_exit_penalty;
use crate::rps::{
    epoch_max_reward, per_share_increment, raw_reward, validator_weight, RpsBook, RpsSnapshot,
};
use crate::slashing::{
    check_unique_block_hashes, implicated_validators, signed_message_digest, SignatureOracle,
    SlashingCommitInput,
};
use crate::registry::ValidatorRegistry;
use crate::vesting::{
    annualized_reward, deliver_bonus_reward, top_up_time_extension, validate_top_up_index,
    VestingBook,
};

/// Neutral stability index: multiplies by exactly one.
const NEUTRAL_RSI_BPS: BasisPoints = BPS_DENOMINATOR as BasisPoints;

pub struct StakingEngine<A, T, O> {
    params: ProtocolParams,
    auth: A,
    token: T,
    oracle: O,
    epochs: EpochLedger,
    registry: ValidatorRegistry,
    rps: RpsBook,
    vesting: VestingBook,
    delegations: DelegationBook,
    withdrawals: WithdrawalQueue,
    events: EventLog,
    metrics: StakingMetrics,
}

impl<A, T, O> StakingEngine<A, T, O>
where
    A: AuthorizationGate,
    T: StakeTokenLedger,
    O: SignatureOracle,
{
    pub fn new(params: ProtocolParams, auth: A, token: T, oracle: O) -> Self {
        let min_validator_stake = params.min_validator_stake;
        StakingEngine {
            params,
            auth,
            token,
            oracle,
            epochs: EpochLedger::new(),
            registry: ValidatorRegistry::new(min_validator_stake),
            rps: RpsBook::new(),
            vesting: VestingBook::new(),
            delegations: DelegationBook::new(),
            withdrawals: WithdrawalQueue::new(),
            events: EventLog::new(),
            metrics: StakingMetrics::new(),
        }
    }

    // ==================================================================
    // Epoch commit
    // ==================================================================

    /// Commit the next epoch and distribute its reward budget.
    ///
    /// `uptime` lists the validators whose uptime the committer observed;
    /// only those receive a reward-per-share snapshot for this epoch.
    pub fn commit_epoch(
        &mut self,
        caller: &AccountId,
        id: EpochNumber,
        epoch: Epoch,
        epoch_size: u64,
        timestamp: Timestamp,
        uptime: &[AccountId],
    ) -> Result<(), StakingError> {
        if !self.auth.is_epoch_committer(caller) {
            return Err(StakingError::Unauthorized);
        }
        self.epochs.validate_commit(id, &epoch, epoch_size)?;
        self.apply_commit(id, epoch, timestamp, uptime);
        Ok(())
    }

    /// Commit the next epoch, applying double-signer slashes first.
    ///
    /// Every sequencing and geometry check of [`commit_epoch`] runs before
    /// the evidence is even looked at; evidence integrity checks run before
    /// any stake is touched. Implicated validators lose a flat
    /// [`DOUBLE_SIGN_SLASH_BPS`] of their bond before rewards distribute.
    #[allow(clippy::too_many_arguments)]
    pub fn commit_epoch_with_double_signer_slashing(
        &mut self,
        caller: &AccountId,
        id: EpochNumber,
        epoch: Epoch,
        epoch_size: u64,
        timestamp: Timestamp,
        uptime: &[AccountId],
        input: &SlashingCommitInput,
    ) -> Result<(), StakingError> {
        if !self.auth.is_epoch_committer(caller) {
            return Err(StakingError::Unauthorized);
        }
        self.epochs.validate_commit(id, &epoch, epoch_size)?;

        let active = self.registry.active_set().to_vec();
        if input.evidence.len() < 2 || uptime.len() != active.len() {
            return Err(StakingError::InvalidLength);
        }
        check_unique_block_hashes(&input.evidence)?;

        // Fail-closed signature verification: one bad item aborts the commit.
        for item in &input.evidence {
            let message = signed_message_digest(
                self.params.chain_id,
                input.block_number,
                &item.block_hash,
                input.pbft_round,
                id,
                &epoch.root,
                &input.current_validator_set_hash,
                &input.next_validator_set_hash,
            );
            if !self.oracle.verify(&message, item) {
                return Err(StakingError::SignatureVerificationFailed);
            }
        }

        let implicated = implicated_validators(active.len(), &input.evidence);
        for (index, validator) in active.iter().enumerate() {
            if !implicated[index] {
                continue;
            }
            let burned = self.registry.slash(validator, DOUBLE_SIGN_SLASH_BPS)?;
            self.token.burn(validator, burned)?;
            self.events.push(StakingEvent::ValidatorSlashed {
                validator: *validator,
                amount: burned,
            });
            self.metrics.record_slash(burned);
        }

        self.apply_commit(id, epoch, timestamp, uptime);
        Ok(())
    }

    /// Shared tail of both commit paths: distribute, store, rotate.
    fn apply_commit(
        &mut self,
        id: EpochNumber,
        epoch: Epoch,
        timestamp: Timestamp,
        uptime: &[AccountId],
    ) {
        let exponent = self.params.exponent.value;
        let budget = self.params.epoch_reward_budget;

        // Reward only validators that are active and had uptime reported.
        let rewarded: Vec<&ValidatorRecord> = uptime
            .iter()
            .filter_map(|address| self.registry.get(address))
            .filter(|record| record.active)
            .collect();

        let total_weight: u128 = rewarded
            .iter()
            .map(|record| validator_weight(record.total_stake, exponent))
            .sum();

        let shares: Vec<(AccountId, StakeAmount, BasisPoints, StakeAmount)> = rewarded
            .iter()
            .map(|record| {
                let weight = validator_weight(record.total_stake, exponent);
                let max_reward = epoch_max_reward(budget, weight, total_weight);
                (record.address, record.total_stake, record.commission_bps, max_reward)
            })
            .collect();

        for (address, total_stake, commission_bps, max_reward) in shares {
            let commission = (u128::from(max_reward) * u128::from(commission_bps)
                / u128::from(BPS_DENOMINATOR)) as StakeAmount;
            let delegator_reward = max_reward - commission;
            self.registry.credit_commission(&address, commission);

            let increment = per_share_increment(delegator_reward, total_stake);
            let cumulative = self.rps.latest_cumulative(&address) + increment;
            self.rps.history_mut(&address).append(RpsSnapshot {
                epoch_num: id,
                timestamp,
                cumulative_rps: cumulative,
            });
        }

        self.epochs.record(epoch);
        self.params.exponent.rotate();
        self.events.push(StakingEvent::NewEpoch {
            epoch_id: id,
            start_block: epoch.start_block,
            end_block: epoch.end_block,
            root: epoch.root,
        });
        self.metrics.inc_epochs_committed();
    }

    // ==================================================================
    // Governance-gated parameter and whitelist administration
    // ==================================================================

    pub fn add_to_whitelist(
        &mut self,
        caller: &AccountId,
        address: AccountId,
    ) -> Result<(), StakingError> {
        if !self.auth.is_governance(caller) {
            return Err(StakingError::Unauthorized);
        }
        self.registry.add_to_whitelist(address);
        Ok(())
    }

    pub fn remove_from_whitelist(
        &mut self,
        caller: &AccountId,
        address: AccountId,
    ) -> Result<(), StakingError> {
        if !self.auth.is_governance(caller) {
            return Err(StakingError::Unauthorized);
        }
        self.registry.remove_from_whitelist(address);
        Ok(())
    }

    /// Stage a voting-power exponent for the next epoch commit.
    pub fn set_pending_exponent(
        &mut self,
        caller: &AccountId,
        value: u32,
    ) -> Result<(), StakingError> {
        if !self.auth.is_governance(caller) {
            return Err(StakingError::Unauthorized);
        }
        if value == 0 || value > 2 {
            return Err(StakingError::InvalidExponent { value });
        }
        self.params.exponent.set_pending(value);
        Ok(())
    }

    // ==================================================================
    // Validator operations
    // ==================================================================

    pub fn register_validator(
        &mut self,
        caller: &AccountId,
        bls_key_ref: BlsKeyRef,
        commission_bps: BasisPoints,
    ) -> Result<(), StakingError> {
        self.registry.register(*caller, bls_key_ref, commission_bps)
    }

    /// Bond more self-stake. Every call must leave the bond at or above the
    /// protocol minimum.
    pub fn stake(&mut self, caller: &AccountId, amount: StakeAmount) -> Result<(), StakingError> {
        let record = self.registry.get(caller).ok_or(StakingError::ValidatorNotFound)?;
        let resulting = record.self_stake + amount;
        if resulting < self.params.min_validator_stake {
            return Err(StakingError::StakeTooLow {
                amount: resulting,
                min: self.params.min_validator_stake,
            });
        }
        self.registry.stake(caller, amount)?;
        self.token.mint(caller, amount)?;
        self.events.push(StakingEvent::Staked {
            validator: *caller,
            amount,
        });
        Ok(())
    }

    /// Unbond self-stake into the withdrawal queue. Dropping below the
    /// minimum deactivates the validator.
    pub fn unstake(&mut self, caller: &AccountId, amount: StakeAmount) -> Result<(), StakingError> {
        self.registry.unstake(caller, amount)?;
        self.token.burn(caller, amount)?;
        self.events.push(StakingEvent::Unstaked {
            validator: *caller,
            amount,
        });
        self.register_withdrawal(caller, amount);
        Ok(())
    }

    pub fn set_commission(
        &mut self,
        caller: &AccountId,
        bps: BasisPoints,
    ) -> Result<(), StakingError> {
        self.registry.set_commission(caller, bps)
    }

    /// Move the accumulated commission balance into the withdrawal queue.
    pub fn claim_validator_reward(
        &mut self,
        caller: &AccountId,
    ) -> Result<StakeAmount, StakingError> {
        let amount = self.registry.take_commission_balance(caller)?;
        if amount > 0 {
            self.register_withdrawal(caller, amount);
            self.events.push(StakingEvent::ValidatorRewardClaimed {
                validator: *caller,
                amount,
            });
        }
        Ok(amount)
    }

    // ==================================================================
    // Plain delegation
    // ==================================================================

    pub fn delegate(
        &mut self,
        caller: &AccountId,
        validator: &AccountId,
        amount: StakeAmount,
    ) -> Result<(), StakingError> {
        if self.registry.get(validator).is_none() {
            return Err(StakingError::ValidatorNotFound);
        }
        let balance = self.delegations.balance_of(caller, validator);
        if balance + amount < self.params.min_delegation {
            return Err(StakingError::DelegationTooLow {
                amount: balance + amount,
                min: self.params.min_delegation,
            });
        }
        let latest = self.rps.latest_cumulative(validator);
        let account = self.delegations.get_or_default(caller, validator);
        account.settle(latest);
        account.balance += amount;
        self.registry.delegation_increase(validator, amount)?;
        self.token.mint(caller, amount)?;
        self.events.push(StakingEvent::Delegated {
            account: *caller,
            validator: *validator,
            amount,
        });
        Ok(())
    }

    pub fn undelegate(
        &mut self,
        caller: &AccountId,
        validator: &AccountId,
        amount: StakeAmount,
    ) -> Result<(), StakingError> {
        let balance = self.delegations.balance_of(caller, validator);
        if balance < amount {
            return Err(StakingError::InsufficientBalance {
                balance,
                requested: amount,
            });
        }
        let remainder = balance - amount;
        if remainder != 0 && remainder < self.params.min_delegation {
            return Err(StakingError::DelegationTooLow {
                amount: remainder,
                min: self.params.min_delegation,
            });
        }
        let latest = self.rps.latest_cumulative(validator);
        let account = self.delegations.get_or_default(caller, validator);
        account.settle(latest);
        account.balance = remainder;
        self.registry.delegation_decrease(validator, amount)?;
        self.token.burn(caller, amount)?;
        self.events.push(StakingEvent::Undelegated {
            account: *caller,
            validator: *validator,
            amount,
        });
        self.register_withdrawal(caller, amount);
        Ok(())
    }

    /// Claim the raw reward of a plain delegation at the base APR.
    pub fn claim_delegator_reward(
        &mut self,
        caller: &AccountId,
        validator: &AccountId,
    ) -> Result<StakeAmount, StakingError> {
        let latest = self.rps.latest_cumulative(validator);
        let epochs_per_year = self.params.epochs_per_year;
        let base = self.params.base_apr_bps;
        let account = self.delegations.get_or_default(caller, validator);
        account.settle(latest);
        let raw = account.pending_raw;
        account.pending_raw = 0;

        let delivered = annualized_reward(raw, u64::from(base), u64::from(NEUTRAL_RSI_BPS), epochs_per_year);
        self.finish_reward_claim(caller, validator, raw, delivered);
        Ok(delivered)
    }

    // ==================================================================
    // Vesting positions
    // ==================================================================

    /// Record the single position-manager handle an owner may hold.
    pub fn create_position_manager(
        &mut self,
        owner: AccountId,
        manager: AccountId,
    ) -> Result<(), StakingError> {
        self.vesting.create_manager(owner, manager)
    }

    pub fn open_vested_position(
        &mut self,
        caller: &AccountId,
        validator: &AccountId,
        duration_weeks: u64,
        amount: StakeAmount,
        now: Timestamp,
    ) -> Result<(), StakingError> {
        if !self.vesting.is_manager(caller) {
            return Err(StakingError::NotManager);
        }
        if self.registry.get(validator).is_none() {
            return Err(StakingError::ValidatorNotFound);
        }
        if duration_weeks == 0 || duration_weeks > MAX_VESTING_WEEKS {
            return Err(StakingError::InvalidDuration {
                weeks: duration_weeks,
            });
        }
        if amount < self.params.min_delegation {
            return Err(StakingError::DelegationTooLow {
                amount,
                min: self.params.min_delegation,
            });
        }

        let latest = self.rps.latest_cumulative(validator);
        if let Some(existing) = self.vesting.get(caller, validator) {
            match existing.position.phase(now) {
                PositionPhase::Active => return Err(StakingError::PositionActive),
                PositionPhase::Maturing => return Err(StakingError::PositionMaturing),
                PositionPhase::Matured | PositionPhase::Closed => {
                    if existing.account.has_outstanding(latest) {
                        return Err(StakingError::RewardsNotClaimed);
                    }
                }
            }
        }

        let current_epoch = self.epochs.current_epoch_id();
        let base_bps = self.params.base_apr_bps;
        let rsi_bps = self.params.rsi_bps;
        let duration = duration_weeks * WEEK;

        let delegation = self.vesting.get_or_default(caller, validator);
        // A matured remainder folds into the new position's opening balance.
        delegation.account.balance += amount;
        delegation.account.rps_baseline = latest;
        delegation.account.pending_raw = 0;
        delegation.account.consumed_top_up = None;
        delegation.position = VestingPosition {
            start: now,
            end: now + duration,
            duration,
            base_bps,
            vest_bonus_bps: vesting_bonus_bps(duration_weeks),
            rsi_bonus_bps: rsi_bps,
            delegated_amount: delegation.account.balance,
        };
        delegation.top_ups = vec![TopUpRecord {
            epoch_num: current_epoch,
            balance_after: delegation.account.balance,
        }];

        self.registry.delegation_increase(validator, amount)?;
        self.token.mint(caller, amount)?;
        self.events.push(StakingEvent::PositionOpened {
            manager: *caller,
            validator: *validator,
            duration_weeks,
            amount,
        });
        self.events.push(StakingEvent::Delegated {
            account: *caller,
            validator: *validator,
            amount,
        });
        self.metrics.inc_positions_opened();
        Ok(())
    }

    pub fn top_up_position(
        &mut self,
        caller: &AccountId,
        validator: &AccountId,
        amount: StakeAmount,
        now: Timestamp,
    ) -> Result<(), StakingError> {
        if !self.vesting.is_manager(caller) {
            return Err(StakingError::NotManager);
        }
        if amount < self.params.min_delegation {
            return Err(StakingError::DelegationTooLow {
                amount,
                min: self.params.min_delegation,
            });
        }
        let latest = self.rps.latest_cumulative(validator);
        let current_epoch = self.epochs.current_epoch_id();

        let delegation = self
            .vesting
            .get_mut(caller, validator)
            .ok_or(StakingError::PositionNotActive)?;
        if delegation.position.phase(now) != PositionPhase::Active {
            return Err(StakingError::PositionNotActive);
        }
        if delegation.top_ups.len() >= MAX_TOP_UPS {
            return Err(StakingError::TooManyTopUps);
        }
        if let Some(last) = delegation.top_ups.last() {
            if last.epoch_num == current_epoch {
                return Err(StakingError::BalanceChangeAlreadyMade);
            }
        }

        delegation.account.settle(latest);
        let new_balance = delegation.account.balance + amount;
        delegation.account.balance = new_balance;

        // Extension proportional to the added share, never past 2x the
        // original duration from the start.
        let position = &mut delegation.position;
        let extension = top_up_time_extension(position.duration, amount, new_balance);
        let capped_end = position.start + 2 * position.duration;
        position.end = (position.end + extension).min(capped_end);
        position.vest_bonus_bps = vesting_bonus_bps((position.end - position.start) / WEEK);
        position.delegated_amount = new_balance;

        delegation.top_ups.push(TopUpRecord {
            epoch_num: current_epoch,
            balance_after: new_balance,
        });

        self.registry.delegation_increase(validator, amount)?;
        self.token.mint(caller, amount)?;
        self.events.push(StakingEvent::PositionToppedUp {
            manager: *caller,
            validator: *validator,
            amount,
        });
        self.events.push(StakingEvent::Delegated {
            account: *caller,
            validator: *validator,
            amount,
        });
        Ok(())
    }

    /// Claim the reward of a vesting position.
    ///
    /// `rps_index` must bracket the position's maturity cutoff in the
    /// validator's snapshot history; `top_up_index` must be the newest
    /// record at or before that snapshot's epoch. Reward up to the cutoff is
    /// delivered under the vesting multipliers (split between the original
    /// lock and topped-up balance); reward past full maturity is delivered
    /// at the base APR alone. The remainder of the raw reward is burned.
    pub fn claim_position_reward(
        &mut self,
        caller: &AccountId,
        validator: &AccountId,
        rps_index: usize,
        top_up_index: usize,
        now: Timestamp,
    ) -> Result<StakeAmount, StakingError> {
        if !self.vesting.is_manager(caller) {
            return Err(StakingError::NotManager);
        }
        let latest = self.rps.latest_cumulative(validator);
        let epochs_per_year = self.params.epochs_per_year;
        let default_rsi = self.params.default_rsi_bps;

        let delegation = self
            .vesting
            .get_mut(caller, validator)
            .ok_or(StakingError::NoRewardsToClaim)?;
        let position = delegation.position;
        let phase = position.phase(now);

        // A closed position can only hold settled raw reward; deliver it at
        // the base APR so a new position can open.
        if phase == PositionPhase::Closed {
            let raw = delegation.account.pending_raw;
            delegation.account.pending_raw = 0;
            delegation.account.rps_baseline = latest;
            let delivered = annualized_reward(
                raw,
                u64::from(self.params.base_apr_bps),
                u64::from(NEUTRAL_RSI_BPS),
                epochs_per_year,
            );
            self.finish_reward_claim(caller, validator, raw, delivered);
            return Ok(delivered);
        }
        if phase == PositionPhase::Active {
            return Err(StakingError::NoRewardsToClaim);
        }

        // Maturity cutoff: rewards settle gradually through the maturing
        // window and are fully settled at `end` once matured.
        let cutoff = match phase {
            PositionPhase::Matured => position.end,
            _ => position.start + (now - position.end),
        };

        let history = self
            .rps
            .history(validator)
            .ok_or(StakingError::InvalidIndex {
                index: rps_index,
                len: 0,
            })?;
        let snapshot = *history.validate_index(rps_index, cutoff)?;
        validate_top_up_index(
            &delegation.top_ups,
            top_up_index,
            snapshot.epoch_num,
            delegation.account.consumed_top_up,
        )?;

        let account = &mut delegation.account;
        let bracket_raw = if snapshot.cumulative_rps > account.rps_baseline {
            raw_reward(snapshot.cumulative_rps - account.rps_baseline, account.balance)
        } else {
            0
        };
        let bonus_raw = account.pending_raw + bracket_raw;
        let boundary = snapshot.cumulative_rps.max(account.rps_baseline);

        let delivered_bonus = deliver_bonus_reward(
            bonus_raw,
            &delegation.top_ups,
            top_up_index,
            position.base_bps,
            position.vest_bonus_bps,
            position.rsi_bonus_bps,
            default_rsi,
            epochs_per_year,
        );

        // Accrual past the cutoff exists only once the position matured;
        // it earns the base APR with no bonus and no stability index.
        let (base_raw, delivered_base) = if phase == PositionPhase::Matured && latest > boundary {
            let raw = raw_reward(latest - boundary, account.balance);
            (
                raw,
                annualized_reward(
                    raw,
                    u64::from(position.base_bps),
                    u64::from(NEUTRAL_RSI_BPS),
                    epochs_per_year,
                ),
            )
        } else {
            (0, 0)
        };

        account.pending_raw = 0;
        account.rps_baseline = if phase == PositionPhase::Matured {
            latest.max(boundary)
        } else {
            boundary
        };
        account.consumed_top_up = Some(top_up_index);

        let delivered = delivered_bonus + delivered_base;
        self.finish_reward_claim(caller, validator, bonus_raw + base_raw, delivered);
        Ok(delivered)
    }

    /// Cut `amount` out of a vesting position.
    ///
    /// While the position is active this burns the early-exit penalty and
    /// forfeits unclaimed raw reward; afterwards the full amount is queued
    /// and the reward stays claimable. Cutting the whole balance closes the
    /// position.
    pub fn cut_position(
        &mut self,
        caller: &AccountId,
        validator: &AccountId,
        amount: StakeAmount,
        now: Timestamp,
    ) -> Result<(), StakingError> {
        if !self.vesting.is_manager(caller) {
            return Err(StakingError::NotManager);
        }
        let latest = self.rps.latest_cumulative(validator);
        let min_delegation = self.params.min_delegation;

        let delegation = self
            .vesting
            .get_mut(caller, validator)
            .ok_or(StakingError::InsufficientBalance {
                balance: 0,
                requested: amount,
            })?;
        let balance = delegation.account.balance;
        if balance < amount || delegation.position.is_closed() {
            return Err(StakingError::InsufficientBalance {
                balance: if delegation.position.is_closed() { 0 } else { balance },
                requested: amount,
            });
        }
        let remainder = balance - amount;
        if remainder != 0 && remainder < min_delegation {
            return Err(StakingError::DelegationTooLow {
                amount: remainder,
                min: min_delegation,
            });
        }

        delegation.account.settle(latest);
        let penalty = if delegation.position.is_active(now) {
            // Early exit: forfeit unclaimed raw reward and burn the penalty.
            delegation.account.pending_raw = 0;
            early_exit_penalty(delegation.position.end, now, amount)
        } else {
            0
        };

        delegation.account.balance = remainder;
        delegation.position.delegated_amount = remainder;
        let closed = remainder == 0;
        if closed {
            delegation.position.close();
            delegation.top_ups.clear();
            delegation.account.consumed_top_up = None;
        }

        self.registry.delegation_decrease(validator, amount)?;
        self.token.burn(caller, amount)?;
        if penalty > 0 {
            self.metrics.add_penalty_burned(penalty);
        }
        self.events.push(StakingEvent::Undelegated {
            account: *caller,
            validator: *validator,
            amount,
        });
        self.events.push(StakingEvent::PositionCut {
            manager: *caller,
            validator: *validator,
            amount,
            penalty,
        });
        self.register_withdrawal(caller, amount - penalty);
        if closed {
            self.events.push(StakingEvent::PositionClosed {
                manager: *caller,
                validator: *validator,
            });
            self.metrics.inc_positions_closed();
        }
        Ok(())
    }

    // ==================================================================
    // Withdrawals
    // ==================================================================

    /// Pay out every matured withdrawal entry for the caller.
    pub fn withdraw(&mut self, caller: &AccountId) -> Result<StakeAmount, StakingError> {
        let paid = self
            .withdrawals
            .withdraw(caller, self.epochs.current_epoch_id())?;
        self.events.push(StakingEvent::WithdrawalFinished {
            account: *caller,
            amount: paid,
        });
        Ok(paid)
    }

    // ==================================================================
    // Queryable state
    // ==================================================================

    pub fn current_epoch_id(&self) -> EpochNumber {
        self.epochs.current_epoch_id()
    }

    pub fn epoch(&self, id: EpochNumber) -> Option<&Epoch> {
        self.epochs.get(id)
    }

    pub fn get_validator(&self, address: &AccountId) -> Option<&ValidatorRecord> {
        self.registry.get(address)
    }

    pub fn active_validator_set(&self) -> &[AccountId] {
        self.registry.active_set()
    }

    /// Plain delegation balance of `delegator` towards `validator`.
    pub fn delegation_of(&self, delegator: &AccountId, validator: &AccountId) -> StakeAmount {
        self.delegations.balance_of(delegator, validator)
    }

    /// Vested balance of `manager`'s position with `validator`.
    pub fn vested_balance_of(&self, manager: &AccountId, validator: &AccountId) -> StakeAmount {
        self.vesting
            .get(manager, validator)
            .map(|d| d.account.balance)
            .unwrap_or(0)
    }

    pub fn position_of(
        &self,
        manager: &AccountId,
        validator: &AccountId,
    ) -> Option<&VestingPosition> {
        self.vesting.get(manager, validator).map(|d| &d.position)
    }

    pub fn top_ups_of(&self, manager: &AccountId, validator: &AccountId) -> &[TopUpRecord] {
        self.vesting
            .get(manager, validator)
            .map(|d| d.top_ups.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_active_position(
        &self,
        manager: &AccountId,
        validator: &AccountId,
        now: Timestamp,
    ) -> bool {
        self.vesting
            .get(manager, validator)
            .map(|d| d.position.is_active(now))
            .unwrap_or(false)
    }

    /// Snapshot range for off-chain claim-index discovery.
    pub fn rps_values(
        &self,
        validator: &AccountId,
        from_epoch: EpochNumber,
        to_epoch: EpochNumber,
    ) -> &[RpsSnapshot] {
        self.rps
            .history(validator)
            .map(|h| h.range(from_epoch, to_epoch))
            .unwrap_or(&[])
    }

    /// Off-path binary-search helper for clients building a claim: the
    /// snapshot index bracketing `target`, if one exists.
    pub fn find_rps_index_at(&self, validator: &AccountId, target: Timestamp) -> Option<usize> {
        self.rps.history(validator)?.find_at_timestamp(target)
    }

    /// Epoch-keyed snapshot lookup: the index of the snapshot with the
    /// largest epoch not after `epoch`. Fails for epochs beyond the history.
    pub fn find_rps_index_at_epoch(
        &self,
        validator: &AccountId,
        epoch: EpochNumber,
    ) -> Result<usize, StakingError> {
        self.rps
            .history(validator)
            .ok_or(StakingError::InvalidEpoch { requested: epoch })?
            .find_at_epoch(epoch)
    }

    pub fn withdrawable(&self, account: &AccountId) -> StakeAmount {
        self.withdrawals
            .withdrawable(account, self.epochs.current_epoch_id())
    }

    pub fn pending_withdrawals(&self, account: &AccountId) -> StakeAmount {
        self.withdrawals
            .pending(account, self.epochs.current_epoch_id())
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn metrics(&self) -> &StakingMetrics {
        &self.metrics
    }

    pub fn token(&self) -> &T {
        &self.token
    }

    pub fn params(&self) -> &ProtocolParams {
        &self.params
    }

    /// Total stake delegated towards `validator` across plain and vested
    /// delegations; the registry's `total_stake - self_stake` must always
    /// equal this.
    pub fn delegated_towards(&self, validator: &AccountId) -> u128 {
        self.delegations.delegated_towards(validator) + self.vesting.delegated_towards(validator)
    }

    // ==================================================================
    // Internal helpers
    // ==================================================================

    fn register_withdrawal(&mut self, account: &AccountId, amount: StakeAmount) {
        let available_after = self.epochs.current_epoch_id() + self.params.withdrawal_wait_epochs;
        self.withdrawals.register(account, amount, available_after);
        self.events.push(StakingEvent::WithdrawalRegistered {
            account: *account,
            amount,
        });
    }

    /// Shared bookkeeping for every reward claim: queue the delivered
    /// amount, burn the excess, emit the event.
    fn finish_reward_claim(
        &mut self,
        account: &AccountId,
        validator: &AccountId,
        raw: StakeAmount,
        delivered: StakeAmount,
    ) {
        if delivered > 0 {
            self.register_withdrawal(account, delivered);
        }
        self.metrics.add_reward_delivered(delivered);
        self.metrics.add_reward_burned(raw - delivered);
        self.events.push(StakingEvent::DelegatorRewardClaimed {
            account: *account,
            validator: *validator,
            amount: delivered,
        });
    }
}
