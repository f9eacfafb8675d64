//! Epoch commit and reward distribution tests.
//!
//! Covered scenarios:
//!
//! A) Commit sequencing: authorization, id gating, block-range geometry
//! B) Reward distribution: budget split, commission, RPS snapshots
//! C) Two-phase voting-power exponent rotation
//! D) Withdrawal maturity after unstake
//! E) Parameter serialization round-trip

use delos_ledger::{InMemoryStakeToken, StakeTokenLedger, StaticAuthorizationGate};
use delos_staking::{
    AcceptAllOracle, Epoch, ProtocolParams, StakingEngine, StakingError, StakingEvent,
};
use delos_types::{AccountId, EpochNumber, Timestamp, RPS_SCALE};

// ============================================================================
// Test helpers
// ============================================================================

const GOVERNOR: AccountId = [0xEE; 32];

fn addr(idx: u8) -> AccountId {
    let mut id = [0u8; 32];
    id[0] = idx;
    id
}

fn test_params() -> ProtocolParams {
    let mut params = ProtocolParams::devnet();
    params.epoch_size = 64;
    params.epoch_reward_budget = 1_000_000;
    params.min_delegation = 1_000;
    params.min_validator_stake = 10_000;
    params.withdrawal_wait_epochs = 1;
    params.epochs_per_year = 100;
    params
}

type TestEngine = StakingEngine<StaticAuthorizationGate, InMemoryStakeToken, AcceptAllOracle>;

fn engine_with_validators(validators: &[(u8, u64)]) -> TestEngine {
    let params = test_params();
    params.validate().unwrap();
    let mut engine = StakingEngine::new(
        params,
        StaticAuthorizationGate::single(GOVERNOR),
        InMemoryStakeToken::new(),
        AcceptAllOracle,
    );
    for &(idx, stake) in validators {
        engine.add_to_whitelist(&GOVERNOR, addr(idx)).unwrap();
        engine.register_validator(&addr(idx), [idx; 32], 0).unwrap();
        engine.stake(&addr(idx), stake).unwrap();
    }
    engine
}

fn epoch(id: EpochNumber) -> Epoch {
    Epoch {
        id,
        start_block: (id - 1) * 64 + 1,
        end_block: id * 64,
        root: [id as u8; 32],
    }
}

fn commit(engine: &mut TestEngine, id: EpochNumber, timestamp: Timestamp, uptime: &[AccountId]) {
    engine
        .commit_epoch(&GOVERNOR, id, epoch(id), 64, timestamp, uptime)
        .unwrap();
}

// ============================================================================
// A) Commit sequencing
// ============================================================================

#[test]
fn test_a1_commit_requires_the_epoch_committer() {
    let mut engine = engine_with_validators(&[(1, 100_000)]);
    let err = engine
        .commit_epoch(&addr(1), 1, epoch(1), 64, 1_000, &[addr(1)])
        .unwrap_err();
    assert_eq!(err, StakingError::Unauthorized);
}

#[test]
fn test_a2_epoch_size_mismatch_is_rejected() {
    let mut engine = engine_with_validators(&[(1, 100_000)]);

    // 63 blocks against epoch size 64 fails.
    let short = Epoch {
        id: 1,
        start_block: 1,
        end_block: 63,
        root: [1; 32],
    };
    let err = engine
        .commit_epoch(&GOVERNOR, 1, short, 64, 1_000, &[addr(1)])
        .unwrap_err();
    assert!(matches!(err, StakingError::EpochSizeMismatch { .. }));
    assert_eq!(engine.current_epoch_id(), 1);

    // The full 64-block range succeeds and advances the id.
    commit(&mut engine, 1, 1_000, &[addr(1)]);
    assert_eq!(engine.current_epoch_id(), 2);
}

#[test]
fn test_a3_commit_id_and_contiguity_are_gated() {
    let mut engine = engine_with_validators(&[(1, 100_000)]);
    commit(&mut engine, 1, 1_000, &[addr(1)]);

    // Same id again fails: the gate is the monotonic current id.
    let err = engine
        .commit_epoch(&GOVERNOR, 1, epoch(1), 64, 2_000, &[addr(1)])
        .unwrap_err();
    assert!(matches!(err, StakingError::UnexpectedEpochId { .. }));

    // A gap in the block range fails.
    let gapped = Epoch {
        id: 2,
        start_block: 66,
        end_block: 129,
        root: [2; 32],
    };
    let err = engine
        .commit_epoch(&GOVERNOR, 2, gapped, 64, 2_000, &[addr(1)])
        .unwrap_err();
    assert!(matches!(err, StakingError::InvalidStartBlock { .. }));

    // A range that does not advance fails.
    let stale = Epoch {
        id: 2,
        start_block: 1,
        end_block: 64,
        root: [2; 32],
    };
    let err = engine
        .commit_epoch(&GOVERNOR, 2, stale, 64, 2_000, &[addr(1)])
        .unwrap_err();
    assert_eq!(err, StakingError::NoBlocksCommitted);
}

#[test]
fn test_a4_failed_commit_leaves_no_events() {
    let mut engine = engine_with_validators(&[(1, 100_000)]);
    let events_before = engine.events().len();
    let _ = engine.commit_epoch(&GOVERNOR, 5, epoch(5), 64, 1_000, &[addr(1)]);
    assert_eq!(engine.events().len(), events_before);
}

// ============================================================================
// B) Reward distribution
// ============================================================================

#[test]
fn test_b1_sole_validator_receives_the_full_budget() {
    let mut engine = engine_with_validators(&[(1, 100_000)]);
    commit(&mut engine, 1, 1_000, &[addr(1)]);

    // increment = budget * RPS_SCALE / total_stake = 1_000_000e18 / 100_000.
    let snapshots = engine.rps_values(&addr(1), 1, 1);
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].cumulative_rps, 10 * RPS_SCALE);
    assert_eq!(snapshots[0].epoch_num, 1);
    assert_eq!(snapshots[0].timestamp, 1_000);
}

#[test]
fn test_b2_budget_splits_by_stake_weight() {
    // Stakes 300k and 100k at exponent 1: shares 3/4 and 1/4.
    let mut engine = engine_with_validators(&[(1, 300_000), (2, 100_000)]);
    commit(&mut engine, 1, 1_000, &[addr(1), addr(2)]);

    let v1 = engine.rps_values(&addr(1), 1, 1)[0].cumulative_rps;
    let v2 = engine.rps_values(&addr(2), 1, 1)[0].cumulative_rps;
    assert_eq!(v1, 750_000 * RPS_SCALE / 300_000);
    assert_eq!(v2, 250_000 * RPS_SCALE / 100_000);
}

#[test]
fn test_b3_commission_accrues_to_the_validator() {
    let mut engine = engine_with_validators(&[(1, 100_000)]);
    // 10% commission.
    engine.set_commission(&addr(1), 1_000).unwrap();
    commit(&mut engine, 1, 1_000, &[addr(1)]);

    let record = engine.get_validator(&addr(1)).unwrap();
    assert_eq!(record.commission_balance, 100_000);
    // The delegator share shrinks accordingly.
    let cum = engine.rps_values(&addr(1), 1, 1)[0].cumulative_rps;
    assert_eq!(cum, 900_000 * RPS_SCALE / 100_000);

    let claimed = engine.claim_validator_reward(&addr(1)).unwrap();
    assert_eq!(claimed, 100_000);
    assert_eq!(engine.get_validator(&addr(1)).unwrap().commission_balance, 0);
}

#[test]
fn test_b4_validator_without_uptime_gets_no_snapshot() {
    let mut engine = engine_with_validators(&[(1, 100_000), (2, 100_000)]);
    commit(&mut engine, 1, 1_000, &[addr(1)]);

    assert_eq!(engine.rps_values(&addr(1), 1, 1).len(), 1);
    assert!(engine.rps_values(&addr(2), 1, 1).is_empty());
    // The absent validator also does not dilute the budget.
    assert_eq!(
        engine.rps_values(&addr(1), 1, 1)[0].cumulative_rps,
        10 * RPS_SCALE
    );
}

#[test]
fn test_b5_rps_history_is_monotone_over_commits() {
    let mut engine = engine_with_validators(&[(1, 100_000), (2, 300_000)]);
    for id in 1..=8u64 {
        commit(&mut engine, id, id * 1_000, &[addr(1), addr(2)]);
    }
    for validator in [addr(1), addr(2)] {
        let snapshots = engine.rps_values(&validator, 1, 8);
        assert_eq!(snapshots.len(), 8);
        for pair in snapshots.windows(2) {
            assert!(pair[1].timestamp > pair[0].timestamp);
            assert!(pair[1].cumulative_rps >= pair[0].cumulative_rps);
        }
    }
}

// ============================================================================
// C) Two-phase exponent
// ============================================================================

#[test]
fn test_c1_pending_exponent_applies_from_the_next_commit() {
    let mut engine = engine_with_validators(&[(1, 300_000), (2, 100_000)]);

    // Staged mid-epoch: the commit that is already accruing keeps weight^1.
    engine.set_pending_exponent(&GOVERNOR, 2).unwrap();
    commit(&mut engine, 1, 1_000, &[addr(1), addr(2)]);
    let v2_epoch1 = engine.rps_values(&addr(2), 1, 1)[0].cumulative_rps;
    assert_eq!(v2_epoch1, 250_000 * RPS_SCALE / 100_000);

    // Next commit weights quadratically: 9:1 split.
    commit(&mut engine, 2, 2_000, &[addr(1), addr(2)]);
    let v2_epoch2 = engine.rps_values(&addr(2), 2, 2)[0].cumulative_rps - v2_epoch1;
    assert_eq!(v2_epoch2, 100_000 * RPS_SCALE / 100_000);
}

#[test]
fn test_c2_exponent_bounds_are_enforced() {
    let mut engine = engine_with_validators(&[(1, 100_000)]);
    assert_eq!(
        engine.set_pending_exponent(&GOVERNOR, 0).unwrap_err(),
        StakingError::InvalidExponent { value: 0 }
    );
    assert_eq!(
        engine.set_pending_exponent(&GOVERNOR, 3).unwrap_err(),
        StakingError::InvalidExponent { value: 3 }
    );
    assert_eq!(
        engine.set_pending_exponent(&addr(1), 2).unwrap_err(),
        StakingError::Unauthorized
    );
}

// ============================================================================
// D) Withdrawals
// ============================================================================

#[test]
fn test_d1_unstake_matures_after_the_wait_period() {
    let mut engine = engine_with_validators(&[(1, 100_000)]);
    engine.unstake(&addr(1), 50_000).unwrap();

    // Registered during epoch 1 with one epoch wait: nothing yet.
    assert_eq!(engine.withdrawable(&addr(1)), 0);
    assert_eq!(engine.pending_withdrawals(&addr(1)), 50_000);
    assert!(engine.withdraw(&addr(1)).is_err());

    commit(&mut engine, 1, 1_000, &[addr(1)]);
    assert_eq!(engine.withdrawable(&addr(1)), 0);
    commit(&mut engine, 2, 2_000, &[addr(1)]);

    assert_eq!(engine.withdrawable(&addr(1)), 50_000);
    assert_eq!(engine.withdraw(&addr(1)).unwrap(), 50_000);
    assert_eq!(engine.withdrawable(&addr(1)), 0);
}

#[test]
fn test_d2_stake_and_unstake_mirror_into_the_token_ledger() {
    let mut engine = engine_with_validators(&[(1, 100_000)]);
    assert_eq!(engine.token().balance_of(&addr(1)), 100_000);
    engine.unstake(&addr(1), 30_000).unwrap();
    assert_eq!(engine.token().balance_of(&addr(1)), 70_000);
}

#[test]
fn test_d3_events_follow_operation_order() {
    let mut engine = engine_with_validators(&[(1, 100_000)]);
    let start = engine.events().len();
    engine.unstake(&addr(1), 10_000).unwrap();
    commit(&mut engine, 1, 1_000, &[addr(1)]);

    let events = engine.events().since(start);
    assert!(matches!(events[0], StakingEvent::Unstaked { .. }));
    assert!(matches!(events[1], StakingEvent::WithdrawalRegistered { .. }));
    assert!(matches!(events[2], StakingEvent::NewEpoch { epoch_id: 1, .. }));
}

// ============================================================================
// E) Parameter round-trip
// ============================================================================

#[test]
fn test_e1_params_serialize_round_trip() {
    let params = test_params();
    let json = serde_json::to_string(&params).unwrap();
    let decoded: ProtocolParams = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, params);
}
