//! Double-signer slashing commit tests.
//!
//! Covered scenarios:
//!
//! A) Evidence shape: item count, uptime length, block-hash uniqueness
//! B) Fail-closed signature verification
//! C) Slash application: flat 10%, ≥2 evidence threshold, short bitmaps
//! D) Interleaving with reward distribution and sequencing checks

use delos_ledger::{InMemoryStakeToken, StakeTokenLedger, StaticAuthorizationGate};
use delos_staking::{
    AcceptAllOracle, DoubleSignEvidence, Epoch, ProtocolParams, RejectAllOracle,
    SlashingCommitInput, StakingEngine, StakingError,
};
use delos_types::{AccountId, EpochNumber, RPS_SCALE};

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
    params.epochs_per_year = 100;
    params
}

fn engine_with_oracle<O: delos_staking::SignatureOracle>(
    oracle: O,
) -> StakingEngine<StaticAuthorizationGate, InMemoryStakeToken, O> {
    let params = test_params();
    params.validate().unwrap();
    let mut engine = StakingEngine::new(
        params,
        StaticAuthorizationGate::single(GOVERNOR),
        InMemoryStakeToken::new(),
        oracle,
    );
    // Three equal validators; equal stakes order the active set by address.
    for idx in 1..=3u8 {
        engine.add_to_whitelist(&GOVERNOR, addr(idx)).unwrap();
        engine.register_validator(&addr(idx), [idx; 32], 0).unwrap();
        engine.stake(&addr(idx), 100_000).unwrap();
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

fn evidence(hash_byte: u8, bitmap: Vec<u8>) -> DoubleSignEvidence {
    DoubleSignEvidence {
        block_hash: [hash_byte; 32],
        signature: vec![0x01; 48],
        bitmap,
    }
}

fn input(evidence_items: Vec<DoubleSignEvidence>) -> SlashingCommitInput {
    SlashingCommitInput {
        block_number: 40,
        pbft_round: 2,
        current_validator_set_hash: [0xC0; 32],
        next_validator_set_hash: [0xC1; 32],
        evidence: evidence_items,
    }
}

fn uptime_all() -> Vec<AccountId> {
    vec![addr(1), addr(2), addr(3)]
}

// ============================================================================
// A) Evidence shape
// ============================================================================

#[test]
fn test_a1_fewer_than_two_items_is_invalid() {
    let mut engine = engine_with_oracle(AcceptAllOracle);
    let err = engine
        .commit_epoch_with_double_signer_slashing(
            &GOVERNOR,
            1,
            epoch(1),
            64,
            1_000,
            &uptime_all(),
            &input(vec![evidence(1, vec![0b11])]),
        )
        .unwrap_err();
    assert_eq!(err, StakingError::InvalidLength);
}

#[test]
fn test_a2_uptime_must_cover_the_active_set() {
    let mut engine = engine_with_oracle(AcceptAllOracle);
    let err = engine
        .commit_epoch_with_double_signer_slashing(
            &GOVERNOR,
            1,
            epoch(1),
            64,
            1_000,
            &[addr(1), addr(2)],
            &input(vec![evidence(1, vec![0b01]), evidence(2, vec![0b01])]),
        )
        .unwrap_err();
    assert_eq!(err, StakingError::InvalidLength);
}

#[test]
fn test_a3_identical_block_hashes_fail_the_whole_commit() {
    let mut engine = engine_with_oracle(AcceptAllOracle);
    let err = engine
        .commit_epoch_with_double_signer_slashing(
            &GOVERNOR,
            1,
            epoch(1),
            64,
            1_000,
            &uptime_all(),
            &input(vec![evidence(1, vec![0b01]), evidence(1, vec![0b01])]),
        )
        .unwrap_err();
    assert_eq!(err, StakingError::BlockhashNotUnique);

    // Nothing was slashed and the epoch did not advance.
    assert_eq!(engine.get_validator(&addr(1)).unwrap().self_stake, 100_000);
    assert_eq!(engine.current_epoch_id(), 1);
}

// ============================================================================
// B) Fail-closed verification
// ============================================================================

#[test]
fn test_b1_rejected_signature_aborts_without_state_change() {
    let mut engine = engine_with_oracle(RejectAllOracle);
    let err = engine
        .commit_epoch_with_double_signer_slashing(
            &GOVERNOR,
            1,
            epoch(1),
            64,
            1_000,
            &uptime_all(),
            &input(vec![evidence(1, vec![0b01]), evidence(2, vec![0b01])]),
        )
        .unwrap_err();
    assert_eq!(err, StakingError::SignatureVerificationFailed);

    assert_eq!(engine.current_epoch_id(), 1);
    for idx in 1..=3u8 {
        assert_eq!(engine.get_validator(&addr(idx)).unwrap().self_stake, 100_000);
    }
    assert_eq!(engine.metrics().validators_slashed_total(), 0);
}

// ============================================================================
// C) Slash application
// ============================================================================

#[test]
fn test_c1_two_bitmap_hits_slash_exactly_ten_percent() {
    let mut engine = engine_with_oracle(AcceptAllOracle);
    // Validator index 0 (addr 1) is tagged by both items; index 1 by one.
    engine
        .commit_epoch_with_double_signer_slashing(
            &GOVERNOR,
            1,
            epoch(1),
            64,
            1_000,
            &uptime_all(),
            &input(vec![evidence(1, vec![0b0000_0011]), evidence(2, vec![0b0000_0001])]),
        )
        .unwrap();

    assert_eq!(engine.get_validator(&addr(1)).unwrap().self_stake, 90_000);
    assert_eq!(engine.get_validator(&addr(2)).unwrap().self_stake, 100_000);
    assert_eq!(engine.get_validator(&addr(3)).unwrap().self_stake, 100_000);
    assert_eq!(engine.metrics().validators_slashed_total(), 1);
    assert_eq!(engine.metrics().stake_slashed_total(), 10_000);
    // The burn is mirrored into the token ledger.
    assert_eq!(engine.token().balance_of(&addr(1)), 90_000);
}

#[test]
fn test_c2_short_bitmaps_never_implicate_or_error() {
    let mut engine = engine_with_oracle(AcceptAllOracle);
    // Empty bitmaps cover nobody; the commit itself succeeds.
    engine
        .commit_epoch_with_double_signer_slashing(
            &GOVERNOR,
            1,
            epoch(1),
            64,
            1_000,
            &uptime_all(),
            &input(vec![evidence(1, vec![]), evidence(2, vec![0b01])]),
        )
        .unwrap();

    for idx in 1..=3u8 {
        assert_eq!(engine.get_validator(&addr(idx)).unwrap().self_stake, 100_000);
    }
    assert_eq!(engine.current_epoch_id(), 2);
}

#[test]
fn test_c3_multiple_validators_can_be_slashed_in_one_commit() {
    let mut engine = engine_with_oracle(AcceptAllOracle);
    // Bits 0 and 2 set in both items: addr 1 and addr 3.
    engine
        .commit_epoch_with_double_signer_slashing(
            &GOVERNOR,
            1,
            epoch(1),
            64,
            1_000,
            &uptime_all(),
            &input(vec![evidence(1, vec![0b0000_0101]), evidence(2, vec![0b0000_0101])]),
        )
        .unwrap();

    assert_eq!(engine.get_validator(&addr(1)).unwrap().self_stake, 90_000);
    assert_eq!(engine.get_validator(&addr(2)).unwrap().self_stake, 100_000);
    assert_eq!(engine.get_validator(&addr(3)).unwrap().self_stake, 90_000);
    assert_eq!(engine.metrics().stake_slashed_total(), 20_000);
}

// ============================================================================
// D) Interleaving with distribution and sequencing
// ============================================================================

#[test]
fn test_d1_slash_applies_before_reward_distribution() {
    let mut engine = engine_with_oracle(AcceptAllOracle);
    engine
        .commit_epoch_with_double_signer_slashing(
            &GOVERNOR,
            1,
            epoch(1),
            64,
            1_000,
            &uptime_all(),
            &input(vec![evidence(1, vec![0b01]), evidence(2, vec![0b01])]),
        )
        .unwrap();

    // Post-slash stakes: 90_000 + 100_000 + 100_000 = 290_000. The slashed
    // validator's snapshot is computed on its reduced stake.
    let snapshot = engine.rps_values(&addr(1), 1, 1)[0];
    let expected_reward = 1_000_000u128 * 90_000 / 290_000;
    assert_eq!(
        snapshot.cumulative_rps,
        expected_reward * RPS_SCALE / 90_000
    );
}

#[test]
fn test_d2_sequencing_checks_precede_evidence_checks() {
    let mut engine = engine_with_oracle(AcceptAllOracle);
    // Wrong epoch id with malformed evidence: the sequencing error wins.
    let err = engine
        .commit_epoch_with_double_signer_slashing(
            &GOVERNOR,
            7,
            epoch(7),
            64,
            1_000,
            &uptime_all(),
            &input(vec![evidence(1, vec![0b01])]),
        )
        .unwrap_err();
    assert!(matches!(err, StakingError::UnexpectedEpochId { .. }));
}

#[test]
fn test_d3_unauthorized_committer_is_rejected_first() {
    let mut engine = engine_with_oracle(AcceptAllOracle);
    let err = engine
        .commit_epoch_with_double_signer_slashing(
            &addr(1),
            1,
            epoch(1),
            64,
            1_000,
            &uptime_all(),
            &input(vec![evidence(1, vec![0b01]), evidence(2, vec![0b01])]),
        )
        .unwrap_err();
    assert_eq!(err, StakingError::Unauthorized);
}
