//! Double-signer slashing.
//!
//! Evidence of a fork is a set of conflicting signed messages for the same
//! height and round, each tagged with a bitmap over the active validator
//! set. A validator implicated by at least two independent evidence items is
//! slashed a flat percentage of its bond during the epoch commit, before
//! that epoch's rewards are distributed.
//!
//! Signature verification is delegated to an external oracle and treated
//! fail-closed: one rejected item aborts the whole commit.

use sha3::{Digest, Keccak256};

use delos_types::{BlockNumber, ChainId, EpochNumber, Hash32};

use crate::error::StakingError;

/// Minimum independent evidence items implicating a validator for a slash.
pub const MIN_IMPLICATING_EVIDENCE: usize = 2;

/// One item of double-sign evidence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DoubleSignEvidence {
    /// Hash of the conflicting block this item attests to.
    pub block_hash: Hash32,
    /// Aggregated signature over the recomputed message.
    pub signature: Vec<u8>,
    /// Bitmap over the active set: bit `i` set means validator `i` signed.
    /// Bytes beyond the bitmap's length read as unset.
    pub bitmap: Vec<u8>,
}

/// Consensus-side inputs to a slashing commit, relayed by the committer.
#[derive(Clone, Debug)]
pub struct SlashingCommitInput {
    pub block_number: BlockNumber,
    pub pbft_round: u64,
    pub current_validator_set_hash: Hash32,
    pub next_validator_set_hash: Hash32,
    pub evidence: Vec<DoubleSignEvidence>,
}

/// External BLS verification collaborator.
///
/// Fail-closed: a `false` here fails the commit; evidence is never silently
/// skipped.
pub trait SignatureOracle {
    fn verify(&self, message: &Hash32, evidence: &DoubleSignEvidence) -> bool;
}

/// Oracle accepting every signature; test harness use only.
#[derive(Debug, Default)]
pub struct AcceptAllOracle;

impl SignatureOracle for AcceptAllOracle {
    fn verify(&self, _message: &Hash32, _evidence: &DoubleSignEvidence) -> bool {
        true
    }
}

/// Oracle rejecting every signature; test harness use only.
#[derive(Debug, Default)]
pub struct RejectAllOracle;

impl SignatureOracle for RejectAllOracle {
    fn verify(&self, _message: &Hash32, _evidence: &DoubleSignEvidence) -> bool {
        false
    }
}

/// Recompute the message a validator would have signed for one evidence item.
#[allow(clippy::too_many_arguments)]
pub fn signed_message_digest(
    chain_id: ChainId,
    block_number: BlockNumber,
    block_hash: &Hash32,
    pbft_round: u64,
    epoch_id: EpochNumber,
    event_root: &Hash32,
    current_validator_set_hash: &Hash32,
    next_validator_set_hash: &Hash32,
) -> Hash32 {
    let mut hasher = Keccak256::new();
    hasher.update(chain_id.as_u64().to_be_bytes());
    hasher.update(block_number.to_be_bytes());
    hasher.update(block_hash);
    hasher.update(pbft_round.to_be_bytes());
    hasher.update(epoch_id.to_be_bytes());
    hasher.update(event_root);
    hasher.update(current_validator_set_hash);
    hasher.update(next_validator_set_hash);
    hasher.finalize().into()
}

/// Read bit `index` of a bitmap; bytes past the end read as unset.
pub fn bitmap_bit(bitmap: &[u8], index: usize) -> bool {
    match bitmap.get(index / 8) {
        Some(byte) => byte & (1 << (index % 8)) != 0,
        None => false,
    }
}

/// Fail if any two evidence items share a block hash: identical hashes are
/// not evidence of a fork.
pub fn check_unique_block_hashes(evidence: &[DoubleSignEvidence]) -> Result<(), StakingError> {
    for (i, a) in evidence.iter().enumerate() {
        for b in &evidence[i + 1..] {
            if a.block_hash == b.block_hash {
                return Err(StakingError::BlockhashNotUnique);
            }
        }
    }
    Ok(())
}

/// For each active-set index, whether at least
/// [`MIN_IMPLICATING_EVIDENCE`] items have its bit set.
pub fn implicated_validators(active_len: usize, evidence: &[DoubleSignEvidence]) -> Vec<bool> {
    (0..active_len)
        .map(|i| {
            let count = evidence.iter().filter(|e| bitmap_bit(&e.bitmap, i)).count();
            count >= MIN_IMPLICATING_EVIDENCE
        })
        .collect()
}
