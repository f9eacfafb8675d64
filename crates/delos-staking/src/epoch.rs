//! Committed-epoch ledger.
//!
//! Stores the immutable record of every committed epoch and the monotonic
//! current epoch id. Commit validation is all-or-nothing: the epoch is only
//! stored after every sequencing and geometry check passes.

use std::collections::BTreeMap;

use delos_types::{BlockNumber, EpochNumber, Hash32};

use crate::error::StakingError;

/// One committed epoch: a closed block range and its event root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Epoch {
    pub id: EpochNumber,
    pub start_block: BlockNumber,
    pub end_block: BlockNumber,
    pub root: Hash32,
}

/// The epoch history plus the commit sequencing gate.
///
/// `current_epoch_id` starts at 1; the genesis pseudo-epoch 0 ends at block
/// 0, so the first commit must start at block 1.
#[derive(Debug)]
pub struct EpochLedger {
    epochs: BTreeMap<EpochNumber, Epoch>,
    current_epoch_id: EpochNumber,
}

impl Default for EpochLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl EpochLedger {
    pub fn new() -> Self {
        let mut epochs = BTreeMap::new();
        epochs.insert(
            0,
            Epoch {
                id: 0,
                start_block: 0,
                end_block: 0,
                root: [0u8; 32],
            },
        );
        EpochLedger {
            epochs,
            current_epoch_id: 1,
        }
    }

    pub fn current_epoch_id(&self) -> EpochNumber {
        self.current_epoch_id
    }

    pub fn get(&self, id: EpochNumber) -> Option<&Epoch> {
        self.epochs.get(&id)
    }

    /// The most recently committed epoch (genesis pseudo-epoch if none).
    pub fn latest(&self) -> &Epoch {
        self.epochs
            .values()
            .next_back()
            .expect("ledger always holds the genesis epoch")
    }

    /// Run every commit precondition without mutating anything.
    pub fn validate_commit(
        &self,
        id: EpochNumber,
        epoch: &Epoch,
        epoch_size: u64,
    ) -> Result<(), StakingError> {
        if id != self.current_epoch_id {
            return Err(StakingError::UnexpectedEpochId {
                expected: self.current_epoch_id,
                got: id,
            });
        }
        let previous = self.latest();
        if epoch.end_block <= previous.end_block {
            return Err(StakingError::NoBlocksCommitted);
        }
        let span = epoch.end_block - epoch.start_block + 1;
        if span % epoch_size != 0 {
            return Err(StakingError::EpochSizeMismatch {
                start_block: epoch.start_block,
                end_block: epoch.end_block,
                epoch_size,
            });
        }
        if epoch.start_block != previous.end_block + 1 {
            return Err(StakingError::InvalidStartBlock {
                expected: previous.end_block + 1,
                got: epoch.start_block,
            });
        }
        Ok(())
    }

    /// Store a validated epoch and advance the sequencing gate.
    ///
    /// Callers must have run [`validate_commit`](Self::validate_commit)
    /// first; this method only asserts the id to catch misuse.
    pub fn record(&mut self, epoch: Epoch) {
        debug_assert_eq!(epoch.id, self.current_epoch_id);
        self.epochs.insert(epoch.id, epoch);
        self.current_epoch_id += 1;
    }
}
