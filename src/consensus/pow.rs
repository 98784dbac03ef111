//! Proof-of-work check

use crate::consensus::events::{DifficultyEvent, EventSink};
use crate::consensus::DifficultyEngine;
use crate::core::constants::TARGET_SIZE;
use crate::core::{CompactTarget, U256};
use crate::error::{Error, Result};

impl<S: EventSink> DifficultyEngine<S> {
    /// Check that `hash` meets the target claimed by `bits`.
    ///
    /// Fails with [`Error::InvalidTarget`] when the claimed target is
    /// negative, zero, overflowing or easier than the proof-of-work limit,
    /// and with [`Error::InsufficientWork`] when `hash > target`. What a
    /// failure means for the block is up to the caller.
    pub fn check_proof_of_work(&self, hash: &U256, bits: CompactTarget) -> Result<()> {
        let decoded = bits.decode();

        if let Some(reason) = decoded.rejection(&self.params.pow_limit) {
            self.emit(DifficultyEvent::ProofOfWorkRejected {
                bits,
                reason: Some(reason),
            });
            return Err(Error::invalid_target(bits, reason));
        }

        if *hash > decoded.target {
            self.emit(DifficultyEvent::ProofOfWorkRejected { bits, reason: None });
            return Err(Error::InsufficientWork {
                hash: *hash,
                target: decoded.target,
            });
        }

        Ok(())
    }

    /// Like [`Self::check_proof_of_work`] for a hash in its little-endian byte order
    pub fn check_proof_of_work_bytes(
        &self,
        hash: [u8; TARGET_SIZE],
        bits: CompactTarget,
    ) -> Result<()> {
        self.check_proof_of_work(&U256::from_little_endian(&hash), bits)
    }
}
