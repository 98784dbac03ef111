//! Chain work and equivalent time

use crate::consensus::chain::BlockView;
use crate::consensus::events::{DifficultyEvent, EventSink};
use crate::consensus::DifficultyEngine;
use crate::core::{ChainWork, CompactTarget, TargetRejection, U256};
use crate::error::{Error, Result};

/// Expected number of hashes needed to meet `bits`.
///
/// This is `2^256 / (target + 1)`, computed as `!target / (target + 1) + 1`
/// so that 2^256 never has to be represented. Negative, overflowing and zero
/// targets yield zero work.
///
/// A zero result adds nothing to an accumulated chain work total, which
/// understates the work of a chain carrying such a header instead of
/// flagging it; callers that accumulate work should validate `bits` first.
pub fn block_proof(bits: CompactTarget) -> ChainWork {
    let decoded = bits.decode();
    if decoded.negative || decoded.overflow || decoded.target.is_zero() {
        return U256::zero();
    }

    // A non-overflowing compact target is at most 0xff * 2^248, so `target + 1`
    // neither wraps nor is zero, and the quotient is below 2^255
    let target = decoded.target;
    !target / (target + U256::one()) + U256::one()
}

impl<S: EventSink> DifficultyEngine<S> {
    /// Seconds it would take, at the tip's difficulty and the target spacing,
    /// to produce the work between `from` and `to`.
    ///
    /// Negative when `to` has less work than `from`. Estimates that need more
    /// than 63 bits saturate to `±i64::MAX` keeping their sign.
    pub fn block_proof_equivalent_time(
        &self,
        to: &BlockView,
        from: &BlockView,
        tip: &BlockView,
    ) -> Result<i64> {
        let (delta, sign) = to.chain_work.abs_diff_signed(&from.chain_work);

        let tip_proof = block_proof(tip.bits);
        if tip_proof.is_zero() {
            let reason = tip
                .bits
                .decode()
                .rejection(&U256::MAX)
                .unwrap_or(TargetRejection::Zero);
            return Err(Error::invalid_target(tip.bits, reason));
        }

        let spacing = u64::try_from(self.params.target_spacing)
            .map_err(|_| Error::invariant("Target spacing must be positive"))?;
        // The product wraps modulo 2^256 like the chain work it is derived from
        let (scaled, _) = delta.overflowing_mul(U256::from(spacing));
        let r = scaled / tip_proof;

        if r.bits() > 63 {
            self.emit(DifficultyEvent::EquivalentTimeSaturated {
                sign,
                bits: r.bits() as u32,
            });
            return Ok(sign.apply(i64::MAX));
        }

        Ok(sign.apply(r.low_u64() as i64))
    }
}
