//! Retarget calculation for one averaging window

use crate::consensus::chain::BlockView;
use crate::consensus::events::{DifficultyEvent, EventSink};
use crate::consensus::DifficultyEngine;
use crate::core::{CompactTarget, U256};
use crate::error::{Error, Result};

impl<S: EventSink> DifficultyEngine<S> {
    /// Target for the block after `last`, given the timestamp of the first
    /// block of the averaging window.
    ///
    /// The measured window duration is clamped to the era's bounds, the old
    /// target is scaled by `actual / expected` (multiply first, then floor
    /// divide) and the result is capped at the proof-of-work limit.
    pub fn calculate_next_work_required(
        &self,
        last: &BlockView,
        first_block_time: i64,
    ) -> Result<CompactTarget> {
        let next_height = last.height.saturating_add(1);

        if self.params.no_retargeting {
            self.emit(DifficultyEvent::RetargetDisabled {
                next_height,
                bits: last.bits,
            });
            return Ok(last.bits);
        }

        let era = self.eras.select(next_height);
        let timespans = era.timespans(self.params.target_spacing)?;

        let measured_timespan = last.time.saturating_sub(first_block_time);
        let actual_timespan = timespans.clamp(measured_timespan);

        let actual = u64::try_from(actual_timespan).map_err(|_| {
            Error::invariant(format!("Negative clamped timespan {}", actual_timespan))
        })?;
        let expected = u64::try_from(timespans.averaging_target_timespan).map_err(|_| {
            Error::invariant(format!(
                "Negative averaging timespan {}",
                timespans.averaging_target_timespan
            ))
        })?;

        // Flags are ignored here; the parent's bits passed validation already
        let old_target = last.bits.decode().target;
        // The product wraps modulo 2^256; targets at most the limit times a
        // clamped timespan stay far below that
        let (scaled, _) = old_target.overflowing_mul(U256::from(actual));
        let mut new_target = scaled
            .checked_div(U256::from(expected))
            .ok_or(Error::DivisionByZero)?;

        let capped_at_limit = new_target > self.params.pow_limit;
        if capped_at_limit {
            new_target = self.params.pow_limit;
        }

        let after = CompactTarget::encode(&new_target);
        self.emit(DifficultyEvent::Retarget {
            next_height,
            era_min_height: era.min_height,
            measured_timespan,
            actual_timespan,
            averaging_target_timespan: timespans.averaging_target_timespan,
            before: last.bits,
            after,
            old_target,
            new_target,
            capped_at_limit,
        });

        Ok(after)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::{ConsensusParams, RecordingSink};
    use pretty_assertions::assert_eq;

    fn engine(params: ConsensusParams) -> DifficultyEngine<RecordingSink> {
        DifficultyEngine::with_sink(params, RecordingSink::new()).unwrap()
    }

    fn last_block(height: u32, time: i64, bits: CompactTarget) -> BlockView {
        BlockView {
            height,
            time,
            bits,
            chain_work: U256::zero(),
        }
    }

    #[test]
    fn test_on_schedule_keeps_target() {
        let engine = engine(ConsensusParams::main());
        let bits = CompactTarget::from_consensus(0x1d00_ffff);
        // Era 1: 160 blocks at 45 seconds
        let last = last_block(1_000, 7_200, bits);

        assert_eq!(engine.calculate_next_work_required(&last, 0).unwrap(), bits);
    }

    #[test]
    fn test_fast_window_clamps_to_max_increase() {
        let engine = engine(ConsensusParams::main());
        let bits = CompactTarget::from_consensus(0x1d00_ffff);
        let last = last_block(1_000, 500, bits);

        let next = engine.calculate_next_work_required(&last, 500).unwrap();
        let old = bits.decode().target;
        let expected = old * U256::from(7_128u64) / U256::from(7_200u64);
        assert_eq!(next, CompactTarget::encode(&expected));

        match engine.sink().last() {
            Some(DifficultyEvent::Retarget {
                measured_timespan,
                actual_timespan,
                capped_at_limit,
                ..
            }) => {
                assert_eq!(measured_timespan, 0);
                assert_eq!(actual_timespan, 7_128);
                assert!(!capped_at_limit);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_slow_window_clamps_to_max_decrease() {
        let engine = engine(ConsensusParams::main());
        let bits = CompactTarget::from_consensus(0x1d00_ffff);
        let last = last_block(1_000, 1_000_000, bits);

        let next = engine.calculate_next_work_required(&last, 0).unwrap();
        let expected = bits.decode().target * U256::from(7_920u64) / U256::from(7_200u64);
        assert_eq!(next, CompactTarget::encode(&expected));
    }

    #[test]
    fn test_era_three_bounds() {
        let engine = engine(ConsensusParams::main());
        let bits = CompactTarget::from_consensus(0x1c12_3456);
        let last = last_block(95_000, 10_000, bits);

        let next = engine.calculate_next_work_required(&last, 0).unwrap();
        let expected = bits.decode().target * U256::from(370u64) / U256::from(360u64);
        assert_eq!(next, CompactTarget::encode(&expected));
    }

    #[test]
    fn test_capped_at_limit() {
        let params = ConsensusParams::main();
        let limit_bits = params.pow_limit_compact();
        let engine = engine(params);
        let last = last_block(1_000, 1_000_000, limit_bits);

        assert_eq!(engine.calculate_next_work_required(&last, 0).unwrap(), limit_bits);
        assert!(matches!(
            engine.sink().last(),
            Some(DifficultyEvent::Retarget {
                capped_at_limit: true,
                ..
            })
        ));
    }

    #[test]
    fn test_no_retargeting_returns_parent_bits() {
        let engine = engine(ConsensusParams::regtest());
        let bits = CompactTarget::from_consensus(0x1d00_ffff);
        let last = last_block(1_000, 1_000_000, bits);

        assert_eq!(engine.calculate_next_work_required(&last, 0).unwrap(), bits);
        assert_eq!(
            engine.sink().last(),
            Some(DifficultyEvent::RetargetDisabled {
                next_height: 1_001,
                bits,
            })
        );
    }
}
