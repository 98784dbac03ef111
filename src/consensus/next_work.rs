//! Next required target

use crate::consensus::chain::{BlockView, ChainView};
use crate::consensus::events::{DifficultyEvent, EventSink};
use crate::consensus::DifficultyEngine;
use crate::core::CompactTarget;
use crate::error::{Error, Result};

impl<S: EventSink> DifficultyEngine<S> {
    /// Compact target the block after `last` must claim.
    ///
    /// `last` is `None` when the block being produced is genesis.
    /// `new_block_time` is the candidate header's timestamp; only the
    /// minimum-difficulty rule reads it.
    ///
    /// Fails with [`Error::InvariantViolation`] when `chain` does not hold
    /// the full averaging window below `last`.
    pub fn next_work_required<C>(
        &self,
        chain: &C,
        last: Option<&BlockView>,
        new_block_time: i64,
    ) -> Result<CompactTarget>
    where
        C: ChainView + ?Sized,
    {
        let limit_bits = self.params.pow_limit_compact();

        let Some(last) = last else {
            self.emit(DifficultyEvent::GenesisTarget { bits: limit_bits });
            return Ok(limit_bits);
        };

        let next_height = last.height.saturating_add(1);
        let warm_up_blocks = self.eras.warm_up_blocks();
        if next_height < warm_up_blocks {
            self.emit(DifficultyEvent::WarmUp {
                next_height,
                warm_up_blocks,
                bits: limit_bits,
            });
            return Ok(limit_bits);
        }

        if self.params.allow_min_difficulty_blocks {
            return self.min_difficulty_target(chain, last, new_block_time, limit_bits);
        }

        let era = self.eras.select(next_height);
        let steps = era.averaging_interval_blocks - 1;
        let first = self.walk_back(chain, last, steps)?;

        self.calculate_next_work_required(last, first.time)
    }

    /// Test-network rule: the limit after a long gap, otherwise the target of
    /// the last block that was not itself a gap block.
    ///
    /// Gap blocks are recognised by their header word being exactly the
    /// limit's compact form; an equal target spelled differently does not
    /// count. The walk always stops at genesis (height 0 is an interval
    /// boundary), so running out of view before that is an
    /// [`Error::InvariantViolation`].
    fn min_difficulty_target<C>(
        &self,
        chain: &C,
        last: &BlockView,
        new_block_time: i64,
        limit_bits: CompactTarget,
    ) -> Result<CompactTarget>
    where
        C: ChainView + ?Sized,
    {
        let next_height = last.height.saturating_add(1);
        let gap = new_block_time.saturating_sub(last.time);

        if new_block_time > last.time.saturating_add(self.params.target_spacing.saturating_mul(2)) {
            self.emit(DifficultyEvent::MinDifficultyGap {
                next_height,
                gap,
                bits: limit_bits,
            });
            return Ok(limit_bits);
        }

        let interval = self.params.difficulty_adjustment_interval();
        let mut block = *last;
        while i64::from(block.height) % interval != 0 && block.bits == limit_bits {
            block = chain.predecessor(&block).ok_or_else(|| {
                Error::invariant(format!(
                    "Chain view ends at height {} while looking for the last non-gap block below height {}",
                    block.height, last.height
                ))
            })?;
        }

        self.emit(DifficultyEvent::MinDifficultyCarryOver {
            next_height,
            source_height: block.height,
            bits: block.bits,
        });
        Ok(block.bits)
    }

    /// The block exactly `steps` heights below `last`
    fn walk_back<C>(&self, chain: &C, last: &BlockView, steps: u32) -> Result<BlockView>
    where
        C: ChainView + ?Sized,
    {
        chain.ancestor(last, steps).ok_or_else(|| {
            Error::invariant(format!(
                "Chain view does not hold height {} ({} steps back from height {})",
                i64::from(last.height) - i64::from(steps),
                steps,
                last.height
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::{ConsensusParams, InMemoryChain, RecordingSink};
    use crate::core::U256;

    const BITS: CompactTarget = CompactTarget::from_consensus(0x1d00_ffff);

    fn engine(params: ConsensusParams) -> DifficultyEngine<RecordingSink> {
        DifficultyEngine::with_sink(params, RecordingSink::new()).unwrap()
    }

    fn steady_chain(blocks: u32, bits: CompactTarget) -> InMemoryChain {
        let mut chain = InMemoryChain::new();
        for height in 0..blocks {
            chain.push_header(i64::from(height) * 45, bits);
        }
        chain
    }

    #[test]
    fn test_genesis_gets_limit() {
        let engine = engine(ConsensusParams::main());
        let chain = InMemoryChain::new();
        let bits = engine.next_work_required(&chain, None, 0).unwrap();

        assert_eq!(bits, engine.params().pow_limit_compact());
        assert!(matches!(
            engine.sink().last(),
            Some(DifficultyEvent::GenesisTarget { .. })
        ));
    }

    #[test]
    fn test_warm_up_gets_limit() {
        let engine = engine(ConsensusParams::main());
        let chain = steady_chain(159, BITS);
        let last = chain.tip().unwrap();
        assert_eq!(last.height, 158);

        let bits = engine.next_work_required(&chain, Some(&last), 0).unwrap();
        assert_eq!(bits, engine.params().pow_limit_compact());
    }

    #[test]
    fn test_first_retarget_after_warm_up() {
        let engine = engine(ConsensusParams::main());
        let chain = steady_chain(160, BITS);
        let last = chain.tip().unwrap();

        // 159 intervals of 45 seconds is below the 160-block expectation
        let bits = engine.next_work_required(&chain, Some(&last), 0).unwrap();
        let expected = BITS.decode().target * U256::from(7_155u64) / U256::from(7_200u64);
        assert_eq!(bits, CompactTarget::encode(&expected));
    }

    #[test]
    fn test_truncated_history_is_invariant_violation() {
        let engine = engine(ConsensusParams::main());
        let mut chain = InMemoryChain::starting_at(1_000, Default::default());
        for i in 0..10 {
            chain.push_header(i * 45, BITS);
        }
        let last = chain.tip().unwrap();

        let err = engine.next_work_required(&chain, Some(&last), 0).unwrap_err();
        assert!(matches!(err, Error::InvariantViolation(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_min_difficulty_walk_off_truncated_view_is_invariant_violation() {
        let mut params = ConsensusParams::test();
        params.target_timespan = params.target_spacing * 10;
        let limit_bits = params.pow_limit_compact();
        let engine = engine(params);

        // Every held block is a gap block and none sits on a retarget point
        let mut chain = InMemoryChain::starting_at(1_001, U256::zero());
        for height in 1_001..1_006 {
            chain.push_header(i64::from(height) * 45, limit_bits);
        }
        let last = chain.tip().unwrap();

        let err = engine.next_work_required(&chain, Some(&last), last.time).unwrap_err();
        assert!(matches!(err, Error::InvariantViolation(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_min_difficulty_gap() {
        let engine = engine(ConsensusParams::test());
        let chain = steady_chain(200, BITS);
        let last = chain.tip().unwrap();

        let late = last.time + 91;
        assert_eq!(
            engine.next_work_required(&chain, Some(&last), late).unwrap(),
            engine.params().pow_limit_compact()
        );

        // Exactly twice the spacing is not a gap
        let on_time = last.time + 90;
        assert_eq!(engine.next_work_required(&chain, Some(&last), on_time).unwrap(), BITS);
    }

    #[test]
    fn test_min_difficulty_walk_skips_gap_blocks() {
        let mut params = ConsensusParams::test();
        // Retarget points every 10 blocks
        params.target_timespan = params.target_spacing * 10;
        let limit_bits = params.pow_limit_compact();
        let engine = engine(params);

        let mut chain = steady_chain(203, BITS);
        for height in 203..207 {
            chain.push_header(i64::from(height) * 45, limit_bits);
        }
        let last = chain.tip().unwrap();

        let bits = engine.next_work_required(&chain, Some(&last), last.time).unwrap();
        assert_eq!(bits, BITS);
        assert_eq!(
            engine.sink().last(),
            Some(DifficultyEvent::MinDifficultyCarryOver {
                next_height: 207,
                source_height: 202,
                bits: BITS,
            })
        );
    }

    #[test]
    fn test_min_difficulty_walk_stops_at_interval() {
        let mut params = ConsensusParams::test();
        params.target_timespan = params.target_spacing * 10;
        let limit_bits = params.pow_limit_compact();
        let engine = engine(params);

        let mut chain = steady_chain(195, BITS);
        for height in 195..207 {
            chain.push_header(i64::from(height) * 45, limit_bits);
        }
        let last = chain.tip().unwrap();

        // Walk halts on height 200 even though it carries the limit
        let bits = engine.next_work_required(&chain, Some(&last), last.time).unwrap();
        assert_eq!(bits, limit_bits);
        assert!(matches!(
            engine.sink().last(),
            Some(DifficultyEvent::MinDifficultyCarryOver {
                source_height: 200,
                ..
            })
        ));
    }

    #[test]
    fn test_min_difficulty_compares_header_words() {
        let mut params = ConsensusParams::test();
        params.target_timespan = params.target_spacing * 10;
        params.pow_limit = U256::from(0x7fffu64) << 208;
        let engine = engine(params);

        // Same value as the limit's compact form, spelled with a wider exponent
        let limit = engine.params().pow_limit_compact();
        assert_eq!(limit.to_consensus(), 0x1c7f_ff00);
        let alias = CompactTarget::from_consensus(0x1d00_7fff);
        assert_eq!(alias.decode().target, limit.decode().target);
        assert_ne!(alias, limit);

        let regular = CompactTarget::from_consensus(0x1c12_3456);
        let mut chain = steady_chain(203, regular);
        chain.push_header(203 * 45, alias);
        let last = chain.tip().unwrap();

        // The aliased block is not recognised as a gap block, so its bits are kept
        let bits = engine.next_work_required(&chain, Some(&last), last.time).unwrap();
        assert_eq!(bits, alias);
    }
}
