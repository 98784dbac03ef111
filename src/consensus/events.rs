//! Structured difficulty events
//!
//! The rules report what they decided through an [`EventSink`] instead of
//! logging directly. [`TracingSink`] forwards events to `tracing`;
//! [`RecordingSink`] keeps them in memory for inspection.

use crate::core::{CompactTarget, Sign, TargetRejection, U256};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Something the difficulty rules decided
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DifficultyEvent {
    /// No previous block: the genesis block gets the limit
    GenesisTarget {
        /// Compact proof-of-work limit
        bits: CompactTarget,
    },

    /// Too little history for the first era's averaging window
    WarmUp {
        /// Height of the block being produced
        next_height: u32,
        /// Blocks needed before retargeting starts
        warm_up_blocks: u32,
        /// Compact proof-of-work limit
        bits: CompactTarget,
    },

    /// Test-network rule: the candidate came long after its parent
    MinDifficultyGap {
        /// Height of the block being produced
        next_height: u32,
        /// Seconds between the parent and the candidate
        gap: i64,
        /// Compact proof-of-work limit
        bits: CompactTarget,
    },

    /// Test-network rule: reuse the last target not set by the gap rule
    MinDifficultyCarryOver {
        /// Height of the block being produced
        next_height: u32,
        /// Height of the block whose target is reused
        source_height: u32,
        /// The reused target
        bits: CompactTarget,
    },

    /// Regression-test rule: the target never changes
    RetargetDisabled {
        /// Height of the block being produced
        next_height: u32,
        /// The unchanged target
        bits: CompactTarget,
    },

    /// A retarget from a measured averaging window
    Retarget {
        /// Height of the block being produced
        next_height: u32,
        /// First height of the era in force
        era_min_height: u32,
        /// Measured window duration before clamping
        measured_timespan: i64,
        /// Window duration after clamping
        actual_timespan: i64,
        /// Expected window duration for the era
        averaging_target_timespan: i64,
        /// Previous compact target
        before: CompactTarget,
        /// New compact target
        after: CompactTarget,
        /// Previous target
        old_target: U256,
        /// New target before encoding
        new_target: U256,
        /// Whether the proof-of-work limit capped the new target
        capped_at_limit: bool,
    },

    /// A block failed the proof-of-work check
    ProofOfWorkRejected {
        /// Claimed compact target
        bits: CompactTarget,
        /// Reason, when the target itself was unusable
        reason: Option<TargetRejection>,
    },

    /// An equivalent-time estimate did not fit in 63 bits
    EquivalentTimeSaturated {
        /// Direction of the work difference
        sign: Sign,
        /// Bit length of the unclamped estimate
        bits: u32,
    },
}

/// Receiver of difficulty events
pub trait EventSink {
    /// Handle one event
    fn emit(&self, event: DifficultyEvent);
}

impl<S: EventSink + ?Sized> EventSink for &S {
    fn emit(&self, event: DifficultyEvent) {
        (**self).emit(event)
    }
}

impl<S: EventSink + ?Sized> EventSink for Arc<S> {
    fn emit(&self, event: DifficultyEvent) {
        (**self).emit(event)
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: DifficultyEvent) {}
}

/// Forwards events to `tracing` with structured fields
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: DifficultyEvent) {
        match event {
            DifficultyEvent::GenesisTarget { bits } => {
                debug!(bits = %bits, "Genesis block uses proof-of-work limit");
            }
            DifficultyEvent::WarmUp {
                next_height,
                warm_up_blocks,
                bits,
            } => {
                debug!(next_height, warm_up_blocks, bits = %bits, "Warm-up block uses proof-of-work limit");
            }
            DifficultyEvent::MinDifficultyGap {
                next_height,
                gap,
                bits,
            } => {
                info!(next_height, gap, bits = %bits, "Minimum-difficulty block allowed after gap");
            }
            DifficultyEvent::MinDifficultyCarryOver {
                next_height,
                source_height,
                bits,
            } => {
                debug!(next_height, source_height, bits = %bits, "Reusing last regular target");
            }
            DifficultyEvent::RetargetDisabled { next_height, bits } => {
                debug!(next_height, bits = %bits, "Retargeting disabled");
            }
            DifficultyEvent::Retarget {
                next_height,
                era_min_height,
                measured_timespan,
                actual_timespan,
                averaging_target_timespan,
                before,
                after,
                old_target,
                new_target,
                capped_at_limit,
            } => {
                info!(
                    next_height,
                    era_min_height,
                    measured_timespan,
                    actual_timespan,
                    averaging_target_timespan,
                    before = %before,
                    after = %after,
                    old_target = %old_target.to_hex(),
                    new_target = %new_target.to_hex(),
                    capped_at_limit,
                    "Retarget"
                );
            }
            DifficultyEvent::ProofOfWorkRejected { bits, reason } => match reason {
                Some(reason) => warn!(bits = %bits, reason = %reason, "Proof of work rejected"),
                None => warn!(bits = %bits, "Proof of work rejected: hash above target"),
            },
            DifficultyEvent::EquivalentTimeSaturated { sign, bits } => {
                debug!(?sign, bits, "Equivalent time saturated");
            }
        }
    }
}

/// Keeps events in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<DifficultyEvent>>,
}

impl RecordingSink {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the events recorded so far
    pub fn events(&self) -> Vec<DifficultyEvent> {
        self.events.lock().clone()
    }

    /// Remove and return the recorded events
    pub fn take(&self) -> Vec<DifficultyEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// The most recent event
    pub fn last(&self) -> Option<DifficultyEvent> {
        self.events.lock().last().cloned()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: DifficultyEvent) {
        self.events.lock().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink() {
        let sink = RecordingSink::new();
        let bits = CompactTarget::from_consensus(0x1e0f_ffff);

        sink.emit(DifficultyEvent::GenesisTarget { bits });
        (&sink).emit(DifficultyEvent::RetargetDisabled {
            next_height: 7,
            bits,
        });

        assert_eq!(sink.events().len(), 2);
        assert_eq!(
            sink.last(),
            Some(DifficultyEvent::RetargetDisabled {
                next_height: 7,
                bits
            })
        );
        assert_eq!(sink.take().len(), 2);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_shared_sink() {
        let sink = Arc::new(RecordingSink::new());
        let shared = Arc::clone(&sink);
        shared.emit(DifficultyEvent::EquivalentTimeSaturated {
            sign: Sign::Negative,
            bits: 70,
        });
        assert_eq!(sink.events().len(), 1);
    }

    #[test]
    fn test_event_serialization() {
        let event = DifficultyEvent::WarmUp {
            next_height: 10,
            warm_up_blocks: 160,
            bits: CompactTarget::from_consensus(0x1e0f_ffff),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "warm_up");
        assert_eq!(json["bits"], "1e0fffff");
    }

    #[test]
    fn test_tracing_and_noop_sinks_accept_events() {
        let event = DifficultyEvent::ProofOfWorkRejected {
            bits: CompactTarget::from_consensus(0),
            reason: Some(TargetRejection::Zero),
        };
        TracingSink.emit(event.clone());
        NoopSink.emit(event);
    }
}
