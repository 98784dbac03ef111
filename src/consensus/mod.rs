//! Difficulty consensus rules
//!
//! [`DifficultyEngine`] bundles the network parameters, the era schedule and
//! an event sink. Its methods are pure functions of their inputs: they never
//! mutate the chain view and keep no state between calls.

pub mod chain;
pub mod era;
pub mod events;
mod next_work;
pub mod params;
mod pow;
mod retarget;
pub mod work;

pub use chain::{BlockView, ChainView, HeaderRecord, InMemoryChain};
pub use era::{DifficultyEra, EraSchedule, EraTimespans};
pub use events::{DifficultyEvent, EventSink, NoopSink, RecordingSink, TracingSink};
pub use params::{ConsensusParams, Network};
pub use work::block_proof;

use crate::error::Result;

/// Difficulty rules for one network
#[derive(Debug, Clone)]
pub struct DifficultyEngine<S = TracingSink> {
    params: ConsensusParams,
    eras: EraSchedule,
    sink: S,
}

impl DifficultyEngine<TracingSink> {
    /// Engine with the standard eras, reporting events through `tracing`
    pub fn new(params: ConsensusParams) -> Result<Self> {
        Self::with_sink(params, TracingSink)
    }
}

impl<S: EventSink> DifficultyEngine<S> {
    /// Engine with the standard eras and a custom event sink
    pub fn with_sink(params: ConsensusParams, sink: S) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            eras: EraSchedule::standard(),
            sink,
        })
    }

    /// Replace the era schedule
    pub fn with_eras(mut self, eras: EraSchedule) -> Self {
        self.eras = eras;
        self
    }

    /// Network parameters
    pub fn params(&self) -> &ConsensusParams {
        &self.params
    }

    /// Era schedule in force
    pub fn eras(&self) -> &EraSchedule {
        &self.eras
    }

    /// Event sink
    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn emit(&self, event: DifficultyEvent) {
        self.sink.emit(event);
    }
}
