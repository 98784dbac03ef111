//! Difficulty eras
//!
//! The retarget parameters changed twice in the chain's history. Each change
//! is frozen as an [`DifficultyEra`] row keyed by the first height it applies
//! to, and the rules select a row by the height of the block being produced.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Blocks between retargets; the chain retargets on every block
pub const BASE_RETARGET_INTERVAL: u32 = 1;

/// First height of the second era
pub const ERA_2_HEIGHT: u32 = 32_000;

/// First height of the third era
pub const ERA_3_HEIGHT: u32 = 90_000;

/// The frozen era table of the chain
pub const STANDARD_ERAS: [DifficultyEra; 3] = [
    DifficultyEra {
        min_height: 0,
        averaging_interval_blocks: BASE_RETARGET_INTERVAL * 160,
        max_adjust_up_percent: 1,
        max_adjust_down_percent: 10,
    },
    DifficultyEra {
        min_height: ERA_2_HEIGHT,
        averaging_interval_blocks: BASE_RETARGET_INTERVAL * 8,
        max_adjust_up_percent: 1,
        max_adjust_down_percent: 1,
    },
    DifficultyEra {
        min_height: ERA_3_HEIGHT,
        averaging_interval_blocks: BASE_RETARGET_INTERVAL * 8,
        max_adjust_up_percent: 1,
        max_adjust_down_percent: 3,
    },
];

/// One frozen set of retarget parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyEra {
    /// First block height the era applies to
    pub min_height: u32,
    /// Number of trailing blocks whose elapsed time drives a retarget
    pub averaging_interval_blocks: u32,
    /// Largest difficulty increase per retarget, in percent
    pub max_adjust_up_percent: u32,
    /// Largest difficulty decrease per retarget, in percent
    pub max_adjust_down_percent: u32,
}

/// Timespans of an era for a given block spacing, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EraTimespans {
    /// Expected duration of the averaging window
    pub averaging_target_timespan: i64,
    /// Shortest window duration the retarget will use
    pub min_actual_timespan: i64,
    /// Longest window duration the retarget will use
    pub max_actual_timespan: i64,
}

impl DifficultyEra {
    /// Derive the era's timespans from the network's block spacing.
    ///
    /// Fails with [`Error::Config`] when a timespan does not fit in an `i64`.
    pub fn timespans(&self, target_spacing: i64) -> Result<EraTimespans> {
        let overflow = || {
            Error::config(format!(
                "Era at height {} overflows its timespans with a target spacing of {}s",
                self.min_height, target_spacing
            ))
        };
        let scaled = |timespan: i64, percent: i64| {
            timespan
                .checked_mul(percent)
                .map(|product| product / 100)
                .ok_or_else(overflow)
        };

        let averaging_target_timespan = i64::from(self.averaging_interval_blocks)
            .checked_mul(target_spacing)
            .ok_or_else(overflow)?;

        Ok(EraTimespans {
            averaging_target_timespan,
            min_actual_timespan: scaled(
                averaging_target_timespan,
                100 - i64::from(self.max_adjust_up_percent),
            )?,
            max_actual_timespan: scaled(
                averaging_target_timespan,
                100 + i64::from(self.max_adjust_down_percent),
            )?,
        })
    }
}

impl EraTimespans {
    /// Bound a measured window duration to this era's adjustment limits
    pub fn clamp(&self, actual_timespan: i64) -> i64 {
        actual_timespan.clamp(self.min_actual_timespan, self.max_actual_timespan)
    }
}

/// Ordered table of eras, selected by height
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<DifficultyEra>", into = "Vec<DifficultyEra>")]
pub struct EraSchedule {
    eras: Vec<DifficultyEra>,
}

impl EraSchedule {
    /// Build a schedule, checking that it starts at height 0 and is strictly ordered
    pub fn new(eras: Vec<DifficultyEra>) -> Result<Self> {
        let first = eras
            .first()
            .ok_or_else(|| Error::config("Era schedule must not be empty"))?;

        if first.min_height != 0 {
            return Err(Error::config("First era must start at height 0"));
        }

        for pair in eras.windows(2) {
            if pair[1].min_height <= pair[0].min_height {
                return Err(Error::config(format!(
                    "Era heights must be strictly increasing: {} then {}",
                    pair[0].min_height, pair[1].min_height
                )));
            }
        }

        for era in &eras {
            if era.averaging_interval_blocks == 0 {
                return Err(Error::config(format!(
                    "Era at height {} has an empty averaging window",
                    era.min_height
                )));
            }
            if era.max_adjust_up_percent >= 100 {
                return Err(Error::config(format!(
                    "Era at height {} allows an upward adjustment of {}%",
                    era.min_height, era.max_adjust_up_percent
                )));
            }
        }

        Ok(Self { eras })
    }

    /// The chain's frozen schedule
    pub fn standard() -> Self {
        Self {
            eras: STANDARD_ERAS.to_vec(),
        }
    }

    /// The era with the greatest `min_height` not above `next_height`
    pub fn select(&self, next_height: u32) -> &DifficultyEra {
        let index = self
            .eras
            .partition_point(|era| era.min_height <= next_height);
        // The first era starts at height 0, so at least one row matches
        &self.eras[index.saturating_sub(1)]
    }

    /// Number of blocks before the earliest era has a full averaging window
    pub fn warm_up_blocks(&self) -> u32 {
        self.eras[0].averaging_interval_blocks
    }

    /// All eras in height order
    pub fn eras(&self) -> &[DifficultyEra] {
        &self.eras
    }
}

impl Default for EraSchedule {
    fn default() -> Self {
        Self::standard()
    }
}

impl TryFrom<Vec<DifficultyEra>> for EraSchedule {
    type Error = Error;

    fn try_from(eras: Vec<DifficultyEra>) -> Result<Self> {
        Self::new(eras)
    }
}

impl From<EraSchedule> for Vec<DifficultyEra> {
    fn from(schedule: EraSchedule) -> Self {
        schedule.eras
    }
}
