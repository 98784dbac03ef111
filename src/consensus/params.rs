//! Network consensus parameters

use crate::core::{CompactTarget, U256};
use crate::error::{Error, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Seconds between blocks on every preset network
pub const TARGET_SPACING_SECS: i64 = 45;

/// Legacy retarget timespan; equal to the spacing, so the interval is one block
pub const TARGET_TIMESPAN_SECS: i64 = 45;

/// Longest block spacing [`ConsensusParams::validate`] accepts, one day
pub const MAX_TARGET_SPACING_SECS: i64 = 86_400;

/// Immutable parameter bag the difficulty rules read from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusParams {
    /// Easiest target any block may claim
    pub pow_limit: U256,

    /// Expected seconds per block
    pub target_spacing: i64,

    /// Legacy retarget timespan; eras define the timespans actually used
    pub target_timespan: i64,

    /// Test-network rule allowing minimum-difficulty blocks after a gap
    #[serde(default)]
    pub allow_min_difficulty_blocks: bool,

    /// Regression-test rule that never changes the target
    #[serde(default)]
    pub no_retargeting: bool,
}

impl ConsensusParams {
    /// Main network: limit `2^236 - 1`, retargeting every block
    pub fn main() -> Self {
        Self {
            pow_limit: U256::MAX >> 20,
            target_spacing: TARGET_SPACING_SECS,
            target_timespan: TARGET_TIMESPAN_SECS,
            allow_min_difficulty_blocks: false,
            no_retargeting: false,
        }
    }

    /// Test network: main-network rules plus minimum-difficulty blocks
    pub fn test() -> Self {
        Self {
            allow_min_difficulty_blocks: true,
            ..Self::main()
        }
    }

    /// Regression test network: limit `2^255 - 1` and a frozen target
    pub fn regtest() -> Self {
        Self {
            pow_limit: U256::MAX >> 1,
            target_spacing: TARGET_SPACING_SECS,
            target_timespan: TARGET_TIMESPAN_SECS,
            allow_min_difficulty_blocks: true,
            no_retargeting: true,
        }
    }

    /// Blocks between legacy retarget points (`target_timespan / target_spacing`)
    pub fn difficulty_adjustment_interval(&self) -> i64 {
        self.target_timespan / self.target_spacing
    }

    /// Compact form of the proof-of-work limit
    pub fn pow_limit_compact(&self) -> CompactTarget {
        CompactTarget::encode(&self.pow_limit)
    }

    /// Reject parameter sets the rules cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.pow_limit.is_zero() {
            return Err(Error::config("Proof-of-work limit must be nonzero"));
        }

        if self.target_spacing <= 0 {
            return Err(Error::config("Target spacing must be greater than 0"));
        }

        if self.target_spacing > MAX_TARGET_SPACING_SECS {
            return Err(Error::config(format!(
                "Target spacing must be at most {}s, got {}s",
                MAX_TARGET_SPACING_SECS, self.target_spacing
            )));
        }

        if self.target_timespan < self.target_spacing {
            return Err(Error::config(
                "Target timespan must be at least one target spacing",
            ));
        }

        Ok(())
    }
}

impl Default for ConsensusParams {
    fn default() -> Self {
        Self::main()
    }
}

/// Named parameter presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Main network
    #[default]
    Main,
    /// Public test network
    Test,
    /// Local regression testing
    Regtest,
}

impl Network {
    /// Parameters for this network
    pub fn params(self) -> ConsensusParams {
        match self {
            Network::Main => ConsensusParams::main(),
            Network::Test => ConsensusParams::test(),
            Network::Regtest => ConsensusParams::regtest(),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Main => write!(f, "main"),
            Network::Test => write!(f, "test"),
            Network::Regtest => write!(f, "regtest"),
        }
    }
}

impl FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "main" | "mainnet" => Ok(Network::Main),
            "test" | "testnet" => Ok(Network::Test),
            "regtest" => Ok(Network::Regtest),
            _ => Err(Error::config(format!("Unknown network: {}", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let main = ConsensusParams::main();
        assert_eq!(main.pow_limit.bits(), 236);
        assert_eq!(main.pow_limit, U256::MAX >> 20);
        assert_eq!(main.pow_limit_compact().to_consensus(), 0x1e0f_ffff);
        assert_eq!(main.difficulty_adjustment_interval(), 1);
        assert!(!main.allow_min_difficulty_blocks);

        let test = ConsensusParams::test();
        assert!(test.allow_min_difficulty_blocks);
        assert_eq!(test.pow_limit, main.pow_limit);

        let regtest = ConsensusParams::regtest();
        assert!(regtest.no_retargeting);
        assert_eq!(regtest.pow_limit_compact().to_consensus(), 0x207f_ffff);
    }

    #[test]
    fn test_validation() {
        let mut params = ConsensusParams::main();
        assert!(params.validate().is_ok());

        params.target_spacing = 0;
        assert!(params.validate().is_err());

        params = ConsensusParams::main();
        params.target_timespan = 10;
        assert!(params.validate().is_err());

        params = ConsensusParams::main();
        params.target_spacing = MAX_TARGET_SPACING_SECS;
        params.target_timespan = MAX_TARGET_SPACING_SECS;
        assert!(params.validate().is_ok());

        params.target_spacing = i64::MAX / 100;
        params.target_timespan = i64::MAX / 100;
        assert!(matches!(params.validate(), Err(Error::Config(_))));

        params = ConsensusParams::main();
        params.pow_limit = U256::zero();
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_network_names() {
        assert_eq!("main".parse::<Network>().unwrap(), Network::Main);
        assert_eq!("TESTNET".parse::<Network>().unwrap(), Network::Test);
        assert_eq!(Network::Regtest.to_string(), "regtest");
        assert!("moon".parse::<Network>().is_err());
        assert_eq!(Network::default().params(), ConsensusParams::main());
    }

    #[test]
    fn test_params_serde() {
        let params = ConsensusParams::regtest();
        let json = serde_json::to_string(&params).unwrap();
        let back: ConsensusParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
    }
}
