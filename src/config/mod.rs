//! Configuration management for `powtool` and embedders
//!
//! Sources are layered lowest to highest: built-in defaults, an optional
//! TOML/YAML/JSON file, `POW_`-prefixed environment variables
//! (`POW_NETWORK__PRESET=test`, `POW_LOGGING__LEVEL=debug`) and finally
//! command-line flags.

use crate::consensus::{ConsensusParams, Network};
use crate::core::U256;
use crate::error::{Error, Result};
use crate::utils::logging::LOG_FORMATS;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Prefix of environment variables read by [`Config::load`]
pub const ENV_PREFIX: &str = "POW";

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    name = "powtool",
    about = "Inspect and compute proof-of-work difficulty targets",
    version
)]
pub struct Args {
    /// Configuration file path (TOML, YAML or JSON)
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Parameter preset, overriding the configuration file
    #[arg(short, long, value_enum, global = true)]
    pub network: Option<Network>,

    /// Log level or filter directive
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Log format
    #[arg(long, value_parser = LOG_FORMATS, global = true)]
    pub log_format: Option<String>,

    /// Operation to run
    #[command(subcommand)]
    pub command: Command,
}

/// `powtool` operations; each prints one JSON document
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Decode a compact target word
    Decode {
        /// Compact target as hex, e.g. 1d00ffff
        bits: String,
    },

    /// Encode a 256-bit target into its compact form
    Encode {
        /// Target as up to 64 hex digits
        target: String,
    },

    /// Expected hash count for a block claiming `bits`
    Proof {
        /// Compact target as hex
        bits: String,
    },

    /// Check a block hash against a compact target
    Check {
        /// Block hash as a big-endian hex number
        hash: String,
        /// Compact target as hex
        bits: String,
    },

    /// Target required of the block after a chain's tip
    Next {
        /// Chain file: a JSON or YAML list of {time, bits} headers
        chain: PathBuf,
        /// Timestamp of the new block; defaults to tip time plus one spacing
        #[arg(long)]
        time: Option<i64>,
    },

    /// Seconds of work between two blocks at the tip's difficulty
    EquivalentTime {
        /// Chain file: a JSON or YAML list of {time, bits} headers
        chain: PathBuf,
        /// Height of the first block
        to: u32,
        /// Height of the second block
        from: u32,
    },

    /// Print the resolved configuration as TOML
    ShowConfig,
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Consensus parameter selection
    #[serde(default)]
    pub network: NetworkConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// A preset plus optional per-field overrides
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Preset the overrides apply to
    #[serde(default)]
    pub preset: Network,

    /// Proof-of-work limit as hex
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pow_limit: Option<U256>,

    /// Seconds per block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_spacing: Option<i64>,

    /// Legacy retarget timespan in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_timespan: Option<i64>,

    /// Minimum-difficulty rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_min_difficulty_blocks: Option<bool>,

    /// Frozen-target rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_retargeting: Option<bool>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (plain, pretty, json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "plain".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl NetworkConfig {
    /// Preset parameters with the overrides applied
    pub fn resolve(&self) -> ConsensusParams {
        let mut params = self.preset.params();

        if let Some(pow_limit) = self.pow_limit {
            params.pow_limit = pow_limit;
        }
        if let Some(spacing) = self.target_spacing {
            params.target_spacing = spacing;
        }
        if let Some(timespan) = self.target_timespan {
            params.target_timespan = timespan;
        }
        if let Some(allow) = self.allow_min_difficulty_blocks {
            params.allow_min_difficulty_blocks = allow;
        }
        if let Some(frozen) = self.no_retargeting {
            params.no_retargeting = frozen;
        }

        params
    }
}

impl Config {
    /// Load from an optional file plus the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Load from an optional file plus an explicit environment map.
    ///
    /// `None` reads the process environment.
    pub fn load_with_env(path: Option<&Path>, env: Option<HashMap<String, String>>) -> Result<Self> {
        let mut builder = ::config::Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(Error::config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(::config::File::from(path));
        }

        let environment = ::config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .source(env);

        let config: Self = builder
            .add_source(environment)
            .build()
            .and_then(|settings| settings.try_deserialize())
            .map_err(|e| Error::config(format!("Failed to load configuration: {}", e)))?;

        config.validate()?;
        tracing::debug!(
            preset = %config.network.preset,
            file = ?path,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Load the file named by `args` and apply the flag overrides
    pub fn from_args(args: &Args) -> Result<Self> {
        let mut config = Self::load(args.config.as_deref())?;
        config.apply_args(args);
        config.validate()?;
        Ok(config)
    }

    /// Command-line flags take precedence over every other source
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(network) = args.network {
            self.network.preset = network;
        }
        if let Some(level) = &args.log_level {
            self.logging.level = level.clone();
        }
        if let Some(format) = &args.log_format {
            self.logging.format = format.clone();
        }
    }

    /// Resolved and validated consensus parameters
    pub fn consensus_params(&self) -> Result<ConsensusParams> {
        let params = self.network.resolve();
        params.validate()?;
        Ok(params)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !LOG_FORMATS.contains(&self.logging.format.as_str()) {
            return Err(Error::config(format!(
                "Unknown log format: {} (expected one of {})",
                self.logging.format,
                LOG_FORMATS.join(", ")
            )));
        }

        self.consensus_params().map(|_| ())
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::config(format!("Failed to serialize config: {}", e)))
    }
}
