//! Log subscriber setup for binaries
//!
//! The library itself only emits `tracing` events (through
//! [`TracingSink`](crate::consensus::TracingSink) and config loading); this
//! module installs a subscriber to print them.

use crate::config::LoggingConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Output formats understood by [`init_logging`]
pub const LOG_FORMATS: [&str; 3] = ["plain", "pretty", "json"];

/// Build the level filter, falling back to `info` on a bad directive
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install a global subscriber writing to stderr.
///
/// `format` is one of [`LOG_FORMATS`]; anything else is treated as `plain`.
/// Does nothing if a subscriber is already installed.
pub fn init_logging(level: &str, format: &str) {
    let env_filter = env_filter(level);

    let result = match format {
        "json" => {
            let fmt_layer = fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()
        }
        "pretty" => {
            let fmt_layer = fmt::layer()
                .pretty()
                .with_writer(std::io::stderr)
                .with_target(true);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()
        }
        _ => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()
        }
    };

    if result.is_err() {
        tracing::debug!("Log subscriber already installed");
    }
}

/// Install a subscriber from a [`LoggingConfig`]
pub fn init_from_config(config: &LoggingConfig) {
    init_logging(&config.level, &config.format);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_filter_fallback() {
        assert_eq!(env_filter("debug").to_string(), "debug");
        assert_eq!(env_filter("pow_retarget=trace").to_string(), "pow_retarget=trace");
        assert_eq!(env_filter("pow_retarget=loud").to_string(), "info");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_logging("warn", "json");
        init_logging("warn", "plain");
    }
}
