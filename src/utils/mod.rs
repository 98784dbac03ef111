//! Utility functions and helpers

pub mod logging;

pub use logging::init_logging;

use crate::consensus::chain::{HeaderRecord, InMemoryChain};
use crate::error::{Error, Result};
use std::path::Path;

/// Read a chain file: a JSON or YAML list of `{time, bits}` header records,
/// chosen by extension (`.yaml`/`.yml`, otherwise JSON)
pub fn load_chain_file(path: &Path) -> Result<InMemoryChain> {
    let contents = std::fs::read_to_string(path)?;

    let headers: Vec<HeaderRecord> = match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&contents)
            .map_err(|e| Error::parse(format!("Invalid chain file {}: {}", path.display(), e)))?,
        _ => serde_json::from_str(&contents)?,
    };

    let chain = InMemoryChain::from_headers(headers);
    tracing::debug!(path = %path.display(), blocks = chain.len(), "Loaded chain file");
    Ok(chain)
}

/// Format a hash count with a metric suffix
pub fn format_work(work: f64) -> String {
    if work >= 1e18 {
        format!("{:.2} EH", work / 1e18)
    } else if work >= 1e15 {
        format!("{:.2} PH", work / 1e15)
    } else if work >= 1e12 {
        format!("{:.2} TH", work / 1e12)
    } else if work >= 1e9 {
        format!("{:.2} GH", work / 1e9)
    } else if work >= 1e6 {
        format!("{:.2} MH", work / 1e6)
    } else if work >= 1e3 {
        format!("{:.2} KH", work / 1e3)
    } else {
        format!("{} H", work)
    }
}
