//! Configuration files driving the engine end to end

use pow_retarget::config::Config;
use pow_retarget::consensus::{HeaderRecord, NoopSink};
use pow_retarget::prelude::*;
use pow_retarget::utils::load_chain_file;
use std::collections::HashMap;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_temp(suffix: &str, contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    write!(file, "{}", contents).unwrap();
    file
}

fn load(file: &NamedTempFile) -> Config {
    Config::load_with_env(Some(file.path()), Some(HashMap::new())).unwrap()
}

#[test]
fn test_test_network_file_enables_min_difficulty() {
    let config_file = write_temp(
        ".toml",
        r#"
[network]
preset = "test"

[logging]
level = "info"
format = "json"
"#,
    );
    let config = load(&config_file);
    let engine = DifficultyEngine::with_sink(config.consensus_params().unwrap(), NoopSink).unwrap();
    let limit = engine.params().pow_limit_compact();

    let headers: Vec<HeaderRecord> = (0..200)
        .map(|height| HeaderRecord {
            time: height * 45,
            bits: CompactTarget::from_consensus(0x1d00_ffff),
        })
        .collect();
    let chain_file = write_temp(".json", &serde_json::to_string(&headers).unwrap());
    let chain = load_chain_file(chain_file.path()).unwrap();
    let last = chain.tip().unwrap();

    // A late block may use the limit, an on-time one keeps the parent's bits
    assert_eq!(
        engine.next_work_required(&chain, Some(&last), last.time + 600).unwrap(),
        limit
    );
    assert_eq!(
        engine.next_work_required(&chain, Some(&last), last.time + 45).unwrap(),
        last.bits
    );
}

#[test]
fn test_overrides_change_retarget_inputs() {
    let config_file = write_temp(
        ".yaml",
        "network:\n  preset: main\n  target_spacing: 60\n  target_timespan: 60\n",
    );
    let config = load(&config_file);
    let params = config.consensus_params().unwrap();
    assert_eq!(params.target_spacing, 60);

    let engine = DifficultyEngine::with_sink(params, NoopSink).unwrap();
    let bits = CompactTarget::from_consensus(0x1d00_ffff);

    let mut chain = InMemoryChain::new();
    for height in 0..160 {
        chain.push_header(height * 60, bits);
    }
    let last = chain.tip().unwrap();

    // 159 blocks at 60 seconds against a 160 * 60 second expectation
    let expected = bits.decode().target * U256::from(159u64 * 60) / U256::from(160u64 * 60);
    assert_eq!(
        engine.next_work_required(&chain, Some(&last), last.time).unwrap(),
        CompactTarget::encode(&expected)
    );
}

#[test]
fn test_invalid_preset_is_rejected() {
    let config_file = write_temp(".toml", "[network]\npreset = \"moonnet\"\n");
    let err = Config::load_with_env(Some(config_file.path()), Some(HashMap::new())).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_resolved_config_round_trips_through_toml() {
    let config_file = write_temp(
        ".toml",
        "[network]\npreset = \"regtest\"\npow_limit = \"7fffff\"\n",
    );
    let config = load(&config_file);
    assert_eq!(config.consensus_params().unwrap().pow_limit, U256::from(0x7f_ffffu64));

    let rendered = write_temp(".toml", &config.to_toml().unwrap());
    assert_eq!(load(&rendered), config);
}
