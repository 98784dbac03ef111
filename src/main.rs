//! powtool
//!
//! Command-line front end to the difficulty engine: decode and encode compact
//! targets, check proofs of work, and compute the next required target of a
//! chain stored as a header file.

use anyhow::{Context, anyhow};
use clap::Parser;
use pow_retarget::{
    DifficultyEngine, U256,
    config::{Args, Command, Config},
    consensus::block_proof,
    core::CompactTarget,
    utils::{self, format_work, logging},
};
use serde_json::{Value, json};
use tracing::{debug, error};

fn main() {
    let args = Args::parse();

    match run(args) {
        Ok(success) => {
            if !success {
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    }
}

/// Run one command; `Ok(false)` means the command ran but its check failed
fn run(args: Args) -> anyhow::Result<bool> {
    let config = Config::from_args(&args).context("Failed to load configuration")?;
    logging::init_from_config(&config.logging);

    let params = config.consensus_params()?;
    debug!(network = %config.network.preset, "Using consensus parameters");
    let engine = DifficultyEngine::new(params)?;

    let (output, success) = match &args.command {
        Command::Decode { bits } => (decode(&engine, bits)?, true),
        Command::Encode { target } => (encode(target)?, true),
        Command::Proof { bits } => (proof(bits)?, true),
        Command::Check { hash, bits } => check(&engine, hash, bits)?,
        Command::Next { chain, time } => {
            let chain = utils::load_chain_file(chain)?;
            let last = chain.tip();
            let new_block_time = time.unwrap_or_else(|| {
                last.map_or(0, |tip| {
                    tip.time.saturating_add(engine.params().target_spacing)
                })
            });

            let bits = engine.next_work_required(&chain, last.as_ref(), new_block_time)?;
            let next_height = last.map_or(0, |tip| tip.height + 1);
            (
                json!({
                    "next_height": next_height,
                    "time": new_block_time,
                    "bits": bits,
                    "target": bits.decode().target,
                }),
                true,
            )
        }
        Command::EquivalentTime { chain, to, from } => {
            let chain = utils::load_chain_file(chain)?;
            let tip = chain.tip().ok_or_else(|| anyhow!("Chain file holds no blocks"))?;
            let to_block = chain.get(*to)?;
            let from_block = chain.get(*from)?;

            let seconds = engine.block_proof_equivalent_time(&to_block, &from_block, &tip)?;
            (
                json!({
                    "to": to,
                    "from": from,
                    "tip_height": tip.height,
                    "seconds": seconds,
                }),
                true,
            )
        }
        Command::ShowConfig => {
            print!("{}", config.to_toml()?);
            return Ok(true);
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(success)
}

fn decode(engine: &DifficultyEngine, bits: &str) -> anyhow::Result<Value> {
    let bits = CompactTarget::from_hex(bits)?;
    let decoded = bits.decode();

    Ok(json!({
        "bits": bits,
        "exponent": bits.exponent(),
        "mantissa": format!("{:06x}", bits.mantissa()),
        "target": decoded.target,
        "negative": decoded.negative,
        "overflow": decoded.overflow,
        "rejection": decoded.rejection(&engine.params().pow_limit),
    }))
}

fn encode(target: &str) -> anyhow::Result<Value> {
    let target = U256::from_hex(target)?;
    let bits = CompactTarget::encode(&target);

    Ok(json!({
        "target": target,
        "bits": bits,
        "decoded": bits.decode().target,
    }))
}

fn proof(bits: &str) -> anyhow::Result<Value> {
    let bits = CompactTarget::from_hex(bits)?;
    let work = block_proof(bits);

    Ok(json!({
        "bits": bits,
        "proof": work,
        "hashes": format_work(approximate(&work)),
    }))
}

fn check(engine: &DifficultyEngine, hash: &str, bits: &str) -> anyhow::Result<(Value, bool)> {
    let hash = U256::from_hex(hash)?;
    let bits = CompactTarget::from_hex(bits)?;

    let output = match engine.check_proof_of_work(&hash, bits) {
        Ok(()) => (json!({ "valid": true }), true),
        Err(e) if !e.is_fatal() => (
            json!({
                "valid": false,
                "category": e.category(),
                "error": e.to_string(),
            }),
            false,
        ),
        Err(e) => return Err(e.into()),
    };
    Ok(output)
}

/// Nearest `f64` to a 256-bit value, for display only
fn approximate(value: &U256) -> f64 {
    value
        .0
        .iter()
        .rev()
        .fold(0.0, |acc, word| acc * 18_446_744_073_709_551_616.0 + *word as f64)
}
