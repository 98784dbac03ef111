//! # pow-retarget
//!
//! Proof-of-work difficulty engine for a retarget-every-block chain.
//!
//! ## Features
//!
//! - **Fixed-width arithmetic**: a `uint`-backed 256-bit integer with signed
//!   differences and hex serde
//! - **Compact targets**: bit-exact `nBits` decoding and encoding with sign
//!   and overflow flags
//! - **Era-based retargeting**: three frozen parameter sets selected by height
//! - **Proof-of-work checks** and **chain work** for chain selection
//! - **Structured events** through a pluggable sink, `tracing` by default
//!
//! ## Architecture
//!
//! Everything consensus-critical hangs off [`DifficultyEngine`], which reads
//! the chain through the [`ChainView`] trait and never mutates it. Every
//! method is a deterministic function of its inputs.

#![warn(
    missing_docs,
    rust_2018_idioms,
    unused_lifetimes,
    unused_qualifications,
    clippy::all
)]
#![forbid(unsafe_code)]

pub mod config;
pub mod consensus;
pub mod core;
pub mod error;
pub mod utils;

pub use crate::error::{Error, Result};
pub use crate::config::Config;
pub use crate::consensus::{
    BlockView, ChainView, ConsensusParams, DifficultyEngine, InMemoryChain, Network, block_proof,
};
pub use crate::core::{ChainWork, CompactTarget, Target, U256};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        config::Config,
        consensus::{
            BlockView, ChainView, ConsensusParams, DifficultyEngine, DifficultyEvent, EventSink,
            InMemoryChain, Network, RecordingSink, TracingSink, block_proof,
        },
        core::{ChainWork, CompactTarget, DecodedTarget, Sign, Target, U256},
        error::{Error, Result},
    };
}
