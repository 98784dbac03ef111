//! Core value types for proof-of-work arithmetic
//!
//! This module contains the fixed-width integer every consensus calculation
//! runs on and the compact target codec used in block headers.

mod compact;
mod uint256;

pub use compact::{CompactTarget, DecodedTarget, TargetRejection};
pub use uint256::{Sign, U256};

/// A proof-of-work target: the largest hash a valid block may have
pub type Target = U256;

/// Accumulated expected hashing effort along a chain
pub type ChainWork = U256;

/// Constants shared by the codec and the consensus rules
pub mod constants {
    /// Width of targets, hashes and chain work in bytes
    pub const TARGET_SIZE: usize = 32;

    /// Bytes of mantissa in a compact target
    pub const COMPACT_MANTISSA_BYTES: u32 = 3;
}
