//! 256-bit unsigned integer for consensus arithmetic
//!
//! [`U256`] comes from `uint::construct_uint!`: four little-endian `u64`
//! words with checked, overflowing and panicking operators. This module adds
//! the pieces consensus code needs on top:
//!
//! - [`U256::abs_diff_signed`] returns a magnitude and a separate [`Sign`],
//!   since the type itself is unsigned.
//! - [`U256::from_hex`] and [`U256::to_hex`] use fixed-width big-endian hex,
//!   which is also the serde form.

use crate::core::constants::TARGET_SIZE;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

mod inner {
    use uint::construct_uint;

    construct_uint! {
        /// A 256-bit unsigned integer stored as four little-endian 64-bit words
        pub struct U256(4);
    }
}

pub use inner::U256;

/// Sign attached to the magnitude returned by [`U256::abs_diff_signed`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sign {
    /// `a >= b`
    Positive,
    /// `a < b`
    Negative,
}

impl Sign {
    /// Apply the sign to a non-negative machine integer
    pub fn apply(self, magnitude: i64) -> i64 {
        match self {
            Sign::Positive => magnitude,
            Sign::Negative => -magnitude,
        }
    }
}

impl U256 {
    /// Parse a big-endian hex string of at most 64 digits, with an optional `0x` prefix
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim().trim_start_matches("0x");
        if digits.is_empty() || digits.len() > 2 * TARGET_SIZE {
            return Err(Error::parse(format!(
                "Expected 1 to {} hex digits, got {}",
                2 * TARGET_SIZE,
                digits.len()
            )));
        }

        // Left-pad to a full 32-byte value
        let padded = format!("{:0>64}", digits);
        let mut bytes = [0u8; TARGET_SIZE];
        hex::decode_to_slice(&padded, &mut bytes)
            .map_err(|e| Error::parse(format!("Invalid hex: {}", e)))?;
        Ok(Self::from_big_endian(&bytes))
    }

    /// Big-endian hex string, always 64 digits
    pub fn to_hex(&self) -> String {
        let [w0, w1, w2, w3] = self.0;
        format!("{:016x}{:016x}{:016x}{:016x}", w3, w2, w1, w0)
    }

    /// Magnitude of `self - other` together with its sign.
    ///
    /// The sign is [`Sign::Negative`] only when `self < other`; a zero
    /// difference is positive.
    pub fn abs_diff_signed(&self, other: &U256) -> (U256, Sign) {
        if self < other {
            (*other - *self, Sign::Negative)
        } else {
            (*self - *other, Sign::Positive)
        }
    }
}

impl Serialize for U256 {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for U256 {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}
