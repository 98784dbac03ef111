//! Compact ("nBits") target encoding
//!
//! A compact target is the 32-bit form of a [`U256`] target carried in block
//! headers. The high byte is a base-256 exponent, the low three bytes a
//! mantissa whose top bit is a legacy sign flag.

use crate::core::U256;
use crate::core::constants::COMPACT_MANTISSA_BYTES as MANTISSA_BYTES;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sign flag inside the mantissa
const SIGN_BIT: u32 = 0x0080_0000;

/// Mantissa bits that carry magnitude
const MANTISSA_MASK: u32 = 0x007f_ffff;

/// 32-bit compact encoding of a 256-bit target
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CompactTarget(u32);

/// Why a decoded target cannot be used as a proof-of-work target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetRejection {
    /// The sign flag is set on a nonzero mantissa
    Negative,
    /// The encoded value needs more than 256 bits
    Overflow,
    /// The decoded target is zero
    Zero,
    /// The decoded target is easier than the network's proof-of-work limit
    AboveLimit,
}

impl fmt::Display for TargetRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            TargetRejection::Negative => "negative target",
            TargetRejection::Overflow => "target overflows 256 bits",
            TargetRejection::Zero => "zero target",
            TargetRejection::AboveLimit => "target above proof-of-work limit",
        };
        f.write_str(reason)
    }
}

/// Result of decoding a compact target, with both flags surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedTarget {
    /// Decoded magnitude
    pub target: U256,
    /// Sign flag set on a nonzero mantissa
    pub negative: bool,
    /// Value would not fit in 256 bits
    pub overflow: bool,
}

impl DecodedTarget {
    /// First reason this target is unusable under `pow_limit`, if any
    pub fn rejection(&self, pow_limit: &U256) -> Option<TargetRejection> {
        if self.negative {
            Some(TargetRejection::Negative)
        } else if self.overflow {
            Some(TargetRejection::Overflow)
        } else if self.target.is_zero() {
            Some(TargetRejection::Zero)
        } else if self.target > *pow_limit {
            Some(TargetRejection::AboveLimit)
        } else {
            None
        }
    }

    /// The target if it is positive, in range and at most `pow_limit`
    pub fn into_valid(self, bits: CompactTarget, pow_limit: &U256) -> Result<U256> {
        match self.rejection(pow_limit) {
            Some(reason) => Err(Error::invalid_target(bits, reason)),
            None => Ok(self.target),
        }
    }
}

impl CompactTarget {
    /// Wrap a raw header word
    pub const fn from_consensus(bits: u32) -> Self {
        Self(bits)
    }

    /// The raw header word
    pub const fn to_consensus(self) -> u32 {
        self.0
    }

    /// Base-256 exponent (byte length of the encoded value)
    pub fn exponent(self) -> u32 {
        self.0 >> 24
    }

    /// Mantissa without the sign flag
    pub fn mantissa(self) -> u32 {
        self.0 & MANTISSA_MASK
    }

    /// Decode to a 256-bit target.
    ///
    /// The magnitude is `mantissa * 256^(exponent - 3)`, or the mantissa
    /// shifted right for exponents below 3. Negative and overflow flags are
    /// computed from the shifted mantissa and returned alongside.
    pub fn decode(self) -> DecodedTarget {
        let size = self.exponent();
        let mut word = self.mantissa();

        let target = if size <= MANTISSA_BYTES {
            word >>= 8 * (MANTISSA_BYTES - size);
            U256::from(word)
        } else {
            U256::from(word) << (8 * (size - MANTISSA_BYTES))
        };

        let negative = word != 0 && (self.0 & SIGN_BIT) != 0;
        let overflow = word != 0
            && (size > 34 || (word > 0xff && size > 33) || (word > 0xffff && size > 32));

        DecodedTarget {
            target,
            negative,
            overflow,
        }
    }

    /// Canonical compact encoding of `target`.
    ///
    /// Uses the smallest byte size that holds the value. When the top
    /// mantissa bit would be set, the mantissa moves down a byte and the
    /// exponent goes up so the result never reads as negative.
    pub fn encode(target: &U256) -> Self {
        Self::encode_signed(target, false)
    }

    /// Compact encoding with the sign flag set when `negative` and the mantissa is nonzero
    pub fn encode_signed(target: &U256, negative: bool) -> Self {
        let mut size = target.bits().div_ceil(8) as u32;
        let mut compact = if size <= MANTISSA_BYTES {
            (target.low_u64() << (8 * (MANTISSA_BYTES - size))) as u32
        } else {
            (*target >> (8 * (size - MANTISSA_BYTES))).low_u64() as u32
        };

        if compact & SIGN_BIT != 0 {
            compact >>= 8;
            size += 1;
        }

        compact |= size << 24;
        if negative && compact & MANTISSA_MASK != 0 {
            compact |= SIGN_BIT;
        }

        Self(compact)
    }

    /// Parse a hex word such as `1e0fffff` or `0x1e0fffff`
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim().trim_start_matches("0x");
        u32::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|e| Error::parse(format!("Invalid compact target {:?}: {}", hex, e)))
    }

    /// Eight-digit hex form
    pub fn to_hex(self) -> String {
        format!("{:08x}", self.0)
    }
}

impl From<u32> for CompactTarget {
    fn from(bits: u32) -> Self {
        Self(bits)
    }
}

impl From<CompactTarget> for u32 {
    fn from(bits: CompactTarget) -> Self {
        bits.0
    }
}

impl fmt::Display for CompactTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

impl fmt::Debug for CompactTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompactTarget(0x{:08x})", self.0)
    }
}

impl fmt::LowerHex for CompactTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl Serialize for CompactTarget {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for CompactTarget {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}
