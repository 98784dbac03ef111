//! Error types for the difficulty engine
//!
//! This module provides the error taxonomy of the engine using `thiserror`
//! for automatic error trait implementations.

use crate::core::{CompactTarget, TargetRejection, U256};
use thiserror::Error;

/// Main error type for the difficulty engine
#[derive(Error, Debug)]
pub enum Error {
    /// A compact target that cannot be used: negative, overflowing, zero or above the limit
    #[error("Invalid target {bits}: {reason}")]
    InvalidTarget {
        /// The offending header word
        bits: CompactTarget,
        /// Why it was rejected
        reason: TargetRejection,
    },

    /// A block hash above its claimed target
    #[error("Insufficient work: hash {hash:#x} exceeds target {target:#x}")]
    InsufficientWork {
        /// The block hash as a 256-bit value
        hash: U256,
        /// The decoded target it had to meet
        target: U256,
    },

    /// The chain view broke a guarantee the rules rely on
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Division of a 256-bit value by zero
    #[error("Division by zero")]
    DivisionByZero,

    /// Malformed textual input (hex values, compact words)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for the difficulty engine
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an invalid target error
    pub fn invalid_target(bits: CompactTarget, reason: TargetRejection) -> Self {
        Self::InvalidTarget { bits, reason }
    }

    /// Create an invariant violation error
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the caller must abort instead of treating this as a validation failure
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::InvariantViolation(_) | Error::DivisionByZero)
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Error::InvalidTarget { .. } => "invalid_target",
            Error::InsufficientWork { .. } => "insufficient_work",
            Error::InvariantViolation(_) => "invariant_violation",
            Error::DivisionByZero => "division_by_zero",
            Error::Parse(_) => "parse",
            Error::Config(_) => "config",
            Error::Io(_) => "io",
            Error::Json(_) => "json",
        }
    }
}
