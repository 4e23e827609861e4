//! # Error Types
//!
//! Errors raised while parsing opaque values.

use thiserror::Error;

/// Errors that can occur when decoding an opaque value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    /// The input was not valid hex.
    #[error("Invalid hex value {value:?}: {reason}")]
    InvalidHex { value: String, reason: String },
}
