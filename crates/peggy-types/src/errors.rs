//! # Error Types
//!
//! Parsing and validation errors for the shared value types.

use thiserror::Error;

/// Errors raised while constructing or parsing a value type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypesError {
    /// Input was not valid hex.
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// Input had the wrong byte length.
    #[error("Invalid length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },

    /// An address was required but the all-zero address was given.
    #[error("Empty address")]
    EmptyAddress,

    /// Nonce text was neither decimal nor an 8-byte base64 string.
    #[error("Invalid nonce: {0}")]
    InvalidNonce(String),

    /// Token was malformed.
    #[error("Invalid token: {0}")]
    InvalidToken(String),
}
