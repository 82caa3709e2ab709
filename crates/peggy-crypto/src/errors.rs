//! # Crypto Errors

use peggy_types::EthAddress;
use thiserror::Error;

/// Errors raised by the signature codec.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// No signing key was supplied.
    #[error("Missing private key")]
    MissingKey,

    /// Signature is not exactly 65 bytes.
    #[error("Invalid signature length: expected 65 bytes, got {0}")]
    InvalidLength(usize),

    /// Recovery byte must be 0, 1, 27 or 28.
    #[error("Invalid recovery ID: {0}")]
    InvalidRecoveryId(u8),

    /// r/s do not form a valid signature.
    #[error("Invalid signature format")]
    InvalidFormat,

    /// Public key recovery failed.
    #[error("Failed to recover public key")]
    RecoveryFailed,

    /// Recovered signer differs from the expected address.
    #[error("Signer mismatch: expected {expected}, got {actual}")]
    SignerMismatch {
        expected: EthAddress,
        actual: EthAddress,
    },

    #[error("Signing failed: {0}")]
    SigningFailed(String),
}

/// Errors raised while preparing checkpoint ABI values.
///
/// Any of these while hashing a checkpoint means the input violated an
/// invariant the caller should already have enforced.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AbiError {
    /// A string tag does not fit in `bytes32`.
    #[error("Value of {0} bytes does not fit in bytes32")]
    FixedBytesOverflow(usize),
}
