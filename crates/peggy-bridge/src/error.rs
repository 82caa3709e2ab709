//! Error types for the bridge core

use peggy_crypto::{AbiError, SignatureError};
use peggy_types::{Nonce, TypesError};
use thiserror::Error;

/// Errors raised by the persisted-store port.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Lock poisoned by a panicking writer
    #[error("Store lock poisoned")]
    LockPoisoned,

    /// Backend failure
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Bridge core errors.
///
/// Duplicate, equivocating and already-finalized claims are not errors; they
/// are reported through [`crate::domain::ClaimOutcome`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BridgeError {
    /// Malformed input: bad address, signature, empty required field
    #[error("Invalid: {0}")]
    Invalid(String),

    /// Nonce is not the next one expected on its stream
    #[error("Out of sequence: expected nonce {expected}, got {got}")]
    OutOfSequence { expected: Nonce, got: Nonce },

    /// Sender is not a bonded validator or its delegated orchestrator
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Referenced valset/batch/attestation does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Checkpoint encoding failed on input that should have been well formed.
    /// The transition must be abandoned.
    #[error("Fatal: {0}")]
    Fatal(String),
}

impl BridgeError {
    /// Short label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            BridgeError::Invalid(_) => "invalid",
            BridgeError::OutOfSequence { .. } => "out_of_sequence",
            BridgeError::Unauthorized(_) => "unauthorized",
            BridgeError::NotFound(_) => "not_found",
            BridgeError::Store(_) => "store",
            BridgeError::Fatal(_) => "fatal",
        }
    }
}

impl From<TypesError> for BridgeError {
    fn from(e: TypesError) -> Self {
        BridgeError::Invalid(e.to_string())
    }
}

impl From<SignatureError> for BridgeError {
    fn from(e: SignatureError) -> Self {
        BridgeError::Invalid(format!("signature: {e}"))
    }
}

impl From<AbiError> for BridgeError {
    fn from(e: AbiError) -> Self {
        BridgeError::Fatal(format!("checkpoint encoding: {e}"))
    }
}

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;
