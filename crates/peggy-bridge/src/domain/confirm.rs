//! Orchestrator confirmations of valset and batch checkpoints.

use peggy_crypto::EthSignature;
use peggy_types::{AccountAddress, EthAddress, Nonce, ValidatorAddress};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A confirmation nonce stream. Batch streams are per token contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConfirmStream {
    Valset,
    Batch(EthAddress),
}

impl ConfirmStream {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfirmStream::Valset => "valset",
            ConfirmStream::Batch(_) => "batch",
        }
    }
}

impl fmt::Display for ConfirmStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfirmStream::Valset => f.write_str("valset"),
            ConfirmStream::Batch(token) => write!(f, "batch/{token}"),
        }
    }
}

/// Signature over a valset checkpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValsetConfirm {
    pub nonce: Nonce,
    pub validator: ValidatorAddress,
    pub orchestrator: AccountAddress,
    pub eth_address: EthAddress,
    pub signature: EthSignature,
}

/// Signature over a batch checkpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfirm {
    pub nonce: Nonce,
    pub token_contract: EthAddress,
    pub validator: ValidatorAddress,
    pub orchestrator: AccountAddress,
    pub eth_address: EthAddress,
    pub signature: EthSignature,
}

/// Result of a confirmation that was not rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Stored,
    /// Identical confirmation already on record
    Duplicate,
}
