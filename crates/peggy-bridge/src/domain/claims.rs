//! # Ethereum Claims
//!
//! A claim is one orchestrator's assertion that an event happened on
//! Ethereum. Claim kinds form a closed set; each carries its event nonce and
//! a payload, and reduces the payload to a details fingerprint. Two claims
//! are the same claim iff type, nonce and fingerprint all match.

use crate::error::{BridgeError, BridgeResult};
use peggy_crypto::keccak256;
use peggy_types::{AccountAddress, Erc20Token, EthAddress, Hash, Nonce};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Claim kinds. Each kind is its own nonce stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClaimType {
    Deposit,
    WithdrawalBatchExecuted,
    ValsetUpdateExecuted,
}

impl ClaimType {
    pub const ALL: [ClaimType; 3] = [
        ClaimType::Deposit,
        ClaimType::WithdrawalBatchExecuted,
        ClaimType::ValsetUpdateExecuted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimType::Deposit => "deposit",
            ClaimType::WithdrawalBatchExecuted => "withdrawal_batch_executed",
            ClaimType::ValsetUpdateExecuted => "valset_update_executed",
        }
    }

    fn tag(&self) -> u8 {
        match self {
            ClaimType::Deposit => 1,
            ClaimType::WithdrawalBatchExecuted => 2,
            ClaimType::ValsetUpdateExecuted => 3,
        }
    }
}

impl fmt::Display for ClaimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An observed Ethereum event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EthereumClaim {
    /// Tokens locked in the bridge contract for a host-chain account.
    Deposit {
        nonce: Nonce,
        token: Erc20Token,
        eth_sender: EthAddress,
        cosmos_receiver: AccountAddress,
    },
    /// A batch was submitted to and executed by the contract.
    WithdrawalBatchExecuted {
        nonce: Nonce,
        batch_nonce: Nonce,
        token_contract: EthAddress,
    },
    /// The contract switched to a new valset.
    ValsetUpdateExecuted { nonce: Nonce, valset_nonce: Nonce },
}

impl EthereumClaim {
    pub fn claim_type(&self) -> ClaimType {
        match self {
            EthereumClaim::Deposit { .. } => ClaimType::Deposit,
            EthereumClaim::WithdrawalBatchExecuted { .. } => ClaimType::WithdrawalBatchExecuted,
            EthereumClaim::ValsetUpdateExecuted { .. } => ClaimType::ValsetUpdateExecuted,
        }
    }

    /// Event nonce on this claim type's stream.
    pub fn nonce(&self) -> Nonce {
        match self {
            EthereumClaim::Deposit { nonce, .. }
            | EthereumClaim::WithdrawalBatchExecuted { nonce, .. }
            | EthereumClaim::ValsetUpdateExecuted { nonce, .. } => *nonce,
        }
    }

    pub fn validate(&self) -> BridgeResult<()> {
        if self.nonce().value() == 0 {
            return Err(BridgeError::Invalid("claim nonce must be positive".into()));
        }
        match self {
            EthereumClaim::Deposit {
                token,
                eth_sender,
                cosmos_receiver,
                ..
            } => {
                token.validate()?;
                if token.amount.is_zero() {
                    return Err(BridgeError::Invalid("zero deposit amount".into()));
                }
                eth_sender.ensure_non_empty()?;
                if cosmos_receiver.is_empty() {
                    return Err(BridgeError::Invalid("empty deposit receiver".into()));
                }
            }
            EthereumClaim::WithdrawalBatchExecuted {
                batch_nonce,
                token_contract,
                ..
            } => {
                token_contract.ensure_non_empty()?;
                if batch_nonce.value() == 0 {
                    return Err(BridgeError::Invalid("batch nonce must be positive".into()));
                }
            }
            EthereumClaim::ValsetUpdateExecuted { valset_nonce, .. } => {
                if valset_nonce.value() == 0 {
                    return Err(BridgeError::Invalid("valset nonce must be positive".into()));
                }
            }
        }
        Ok(())
    }

    /// Hash of the semantic payload, excluding the event nonce.
    pub fn details_fingerprint(&self) -> Hash {
        let mut buf = vec![self.claim_type().tag()];
        match self {
            EthereumClaim::Deposit {
                token,
                eth_sender,
                cosmos_receiver,
                ..
            } => {
                let mut amount = [0u8; 32];
                token.amount.to_big_endian(&mut amount);
                buf.extend_from_slice(&amount);
                buf.extend_from_slice(token.contract.as_bytes());
                buf.extend_from_slice(&(token.symbol.len() as u32).to_be_bytes());
                buf.extend_from_slice(token.symbol.as_bytes());
                buf.extend_from_slice(eth_sender.as_bytes());
                buf.extend_from_slice(cosmos_receiver.as_bytes());
            }
            EthereumClaim::WithdrawalBatchExecuted {
                batch_nonce,
                token_contract,
                ..
            } => {
                buf.extend_from_slice(&batch_nonce.to_be_bytes());
                buf.extend_from_slice(token_contract.as_bytes());
            }
            EthereumClaim::ValsetUpdateExecuted { valset_nonce, .. } => {
                buf.extend_from_slice(&valset_nonce.to_be_bytes());
            }
        }
        keccak256(&buf)
    }
}
