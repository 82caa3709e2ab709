//! # Outgoing Batches
//!
//! Withdrawals to Ethereum wait in a pending pool until a batch for their
//! token contract is built. A batch is fixed at build time: its elements,
//! their order, and the valset checkpoint it is bound to never change.
//!
//! ## Checkpoint
//!
//! ```text
//! keccak256(abi.encode(
//!     bytes32 peggy_id,
//!     bytes32 "transactionBatch",
//!     bytes32 valset_checkpoint,
//!     uint256[] amounts,
//!     address[] destinations,
//!     uint256[] fees,
//!     uint256 batch_nonce,
//!     address token_contract))
//! ```

use crate::error::{BridgeError, BridgeResult};
use peggy_crypto::{address_token, bytes32_token, encode, fixed_bytes32, keccak256, uint_token, Token};
use peggy_types::{AccountAddress, Erc20Token, EthAddress, Hash, Nonce};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Tag mixed into every batch checkpoint.
pub const BATCH_CHECKPOINT_TAG: &str = "transactionBatch";

/// A single withdrawal request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingTransferTx {
    pub id: u64,
    pub sender: AccountAddress,
    pub dest: EthAddress,
    pub amount: Erc20Token,
    pub bridge_fee: Erc20Token,
}

impl OutgoingTransferTx {
    pub fn token_contract(&self) -> EthAddress {
        self.amount.contract
    }

    /// Both tokens must be the same asset, the amount non-zero and the
    /// destination set.
    pub fn validate(&self) -> BridgeResult<()> {
        self.dest.ensure_non_empty()?;
        self.amount.validate()?;
        self.bridge_fee.validate()?;
        if !self.amount.same_asset(&self.bridge_fee) {
            return Err(BridgeError::Invalid(format!(
                "fee token {} differs from amount token {}",
                self.bridge_fee.contract, self.amount.contract
            )));
        }
        if self.amount.amount.is_zero() {
            return Err(BridgeError::Invalid("zero transfer amount".into()));
        }
        Ok(())
    }
}

/// Batch selection order: highest fee first, older transfer first on ties.
pub fn fee_order(a: &OutgoingTransferTx, b: &OutgoingTransferTx) -> Ordering {
    b.bridge_fee
        .amount
        .cmp(&a.bridge_fee.amount)
        .then_with(|| a.id.cmp(&b.id))
}

/// Batch lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BatchStatus {
    /// Waiting for confirmations and relay
    Pending,
    /// Execution on Ethereum has been attested (terminal)
    ObservedExecuted,
}

impl BatchStatus {
    pub fn can_transition_to(&self, target: BatchStatus) -> bool {
        matches!(
            (self, target),
            (BatchStatus::Pending, BatchStatus::ObservedExecuted)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchStatus::ObservedExecuted)
    }
}

/// A fixed, ordered set of transfers for one token contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingTxBatch {
    pub nonce: Nonce,
    pub elements: Vec<OutgoingTransferTx>,
    pub total_fee: Erc20Token,
    pub token_contract: EthAddress,
    /// Checkpoint of the valset this batch is to be executed under
    pub valset_checkpoint: Hash,
    pub status: BatchStatus,
}

impl OutgoingTxBatch {
    /// Assemble a pending batch from already-ordered elements.
    pub fn new(
        nonce: Nonce,
        token_contract: EthAddress,
        elements: Vec<OutgoingTransferTx>,
        valset_checkpoint: Hash,
    ) -> BridgeResult<Self> {
        token_contract.ensure_non_empty()?;
        let first = elements
            .first()
            .ok_or_else(|| BridgeError::Invalid("batch has no elements".into()))?;
        let mut total_fee = first.bridge_fee.zero_of();
        for tx in &elements {
            if tx.token_contract() != token_contract {
                return Err(BridgeError::Invalid(format!(
                    "transfer {} is for {}, batch is for {}",
                    tx.id,
                    tx.token_contract(),
                    token_contract
                )));
            }
            total_fee = total_fee.checked_add(&tx.bridge_fee)?;
        }
        Ok(Self {
            nonce,
            elements,
            total_fee,
            token_contract,
            valset_checkpoint,
            status: BatchStatus::Pending,
        })
    }

    pub fn is_pending(&self) -> bool {
        self.status == BatchStatus::Pending
    }

    pub fn transition_to(&mut self, target: BatchStatus) -> BridgeResult<()> {
        if !self.status.can_transition_to(target) {
            return Err(BridgeError::Invalid(format!(
                "batch {} cannot move from {:?} to {:?}",
                self.nonce, self.status, target
            )));
        }
        self.status = target;
        Ok(())
    }

    /// Contract-compatible checkpoint hash under bridge id `peggy_id`.
    pub fn checkpoint(&self, peggy_id: &str) -> BridgeResult<Hash> {
        let amounts = self
            .elements
            .iter()
            .map(|tx| uint_token(tx.amount.amount))
            .collect();
        let destinations = self
            .elements
            .iter()
            .map(|tx| address_token(tx.dest))
            .collect();
        let fees = self
            .elements
            .iter()
            .map(|tx| uint_token(tx.bridge_fee.amount))
            .collect();

        let encoded = encode(&[
            bytes32_token(fixed_bytes32(peggy_id)?),
            bytes32_token(fixed_bytes32(BATCH_CHECKPOINT_TAG)?),
            bytes32_token(self.valset_checkpoint),
            Token::Array(amounts),
            Token::Array(destinations),
            Token::Array(fees),
            uint_token(self.nonce.value()),
            address_token(self.token_contract),
        ]);
        Ok(keccak256(&encoded))
    }
}
