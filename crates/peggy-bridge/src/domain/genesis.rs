//! # Genesis State
//!
//! Everything the bridge persists, in one serialisable document. Importing
//! and exporting through [`crate::BridgeService`] round-trips it exactly.

use super::attestation::Attestation;
use super::batch::{OutgoingTransferTx, OutgoingTxBatch};
use super::claims::ClaimType;
use super::confirm::{BatchConfirm, ConfirmStream, ValsetConfirm};
use super::params::BridgeParams;
use super::valset::Valset;
use crate::error::{BridgeError, BridgeResult};
use peggy_types::{EthAddress, Nonce, ValidatorAddress};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthAddressRegistration {
    pub validator: ValidatorAddress,
    pub eth_address: EthAddress,
}

/// Last observed nonce of one claim stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimCursor {
    pub claim_type: ClaimType,
    pub nonce: Nonce,
}

/// Last confirmed nonce of one validator on one confirmation stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmCursor {
    pub validator: ValidatorAddress,
    pub stream: ConfirmStream,
    pub nonce: Nonce,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenesisState {
    pub params: BridgeParams,
    pub valsets: Vec<Valset>,
    pub observed_valset_nonce: Option<Nonce>,
    pub valset_confirms: Vec<ValsetConfirm>,
    pub batches: Vec<OutgoingTxBatch>,
    pub batch_confirms: Vec<BatchConfirm>,
    pub attestations: Vec<Attestation>,
    pub pending_transfers: Vec<OutgoingTransferTx>,
    pub eth_addresses: Vec<EthAddressRegistration>,
    pub claim_cursors: Vec<ClaimCursor>,
    pub confirm_cursors: Vec<ConfirmCursor>,
    pub last_transfer_id: u64,
    pub last_batch_nonce: Nonce,
}

impl GenesisState {
    pub fn new(params: BridgeParams) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> BridgeResult<Self> {
        serde_json::from_str(json).map_err(|e| BridgeError::Invalid(format!("genesis: {e}")))
    }

    pub fn to_json(&self) -> BridgeResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| BridgeError::Invalid(format!("genesis: {e}")))
    }

    /// Structural checks; nothing is written until these pass.
    pub fn validate(&self) -> BridgeResult<()> {
        self.params.validate()?;

        let mut valset_nonces = BTreeSet::new();
        for valset in &self.valsets {
            valset.validate()?;
            if !valset_nonces.insert(valset.nonce()) {
                return Err(BridgeError::Invalid(format!(
                    "duplicate valset nonce {}",
                    valset.nonce()
                )));
            }
        }
        for confirm in &self.valset_confirms {
            if !valset_nonces.contains(&confirm.nonce) {
                return Err(BridgeError::Invalid(format!(
                    "confirm for unknown valset {}",
                    confirm.nonce
                )));
            }
        }

        let mut batch_keys = BTreeSet::new();
        for batch in &self.batches {
            if batch.nonce > self.last_batch_nonce {
                return Err(BridgeError::Invalid(format!(
                    "batch {} is above last_batch_nonce {}",
                    batch.nonce, self.last_batch_nonce
                )));
            }
            if !batch_keys.insert((batch.token_contract, batch.nonce)) {
                return Err(BridgeError::Invalid(format!(
                    "duplicate batch {} for {}",
                    batch.nonce, batch.token_contract
                )));
            }
        }
        for confirm in &self.batch_confirms {
            if !batch_keys.contains(&(confirm.token_contract, confirm.nonce)) {
                return Err(BridgeError::Invalid(format!(
                    "confirm for unknown batch {} of {}",
                    confirm.nonce, confirm.token_contract
                )));
            }
        }

        let mut ids = BTreeSet::new();
        for tx in &self.pending_transfers {
            tx.validate()?;
            if tx.id == 0 || tx.id > self.last_transfer_id || !ids.insert(tx.id) {
                return Err(BridgeError::Invalid(format!("bad transfer id {}", tx.id)));
            }
        }

        for att in &self.attestations {
            att.claim.validate()?;
            if att.details_hash != att.claim.details_fingerprint() {
                return Err(BridgeError::Invalid(format!(
                    "attestation {} {} has a stale details hash",
                    att.claim_type(),
                    att.nonce()
                )));
            }
        }

        let mut registered = BTreeSet::new();
        for reg in &self.eth_addresses {
            reg.eth_address.ensure_non_empty()?;
            if !registered.insert(reg.eth_address) {
                return Err(BridgeError::Invalid(format!(
                    "eth address {} registered twice",
                    reg.eth_address
                )));
            }
        }
        Ok(())
    }
}
