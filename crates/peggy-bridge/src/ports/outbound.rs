//! Driven Ports (SPI - Outbound Dependencies)
//!
//! The host chain supplies persisted state, the staking registry, the token
//! ledger and the slashing module. The core reaches all of them only through
//! these traits.

use crate::domain::{
    voucher_denom, Attestation, BatchConfirm, ClaimType, ConfirmStream, OutgoingTransferTx,
    OutgoingTxBatch, SlashingSignal, Valset, ValsetConfirm,
};
use crate::error::{BridgeResult, StoreError};
use peggy_types::{AccountAddress, EthAddress, Hash, Nonce, ValidatorAddress, U256};

pub type StoreResult<T> = Result<T, StoreError>;

/// Persisted bridge state, keyed by each entity's natural key.
///
/// Mutations are expected to be transactional with the surrounding host
/// state transition: a failed operation is rolled back by the host.
pub trait BridgeStore: Send + Sync {
    // --- attestations, keyed by (type, nonce, details) ---
    fn get_attestation(
        &self,
        claim_type: ClaimType,
        nonce: Nonce,
        details_hash: &Hash,
    ) -> StoreResult<Option<Attestation>>;
    /// Every attestation at (type, nonce), any details.
    fn attestations_at(&self, claim_type: ClaimType, nonce: Nonce)
        -> StoreResult<Vec<Attestation>>;
    fn set_attestation(&self, attestation: &Attestation) -> StoreResult<()>;
    fn attestations(&self) -> StoreResult<Vec<Attestation>>;

    // --- claim stream cursors ---
    fn last_observed_nonce(&self, claim_type: ClaimType) -> StoreResult<Nonce>;
    fn set_last_observed_nonce(&self, claim_type: ClaimType, nonce: Nonce) -> StoreResult<()>;

    // --- confirmation stream cursors ---
    fn last_confirmed_nonce(
        &self,
        validator: &ValidatorAddress,
        stream: &ConfirmStream,
    ) -> StoreResult<Nonce>;
    fn set_last_confirmed_nonce(
        &self,
        validator: &ValidatorAddress,
        stream: &ConfirmStream,
        nonce: Nonce,
    ) -> StoreResult<()>;
    fn confirm_cursors(&self) -> StoreResult<Vec<(ValidatorAddress, ConfirmStream, Nonce)>>;

    // --- valsets, keyed by nonce ---
    fn get_valset(&self, nonce: Nonce) -> StoreResult<Option<Valset>>;
    fn set_valset(&self, valset: &Valset) -> StoreResult<()>;
    fn delete_valset(&self, nonce: Nonce) -> StoreResult<()>;
    /// Ascending by nonce.
    fn valsets(&self) -> StoreResult<Vec<Valset>>;
    /// Newest valset the contract is known to hold.
    fn observed_valset_nonce(&self) -> StoreResult<Option<Nonce>>;
    fn set_observed_valset_nonce(&self, nonce: Nonce) -> StoreResult<()>;

    // --- valset confirmations, keyed by (nonce, validator) ---
    fn get_valset_confirm(
        &self,
        nonce: Nonce,
        validator: &ValidatorAddress,
    ) -> StoreResult<Option<ValsetConfirm>>;
    fn set_valset_confirm(&self, confirm: &ValsetConfirm) -> StoreResult<()>;
    fn valset_confirms(&self, nonce: Nonce) -> StoreResult<Vec<ValsetConfirm>>;
    fn delete_valset_confirms(&self, nonce: Nonce) -> StoreResult<()>;

    // --- batches, keyed by (token contract, nonce) ---
    fn get_batch(&self, token_contract: &EthAddress, nonce: Nonce)
        -> StoreResult<Option<OutgoingTxBatch>>;
    fn set_batch(&self, batch: &OutgoingTxBatch) -> StoreResult<()>;
    fn delete_batch(&self, token_contract: &EthAddress, nonce: Nonce) -> StoreResult<()>;
    /// Ascending by (token contract, nonce).
    fn batches(&self) -> StoreResult<Vec<OutgoingTxBatch>>;
    fn last_batch_nonce(&self) -> StoreResult<Nonce>;
    fn set_last_batch_nonce(&self, nonce: Nonce) -> StoreResult<()>;

    // --- batch confirmations, keyed by (token contract, nonce, validator) ---
    fn get_batch_confirm(
        &self,
        token_contract: &EthAddress,
        nonce: Nonce,
        validator: &ValidatorAddress,
    ) -> StoreResult<Option<BatchConfirm>>;
    fn set_batch_confirm(&self, confirm: &BatchConfirm) -> StoreResult<()>;
    fn batch_confirms(
        &self,
        token_contract: &EthAddress,
        nonce: Nonce,
    ) -> StoreResult<Vec<BatchConfirm>>;
    fn delete_batch_confirms(&self, token_contract: &EthAddress, nonce: Nonce)
        -> StoreResult<()>;

    // --- pending transfer pool, keyed by id ---
    /// Ascending by id.
    fn pending_transfers(&self) -> StoreResult<Vec<OutgoingTransferTx>>;
    fn set_pending_transfer(&self, tx: &OutgoingTransferTx) -> StoreResult<()>;
    fn remove_pending_transfer(&self, id: u64) -> StoreResult<()>;
    fn last_transfer_id(&self) -> StoreResult<u64>;
    fn set_last_transfer_id(&self, id: u64) -> StoreResult<()>;

    // --- orchestrator Ethereum keys ---
    fn get_eth_address(&self, validator: &ValidatorAddress) -> StoreResult<Option<EthAddress>>;
    fn set_eth_address(&self, validator: &ValidatorAddress, address: &EthAddress)
        -> StoreResult<()>;
    fn eth_addresses(&self) -> StoreResult<Vec<(ValidatorAddress, EthAddress)>>;
}

/// Staking registry view.
pub trait ValidatorRegistry: Send + Sync {
    fn total_bonded_power(&self) -> BridgeResult<u64>;
    /// Zero for unknown or unbonded validators.
    fn power_of(&self, validator: &ValidatorAddress) -> BridgeResult<u64>;
    /// Validator that delegated signing to `orchestrator`, if any.
    fn resolve_orchestrator(
        &self,
        orchestrator: &AccountAddress,
    ) -> BridgeResult<Option<ValidatorAddress>>;
    fn is_bonded(&self, validator: &ValidatorAddress) -> BridgeResult<bool>;
    /// All bonded validators with their power.
    fn bonded_validators(&self) -> BridgeResult<Vec<(ValidatorAddress, u64)>>;
}

/// Host token ledger.
pub trait TokenLedger: Send + Sync {
    fn mint_to(&self, account: &AccountAddress, amount: U256, denom: &str) -> BridgeResult<()>;
    /// Fails with `Invalid` on insufficient balance.
    fn burn_from(&self, account: &AccountAddress, amount: U256, denom: &str) -> BridgeResult<()>;
    /// Ledger denomination of an ERC20 token.
    fn denom_for(&self, token_contract: &EthAddress, symbol: &str) -> String {
        voucher_denom(token_contract, symbol)
    }
}

/// Receives slashing evidence; execution is up to the host.
pub trait SlashingSink: Send + Sync {
    fn submit(&self, signal: SlashingSignal) -> BridgeResult<()>;
}
