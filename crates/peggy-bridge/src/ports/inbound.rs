//! Driving Ports (API - Inbound)
//!
//! Messages mutate bridge state and take `&mut self`: the host applies them
//! one at a time, in block order. Queries are read-only.

use crate::domain::{
    Attestation, BatchConfirm, BridgeParams, ClaimOutcome, ClaimType, ConfirmOutcome,
    ConfirmStream, EthereumClaim, OutgoingTransferTx, OutgoingTxBatch, SlashingSignal, Valset,
    ValsetConfirm,
};
use crate::error::BridgeResult;
use peggy_types::{AccountAddress, Erc20Token, EthAddress, Hash, Nonce, ValidatorAddress};

/// State-transition messages.
pub trait BridgeApi {
    /// An orchestrator reports an Ethereum event.
    ///
    /// Only the next nonce of the claim's type stream is admitted. Late
    /// claims for an already finalized nonce are recorded for audit.
    fn submit_claim(
        &mut self,
        orchestrator: &AccountAddress,
        claim: EthereumClaim,
    ) -> BridgeResult<ClaimOutcome>;

    /// An orchestrator signs the checkpoint of valset `nonce`.
    fn confirm_valset(
        &mut self,
        orchestrator: &AccountAddress,
        nonce: Nonce,
        signature: &[u8],
    ) -> BridgeResult<ConfirmOutcome>;

    /// An orchestrator signs the checkpoint of batch `nonce` for `token_contract`.
    fn confirm_batch(
        &mut self,
        orchestrator: &AccountAddress,
        nonce: Nonce,
        token_contract: &EthAddress,
        signature: &[u8],
    ) -> BridgeResult<ConfirmOutcome>;

    /// A validator registers the Ethereum key its orchestrator signs with.
    /// `signature` is by `eth_address` over `keccak256(validator)`.
    fn set_eth_address(
        &mut self,
        validator: &ValidatorAddress,
        eth_address: EthAddress,
        signature: &[u8],
    ) -> BridgeResult<()>;

    /// Queue a withdrawal. Returns the transfer id.
    fn send_to_eth(
        &mut self,
        sender: &AccountAddress,
        dest: EthAddress,
        amount: Erc20Token,
        bridge_fee: Erc20Token,
    ) -> BridgeResult<u64>;

    /// Cut a batch from the pending pool of `token_contract`.
    fn build_batch(&mut self, token_contract: &EthAddress) -> BridgeResult<OutgoingTxBatch>;

    /// Snapshot the current validator set as a new valset.
    fn request_valset(&mut self) -> BridgeResult<Valset>;

    /// Snapshot a new valset when none exists or power moved enough.
    fn update_valset_if_changed(&mut self) -> BridgeResult<Option<Valset>>;

    /// Called by the host when the signing window of valset `nonce` closed.
    fn report_missed_valset_confirmations(
        &mut self,
        nonce: Nonce,
    ) -> BridgeResult<Vec<SlashingSignal>>;

    /// Called by the host when the signing window of a batch closed.
    fn report_missed_batch_confirmations(
        &mut self,
        token_contract: &EthAddress,
        nonce: Nonce,
    ) -> BridgeResult<Vec<SlashingSignal>>;
}

/// Read-only queries.
pub trait BridgeQueries {
    fn params(&self) -> &BridgeParams;

    /// Valset the registry would produce right now; not stored.
    fn current_valset(&self) -> BridgeResult<Valset>;
    fn valset_by_nonce(&self, nonce: Nonce) -> BridgeResult<Option<Valset>>;
    /// Newest first.
    fn latest_valsets(&self, count: usize) -> BridgeResult<Vec<Valset>>;
    fn valset_checkpoint(&self, nonce: Nonce) -> BridgeResult<Hash>;
    fn valset_confirms(&self, nonce: Nonce) -> BridgeResult<Vec<ValsetConfirm>>;
    fn valset_confirm(
        &self,
        nonce: Nonce,
        validator: &ValidatorAddress,
    ) -> BridgeResult<Option<ValsetConfirm>>;
    /// Oldest stored valset `validator` has not confirmed.
    fn last_pending_valset_for(&self, validator: &ValidatorAddress)
        -> BridgeResult<Option<Valset>>;

    /// Newest pending batch for the contract.
    fn pending_batch(&self, token_contract: &EthAddress) -> BridgeResult<Option<OutgoingTxBatch>>;
    fn batch_by_nonce(
        &self,
        token_contract: &EthAddress,
        nonce: Nonce,
    ) -> BridgeResult<Option<OutgoingTxBatch>>;
    fn outgoing_batches(&self) -> BridgeResult<Vec<OutgoingTxBatch>>;
    fn batch_checkpoint(&self, token_contract: &EthAddress, nonce: Nonce) -> BridgeResult<Hash>;
    fn batch_confirms(
        &self,
        token_contract: &EthAddress,
        nonce: Nonce,
    ) -> BridgeResult<Vec<BatchConfirm>>;
    /// Oldest pending batch `validator` has not confirmed.
    fn last_pending_batch_for(
        &self,
        validator: &ValidatorAddress,
    ) -> BridgeResult<Option<OutgoingTxBatch>>;

    /// The finalized attestation at (type, nonce), else the one with the
    /// most attested power.
    fn attestation(&self, claim_type: ClaimType, nonce: Nonce) -> BridgeResult<Option<Attestation>>;
    fn last_observed_nonce(&self, claim_type: ClaimType) -> BridgeResult<Nonce>;
    fn last_confirmed_nonce(
        &self,
        validator: &ValidatorAddress,
        stream: &ConfirmStream,
    ) -> BridgeResult<Nonce>;
    fn pending_transfers(&self, token_contract: &EthAddress)
        -> BridgeResult<Vec<OutgoingTransferTx>>;
}
