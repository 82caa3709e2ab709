use crate::domain::{
    Attestation, AttestationKey, BatchConfirm, ClaimType, ConfirmStream, OutgoingTransferTx,
    OutgoingTxBatch, Valset, ValsetConfirm,
};
use crate::error::StoreError;
use crate::ports::{BridgeStore, StoreResult};
use peggy_types::{EthAddress, Hash, Nonce, ValidatorAddress};
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

const MIN_VALIDATOR: ValidatorAddress = ValidatorAddress::new([0u8; 20]);
const MAX_VALIDATOR: ValidatorAddress = ValidatorAddress::new([0xFFu8; 20]);

#[derive(Default)]
struct StoreState {
    attestations: BTreeMap<AttestationKey, Attestation>,
    observed_nonces: BTreeMap<ClaimType, Nonce>,
    confirm_cursors: BTreeMap<(ValidatorAddress, ConfirmStream), Nonce>,
    valsets: BTreeMap<Nonce, Valset>,
    observed_valset: Option<Nonce>,
    valset_confirms: BTreeMap<(Nonce, ValidatorAddress), ValsetConfirm>,
    batches: BTreeMap<(EthAddress, Nonce), OutgoingTxBatch>,
    last_batch_nonce: Nonce,
    batch_confirms: BTreeMap<(EthAddress, Nonce, ValidatorAddress), BatchConfirm>,
    pending: BTreeMap<u64, OutgoingTransferTx>,
    last_transfer_id: u64,
    eth_addresses: BTreeMap<ValidatorAddress, EthAddress>,
}

/// In-memory implementation of BridgeStore for testing
pub struct InMemoryBridgeStore {
    state: RwLock<StoreState>,
}

impl InMemoryBridgeStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
        }
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, StoreState>> {
        self.state.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, StoreState>> {
        self.state.write().map_err(|_| StoreError::LockPoisoned)
    }
}

impl Default for InMemoryBridgeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BridgeStore for InMemoryBridgeStore {
    fn get_attestation(
        &self,
        claim_type: ClaimType,
        nonce: Nonce,
        details_hash: &Hash,
    ) -> StoreResult<Option<Attestation>> {
        let key = AttestationKey {
            claim_type,
            nonce,
            details_hash: *details_hash,
        };
        Ok(self.read()?.attestations.get(&key).cloned())
    }

    fn attestations_at(
        &self,
        claim_type: ClaimType,
        nonce: Nonce,
    ) -> StoreResult<Vec<Attestation>> {
        let from = AttestationKey {
            claim_type,
            nonce,
            details_hash: [0u8; 32],
        };
        let to = AttestationKey {
            claim_type,
            nonce,
            details_hash: [0xFFu8; 32],
        };
        Ok(self
            .read()?
            .attestations
            .range(from..=to)
            .map(|(_, a)| a.clone())
            .collect())
    }

    fn set_attestation(&self, attestation: &Attestation) -> StoreResult<()> {
        self.write()?
            .attestations
            .insert(attestation.key(), attestation.clone());
        Ok(())
    }

    fn attestations(&self) -> StoreResult<Vec<Attestation>> {
        Ok(self.read()?.attestations.values().cloned().collect())
    }

    fn last_observed_nonce(&self, claim_type: ClaimType) -> StoreResult<Nonce> {
        Ok(self
            .read()?
            .observed_nonces
            .get(&claim_type)
            .copied()
            .unwrap_or_default())
    }

    fn set_last_observed_nonce(&self, claim_type: ClaimType, nonce: Nonce) -> StoreResult<()> {
        self.write()?.observed_nonces.insert(claim_type, nonce);
        Ok(())
    }

    fn last_confirmed_nonce(
        &self,
        validator: &ValidatorAddress,
        stream: &ConfirmStream,
    ) -> StoreResult<Nonce> {
        Ok(self
            .read()?
            .confirm_cursors
            .get(&(*validator, *stream))
            .copied()
            .unwrap_or_default())
    }

    fn set_last_confirmed_nonce(
        &self,
        validator: &ValidatorAddress,
        stream: &ConfirmStream,
        nonce: Nonce,
    ) -> StoreResult<()> {
        self.write()?
            .confirm_cursors
            .insert((*validator, *stream), nonce);
        Ok(())
    }

    fn confirm_cursors(&self) -> StoreResult<Vec<(ValidatorAddress, ConfirmStream, Nonce)>> {
        Ok(self
            .read()?
            .confirm_cursors
            .iter()
            .map(|((v, s), n)| (*v, *s, *n))
            .collect())
    }

    fn get_valset(&self, nonce: Nonce) -> StoreResult<Option<Valset>> {
        Ok(self.read()?.valsets.get(&nonce).cloned())
    }

    fn set_valset(&self, valset: &Valset) -> StoreResult<()> {
        self.write()?.valsets.insert(valset.nonce(), valset.clone());
        Ok(())
    }

    fn delete_valset(&self, nonce: Nonce) -> StoreResult<()> {
        self.write()?.valsets.remove(&nonce);
        Ok(())
    }

    fn valsets(&self) -> StoreResult<Vec<Valset>> {
        Ok(self.read()?.valsets.values().cloned().collect())
    }

    fn observed_valset_nonce(&self) -> StoreResult<Option<Nonce>> {
        Ok(self.read()?.observed_valset)
    }

    fn set_observed_valset_nonce(&self, nonce: Nonce) -> StoreResult<()> {
        self.write()?.observed_valset = Some(nonce);
        Ok(())
    }

    fn get_valset_confirm(
        &self,
        nonce: Nonce,
        validator: &ValidatorAddress,
    ) -> StoreResult<Option<ValsetConfirm>> {
        Ok(self
            .read()?
            .valset_confirms
            .get(&(nonce, *validator))
            .cloned())
    }

    fn set_valset_confirm(&self, confirm: &ValsetConfirm) -> StoreResult<()> {
        self.write()?
            .valset_confirms
            .insert((confirm.nonce, confirm.validator), confirm.clone());
        Ok(())
    }

    fn valset_confirms(&self, nonce: Nonce) -> StoreResult<Vec<ValsetConfirm>> {
        Ok(self
            .read()?
            .valset_confirms
            .range((nonce, MIN_VALIDATOR)..=(nonce, MAX_VALIDATOR))
            .map(|(_, c)| c.clone())
            .collect())
    }

    fn delete_valset_confirms(&self, nonce: Nonce) -> StoreResult<()> {
        self.write()?
            .valset_confirms
            .retain(|(n, _), _| *n != nonce);
        Ok(())
    }

    fn get_batch(
        &self,
        token_contract: &EthAddress,
        nonce: Nonce,
    ) -> StoreResult<Option<OutgoingTxBatch>> {
        Ok(self
            .read()?
            .batches
            .get(&(*token_contract, nonce))
            .cloned())
    }

    fn set_batch(&self, batch: &OutgoingTxBatch) -> StoreResult<()> {
        self.write()?
            .batches
            .insert((batch.token_contract, batch.nonce), batch.clone());
        Ok(())
    }

    fn delete_batch(&self, token_contract: &EthAddress, nonce: Nonce) -> StoreResult<()> {
        self.write()?.batches.remove(&(*token_contract, nonce));
        Ok(())
    }

    fn batches(&self) -> StoreResult<Vec<OutgoingTxBatch>> {
        Ok(self.read()?.batches.values().cloned().collect())
    }

    fn last_batch_nonce(&self) -> StoreResult<Nonce> {
        Ok(self.read()?.last_batch_nonce)
    }

    fn set_last_batch_nonce(&self, nonce: Nonce) -> StoreResult<()> {
        self.write()?.last_batch_nonce = nonce;
        Ok(())
    }

    fn get_batch_confirm(
        &self,
        token_contract: &EthAddress,
        nonce: Nonce,
        validator: &ValidatorAddress,
    ) -> StoreResult<Option<BatchConfirm>> {
        Ok(self
            .read()?
            .batch_confirms
            .get(&(*token_contract, nonce, *validator))
            .cloned())
    }

    fn set_batch_confirm(&self, confirm: &BatchConfirm) -> StoreResult<()> {
        self.write()?.batch_confirms.insert(
            (confirm.token_contract, confirm.nonce, confirm.validator),
            confirm.clone(),
        );
        Ok(())
    }

    fn batch_confirms(
        &self,
        token_contract: &EthAddress,
        nonce: Nonce,
    ) -> StoreResult<Vec<BatchConfirm>> {
        let from = (*token_contract, nonce, MIN_VALIDATOR);
        let to = (*token_contract, nonce, MAX_VALIDATOR);
        Ok(self
            .read()?
            .batch_confirms
            .range(from..=to)
            .map(|(_, c)| c.clone())
            .collect())
    }

    fn delete_batch_confirms(&self, token_contract: &EthAddress, nonce: Nonce) -> StoreResult<()> {
        self.write()?
            .batch_confirms
            .retain(|(t, n, _), _| !(t == token_contract && *n == nonce));
        Ok(())
    }

    fn pending_transfers(&self) -> StoreResult<Vec<OutgoingTransferTx>> {
        Ok(self.read()?.pending.values().cloned().collect())
    }

    fn set_pending_transfer(&self, tx: &OutgoingTransferTx) -> StoreResult<()> {
        self.write()?.pending.insert(tx.id, tx.clone());
        Ok(())
    }

    fn remove_pending_transfer(&self, id: u64) -> StoreResult<()> {
        self.write()?.pending.remove(&id);
        Ok(())
    }

    fn last_transfer_id(&self) -> StoreResult<u64> {
        Ok(self.read()?.last_transfer_id)
    }

    fn set_last_transfer_id(&self, id: u64) -> StoreResult<()> {
        self.write()?.last_transfer_id = id;
        Ok(())
    }

    fn get_eth_address(&self, validator: &ValidatorAddress) -> StoreResult<Option<EthAddress>> {
        Ok(self.read()?.eth_addresses.get(validator).copied())
    }

    fn set_eth_address(
        &self,
        validator: &ValidatorAddress,
        address: &EthAddress,
    ) -> StoreResult<()> {
        self.write()?.eth_addresses.insert(*validator, *address);
        Ok(())
    }

    fn eth_addresses(&self) -> StoreResult<Vec<(ValidatorAddress, EthAddress)>> {
        Ok(self
            .read()?
            .eth_addresses
            .iter()
            .map(|(v, a)| (*v, *a))
            .collect())
    }
}
