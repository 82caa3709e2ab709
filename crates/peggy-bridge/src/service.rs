//! Bridge Service - the consensus core
//!
//! Applies claims, confirmations and pool messages one at a time against the
//! outbound ports. Every message validates fully before its first write.

use crate::domain::{
    fee_order, normalize_power, Attestation, BatchConfirm, BatchStatus, BridgeParams,
    BridgeValidator, ClaimCursor, ClaimOutcome, ClaimType, ConfirmCursor, ConfirmOutcome,
    ConfirmStream, EthAddressRegistration, EthereumClaim, GenesisState, OutgoingTransferTx,
    OutgoingTxBatch, SlashingSignal, Valset, ValsetConfirm,
};
use crate::error::{BridgeError, BridgeResult};
use crate::metrics;
use crate::ports::inbound::{BridgeApi, BridgeQueries};
use crate::ports::outbound::{BridgeStore, SlashingSink, TokenLedger, ValidatorRegistry};
use peggy_crypto::{keccak256, verify_eth_signature, EthSignature};
use peggy_types::{AccountAddress, Erc20Token, EthAddress, Hash, Nonce, ValidatorAddress};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The bridge state machine.
pub struct BridgeService<S, R, L, K>
where
    S: BridgeStore,
    R: ValidatorRegistry,
    L: TokenLedger,
    K: SlashingSink,
{
    params: BridgeParams,
    store: Arc<S>,
    registry: Arc<R>,
    ledger: Arc<L>,
    slashing: Arc<K>,
}

impl<S, R, L, K> BridgeService<S, R, L, K>
where
    S: BridgeStore,
    R: ValidatorRegistry,
    L: TokenLedger,
    K: SlashingSink,
{
    pub fn new(
        params: BridgeParams,
        store: Arc<S>,
        registry: Arc<R>,
        ledger: Arc<L>,
        slashing: Arc<K>,
    ) -> BridgeResult<Self> {
        params.validate()?;
        Ok(Self {
            params,
            store,
            registry,
            ledger,
            slashing,
        })
    }

    /// Load a genesis state into the store. Params are replaced.
    pub fn init_genesis(&mut self, genesis: GenesisState) -> BridgeResult<()> {
        genesis.validate()?;

        for valset in &genesis.valsets {
            self.store.set_valset(valset)?;
        }
        if let Some(nonce) = genesis.observed_valset_nonce {
            self.store.set_observed_valset_nonce(nonce)?;
        }
        for confirm in &genesis.valset_confirms {
            self.store.set_valset_confirm(confirm)?;
        }
        for batch in &genesis.batches {
            self.store.set_batch(batch)?;
        }
        for confirm in &genesis.batch_confirms {
            self.store.set_batch_confirm(confirm)?;
        }
        for attestation in &genesis.attestations {
            self.store.set_attestation(attestation)?;
        }
        for tx in &genesis.pending_transfers {
            self.store.set_pending_transfer(tx)?;
        }
        for registration in &genesis.eth_addresses {
            self.store
                .set_eth_address(&registration.validator, &registration.eth_address)?;
        }
        for cursor in &genesis.claim_cursors {
            self.store
                .set_last_observed_nonce(cursor.claim_type, cursor.nonce)?;
        }
        for cursor in &genesis.confirm_cursors {
            self.store
                .set_last_confirmed_nonce(&cursor.validator, &cursor.stream, cursor.nonce)?;
        }
        self.store.set_last_transfer_id(genesis.last_transfer_id)?;
        self.store.set_last_batch_nonce(genesis.last_batch_nonce)?;

        info!(
            peggy_id = %genesis.params.peggy_id,
            valsets = genesis.valsets.len(),
            batches = genesis.batches.len(),
            attestations = genesis.attestations.len(),
            "Bridge genesis loaded"
        );
        self.params = genesis.params;
        Ok(())
    }

    pub fn export_genesis(&self) -> BridgeResult<GenesisState> {
        let mut valset_confirms = Vec::new();
        let valsets = self.store.valsets()?;
        for valset in &valsets {
            valset_confirms.extend(self.store.valset_confirms(valset.nonce())?);
        }
        let mut batch_confirms = Vec::new();
        let batches = self.store.batches()?;
        for batch in &batches {
            batch_confirms.extend(self.store.batch_confirms(&batch.token_contract, batch.nonce)?);
        }

        let mut claim_cursors = Vec::new();
        for claim_type in ClaimType::ALL {
            let nonce = self.store.last_observed_nonce(claim_type)?;
            if nonce.value() > 0 {
                claim_cursors.push(ClaimCursor { claim_type, nonce });
            }
        }
        let confirm_cursors = self
            .store
            .confirm_cursors()?
            .into_iter()
            .map(|(validator, stream, nonce)| ConfirmCursor {
                validator,
                stream,
                nonce,
            })
            .collect();
        let eth_addresses = self
            .store
            .eth_addresses()?
            .into_iter()
            .map(|(validator, eth_address)| EthAddressRegistration {
                validator,
                eth_address,
            })
            .collect();

        Ok(GenesisState {
            params: self.params.clone(),
            valsets,
            observed_valset_nonce: self.store.observed_valset_nonce()?,
            valset_confirms,
            batches,
            batch_confirms,
            attestations: self.store.attestations()?,
            pending_transfers: self.store.pending_transfers()?,
            eth_addresses,
            claim_cursors,
            confirm_cursors,
            last_transfer_id: self.store.last_transfer_id()?,
            last_batch_nonce: self.store.last_batch_nonce()?,
        })
    }

    // =========================================================================
    // Authorization
    // =========================================================================

    /// Validator behind `orchestrator`, with its power. Must be bonded with
    /// non-zero power.
    fn resolve_signer(&self, orchestrator: &AccountAddress) -> BridgeResult<(ValidatorAddress, u64)> {
        let validator = self
            .registry
            .resolve_orchestrator(orchestrator)?
            .ok_or_else(|| {
                BridgeError::Unauthorized(format!("{orchestrator} is not a delegated orchestrator"))
            })?;
        if !self.registry.is_bonded(&validator)? {
            return Err(BridgeError::Unauthorized(format!(
                "validator {validator} is not bonded"
            )));
        }
        let power = self.registry.power_of(&validator)?;
        if power == 0 {
            return Err(BridgeError::Unauthorized(format!(
                "validator {validator} has no power"
            )));
        }
        Ok((validator, power))
    }

    /// Resolved validator and the Ethereum key it registered.
    fn resolve_confirmer(
        &self,
        orchestrator: &AccountAddress,
    ) -> BridgeResult<(ValidatorAddress, EthAddress)> {
        let (validator, _) = self.resolve_signer(orchestrator)?;
        let eth_address = self.store.get_eth_address(&validator)?.ok_or_else(|| {
            BridgeError::Unauthorized(format!("validator {validator} has no Ethereum key"))
        })?;
        Ok((validator, eth_address))
    }

    // =========================================================================
    // Claims
    // =========================================================================

    fn process_claim(
        &self,
        orchestrator: &AccountAddress,
        claim: EthereumClaim,
    ) -> BridgeResult<ClaimOutcome> {
        claim.validate()?;
        let (validator, power) = self.resolve_signer(orchestrator)?;

        let claim_type = claim.claim_type();
        let nonce = claim.nonce();
        let details = claim.details_fingerprint();
        let cursor = self.store.last_observed_nonce(claim_type)?;
        let expected = next_nonce(cursor)?;

        if nonce <= cursor {
            return self.record_late_claim(validator, claim, details, expected);
        }
        if nonce != expected {
            return Err(BridgeError::OutOfSequence {
                expected,
                got: nonce,
            });
        }

        let existing = self.store.attestations_at(claim_type, nonce)?;
        let prior = existing
            .iter()
            .find(|a| a.has_voted(&validator))
            .map(|a| a.details_hash);
        let mut attestation = existing
            .into_iter()
            .find(|a| a.details_hash == details)
            .unwrap_or_else(|| Attestation::new(claim));

        if let Some(first_details) = prior {
            if first_details == details || attestation.is_recorded(&validator) {
                // Bonded power may have dropped since the last vote
                if self.finalize_if_met(&mut attestation)? {
                    return Ok(ClaimOutcome::Finalized);
                }
                return Ok(ClaimOutcome::Duplicate);
            }
            return self.flag_equivocation(attestation, validator, first_details);
        }

        attestation.add_vote(validator, power)?;
        if self.finalize_if_met(&mut attestation)? {
            return Ok(ClaimOutcome::Finalized);
        }

        self.store.set_attestation(&attestation)?;
        debug!(
            %validator,
            %claim_type,
            nonce = nonce.value(),
            attested_power = %attestation.attested_power(),
            "Claim accepted"
        );
        Ok(ClaimOutcome::Accepted)
    }

    /// A claim at or below the cursor: audit record against a finalized
    /// attestation, never a vote.
    fn record_late_claim(
        &self,
        validator: ValidatorAddress,
        claim: EthereumClaim,
        details: Hash,
        expected: Nonce,
    ) -> BridgeResult<ClaimOutcome> {
        let claim_type = claim.claim_type();
        let nonce = claim.nonce();
        let existing = self.store.attestations_at(claim_type, nonce)?;
        if !existing.iter().any(|a| a.finalized) {
            return Err(BridgeError::OutOfSequence {
                expected,
                got: nonce,
            });
        }

        let prior = existing
            .iter()
            .find(|a| a.details_hash != details && a.is_recorded(&validator))
            .map(|a| a.details_hash);
        let mut attestation = existing
            .into_iter()
            .find(|a| a.details_hash == details)
            .unwrap_or_else(|| Attestation::new(claim));
        if attestation.is_recorded(&validator) {
            return Ok(ClaimOutcome::Duplicate);
        }
        if let Some(first_details) = prior {
            return self.flag_equivocation(attestation, validator, first_details);
        }
        attestation.record_audit(validator);
        self.store.set_attestation(&attestation)?;

        if attestation.finalized {
            debug!(%validator, %claim_type, nonce = nonce.value(), "Late claim recorded");
            Ok(ClaimOutcome::AuditRecorded)
        } else {
            warn!(
                %validator,
                %claim_type,
                nonce = nonce.value(),
                "Claim conflicts with finalized attestation"
            );
            Ok(ClaimOutcome::AlreadyFinalized)
        }
    }

    /// Finalize `attestation` if its power clears the threshold against the
    /// current bonded set. Applies the side effect, persists the attestation
    /// and advances the claim cursor on the transition.
    fn finalize_if_met(&self, attestation: &mut Attestation) -> BridgeResult<bool> {
        let total_power = self.registry.total_bonded_power()?;
        if !attestation.try_finalize(
            u128::from(total_power),
            &self.params.attestation_threshold,
        ) {
            return Ok(false);
        }
        let claim_type = attestation.claim_type();
        let nonce = attestation.nonce();
        self.apply_claim(&attestation.claim)?;
        self.store.set_attestation(attestation)?;
        self.store.set_last_observed_nonce(claim_type, nonce)?;
        info!(
            %claim_type,
            nonce = nonce.value(),
            attested_power = %attestation.attested_power(),
            total_power,
            "Attestation finalized"
        );
        metrics::record_attestation_finalized(claim_type.as_str());
        Ok(true)
    }

    /// Record a second, conflicting claim without counting it and report
    /// the validator.
    fn flag_equivocation(
        &self,
        mut attestation: Attestation,
        validator: ValidatorAddress,
        first_details: Hash,
    ) -> BridgeResult<ClaimOutcome> {
        let claim_type = attestation.claim_type();
        let nonce = attestation.nonce();
        attestation.record_audit(validator);
        self.store.set_attestation(&attestation)?;
        self.slashing.submit(SlashingSignal::Equivocation {
            validator,
            claim_type,
            nonce,
            first_details,
            second_details: attestation.details_hash,
        })?;
        warn!(
            %validator,
            %claim_type,
            nonce = nonce.value(),
            "Equivocating claim recorded"
        );
        metrics::record_equivocation();
        Ok(ClaimOutcome::Equivocation)
    }

    /// The one side effect of a finalized claim.
    fn apply_claim(&self, claim: &EthereumClaim) -> BridgeResult<()> {
        match claim {
            EthereumClaim::Deposit {
                token,
                cosmos_receiver,
                ..
            } => {
                let denom = self.ledger.denom_for(&token.contract, &token.symbol);
                self.ledger.mint_to(cosmos_receiver, token.amount, &denom)?;
                info!(receiver = %cosmos_receiver, amount = %token.amount, %denom, "Deposit credited");
            }
            EthereumClaim::WithdrawalBatchExecuted {
                batch_nonce,
                token_contract,
                ..
            } => self.apply_batch_executed(token_contract, *batch_nonce)?,
            EthereumClaim::ValsetUpdateExecuted { valset_nonce, .. } => {
                self.apply_valset_executed(*valset_nonce)?
            }
        }
        Ok(())
    }

    fn apply_batch_executed(&self, token_contract: &EthAddress, batch_nonce: Nonce) -> BridgeResult<()> {
        match self.store.get_batch(token_contract, batch_nonce)? {
            Some(mut batch) if batch.is_pending() => {
                batch.transition_to(BatchStatus::ObservedExecuted)?;
                self.store.set_batch(&batch)?;
                info!(
                    token = %token_contract,
                    nonce = batch_nonce.value(),
                    elements = batch.elements.len(),
                    "Batch executed"
                );
            }
            Some(_) => warn!(
                token = %token_contract,
                nonce = batch_nonce.value(),
                "Batch already marked executed"
            ),
            None => warn!(
                token = %token_contract,
                nonce = batch_nonce.value(),
                "Executed batch is unknown"
            ),
        }

        let superseded: Vec<OutgoingTxBatch> = self
            .store
            .batches()?
            .into_iter()
            .filter(|b| b.token_contract == *token_contract && b.nonce < batch_nonce && b.is_pending())
            .collect();
        for batch in superseded {
            self.cancel_batch(batch)?;
        }
        Ok(())
    }

    /// Return a batch's transfers to the pool and drop the batch.
    fn cancel_batch(&self, batch: OutgoingTxBatch) -> BridgeResult<()> {
        for tx in &batch.elements {
            self.store.set_pending_transfer(tx)?;
        }
        self.store
            .delete_batch_confirms(&batch.token_contract, batch.nonce)?;
        self.store.delete_batch(&batch.token_contract, batch.nonce)?;
        info!(
            token = %batch.token_contract,
            nonce = batch.nonce.value(),
            returned = batch.elements.len(),
            "Batch cancelled"
        );
        Ok(())
    }

    fn apply_valset_executed(&self, valset_nonce: Nonce) -> BridgeResult<()> {
        if self.store.get_valset(valset_nonce)?.is_none() {
            warn!(nonce = valset_nonce.value(), "Executed valset is unknown");
            return Ok(());
        }
        if let Some(observed) = self.store.observed_valset_nonce()? {
            if observed >= valset_nonce {
                warn!(
                    nonce = valset_nonce.value(),
                    observed = observed.value(),
                    "Executed valset is not newer than the observed one"
                );
                return Ok(());
            }
        }
        self.store.set_observed_valset_nonce(valset_nonce)?;
        for valset in self.store.valsets()? {
            if valset.nonce() < valset_nonce {
                self.store.delete_valset_confirms(valset.nonce())?;
                self.store.delete_valset(valset.nonce())?;
            }
        }
        info!(nonce = valset_nonce.value(), "Valset observed on Ethereum");
        Ok(())
    }

    // =========================================================================
    // Confirmations
    // =========================================================================

    /// `nonce` must be the next entity on the validator's stream.
    fn check_confirm_sequence(
        &self,
        validator: &ValidatorAddress,
        stream: &ConfirmStream,
        stored: impl IntoIterator<Item = Nonce>,
        nonce: Nonce,
    ) -> BridgeResult<()> {
        let cursor = self.store.last_confirmed_nonce(validator, stream)?;
        let expected = match stored.into_iter().filter(|n| *n > cursor).min() {
            Some(next) => next,
            None => next_nonce(cursor)?,
        };
        if nonce != expected {
            return Err(BridgeError::OutOfSequence {
                expected,
                got: nonce,
            });
        }
        Ok(())
    }

    fn valset_nonces(&self) -> BridgeResult<Vec<Nonce>> {
        Ok(self.store.valsets()?.iter().map(Valset::nonce).collect())
    }

    fn pending_batches(&self) -> BridgeResult<Vec<OutgoingTxBatch>> {
        Ok(self
            .store
            .batches()?
            .into_iter()
            .filter(OutgoingTxBatch::is_pending)
            .collect())
    }

    fn process_valset_confirm(
        &self,
        orchestrator: &AccountAddress,
        nonce: Nonce,
        signature: &[u8],
    ) -> BridgeResult<ConfirmOutcome> {
        let (validator, eth_address) = self.resolve_confirmer(orchestrator)?;
        let valset = self
            .store
            .get_valset(nonce)?
            .ok_or_else(|| BridgeError::NotFound(format!("valset {nonce}")))?;
        if self.store.get_valset_confirm(nonce, &validator)?.is_some() {
            return Ok(ConfirmOutcome::Duplicate);
        }

        let stream = ConfirmStream::Valset;
        self.check_confirm_sequence(&validator, &stream, self.valset_nonces()?, nonce)?;

        let checkpoint = valset.checkpoint(&self.params.peggy_id)?;
        verify_eth_signature(&checkpoint, signature, &eth_address)?;
        let confirm = ValsetConfirm {
            nonce,
            validator,
            orchestrator: *orchestrator,
            eth_address,
            signature: EthSignature::from_slice(signature)?,
        };

        self.store.set_valset_confirm(&confirm)?;
        self.store
            .set_last_confirmed_nonce(&validator, &stream, nonce)?;
        debug!(%validator, nonce = nonce.value(), "Valset confirmation stored");
        metrics::record_confirmation(stream.as_str());
        Ok(ConfirmOutcome::Stored)
    }

    fn process_batch_confirm(
        &self,
        orchestrator: &AccountAddress,
        nonce: Nonce,
        token_contract: &EthAddress,
        signature: &[u8],
    ) -> BridgeResult<ConfirmOutcome> {
        let (validator, eth_address) = self.resolve_confirmer(orchestrator)?;
        let batch = self
            .store
            .get_batch(token_contract, nonce)?
            .ok_or_else(|| BridgeError::NotFound(format!("batch {nonce} for {token_contract}")))?;
        if !batch.is_pending() {
            return Err(BridgeError::Invalid(format!(
                "batch {nonce} for {token_contract} is already executed"
            )));
        }
        if self
            .store
            .get_batch_confirm(token_contract, nonce, &validator)?
            .is_some()
        {
            return Ok(ConfirmOutcome::Duplicate);
        }

        let stream = ConfirmStream::Batch(*token_contract);
        let stored: Vec<Nonce> = self
            .pending_batches()?
            .iter()
            .filter(|b| b.token_contract == *token_contract)
            .map(|b| b.nonce)
            .collect();
        self.check_confirm_sequence(&validator, &stream, stored, nonce)?;

        let checkpoint = batch.checkpoint(&self.params.peggy_id)?;
        verify_eth_signature(&checkpoint, signature, &eth_address)?;
        let confirm = BatchConfirm {
            nonce,
            token_contract: *token_contract,
            validator,
            orchestrator: *orchestrator,
            eth_address,
            signature: EthSignature::from_slice(signature)?,
        };

        self.store.set_batch_confirm(&confirm)?;
        self.store
            .set_last_confirmed_nonce(&validator, &stream, nonce)?;
        debug!(
            %validator,
            token = %token_contract,
            nonce = nonce.value(),
            "Batch confirmation stored"
        );
        metrics::record_confirmation(stream.as_str());
        Ok(ConfirmOutcome::Stored)
    }

    // =========================================================================
    // Valsets
    // =========================================================================

    /// Registry view as contract members: bonded validators with a
    /// registered key, power normalised, zero-power members dropped.
    fn snapshot_members(&self) -> BridgeResult<Vec<BridgeValidator>> {
        let total = self.registry.total_bonded_power()?;
        let mut members = Vec::new();
        for (validator, power) in self.registry.bonded_validators()? {
            let Some(eth_address) = self.store.get_eth_address(&validator)? else {
                continue;
            };
            let normalized = normalize_power(power, total);
            if normalized > 0 {
                members.push(BridgeValidator::new(normalized, eth_address));
            }
        }
        Ok(members)
    }

    fn next_valset_nonce(&self) -> BridgeResult<Nonce> {
        let latest = self
            .store
            .valsets()?
            .last()
            .map(Valset::nonce)
            .unwrap_or_default();
        next_nonce(latest)
    }

    fn store_valset(&self, valset: Valset) -> BridgeResult<Valset> {
        valset.checkpoint(&self.params.peggy_id)?;
        self.store.set_valset(&valset)?;
        info!(
            nonce = valset.nonce().value(),
            members = valset.members().len(),
            "Valset created"
        );
        Ok(valset)
    }

    fn missed_confirmations<F>(&self, stream: ConfirmStream, nonce: Nonce, confirmed: F) -> BridgeResult<Vec<SlashingSignal>>
    where
        F: Fn(&ValidatorAddress) -> BridgeResult<bool>,
    {
        let mut signals = Vec::new();
        for (validator, _) in self.registry.bonded_validators()? {
            if confirmed(&validator)? {
                continue;
            }
            let signal = SlashingSignal::MissedConfirmation {
                validator,
                stream,
                nonce,
            };
            self.slashing.submit(signal.clone())?;
            signals.push(signal);
        }
        if !signals.is_empty() {
            warn!(
                %stream,
                nonce = nonce.value(),
                missed = signals.len(),
                window = self.params.confirm_window(&stream),
                "Confirmation window closed with missing signatures"
            );
        }
        Ok(signals)
    }
}

fn next_nonce(nonce: Nonce) -> BridgeResult<Nonce> {
    nonce
        .next()
        .ok_or_else(|| BridgeError::Fatal(format!("nonce {nonce} overflows")))
}

impl<S, R, L, K> BridgeApi for BridgeService<S, R, L, K>
where
    S: BridgeStore,
    R: ValidatorRegistry,
    L: TokenLedger,
    K: SlashingSink,
{
    fn submit_claim(
        &mut self,
        orchestrator: &AccountAddress,
        claim: EthereumClaim,
    ) -> BridgeResult<ClaimOutcome> {
        let claim_type = claim.claim_type();
        let nonce = claim.nonce();
        let result = self.process_claim(orchestrator, claim);
        match &result {
            Ok(outcome) => metrics::record_claim(outcome.as_str()),
            Err(e) => {
                debug!(
                    %orchestrator,
                    %claim_type,
                    nonce = nonce.value(),
                    error = %e,
                    "Claim rejected"
                );
                metrics::record_claim_rejected(e.reason());
            }
        }
        result
    }

    fn confirm_valset(
        &mut self,
        orchestrator: &AccountAddress,
        nonce: Nonce,
        signature: &[u8],
    ) -> BridgeResult<ConfirmOutcome> {
        self.process_valset_confirm(orchestrator, nonce, signature)
            .inspect_err(|e| debug!(%orchestrator, nonce = nonce.value(), error = %e, "Valset confirmation rejected"))
    }

    fn confirm_batch(
        &mut self,
        orchestrator: &AccountAddress,
        nonce: Nonce,
        token_contract: &EthAddress,
        signature: &[u8],
    ) -> BridgeResult<ConfirmOutcome> {
        self.process_batch_confirm(orchestrator, nonce, token_contract, signature)
            .inspect_err(|e| {
                debug!(
                    %orchestrator,
                    token = %token_contract,
                    nonce = nonce.value(),
                    error = %e,
                    "Batch confirmation rejected"
                )
            })
    }

    fn set_eth_address(
        &mut self,
        validator: &ValidatorAddress,
        eth_address: EthAddress,
        signature: &[u8],
    ) -> BridgeResult<()> {
        if !self.registry.is_bonded(validator)? {
            return Err(BridgeError::Unauthorized(format!(
                "validator {validator} is not bonded"
            )));
        }
        eth_address.ensure_non_empty()?;
        verify_eth_signature(&keccak256(validator.as_bytes()), signature, &eth_address)?;

        if let Some((owner, _)) = self
            .store
            .eth_addresses()?
            .into_iter()
            .find(|(v, a)| a == &eth_address && v != validator)
        {
            return Err(BridgeError::Invalid(format!(
                "{eth_address} is already registered to {owner}"
            )));
        }

        self.store.set_eth_address(validator, &eth_address)?;
        info!(%validator, %eth_address, "Ethereum key registered");
        Ok(())
    }

    fn send_to_eth(
        &mut self,
        sender: &AccountAddress,
        dest: EthAddress,
        amount: Erc20Token,
        bridge_fee: Erc20Token,
    ) -> BridgeResult<u64> {
        if sender.is_empty() {
            return Err(BridgeError::Invalid("empty sender".into()));
        }
        let id = self
            .store
            .last_transfer_id()?
            .checked_add(1)
            .ok_or_else(|| BridgeError::Fatal("transfer id overflows".into()))?;
        let tx = OutgoingTransferTx {
            id,
            sender: *sender,
            dest,
            amount,
            bridge_fee,
        };
        tx.validate()?;
        let total = tx.amount.checked_add(&tx.bridge_fee)?;

        let denom = self.ledger.denom_for(&tx.token_contract(), &tx.amount.symbol);
        self.ledger.burn_from(sender, total.amount, &denom)?;
        self.store.set_pending_transfer(&tx)?;
        self.store.set_last_transfer_id(id)?;
        debug!(
            id,
            %sender,
            dest = %tx.dest,
            amount = %tx.amount.amount,
            fee = %tx.bridge_fee.amount,
            "Transfer queued"
        );
        Ok(id)
    }

    fn build_batch(&mut self, token_contract: &EthAddress) -> BridgeResult<OutgoingTxBatch> {
        token_contract.ensure_non_empty()?;
        let mut selected: Vec<OutgoingTransferTx> = self
            .store
            .pending_transfers()?
            .into_iter()
            .filter(|tx| tx.token_contract() == *token_contract)
            .collect();
        if selected.is_empty() {
            return Err(BridgeError::Invalid(format!(
                "no pending transfers for {token_contract}"
            )));
        }
        selected.sort_by(fee_order);
        selected.truncate(self.params.batch_max_elements);

        let valset = self
            .store
            .valsets()?
            .pop()
            .ok_or_else(|| BridgeError::Invalid("no valset to anchor the batch".into()))?;
        let valset_checkpoint = valset.checkpoint(&self.params.peggy_id)?;
        let nonce = next_nonce(self.store.last_batch_nonce()?)?;
        let batch = OutgoingTxBatch::new(nonce, *token_contract, selected, valset_checkpoint)?;
        // Encoding must succeed before anything is persisted.
        batch.checkpoint(&self.params.peggy_id)?;

        for tx in &batch.elements {
            self.store.remove_pending_transfer(tx.id)?;
        }
        self.store.set_batch(&batch)?;
        self.store.set_last_batch_nonce(nonce)?;
        info!(
            token = %token_contract,
            nonce = nonce.value(),
            elements = batch.elements.len(),
            total_fee = %batch.total_fee.amount,
            valset = valset.nonce().value(),
            "Batch built"
        );
        metrics::record_batch_built();
        Ok(batch)
    }

    fn request_valset(&mut self) -> BridgeResult<Valset> {
        let members = self.snapshot_members()?;
        if members.is_empty() {
            return Err(BridgeError::Invalid(
                "no bonded validator has a registered Ethereum key".into(),
            ));
        }
        let valset = Valset::new(self.next_valset_nonce()?, members)?;
        self.store_valset(valset)
    }

    fn update_valset_if_changed(&mut self) -> BridgeResult<Option<Valset>> {
        let members = self.snapshot_members()?;
        if members.is_empty() {
            return Ok(None);
        }
        let candidate = Valset::new(self.next_valset_nonce()?, members)?;
        if let Some(latest) = self.store.valsets()?.pop() {
            let diff = candidate.power_diff_bps(&latest);
            if diff <= self.params.valset_change_threshold_bps {
                return Ok(None);
            }
            debug!(
                diff_bps = diff,
                threshold_bps = self.params.valset_change_threshold_bps,
                "Validator power moved past threshold"
            );
        }
        self.store_valset(candidate).map(Some)
    }

    fn report_missed_valset_confirmations(
        &mut self,
        nonce: Nonce,
    ) -> BridgeResult<Vec<SlashingSignal>> {
        if self.store.get_valset(nonce)?.is_none() {
            return Err(BridgeError::NotFound(format!("valset {nonce}")));
        }
        self.missed_confirmations(ConfirmStream::Valset, nonce, |validator| {
            Ok(self.store.get_valset_confirm(nonce, validator)?.is_some())
        })
    }

    fn report_missed_batch_confirmations(
        &mut self,
        token_contract: &EthAddress,
        nonce: Nonce,
    ) -> BridgeResult<Vec<SlashingSignal>> {
        if self.store.get_batch(token_contract, nonce)?.is_none() {
            return Err(BridgeError::NotFound(format!(
                "batch {nonce} for {token_contract}"
            )));
        }
        self.missed_confirmations(ConfirmStream::Batch(*token_contract), nonce, |validator| {
            Ok(self
                .store
                .get_batch_confirm(token_contract, nonce, validator)?
                .is_some())
        })
    }
}

impl<S, R, L, K> BridgeQueries for BridgeService<S, R, L, K>
where
    S: BridgeStore,
    R: ValidatorRegistry,
    L: TokenLedger,
    K: SlashingSink,
{
    fn params(&self) -> &BridgeParams {
        &self.params
    }

    fn current_valset(&self) -> BridgeResult<Valset> {
        Valset::new(self.next_valset_nonce()?, self.snapshot_members()?)
    }

    fn valset_by_nonce(&self, nonce: Nonce) -> BridgeResult<Option<Valset>> {
        Ok(self.store.get_valset(nonce)?)
    }

    fn latest_valsets(&self, count: usize) -> BridgeResult<Vec<Valset>> {
        Ok(self.store.valsets()?.into_iter().rev().take(count).collect())
    }

    fn valset_checkpoint(&self, nonce: Nonce) -> BridgeResult<Hash> {
        self.store
            .get_valset(nonce)?
            .ok_or_else(|| BridgeError::NotFound(format!("valset {nonce}")))?
            .checkpoint(&self.params.peggy_id)
    }

    fn valset_confirms(&self, nonce: Nonce) -> BridgeResult<Vec<ValsetConfirm>> {
        Ok(self.store.valset_confirms(nonce)?)
    }

    fn valset_confirm(
        &self,
        nonce: Nonce,
        validator: &ValidatorAddress,
    ) -> BridgeResult<Option<ValsetConfirm>> {
        Ok(self.store.get_valset_confirm(nonce, validator)?)
    }

    fn last_pending_valset_for(
        &self,
        validator: &ValidatorAddress,
    ) -> BridgeResult<Option<Valset>> {
        for valset in self.store.valsets()? {
            if self
                .store
                .get_valset_confirm(valset.nonce(), validator)?
                .is_none()
            {
                return Ok(Some(valset));
            }
        }
        Ok(None)
    }

    fn pending_batch(&self, token_contract: &EthAddress) -> BridgeResult<Option<OutgoingTxBatch>> {
        Ok(self
            .pending_batches()?
            .into_iter()
            .filter(|b| b.token_contract == *token_contract)
            .max_by_key(|b| b.nonce))
    }

    fn batch_by_nonce(
        &self,
        token_contract: &EthAddress,
        nonce: Nonce,
    ) -> BridgeResult<Option<OutgoingTxBatch>> {
        Ok(self.store.get_batch(token_contract, nonce)?)
    }

    fn outgoing_batches(&self) -> BridgeResult<Vec<OutgoingTxBatch>> {
        self.pending_batches()
    }

    fn batch_checkpoint(&self, token_contract: &EthAddress, nonce: Nonce) -> BridgeResult<Hash> {
        self.store
            .get_batch(token_contract, nonce)?
            .ok_or_else(|| BridgeError::NotFound(format!("batch {nonce} for {token_contract}")))?
            .checkpoint(&self.params.peggy_id)
    }

    fn batch_confirms(
        &self,
        token_contract: &EthAddress,
        nonce: Nonce,
    ) -> BridgeResult<Vec<BatchConfirm>> {
        Ok(self.store.batch_confirms(token_contract, nonce)?)
    }

    fn last_pending_batch_for(
        &self,
        validator: &ValidatorAddress,
    ) -> BridgeResult<Option<OutgoingTxBatch>> {
        let mut pending = self.pending_batches()?;
        pending.sort_by_key(|b| b.nonce);
        for batch in pending {
            if self
                .store
                .get_batch_confirm(&batch.token_contract, batch.nonce, validator)?
                .is_none()
            {
                return Ok(Some(batch));
            }
        }
        Ok(None)
    }

    fn attestation(&self, claim_type: ClaimType, nonce: Nonce) -> BridgeResult<Option<Attestation>> {
        let attestations = self.store.attestations_at(claim_type, nonce)?;
        if let Some(finalized) = attestations.iter().find(|a| a.finalized) {
            return Ok(Some(finalized.clone()));
        }
        Ok(attestations.into_iter().max_by_key(Attestation::attested_power))
    }

    fn last_observed_nonce(&self, claim_type: ClaimType) -> BridgeResult<Nonce> {
        Ok(self.store.last_observed_nonce(claim_type)?)
    }

    fn last_confirmed_nonce(
        &self,
        validator: &ValidatorAddress,
        stream: &ConfirmStream,
    ) -> BridgeResult<Nonce> {
        Ok(self.store.last_confirmed_nonce(validator, stream)?)
    }

    fn pending_transfers(&self, token_contract: &EthAddress) -> BridgeResult<Vec<OutgoingTransferTx>> {
        Ok(self
            .store
            .pending_transfers()?
            .into_iter()
            .filter(|tx| tx.token_contract() == *token_contract)
            .collect())
    }
}
