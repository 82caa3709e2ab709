//! Bridge parameters, fixed at genesis.

use super::attestation::AttestationThreshold;
use super::confirm::ConfirmStream;
use crate::error::{BridgeError, BridgeResult};
use peggy_types::EthAddress;
use serde::{Deserialize, Serialize};
use std::env;

/// Longest bridge id that fits the `bytes32` checkpoint slot.
pub const MAX_PEGGY_ID_LEN: usize = 32;

/// Genesis-configured bridge parameters.
///
/// `peggy_id`, `attestation_threshold`, `batch_max_elements` and
/// `valset_change_threshold_bps` drive the core directly. The remaining
/// fields belong to the host and the contract deployment: they are
/// validated, exported with genesis and readable through
/// `BridgeQueries::params`, but nothing here acts on block heights or
/// Ethereum time. The host uses the windows to decide when to call the
/// missed-confirmation reports.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeParams {
    /// Domain separator mixed into every checkpoint
    pub peggy_id: String,
    pub bridge_contract_address: EthAddress,
    pub bridge_chain_id: u64,
    /// Power the contract requires to accept a signed update
    pub start_threshold: u64,
    pub attestation_threshold: AttestationThreshold,
    /// Confirmation windows, in host-chain blocks
    pub signed_valsets_window: u64,
    pub signed_batches_window: u64,
    pub signed_claims_window: u64,
    /// Milliseconds before an unrelayed batch may be dropped
    pub target_batch_timeout: u64,
    pub batch_max_elements: usize,
    /// Normalised power movement, in basis points, that triggers a new valset
    pub valset_change_threshold_bps: u64,
}

impl Default for BridgeParams {
    fn default() -> Self {
        Self {
            peggy_id: "defaultpeggyid".to_string(),
            bridge_contract_address: EthAddress::ZERO,
            bridge_chain_id: 0,
            start_threshold: 2_863_311_530,
            attestation_threshold: AttestationThreshold::default(),
            signed_valsets_window: 10_000,
            signed_batches_window: 10_000,
            signed_claims_window: 10_000,
            target_batch_timeout: 43_200_000,
            batch_max_elements: 100,
            valset_change_threshold_bps: 500,
        }
    }
}

impl BridgeParams {
    /// Defaults overlaid with environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `PEGGY_ID`: bridge id
    /// - `PEGGY_BRIDGE_CHAIN_ID`: Ethereum chain id
    /// - `PEGGY_THRESHOLD_NUM` / `PEGGY_THRESHOLD_DEN`: attestation threshold
    /// - `PEGGY_BATCH_MAX_ELEMENTS`: batch size cap
    ///
    /// Unparseable numbers fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let threshold = AttestationThreshold {
            numerator: env_parse("PEGGY_THRESHOLD_NUM")
                .unwrap_or(defaults.attestation_threshold.numerator),
            denominator: env_parse("PEGGY_THRESHOLD_DEN")
                .unwrap_or(defaults.attestation_threshold.denominator),
        };
        Self {
            peggy_id: env::var("PEGGY_ID").unwrap_or_else(|_| defaults.peggy_id.clone()),
            bridge_chain_id: env_parse("PEGGY_BRIDGE_CHAIN_ID")
                .unwrap_or(defaults.bridge_chain_id),
            attestation_threshold: threshold,
            batch_max_elements: env_parse("PEGGY_BATCH_MAX_ELEMENTS")
                .unwrap_or(defaults.batch_max_elements),
            ..defaults
        }
    }

    /// Parse from JSON, then validate.
    pub fn from_json(json: &str) -> BridgeResult<Self> {
        let params: BridgeParams = serde_json::from_str(json)
            .map_err(|e| BridgeError::Invalid(format!("params: {e}")))?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> BridgeResult<()> {
        if self.peggy_id.is_empty() {
            return Err(BridgeError::Invalid("empty peggy id".into()));
        }
        if self.peggy_id.len() > MAX_PEGGY_ID_LEN {
            return Err(BridgeError::Invalid(format!(
                "peggy id is {} bytes, limit is {MAX_PEGGY_ID_LEN}",
                self.peggy_id.len()
            )));
        }
        self.attestation_threshold.validate()?;
        if self.batch_max_elements == 0 {
            return Err(BridgeError::Invalid("batch_max_elements is zero".into()));
        }
        if self.start_threshold > u64::from(u32::MAX) {
            return Err(BridgeError::Invalid(format!(
                "start_threshold {} exceeds the normalised power scale",
                self.start_threshold
            )));
        }
        for (name, window) in [
            ("signed_valsets_window", self.signed_valsets_window),
            ("signed_batches_window", self.signed_batches_window),
            ("signed_claims_window", self.signed_claims_window),
            ("target_batch_timeout", self.target_batch_timeout),
        ] {
            if window == 0 {
                return Err(BridgeError::Invalid(format!("{name} is zero")));
            }
        }
        Ok(())
    }

    /// Blocks a validator has to confirm an entity of `stream`.
    pub fn confirm_window(&self, stream: &ConfirmStream) -> u64 {
        match stream {
            ConfirmStream::Valset => self.signed_valsets_window,
            ConfirmStream::Batch(_) => self.signed_batches_window,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}
