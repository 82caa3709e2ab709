//! # Signature Codec
//!
//! Orchestrators sign checkpoint hashes with their Ethereum key using the
//! personal-message convention, so the bridge contract can `ecrecover` them.
//!
//! - `sign`: `keccak256("\x19Ethereum Signed Message:\n32" ++ hash)`, signed
//!   recoverably, laid out as `r || s || v` with `v` in the legacy 27/28 form.
//! - `verify`: the recovery byte is normalised from 27/28 to 0/1 *before*
//!   recovery, then the recovered address must equal the expected one.

use crate::errors::SignatureError;
use crate::hash::{address_from_pubkey, eth_message_hash};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use peggy_types::{EthAddress, Hash};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use std::fmt;

/// Length of an `r || s || v` signature.
pub const SIGNATURE_LEN: usize = 65;

/// 65-byte recoverable Ethereum signature.
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EthSignature {
    #[serde_as(as = "Bytes")]
    bytes: [u8; SIGNATURE_LEN],
}

impl EthSignature {
    pub fn from_bytes(bytes: [u8; SIGNATURE_LEN]) -> Self {
        Self { bytes }
    }

    /// Fails unless exactly 65 bytes are given.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SignatureError> {
        let bytes: [u8; SIGNATURE_LEN] = bytes
            .try_into()
            .map_err(|_| SignatureError::InvalidLength(bytes.len()))?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.bytes
    }

    pub fn v(&self) -> u8 {
        self.bytes[64]
    }
}

impl fmt::Debug for EthSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EthSignature(0x{})", hex::encode(self.bytes))
    }
}

impl AsRef<[u8]> for EthSignature {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Sign a 32-byte hash the way an Ethereum wallet signs a personal message.
pub fn sign_eth_message(
    hash: &Hash,
    private_key: Option<&SigningKey>,
) -> Result<EthSignature, SignatureError> {
    let key = private_key.ok_or(SignatureError::MissingKey)?;
    let digest = eth_message_hash(hash);
    let (sig, recid) = key
        .sign_prehash_recoverable(&digest)
        .map_err(|e| SignatureError::SigningFailed(e.to_string()))?;

    let mut bytes = [0u8; SIGNATURE_LEN];
    bytes[..64].copy_from_slice(&sig.to_bytes());
    bytes[64] = recid.to_byte() + 27;
    Ok(EthSignature { bytes })
}

/// Verify that `signature` over `hash` was produced by `expected`.
pub fn verify_eth_signature(
    hash: &Hash,
    signature: &[u8],
    expected: &EthAddress,
) -> Result<(), SignatureError> {
    let actual = recover_signer(hash, signature)?;
    if &actual != expected {
        return Err(SignatureError::SignerMismatch {
            expected: *expected,
            actual,
        });
    }
    Ok(())
}

/// Recover the address that produced `signature` over `hash`.
pub fn recover_signer(hash: &Hash, signature: &[u8]) -> Result<EthAddress, SignatureError> {
    if signature.len() != SIGNATURE_LEN {
        return Err(SignatureError::InvalidLength(signature.len()));
    }
    let recovery_id = parse_recovery_id(signature[64])?;
    let sig = Signature::from_slice(&signature[..64]).map_err(|_| SignatureError::InvalidFormat)?;

    let digest = eth_message_hash(hash);
    let key = VerifyingKey::recover_from_prehash(&digest, &sig, recovery_id)
        .map_err(|_| SignatureError::RecoveryFailed)?;
    Ok(address_from_pubkey(&key))
}

/// Accepts both the 0/1 and the legacy 27/28 forms.
fn parse_recovery_id(v: u8) -> Result<RecoveryId, SignatureError> {
    let normalized = match v {
        0 | 1 => v,
        27 | 28 => v - 27,
        _ => return Err(SignatureError::InvalidRecoveryId(v)),
    };
    RecoveryId::from_byte(normalized).ok_or(SignatureError::InvalidRecoveryId(v))
}
