//! # Validator Sets
//!
//! The bridge contract is a multisig whose signers are the Ethereum keys of
//! the bonded validators, weighted by power. A [`Valset`] is one snapshot of
//! that multisig.
//!
//! ## Canonical form
//!
//! Members are sorted by power descending, ties broken by ascending address
//! bytes, and no address appears twice. The contract recomputes the
//! checkpoint from the same ordered lists, so the order is part of the hash.
//!
//! ## Checkpoint
//!
//! ```text
//! keccak256(abi.encode(
//!     bytes32 peggy_id,
//!     bytes32 "checkpoint",
//!     uint256 nonce,
//!     address[] members,
//!     uint256[] powers))
//! ```

use crate::error::{BridgeError, BridgeResult};
use peggy_crypto::{address_token, bytes32_token, encode, fixed_bytes32, keccak256, uint_token, Token};
use peggy_types::{EthAddress, Hash, Nonce};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Tag mixed into every valset checkpoint.
pub const VALSET_CHECKPOINT_TAG: &str = "checkpoint";

/// Powers are rescaled so the whole bonded set sums to `u32::MAX`.
pub const POWER_SCALE: u64 = u32::MAX as u64;

/// Basis-point denominator used by [`Valset::power_diff_bps`].
pub const BPS: u64 = 10_000;

/// One signer of the bridge multisig.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BridgeValidator {
    pub power: u64,
    pub eth_address: EthAddress,
}

impl BridgeValidator {
    pub fn new(power: u64, eth_address: EthAddress) -> Self {
        Self { power, eth_address }
    }

    pub fn validate(&self) -> BridgeResult<()> {
        if self.power == 0 {
            return Err(BridgeError::Invalid(format!(
                "zero power for {}",
                self.eth_address
            )));
        }
        self.eth_address.ensure_non_empty()?;
        Ok(())
    }
}

/// Canonical member order: power descending, then address ascending.
fn member_order(a: &BridgeValidator, b: &BridgeValidator) -> Ordering {
    b.power
        .cmp(&a.power)
        .then_with(|| a.eth_address.cmp(&b.eth_address))
}

/// Rescale a raw power to the contract's 2^32 scale.
pub fn normalize_power(power: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    let scaled = u128::from(power) * u128::from(POWER_SCALE) / u128::from(total);
    scaled.min(u128::from(POWER_SCALE)) as u64
}

/// Immutable validator-set snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Valset {
    nonce: Nonce,
    members: Vec<BridgeValidator>,
}

impl Valset {
    /// Validate and canonicalise a member list.
    pub fn new(nonce: Nonce, mut members: Vec<BridgeValidator>) -> BridgeResult<Self> {
        if members.is_empty() {
            return Err(BridgeError::Invalid("valset has no members".into()));
        }
        let mut seen = BTreeSet::new();
        for member in &members {
            member.validate()?;
            if !seen.insert(member.eth_address) {
                return Err(BridgeError::Invalid(format!(
                    "duplicate valset member {}",
                    member.eth_address
                )));
            }
        }
        members.sort_by(member_order);
        Ok(Self { nonce, members })
    }

    pub fn nonce(&self) -> Nonce {
        self.nonce
    }

    pub fn members(&self) -> &[BridgeValidator] {
        &self.members
    }

    /// Re-check the canonical form, for values that arrived through serde.
    pub fn validate(&self) -> BridgeResult<()> {
        let rebuilt = Valset::new(self.nonce, self.members.clone())?;
        if rebuilt.members != self.members {
            return Err(BridgeError::Invalid(format!(
                "valset {} members are not in canonical order",
                self.nonce
            )));
        }
        Ok(())
    }

    pub fn total_power(&self) -> u128 {
        self.members.iter().map(|m| u128::from(m.power)).sum()
    }

    pub fn power_of(&self, address: &EthAddress) -> Option<u64> {
        self.members
            .iter()
            .find(|m| &m.eth_address == address)
            .map(|m| m.power)
    }

    /// Contract-compatible checkpoint hash under bridge id `peggy_id`.
    pub fn checkpoint(&self, peggy_id: &str) -> BridgeResult<Hash> {
        let addresses = self
            .members
            .iter()
            .map(|m| address_token(m.eth_address))
            .collect();
        let powers = self
            .members
            .iter()
            .map(|m| uint_token(m.power))
            .collect();

        let encoded = encode(&[
            bytes32_token(fixed_bytes32(peggy_id)?),
            bytes32_token(fixed_bytes32(VALSET_CHECKPOINT_TAG)?),
            uint_token(self.nonce.value()),
            Token::Array(addresses),
            Token::Array(powers),
        ]);
        Ok(keccak256(&encoded))
    }

    /// Total absolute power movement between two sets, in basis points of
    /// the full power scale. Addresses missing from one side count as zero.
    pub fn power_diff_bps(&self, other: &Valset) -> u64 {
        let mut powers: BTreeMap<EthAddress, (u64, u64)> = BTreeMap::new();
        for m in &self.members {
            powers.entry(m.eth_address).or_default().0 = m.power;
        }
        for m in &other.members {
            powers.entry(m.eth_address).or_default().1 = m.power;
        }
        let moved: u128 = powers
            .values()
            .map(|(a, b)| u128::from(a.abs_diff(*b)))
            .sum();
        (moved * u128::from(BPS) / u128::from(POWER_SCALE)) as u64
    }
}
