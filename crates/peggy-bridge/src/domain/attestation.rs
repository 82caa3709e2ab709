//! Attestation tally
//!
//! One attestation per (claim type, nonce, details fingerprint). Votes carry
//! the voter's bonded power at the time of the vote. Finalization happens
//! once, when attested power strictly exceeds the threshold fraction of the
//! total bonded power.

use super::claims::{ClaimType, EthereumClaim};
use crate::error::{BridgeError, BridgeResult};
use peggy_types::{Hash, Nonce, ValidatorAddress, U256};
use serde::{Deserialize, Serialize};

/// Supermajority fraction required to finalize an attestation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationThreshold {
    pub numerator: u64,
    pub denominator: u64,
}

impl Default for AttestationThreshold {
    fn default() -> Self {
        Self {
            numerator: 2,
            denominator: 3,
        }
    }
}

impl AttestationThreshold {
    pub fn new(numerator: u64, denominator: u64) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Fraction must lie in [1/2, 1] with a non-zero denominator.
    pub fn validate(&self) -> BridgeResult<()> {
        if self.denominator == 0 {
            return Err(BridgeError::Invalid("threshold denominator is zero".into()));
        }
        let n = u128::from(self.numerator);
        let d = u128::from(self.denominator);
        if n * 2 < d || n > d {
            return Err(BridgeError::Invalid(format!(
                "threshold {}/{} outside [1/2, 1]",
                self.numerator, self.denominator
            )));
        }
        Ok(())
    }

    /// `attested / total > numerator / denominator`, exactly.
    ///
    /// Nothing is ever met against an empty bonded set.
    pub fn is_met(&self, attested: u128, total: u128) -> bool {
        if total == 0 {
            return false;
        }
        U256::from(attested) * U256::from(self.denominator)
            > U256::from(total) * U256::from(self.numerator)
    }
}

/// Natural key of an attestation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttestationKey {
    pub claim_type: ClaimType,
    pub nonce: Nonce,
    pub details_hash: Hash,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub validator: ValidatorAddress,
    pub power: u64,
}

/// Aggregated claims with identical (type, nonce, details).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    pub claim: EthereumClaim,
    pub details_hash: Hash,
    /// Counted votes, in submission order
    pub votes: Vec<Vote>,
    /// Validators whose claim was recorded without counting: late matches
    /// after finalization and equivocating second claims.
    pub audit: Vec<ValidatorAddress>,
    pub finalized: bool,
}

impl Attestation {
    pub fn new(claim: EthereumClaim) -> Self {
        let details_hash = claim.details_fingerprint();
        Self {
            claim,
            details_hash,
            votes: Vec::new(),
            audit: Vec::new(),
            finalized: false,
        }
    }

    pub fn claim_type(&self) -> ClaimType {
        self.claim.claim_type()
    }

    pub fn nonce(&self) -> Nonce {
        self.claim.nonce()
    }

    pub fn key(&self) -> AttestationKey {
        AttestationKey {
            claim_type: self.claim_type(),
            nonce: self.nonce(),
            details_hash: self.details_hash,
        }
    }

    pub fn attested_power(&self) -> u128 {
        self.votes.iter().map(|v| u128::from(v.power)).sum()
    }

    pub fn has_voted(&self, validator: &ValidatorAddress) -> bool {
        self.votes.iter().any(|v| &v.validator == validator)
    }

    /// Voted or audited.
    pub fn is_recorded(&self, validator: &ValidatorAddress) -> bool {
        self.has_voted(validator) || self.audit.contains(validator)
    }

    /// Count a vote. Finalized attestations and repeat voters are refused.
    pub fn add_vote(&mut self, validator: ValidatorAddress, power: u64) -> BridgeResult<()> {
        if self.finalized {
            return Err(BridgeError::Invalid(format!(
                "{} attestation {} is finalized",
                self.claim_type(),
                self.nonce()
            )));
        }
        if self.has_voted(&validator) {
            return Err(BridgeError::Invalid(format!(
                "{validator} already voted on {} {}",
                self.claim_type(),
                self.nonce()
            )));
        }
        self.votes.push(Vote { validator, power });
        Ok(())
    }

    /// Record a claim without counting it.
    pub fn record_audit(&mut self, validator: ValidatorAddress) {
        if !self.is_recorded(&validator) {
            self.audit.push(validator);
        }
    }

    /// Mark finalized if the threshold is now crossed.
    ///
    /// Returns `true` only on the transition itself.
    pub fn try_finalize(&mut self, total_power: u128, threshold: &AttestationThreshold) -> bool {
        if self.finalized {
            return false;
        }
        if threshold.is_met(self.attested_power(), total_power) {
            self.finalized = true;
            return true;
        }
        false
    }
}

/// Result of a claim that was not rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// Vote counted, threshold not yet reached
    Accepted,
    /// Vote counted and crossed the threshold; side effect applied
    Finalized,
    /// Same validator resubmitted the same claim; ignored
    Duplicate,
    /// Same validator, same nonce, different details; recorded and flagged
    Equivocation,
    /// Late claim matching the finalized attestation; recorded only
    AuditRecorded,
    /// Late claim conflicting with the finalized attestation; recorded only
    AlreadyFinalized,
}

impl ClaimOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimOutcome::Accepted => "accepted",
            ClaimOutcome::Finalized => "finalized",
            ClaimOutcome::Duplicate => "duplicate",
            ClaimOutcome::Equivocation => "equivocation",
            ClaimOutcome::AuditRecorded => "audit_recorded",
            ClaimOutcome::AlreadyFinalized => "already_finalized",
        }
    }
}
