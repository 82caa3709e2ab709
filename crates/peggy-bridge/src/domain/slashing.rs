//! Slashing signals
//!
//! The core never slashes. It reports evidence to the sink and the host's
//! staking module decides what to do with it.

use super::claims::ClaimType;
use super::confirm::ConfirmStream;
use peggy_types::{Hash, Nonce, ValidatorAddress};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlashingSignal {
    /// Two different claims for the same (type, nonce)
    Equivocation {
        validator: ValidatorAddress,
        claim_type: ClaimType,
        nonce: Nonce,
        first_details: Hash,
        second_details: Hash,
    },
    /// No confirmation before the window closed
    MissedConfirmation {
        validator: ValidatorAddress,
        stream: ConfirmStream,
        nonce: Nonce,
    },
}

impl SlashingSignal {
    pub fn validator(&self) -> ValidatorAddress {
        match self {
            Self::Equivocation { validator, .. } => *validator,
            Self::MissedConfirmation { validator, .. } => *validator,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Equivocation { .. } => "equivocation",
            Self::MissedConfirmation { .. } => "missed_confirmation",
        }
    }
}
