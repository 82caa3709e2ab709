//! # Addresses
//!
//! Ethereum addresses and the two host-chain account kinds the bridge deals
//! with: plain accounts (token holders, orchestrators) and validator operator
//! addresses.

use crate::errors::TypesError;
use ethers_core::types::H160;
use ethers_core::utils::to_checksum;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Decode a 20-byte value from hex, with or without `0x` prefix.
fn decode_20(s: &str) -> Result<[u8; 20], TypesError> {
    let stripped = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    let bytes = hex::decode(stripped).map_err(|e| TypesError::InvalidHex(e.to_string()))?;
    if bytes.len() != 20 {
        return Err(TypesError::InvalidLength {
            expected: 20,
            got: bytes.len(),
        });
    }
    let mut out = [0u8; 20];
    out.copy_from_slice(&bytes);
    Ok(out)
}

// =============================================================================
// ETHEREUM ADDRESS
// =============================================================================

/// Ethereum address (20 raw bytes).
///
/// Ordering is byte-wise, which is the tie-break order for valset members.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EthAddress([u8; 20]);

impl EthAddress {
    /// The all-zero address.
    pub const ZERO: EthAddress = EthAddress([0u8; 20]);

    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Build from a slice, which must be exactly 20 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TypesError> {
        let arr: [u8; 20] = bytes.try_into().map_err(|_| TypesError::InvalidLength {
            expected: 20,
            got: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// True for the all-zero address.
    pub fn is_empty(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Fails with [`TypesError::EmptyAddress`] on the all-zero address.
    pub fn ensure_non_empty(&self) -> Result<(), TypesError> {
        if self.is_empty() {
            return Err(TypesError::EmptyAddress);
        }
        Ok(())
    }

    /// EIP-55 mixed-case checksum encoding.
    pub fn to_checksum(&self) -> String {
        to_checksum(&H160::from(self.0), None)
    }
}

impl From<EthAddress> for H160 {
    fn from(address: EthAddress) -> Self {
        H160::from(address.0)
    }
}

impl From<[u8; 20]> for EthAddress {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl FromStr for EthAddress {
    type Err = TypesError;

    /// Case-insensitive: checksum and lowercase forms parse to the same bytes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_20(s).map(Self)
    }
}

impl fmt::Display for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_checksum())
    }
}

impl fmt::Debug for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EthAddress({})", self.to_checksum())
    }
}

impl Serialize for EthAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_checksum())
    }
}

impl<'de> Deserialize<'de> for EthAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// HOST-CHAIN ADDRESSES
// =============================================================================

macro_rules! host_address {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub [u8; 20]);

        impl $name {
            pub const fn new(bytes: [u8; 20]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; 20] {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0 == [0u8; 20]
            }
        }

        impl From<[u8; 20]> for $name {
            fn from(bytes: [u8; 20]) -> Self {
                Self(bytes)
            }
        }

        impl FromStr for $name {
            type Err = TypesError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                decode_20(s).map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

host_address!(
    /// Host-chain account (token holder, orchestrator key).
    AccountAddress
);

host_address!(
    /// Host-chain validator operator address.
    ValidatorAddress
);
