//! # Nonces
//!
//! A nonce is a plain `u64` once it reaches the core. Relayers may still send
//! it as an 8-byte big-endian value encoded in base64, so boundary parsing
//! accepts both forms.

use crate::errors::TypesError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Length of an 8-byte value in padded standard base64.
const BASE64_NONCE_LEN: usize = 12;

/// Monotonic sequence number for claims, valsets and batches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Nonce(u64);

impl Nonce {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(&self) -> u64 {
        self.0
    }

    /// The following nonce, or `None` on overflow.
    pub fn next(&self) -> Option<Nonce> {
        self.0.checked_add(1).map(Nonce)
    }

    pub fn to_be_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    /// Decode the fixed-width byte form. Anything but exactly 8 bytes fails.
    pub fn from_be_bytes(bytes: &[u8]) -> Result<Self, TypesError> {
        let arr: [u8; 8] = bytes.try_into().map_err(|_| TypesError::InvalidLength {
            expected: 8,
            got: bytes.len(),
        })?;
        Ok(Self(u64::from_be_bytes(arr)))
    }

    /// Base64 of the big-endian bytes, as some relayers transmit it.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.to_be_bytes())
    }
}

impl From<u64> for Nonce {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parse a nonce arriving as text.
///
/// A 12-character input is first tried as base64 of 8 big-endian bytes;
/// everything else (and a 12-character input that does not decode to
/// exactly 8 bytes) is parsed as a decimal `u64`.
pub fn parse_nonce(input: &str) -> Result<Nonce, TypesError> {
    let input = input.trim();
    if input.len() == BASE64_NONCE_LEN {
        if let Ok(bytes) = STANDARD.decode(input) {
            if bytes.len() == 8 {
                return Nonce::from_be_bytes(&bytes);
            }
        }
    }
    input
        .parse::<u64>()
        .map(Nonce)
        .map_err(|e| TypesError::InvalidNonce(format!("{input:?}: {e}")))
}

impl Serialize for Nonce {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

struct NonceVisitor;

impl<'de> Visitor<'de> for NonceVisitor {
    type Value = Nonce;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an unsigned integer, a decimal string or a base64 8-byte string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Nonce, E> {
        Ok(Nonce(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Nonce, E> {
        u64::try_from(v)
            .map(Nonce)
            .map_err(|_| E::custom(format!("negative nonce {v}")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Nonce, E> {
        parse_nonce(v).map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Nonce {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NonceVisitor)
    }
}
