//! # Checkpoint ABI Encoding
//!
//! Checkpoints are `keccak256(abi.encode(...))` of a fixed parameter tuple,
//! which is exactly what the contract recomputes. The encoding itself is
//! `ethers_core::abi`; this module only adds the conversions from bridge
//! types and the `bytes32` string tags.

use crate::errors::AbiError;
use peggy_types::{EthAddress, Hash, U256};

pub use ethers_core::abi::{encode, Token};

/// UTF-8 bytes of `s` right-padded with zeros to a `bytes32` value.
///
/// Anything longer than 32 bytes would be silently cut by a Solidity
/// `bytes32` cast, so it is refused here.
pub fn fixed_bytes32(s: &str) -> Result<Hash, AbiError> {
    let bytes = s.as_bytes();
    if bytes.len() > 32 {
        return Err(AbiError::FixedBytesOverflow(bytes.len()));
    }
    let mut out = [0u8; 32];
    out[..bytes.len()].copy_from_slice(bytes);
    Ok(out)
}

pub fn bytes32_token(value: Hash) -> Token {
    Token::FixedBytes(value.to_vec())
}

pub fn address_token(address: EthAddress) -> Token {
    Token::Address(address.into())
}

pub fn uint_token(value: impl Into<U256>) -> Token {
    Token::Uint(value.into())
}
