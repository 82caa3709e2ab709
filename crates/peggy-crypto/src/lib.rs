//! # Peggy Crypto
//!
//! The two pieces of cryptography the bridge shares with the Ethereum
//! contract:
//!
//! - **Signature codec** ([`signer`]): personal-message signing over a
//!   32-byte hash and recovery-based verification against an expected
//!   address.
//! - **Checkpoint encoding** ([`abi`]): bridge values as `ethers-core` ABI
//!   tokens, in the parameter layout the contract uses to recompute valset
//!   and batch checkpoints.
//!
//! Both must agree bit-for-bit with what the contract computes. A wrong
//! checkpoint or a signature the contract cannot recover is unrecoverable
//! once signed.

pub mod abi;
pub mod errors;
pub mod hash;
pub mod signer;

pub use abi::{address_token, bytes32_token, encode, fixed_bytes32, uint_token, Token};
pub use errors::{AbiError, SignatureError};
pub use hash::{address_from_pubkey, eth_message_hash, keccak256};
pub use signer::{
    recover_signer, sign_eth_message, verify_eth_signature, EthSignature, SIGNATURE_LEN,
};

pub use k256::ecdsa::SigningKey;
