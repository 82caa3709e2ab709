//! # Peggy Types Crate
//!
//! Value types shared across the bridge crates.
//!
//! ## Design Principles
//!
//! - **Fixed width**: Ethereum addresses are exactly 20 bytes, hashes 32 bytes.
//!   The all-zero address is "empty" and is rejected wherever an address is
//!   required.
//! - **Boundary parsing**: nonces travel either as decimal text or as a
//!   base64 encoded 8-byte big-endian string. Both are normalised to [`Nonce`]
//!   by [`parse_nonce`]; the core only ever sees the integer.

pub mod address;
pub mod errors;
pub mod nonce;
pub mod token;

pub use address::{AccountAddress, EthAddress, ValidatorAddress};
pub use errors::TypesError;
pub use nonce::{parse_nonce, Nonce};
pub use token::Erc20Token;

/// 32-byte hash (keccak256 output, checkpoint hashes).
pub type Hash = [u8; 32];

/// Unsigned 256-bit integer used for token amounts and ABI `uint256` words.
pub use primitive_types::U256;
