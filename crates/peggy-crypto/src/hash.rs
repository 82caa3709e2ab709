//! Keccak hashing and Ethereum address derivation.

use k256::ecdsa::VerifyingKey;
use peggy_types::{EthAddress, Hash};
use sha3::{Digest, Keccak256};

/// Prefix Ethereum prepends to a 32-byte hash before personal signing.
pub const ETH_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// Keccak256 hash function.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// `keccak256(prefix ++ hash)`, the digest actually signed.
pub fn eth_message_hash(hash: &Hash) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(ETH_MESSAGE_PREFIX);
    hasher.update(hash);
    hasher.finalize().into()
}

/// Derive the Ethereum address of a public key: last 20 bytes of the
/// keccak256 of the uncompressed point without its `0x04` tag.
pub fn address_from_pubkey(public_key: &VerifyingKey) -> EthAddress {
    let point = public_key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    EthAddress::new(address)
}
