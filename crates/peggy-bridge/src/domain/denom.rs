//! Voucher denominations for bridged ERC20 tokens.

use peggy_types::EthAddress;
use sha2::{Digest, Sha256};

/// Prefix of every bridged-token denomination.
pub const VOUCHER_PREFIX: &str = "peggy";

const HASH_BYTES: usize = 5;

/// `"peggy" + hex(sha256("<checksum contract>/<symbol>/"))[..10]`.
pub fn voucher_denom(contract: &EthAddress, symbol: &str) -> String {
    let preimage = format!("{}/{}/", contract.to_checksum(), symbol);
    let digest = Sha256::digest(preimage.as_bytes());
    format!("{VOUCHER_PREFIX}{}", hex::encode(&digest[..HASH_BYTES]))
}
