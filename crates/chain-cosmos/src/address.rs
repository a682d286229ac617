//! Bech32 account addresses: `bech32(prefix, RIPEMD160(SHA256(compressed_key)))`.

use bech32::{Bech32, Hrp};
use crypto_utils::hash::hash160;

use crate::error::CosmosError;

pub fn pubkey_to_address(compressed: &[u8; 33], prefix: &str) -> Result<String, CosmosError> {
    let hrp = Hrp::parse(prefix)
        .map_err(|e| CosmosError::InvalidAddress(format!("prefix {prefix:?}: {e}")))?;
    bech32::encode::<Bech32>(hrp, &hash160(compressed))
        .map_err(|e| CosmosError::InvalidAddress(e.to_string()))
}

/// Decodes `address`, checking it carries `prefix` and a 20-byte payload.
pub fn parse_address(address: &str, prefix: &str) -> Result<[u8; 20], CosmosError> {
    let (hrp, data) = bech32::decode(address)
        .map_err(|e| CosmosError::InvalidAddress(format!("{address}: {e}")))?;
    if hrp.to_string() != prefix {
        return Err(CosmosError::InvalidAddress(format!(
            "{address}: expected prefix {prefix}, got {hrp}"
        )));
    }
    data.try_into().map_err(|v: Vec<u8>| {
        CosmosError::InvalidAddress(format!("{address}: expected 20 bytes, got {}", v.len()))
    })
}
