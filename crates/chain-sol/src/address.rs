//! Solana addresses are the Base58 encoding of the 32-byte Ed25519 key.

use crate::error::SolError;

pub fn pubkey_to_address(ed25519_pubkey: &[u8; 32]) -> String {
    bs58::encode(ed25519_pubkey).into_string()
}

pub fn address_to_bytes(address: &str) -> Result<[u8; 32], SolError> {
    let bytes = bs58::decode(address)
        .into_vec()
        .map_err(|e| SolError::InvalidAddress(format!("{address}: base58 decode failed: {e}")))?;

    bytes.try_into().map_err(|v: Vec<u8>| {
        SolError::InvalidAddress(format!("{address}: expected 32 bytes, got {}", v.len()))
    })
}

pub fn validate_address(address: &str) -> bool {
    address_to_bytes(address).is_ok()
}
