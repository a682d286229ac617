//! EIP-191 personal messages.

use adapter_core::RsvSignature;
use crypto_utils::hash::keccak256;

use crate::error::EthError;

/// `keccak256("\x19Ethereum Signed Message:\n" || len(message) || message)`.
pub fn hash_message(message: &[u8]) -> [u8; 32] {
    let prefix = format!("\x19Ethereum Signed Message:\n{}", message.len());
    let mut preimage = Vec::with_capacity(prefix.len() + message.len());
    preimage.extend_from_slice(prefix.as_bytes());
    preimage.extend_from_slice(message);
    keccak256(&preimage)
}

/// 65-byte `r || s || v` signature as `0x`-prefixed hex, `v` in {27, 28}.
pub fn signature_to_hex(signature: &RsvSignature) -> Result<String, EthError> {
    signature
        .validate()
        .map_err(|e| EthError::SigningError(e.to_string()))?;
    Ok(format!(
        "0x{}{}{:02x}",
        signature.r, signature.s, signature.v
    ))
}
