//! Public-key text formats.
//!
//! The signer contract reports keys in NEAR's `curve:base58` form
//! (`secp256k1:<X‖Y>` or `ed25519:<key>`). Adapters want SEC1 hex for
//! secp256k1 and raw 32-byte keys for Ed25519.

use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::PublicKey;

use crate::error::CryptoError;

const SECP256K1_PREFIX: &str = "secp256k1:";
const ED25519_PREFIX: &str = "ed25519:";

/// Parses a secp256k1 public key from any of the forms the signer or a
/// caller may hand us: `secp256k1:<base58 X‖Y>`, or hex (optionally
/// `0x`-prefixed) holding a 33-byte compressed, 65-byte uncompressed or
/// 64-byte bare `X‖Y` encoding.
pub fn parse_secp256k1_public_key(input: &str) -> Result<PublicKey, CryptoError> {
    let bytes = if let Some(encoded) = input.strip_prefix(SECP256K1_PREFIX) {
        bs58::decode(encoded)
            .into_vec()
            .map_err(|e| CryptoError::InvalidKeyFormat(format!("invalid base58: {e}")))?
    } else {
        let stripped = input.strip_prefix("0x").unwrap_or(input);
        hex::decode(stripped)
            .map_err(|e| CryptoError::InvalidKeyFormat(format!("invalid hex: {e}")))?
    };

    let sec1 = match bytes.len() {
        64 => {
            let mut full = Vec::with_capacity(65);
            full.push(0x04);
            full.extend_from_slice(&bytes);
            full
        }
        33 | 65 => bytes,
        n => {
            return Err(CryptoError::InvalidKeyFormat(format!(
                "unexpected secp256k1 key length {n}"
            )))
        }
    };

    PublicKey::from_sec1_bytes(&sec1)
        .map_err(|_| CryptoError::InvalidKeyFormat("point is not on secp256k1".into()))
}

/// Converts a `secp256k1:<base58>` key into uncompressed SEC1 hex
/// (`04` followed by X and Y, no `0x`).
pub fn near_key_to_uncompressed_hex(key: &str) -> Result<String, CryptoError> {
    if !key.starts_with(SECP256K1_PREFIX) {
        return Err(CryptoError::InvalidKeyFormat(format!(
            "expected {SECP256K1_PREFIX} prefix, got {key}"
        )));
    }
    let public_key = parse_secp256k1_public_key(key)?;
    Ok(uncompressed_hex(&public_key))
}

pub fn uncompressed_hex(public_key: &PublicKey) -> String {
    hex::encode(public_key.to_encoded_point(false).as_bytes())
}

pub fn uncompressed_bytes(public_key: &PublicKey) -> [u8; 65] {
    let mut out = [0u8; 65];
    out.copy_from_slice(public_key.to_encoded_point(false).as_bytes());
    out
}

pub fn compressed_bytes(public_key: &PublicKey) -> [u8; 33] {
    let mut out = [0u8; 33];
    out.copy_from_slice(public_key.to_encoded_point(true).as_bytes());
    out
}

/// Compresses a SEC1 public key given in any form accepted by
/// [`parse_secp256k1_public_key`]. Returns 66 hex characters.
pub fn compress_public_key(input: &str) -> Result<String, CryptoError> {
    let public_key = parse_secp256k1_public_key(input)?;
    Ok(hex::encode(compressed_bytes(&public_key)))
}

/// Parses an Ed25519 public key given as `ed25519:<base58>` or as 64 hex
/// characters.
pub fn parse_ed25519_public_key(input: &str) -> Result<[u8; 32], CryptoError> {
    let bytes = if let Some(encoded) = input.strip_prefix(ED25519_PREFIX) {
        bs58::decode(encoded)
            .into_vec()
            .map_err(|e| CryptoError::InvalidKeyFormat(format!("invalid base58: {e}")))?
    } else {
        let stripped = input.strip_prefix("0x").unwrap_or(input);
        hex::decode(stripped)
            .map_err(|e| CryptoError::InvalidKeyFormat(format!("invalid hex: {e}")))?
    };

    bytes.as_slice().try_into().map_err(|_| {
        CryptoError::InvalidKeyFormat(format!(
            "ed25519 key must be 32 bytes, got {}",
            bytes.len()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const G_NEAR: &str = "secp256k1:3SB8tA9Kbn7FBtT6GWR6AJk73QceudisHaGThPoLCDgC9tan7d3cwZFiDZtrmhSAf8aTynEdQ3N7KXhMm3nWhekP";
    const G_UNCOMPRESSED: &str = "0479be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8";
    const G_COMPRESSED: &str = "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

    #[test]
    fn near_key_converts_to_uncompressed_hex() {
        assert_eq!(near_key_to_uncompressed_hex(G_NEAR).unwrap(), G_UNCOMPRESSED);
    }

    #[test]
    fn near_key_without_prefix_rejected() {
        let err = near_key_to_uncompressed_hex(G_UNCOMPRESSED).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidKeyFormat(_)));
    }

    #[test]
    fn parse_accepts_all_hex_forms() {
        let a = parse_secp256k1_public_key(G_UNCOMPRESSED).unwrap();
        let b = parse_secp256k1_public_key(G_COMPRESSED).unwrap();
        let c = parse_secp256k1_public_key(&G_UNCOMPRESSED[2..]).unwrap();
        let d = parse_secp256k1_public_key(&format!("0x{G_UNCOMPRESSED}")).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a, d);
    }

    #[test]
    fn parse_rejects_off_curve_point() {
        let mut bad = String::from("04");
        bad.push_str(&"11".repeat(64));
        assert!(parse_secp256k1_public_key(&bad).is_err());
    }

    #[test]
    fn parse_rejects_wrong_length() {
        let err = parse_secp256k1_public_key("0411").unwrap_err();
        assert!(err.to_string().contains("length"));
    }

    #[test]
    fn compress_generator() {
        assert_eq!(compress_public_key(G_UNCOMPRESSED).unwrap(), G_COMPRESSED);
    }

    #[test]
    fn ed25519_key_from_base58_and_hex() {
        let raw = [7u8; 32];
        let text = format!("ed25519:{}", bs58::encode(raw).into_string());
        assert_eq!(parse_ed25519_public_key(&text).unwrap(), raw);
        assert_eq!(parse_ed25519_public_key(&hex::encode(raw)).unwrap(), raw);
    }

    #[test]
    fn ed25519_key_wrong_length_rejected() {
        assert!(parse_ed25519_public_key("ed25519:1111").is_err());
    }
}
