use crypto_utils::hash::keccak256;

use crate::error::EthError;

/// Derives the Ethereum address of an uncompressed secp256k1 public key
/// (65 bytes, leading `0x04`): the last 20 bytes of Keccak-256 over the
/// 64 coordinate bytes, as `0x` + 40 lowercase hex characters.
pub fn public_key_to_address(uncompressed_pubkey: &[u8; 65]) -> Result<String, EthError> {
    if uncompressed_pubkey[0] != 0x04 {
        return Err(EthError::InvalidPublicKey(
            "uncompressed key must start with 0x04".into(),
        ));
    }

    let hash = keccak256(&uncompressed_pubkey[1..]);
    Ok(format!("0x{}", hex::encode(&hash[12..])))
}

/// Parses a `0x`-prefixed address into its 20 bytes. Case is not checked.
pub fn parse_address(address: &str) -> Result<[u8; 20], EthError> {
    let hex_part = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .ok_or_else(|| EthError::InvalidAddress("address must start with 0x".into()))?;

    if hex_part.len() != 40 {
        return Err(EthError::InvalidAddress(format!(
            "expected 40 hex characters, got {}",
            hex_part.len()
        )));
    }

    let bytes = hex::decode(hex_part)
        .map_err(|e| EthError::InvalidAddress(format!("invalid hex: {e}")))?;
    let mut out = [0u8; 20];
    out.copy_from_slice(&bytes);
    Ok(out)
}

/// Validates an address. Mixed-case input must carry a correct EIP-55
/// checksum; all-lower and all-upper input is accepted as-is.
pub fn validate_address(address: &str) -> Result<bool, EthError> {
    parse_address(address)?;
    let hex_part = &address[2..];

    let is_all_lower = hex_part.chars().all(|c| !c.is_ascii_uppercase());
    let is_all_upper = hex_part.chars().all(|c| !c.is_ascii_lowercase());
    if is_all_lower || is_all_upper {
        return Ok(true);
    }

    Ok(checksum_address(address)? == address)
}

/// Applies EIP-55 mixed-case checksum encoding.
pub fn checksum_address(address: &str) -> Result<String, EthError> {
    let bytes = parse_address(address)?;
    let lower = hex::encode(bytes);
    let hash = keccak256(lower.as_bytes());

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = if i % 2 == 0 {
            hash[i / 2] >> 4
        } else {
            hash[i / 2] & 0x0f
        };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    Ok(out)
}
