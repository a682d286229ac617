use crypto_utils::hash::blake2b_256;

use crate::error::SuiError;

/// Signature scheme flag for Ed25519.
pub const ED25519_FLAG: u8 = 0x00;

/// `0x` + hex of `Blake2b-256(flag || public_key)`.
pub fn pubkey_to_address(public_key: &[u8; 32]) -> String {
    let mut preimage = [0u8; 33];
    preimage[0] = ED25519_FLAG;
    preimage[1..].copy_from_slice(public_key);
    format!("0x{}", hex::encode(blake2b_256(&preimage)))
}

/// Normalizes to the long `0x` + 64 hex form.
pub fn parse_address(address: &str) -> Result<String, SuiError> {
    let digits = address.strip_prefix("0x").unwrap_or(address);
    if digits.is_empty() || digits.len() > 64 {
        return Err(SuiError::InvalidAddress(format!("{address}: bad length")));
    }
    let padded = format!("{digits:0>64}");
    hex::decode(&padded).map_err(|e| SuiError::InvalidAddress(format!("{address}: {e}")))?;
    Ok(format!("0x{}", padded.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_is_flagged_blake2b() {
        let key = [7u8; 32];
        let mut preimage = vec![0u8];
        preimage.extend_from_slice(&key);
        assert_eq!(
            pubkey_to_address(&key),
            format!("0x{}", hex::encode(blake2b_256(&preimage)))
        );
        assert_eq!(pubkey_to_address(&key).len(), 66);
    }

    #[test]
    fn short_addresses_pad() {
        assert_eq!(parse_address("0x2").unwrap(), format!("0x{}2", "0".repeat(63)));
        assert!(parse_address("0xnothex").is_err());
        assert!(parse_address("").is_err());
    }
}
