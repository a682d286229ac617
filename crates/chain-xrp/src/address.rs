//! Classic addresses: Base58Check over `0x00 ‖ AccountID` in the Ripple
//! alphabet, where `AccountID = RIPEMD160(SHA256(signing_public_key))`.

use crypto_utils::hash::hash160;

use crate::error::XrpError;

const ACCOUNT_ID_VERSION: u8 = 0x00;

/// Prefix byte marking an Ed25519 signing public key.
pub const ED25519_KEY_PREFIX: u8 = 0xED;

pub fn account_id_to_address(account_id: &[u8; 20]) -> String {
    let mut payload = Vec::with_capacity(21);
    payload.push(ACCOUNT_ID_VERSION);
    payload.extend_from_slice(account_id);
    bs58::encode(payload)
        .with_alphabet(bs58::Alphabet::RIPPLE)
        .with_check()
        .into_string()
}

pub fn address_to_account_id(address: &str) -> Result<[u8; 20], XrpError> {
    let decoded = bs58::decode(address)
        .with_alphabet(bs58::Alphabet::RIPPLE)
        .with_check(None)
        .into_vec()
        .map_err(|e| XrpError::InvalidAddress(format!("{address}: {e}")))?;
    match decoded.split_first() {
        Some((&ACCOUNT_ID_VERSION, id)) if id.len() == 20 => {
            let mut out = [0u8; 20];
            out.copy_from_slice(id);
            Ok(out)
        }
        _ => Err(XrpError::InvalidAddress(format!(
            "{address}: not a classic account address"
        ))),
    }
}

/// `signing_public_key` is a 33-byte compressed secp256k1 key or
/// `0xED ‖ ed25519_key`.
pub fn public_key_to_address(signing_public_key: &[u8]) -> Result<String, XrpError> {
    if signing_public_key.len() != 33 {
        return Err(XrpError::InvalidPublicKey(format!(
            "signing key must be 33 bytes, got {}",
            signing_public_key.len()
        )));
    }
    Ok(account_id_to_address(&hash160(signing_public_key)))
}

pub fn validate_address(address: &str) -> bool {
    address_to_account_id(address).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENESIS: &str = "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh";

    #[test]
    fn genesis_account() {
        let key = hex::decode("0330E7FC9D56BB25D6893BA3F317AE5BCF33B3291BD63DB32654A313222F7FD020")
            .unwrap();
        assert_eq!(public_key_to_address(&key).unwrap(), GENESIS);
        assert_eq!(
            hex::encode_upper(address_to_account_id(GENESIS).unwrap()),
            "B5F762798A53D543A014CAF8B297CFF8F2F937E8"
        );
    }

    #[test]
    fn special_accounts() {
        assert_eq!(account_id_to_address(&[0; 20]), "rrrrrrrrrrrrrrrrrrrrrhoLvTp");
        let mut one = [0u8; 20];
        one[19] = 1;
        assert_eq!(account_id_to_address(&one), "rrrrrrrrrrrrrrrrrrrrBZbvji");
    }

    #[test]
    fn rejects_bad_addresses() {
        assert!(!validate_address("rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTj"));
        assert!(!validate_address("0x1234"));
        assert!(!validate_address(""));
        assert!(public_key_to_address(&[0u8; 32]).is_err());
    }
}
