use std::fmt;
use std::str::FromStr;

use crypto_utils::hash::sha3_256;
use serde::{Deserialize, Serialize};

use crate::error::AptosError;

/// Authentication-key scheme byte for single Ed25519 keys.
const ED25519_SCHEME: u8 = 0x00;

/// A 32-byte account address. Displays in long form (`0x` + 64 hex);
/// parses short forms such as `0x1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountAddress(pub [u8; 32]);

impl AccountAddress {
    pub const ONE: Self = Self::from_u8(1);

    const fn from_u8(value: u8) -> Self {
        let mut bytes = [0u8; 32];
        bytes[31] = value;
        Self(bytes)
    }

    /// `SHA3-256(public_key || 0x00)`.
    pub fn from_ed25519_public_key(public_key: &[u8; 32]) -> Self {
        let mut preimage = [0u8; 33];
        preimage[..32].copy_from_slice(public_key);
        preimage[32] = ED25519_SCHEME;
        Self(sha3_256(&preimage))
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for AccountAddress {
    type Err = AptosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        if digits.is_empty() || digits.len() > 64 {
            return Err(AptosError::InvalidAddress(format!("{s}: bad length")));
        }
        let padded = format!("{digits:0>64}");
        let bytes = hex::decode(&padded).map_err(|e| AptosError::InvalidAddress(format!("{s}: {e}")))?;
        let mut out = [0u8; 32];
        out.copy_from_slice(&bytes);
        Ok(Self(out))
    }
}

impl TryFrom<String> for AccountAddress {
    type Error = AptosError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AccountAddress> for String {
    fn from(address: AccountAddress) -> Self {
        address.to_string()
    }
}
