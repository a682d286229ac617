use std::fmt;

use serde::{Deserialize, Serialize};

/// Chains with an adapter in this workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainKind {
    Evm,
    Bitcoin,
    Cosmos,
    Solana,
    Aptos,
    Sui,
    Xrp,
}

impl fmt::Display for ChainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Evm => "evm",
            Self::Bitcoin => "bitcoin",
            Self::Cosmos => "cosmos",
            Self::Solana => "solana",
            Self::Aptos => "aptos",
            Self::Sui => "sui",
            Self::Xrp => "xrp",
        };
        f.write_str(name)
    }
}

/// Signature scheme of a derived key. Selects the signer domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyScheme {
    Secp256k1,
    Ed25519,
}

impl KeyScheme {
    /// Domain id understood by the signer contract.
    pub fn domain_id(self) -> u32 {
        match self {
            Self::Secp256k1 => 0,
            Self::Ed25519 => 1,
        }
    }
}

/// A derivation path: either an opaque string or a structured
/// `{index, scheme}` pair.
///
/// Structured paths are rendered to the signer as canonical JSON with
/// sorted keys, e.g. `{"index":0,"scheme":"secp256k1"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DerivationPath {
    Indexed { index: u32, scheme: KeyScheme },
    Opaque(String),
}

impl DerivationPath {
    /// The exact string fed into key derivation and sign requests.
    pub fn as_path_string(&self) -> String {
        match self {
            Self::Opaque(path) => path.clone(),
            Self::Indexed { index, scheme } => {
                let scheme = match scheme {
                    KeyScheme::Secp256k1 => "secp256k1",
                    KeyScheme::Ed25519 => "ed25519",
                };
                format!("{{\"index\":{index},\"scheme\":\"{scheme}\"}}")
            }
        }
    }

    /// Scheme pinned by a structured path, if any.
    pub fn scheme(&self) -> Option<KeyScheme> {
        match self {
            Self::Indexed { scheme, .. } => Some(*scheme),
            Self::Opaque(_) => None,
        }
    }
}

impl From<&str> for DerivationPath {
    fn from(path: &str) -> Self {
        Self::Opaque(path.to_string())
    }
}

impl From<String> for DerivationPath {
    fn from(path: String) -> Self {
        Self::Opaque(path)
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_path_string())
    }
}

/// A derived public key as returned by the signer client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKey {
    /// SEC1 uncompressed: `04 ‖ X ‖ Y`.
    Secp256k1([u8; 65]),
    Ed25519([u8; 32]),
}

impl PublicKey {
    pub fn scheme(&self) -> KeyScheme {
        match self {
            Self::Secp256k1(_) => KeyScheme::Secp256k1,
            Self::Ed25519(_) => KeyScheme::Ed25519,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Secp256k1(bytes) => bytes,
            Self::Ed25519(bytes) => bytes,
        }
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }
}

/// Native balance in the chain's smallest unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub amount: u128,
    pub decimals: u8,
}

impl Balance {
    pub fn new(amount: u128, decimals: u8) -> Self {
        Self { amount, decimals }
    }

    pub fn zero(decimals: u8) -> Self {
        Self::new(0, decimals)
    }
}

/// Address plus public key (hex, chain-specific encoding) for a
/// derived account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedAccount {
    pub address: String,
    pub public_key: String,
}

/// An unsigned transaction together with the digests the signer must
/// sign, in the order the finalizer expects the signatures back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedTransaction<T> {
    pub transaction: T,
    pub hashes_to_sign: Vec<Vec<u8>>,
}

impl<T> PreparedTransaction<T> {
    pub fn new(transaction: T, hashes_to_sign: Vec<Vec<u8>>) -> Self {
        Self {
            transaction,
            hashes_to_sign,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexed_path_renders_canonical_json() {
        let path = DerivationPath::Indexed {
            index: 0,
            scheme: KeyScheme::Secp256k1,
        };
        assert_eq!(path.as_path_string(), r#"{"index":0,"scheme":"secp256k1"}"#);
    }

    #[test]
    fn indexed_path_matches_serde_rendering() {
        let path = DerivationPath::Indexed {
            index: 7,
            scheme: KeyScheme::Ed25519,
        };
        assert_eq!(path.as_path_string(), serde_json::to_string(&path).unwrap());
    }

    #[test]
    fn opaque_path_passes_through() {
        let path = DerivationPath::from("ethereum-1");
        assert_eq!(path.as_path_string(), "ethereum-1");
        assert_eq!(path.scheme(), None);
    }

    #[test]
    fn path_deserializes_from_string_or_object() {
        let opaque: DerivationPath = serde_json::from_str(r#""btc,1""#).unwrap();
        assert_eq!(opaque, DerivationPath::Opaque("btc,1".into()));

        let indexed: DerivationPath =
            serde_json::from_str(r#"{"index":3,"scheme":"ed25519"}"#).unwrap();
        assert_eq!(indexed.scheme(), Some(KeyScheme::Ed25519));
    }

    #[test]
    fn domain_ids() {
        assert_eq!(KeyScheme::Secp256k1.domain_id(), 0);
        assert_eq!(KeyScheme::Ed25519.domain_id(), 1);
    }

    #[test]
    fn public_key_hex() {
        let key = PublicKey::Ed25519([0xab; 32]);
        assert_eq!(key.to_hex(), "ab".repeat(32));
        assert_eq!(key.scheme(), KeyScheme::Ed25519);
    }

    #[test]
    fn derived_account_serializes_camel_case() {
        let account = DerivedAccount {
            address: "0xabc".into(),
            public_key: "04ff".into(),
        };
        let json = serde_json::to_value(&account).unwrap();
        assert_eq!(json["publicKey"], "04ff");
    }

    #[test]
    fn chain_kind_display() {
        assert_eq!(ChainKind::Xrp.to_string(), "xrp");
        assert_eq!(ChainKind::Evm.to_string(), "evm");
    }
}
