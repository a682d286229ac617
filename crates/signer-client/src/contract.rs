use adapter_core::{DerivationPath, KeyScheme, PublicKey, Signature};
use async_trait::async_trait;
use crypto_utils::kdf::derive_child_key;
use crypto_utils::keys::{parse_secp256k1_public_key, uncompressed_bytes};

use crate::error::SignerError;

/// One `sign` invocation: every payload is signed under the key derived
/// for `(signer_account, path)` in the given scheme's domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignRequest {
    pub payloads: Vec<Vec<u8>>,
    pub path: DerivationPath,
    pub key_scheme: KeyScheme,
    /// Account submitting the request. This is the predecessor the
    /// signer derives keys for, so it must match the owner used when
    /// the address was derived.
    pub signer_account: String,
}

/// The remote threshold-signature contract.
#[async_trait]
pub trait ChainSignatureContract: Send + Sync {
    /// Root secp256k1 key as uncompressed SEC1 hex.
    async fn get_public_key(&self) -> Result<String, SignerError>;

    /// Key that `(owner_id, path)` signs with in `scheme`'s domain.
    async fn get_derived_public_key(
        &self,
        owner_id: &str,
        path: &DerivationPath,
        scheme: KeyScheme,
    ) -> Result<PublicKey, SignerError>;

    /// Deposit (yoctoNEAR) the next `sign` call must attach.
    async fn get_current_signature_deposit(&self) -> Result<u128, SignerError>;

    /// Signs every payload, returning signatures in payload order.
    async fn sign(&self, request: &SignRequest) -> Result<Vec<Signature>, SignerError>;
}

/// Computes a secp256k1 child key offline from the root key.
pub fn derive_secp256k1_public_key(
    root_public_key: &str,
    owner_id: &str,
    path: &DerivationPath,
) -> Result<PublicKey, SignerError> {
    let root = parse_secp256k1_public_key(root_public_key)?;
    let child = derive_child_key(&root, owner_id, &path.as_path_string())?;
    Ok(PublicKey::Secp256k1(uncompressed_bytes(&child)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const G_UNCOMPRESSED: &str = "0479be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8";

    #[test]
    fn derives_same_key_as_kdf() {
        let key = derive_secp256k1_public_key(G_UNCOMPRESSED, "alice.near", &"ethereum-1".into())
            .unwrap();
        assert_eq!(
            key.to_hex(),
            "04c2be7ca1d92446a0c8d7ca0dfcbff57c3fc189b30ec07927331e279b295b12d8051126a9504d5ac4b5eeba7e971b9f7623bec1d374b24ec71ee2d3212ec8cff2"
        );
    }

    #[test]
    fn structured_path_uses_canonical_json() {
        let structured = DerivationPath::Indexed {
            index: 0,
            scheme: KeyScheme::Secp256k1,
        };
        let opaque = DerivationPath::from(r#"{"index":0,"scheme":"secp256k1"}"#);
        let a = derive_secp256k1_public_key(G_UNCOMPRESSED, "alice.near", &structured).unwrap();
        let b = derive_secp256k1_public_key(G_UNCOMPRESSED, "alice.near", &opaque).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn bad_root_is_invalid_public_key() {
        let err = derive_secp256k1_public_key("zz", "alice.near", &"p".into()).unwrap_err();
        assert!(matches!(err, SignerError::InvalidPublicKey(_)));
    }
}
