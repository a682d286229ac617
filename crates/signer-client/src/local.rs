//! In-process signer holding the root secret directly.
//!
//! Secp256k1 keys follow the same additive derivation as the network
//! (`x + ε`), so addresses derived against a `LocalSigner` match the
//! offline KDF. Ed25519 keys are seeded from `SHA-256(seed ‖ owner ‖ "," ‖ path)`;
//! they are stable but not the keys the network would produce.

use adapter_core::{DerivationPath, Ed25519Signature, KeyScheme, PublicKey, RsvSignature, Signature};
use async_trait::async_trait;
use crypto_utils::kdf::derive_epsilon;
use crypto_utils::keys::uncompressed_hex;
use ed25519_dalek::Signer as _;
use k256::ecdsa::SigningKey;
use k256::{NonZeroScalar, SecretKey};
use sha2::{Digest, Sha256};

use crate::contract::{derive_secp256k1_public_key, ChainSignatureContract, SignRequest};
use crate::error::SignerError;

pub struct LocalSigner {
    root: SecretKey,
    ed25519_seed: [u8; 32],
}

impl LocalSigner {
    pub fn new(root_secret: &[u8; 32], ed25519_seed: [u8; 32]) -> Result<Self, SignerError> {
        let root = SecretKey::from_slice(root_secret)
            .map_err(|_| SignerError::InvalidRequest("root secret is not a valid scalar".into()))?;
        Ok(Self { root, ed25519_seed })
    }

    /// Deterministic signer for tests and local networks.
    pub fn from_seed(seed: &[u8]) -> Result<Self, SignerError> {
        let root: [u8; 32] = Sha256::new()
            .chain_update(b"local secp256k1 root")
            .chain_update(seed)
            .finalize()
            .into();
        let ed25519_seed: [u8; 32] = Sha256::new()
            .chain_update(b"local ed25519 root")
            .chain_update(seed)
            .finalize()
            .into();
        Self::new(&root, ed25519_seed)
    }

    fn root_hex(&self) -> String {
        uncompressed_hex(&self.root.public_key())
    }

    fn secp256k1_key(&self, owner: &str, path: &DerivationPath) -> Result<SigningKey, SignerError> {
        let epsilon = derive_epsilon(owner, &path.as_path_string());
        let tweaked = *self.root.to_nonzero_scalar() + epsilon;
        let scalar = Option::<NonZeroScalar>::from(NonZeroScalar::new(tweaked))
            .ok_or_else(|| SignerError::InvalidRequest("derived scalar is zero".into()))?;
        Ok(SigningKey::from(scalar))
    }

    fn ed25519_key(&self, owner: &str, path: &DerivationPath) -> ed25519_dalek::SigningKey {
        let seed: [u8; 32] = Sha256::new()
            .chain_update(self.ed25519_seed)
            .chain_update(owner.as_bytes())
            .chain_update(b",")
            .chain_update(path.as_path_string().as_bytes())
            .finalize()
            .into();
        ed25519_dalek::SigningKey::from_bytes(&seed)
    }

    fn sign_ecdsa(&self, key: &SigningKey, payload: &[u8]) -> Result<Signature, SignerError> {
        if payload.len() != 32 {
            return Err(SignerError::InvalidRequest(format!(
                "ecdsa payload must be 32 bytes, got {}",
                payload.len()
            )));
        }
        let (signature, recovery_id) = key
            .sign_prehash_recoverable(payload)
            .map_err(|e| SignerError::CallFailed(format!("local signing failed: {e}")))?;
        if recovery_id.is_x_reduced() {
            return Err(SignerError::CallFailed("x-reduced recovery id".into()));
        }
        let bytes = signature.to_bytes();
        let rsv = RsvSignature::new(
            hex::encode(&bytes[..32]),
            hex::encode(&bytes[32..]),
            27 + recovery_id.to_byte(),
        )
        .map_err(|e| SignerError::InvalidResponse(e.to_string()))?;
        Ok(Signature::Ecdsa(rsv))
    }
}

#[async_trait]
impl ChainSignatureContract for LocalSigner {
    async fn get_public_key(&self) -> Result<String, SignerError> {
        Ok(self.root_hex())
    }

    async fn get_derived_public_key(
        &self,
        owner_id: &str,
        path: &DerivationPath,
        scheme: KeyScheme,
    ) -> Result<PublicKey, SignerError> {
        match scheme {
            KeyScheme::Secp256k1 => derive_secp256k1_public_key(&self.root_hex(), owner_id, path),
            KeyScheme::Ed25519 => Ok(PublicKey::Ed25519(
                self.ed25519_key(owner_id, path).verifying_key().to_bytes(),
            )),
        }
    }

    async fn get_current_signature_deposit(&self) -> Result<u128, SignerError> {
        Ok(1)
    }

    async fn sign(&self, request: &SignRequest) -> Result<Vec<Signature>, SignerError> {
        tracing::debug!(
            owner = %request.signer_account,
            path = %request.path,
            payloads = request.payloads.len(),
            "signing locally"
        );
        match request.key_scheme {
            KeyScheme::Secp256k1 => {
                let key = self.secp256k1_key(&request.signer_account, &request.path)?;
                request
                    .payloads
                    .iter()
                    .map(|payload| self.sign_ecdsa(&key, payload))
                    .collect()
            }
            KeyScheme::Ed25519 => {
                let key = self.ed25519_key(&request.signer_account, &request.path);
                Ok(request
                    .payloads
                    .iter()
                    .map(|payload| Signature::Ed25519(Ed25519Signature(key.sign(payload).to_bytes())))
                    .collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use ed25519_dalek::Verifier as _;
    use k256::ecdsa::{RecoveryId, VerifyingKey};

    use super::*;

    fn request(scheme: KeyScheme, payloads: Vec<Vec<u8>>) -> SignRequest {
        SignRequest {
            payloads,
            path: "test-path".into(),
            key_scheme: scheme,
            signer_account: "alice.testnet".into(),
        }
    }

    #[tokio::test]
    async fn ecdsa_signature_recovers_to_derived_key() {
        let signer = LocalSigner::from_seed(b"unit").unwrap();
        let digest = [0x42u8; 32];
        let signatures = signer
            .sign(&request(KeyScheme::Secp256k1, vec![digest.to_vec()]))
            .await
            .unwrap();
        let rsv = signatures[0].as_ecdsa().unwrap().clone();

        let sig = k256::ecdsa::Signature::from_slice(&rsv.to_compact().unwrap()).unwrap();
        let recid = RecoveryId::from_byte(rsv.recovery_id()).unwrap();
        let recovered = VerifyingKey::recover_from_prehash(&digest, &sig, recid).unwrap();

        let derived = signer
            .get_derived_public_key("alice.testnet", &"test-path".into(), KeyScheme::Secp256k1)
            .await
            .unwrap();
        assert_eq!(
            recovered.to_encoded_point(false).as_bytes(),
            derived.as_bytes()
        );
    }

    #[tokio::test]
    async fn ed25519_signature_verifies() {
        let signer = LocalSigner::from_seed(b"unit").unwrap();
        let message = b"aptos message".to_vec();
        let signatures = signer
            .sign(&request(KeyScheme::Ed25519, vec![message.clone()]))
            .await
            .unwrap();
        let sig = signatures[0].as_ed25519().unwrap().to_bytes();

        let derived = signer
            .get_derived_public_key("alice.testnet", &"test-path".into(), KeyScheme::Ed25519)
            .await
            .unwrap();
        let PublicKey::Ed25519(pk) = derived else {
            panic!("expected ed25519 key");
        };
        let verifying = ed25519_dalek::VerifyingKey::from_bytes(&pk).unwrap();
        verifying
            .verify(&message, &ed25519_dalek::Signature::from_bytes(&sig))
            .unwrap();
    }

    #[tokio::test]
    async fn signatures_keep_payload_order() {
        let signer = LocalSigner::from_seed(b"unit").unwrap();
        let payloads = vec![[1u8; 32].to_vec(), [2u8; 32].to_vec(), [3u8; 32].to_vec()];
        let signatures = signer
            .sign(&request(KeyScheme::Secp256k1, payloads.clone()))
            .await
            .unwrap();
        assert_eq!(signatures.len(), 3);

        let single = signer
            .sign(&request(KeyScheme::Secp256k1, vec![payloads[1].clone()]))
            .await
            .unwrap();
        assert_eq!(signatures[1], single[0]);
    }

    #[tokio::test]
    async fn short_ecdsa_payload_rejected() {
        let signer = LocalSigner::from_seed(b"unit").unwrap();
        let err = signer
            .sign(&request(KeyScheme::Secp256k1, vec![vec![1, 2, 3]]))
            .await
            .unwrap_err();
        assert!(matches!(err, SignerError::InvalidRequest(_)));
    }
}
