//! Additive child-key derivation for the MPC signer.
//!
//! The signer holds one root secret `x` with public key `X = x·G`. For a
//! requesting account (the predecessor) and an arbitrary path string it
//! signs with `x + ε`, where
//!
//! ```text
//! ε = SHA3-256("near-mpc-recovery v0.1.0 epsilon derivation:" ‖ predecessor ‖ "," ‖ path) mod n
//! ```
//!
//! so the matching public key is `X + ε·G` and can be computed offline.

use k256::elliptic_curve::ops::Reduce;
use k256::{ProjectivePoint, PublicKey, Scalar, U256};
use sha3::{Digest, Sha3_256};

use crate::error::CryptoError;
use crate::keys::{parse_secp256k1_public_key, uncompressed_hex};

pub const EPSILON_DERIVATION_PREFIX: &str = "near-mpc-recovery v0.1.0 epsilon derivation:";

/// Computes the derivation tweak `ε` for `(predecessor, path)`.
pub fn derive_epsilon(predecessor: &str, path: &str) -> Scalar {
    let mut hasher = Sha3_256::new();
    hasher.update(EPSILON_DERIVATION_PREFIX.as_bytes());
    hasher.update(predecessor.as_bytes());
    hasher.update(b",");
    hasher.update(path.as_bytes());
    let digest = hasher.finalize();
    <Scalar as Reduce<U256>>::reduce(U256::from_be_slice(&digest))
}

/// Returns `root + ε·G`.
pub fn derive_child_key(root: &PublicKey, predecessor: &str, path: &str) -> Result<PublicKey, CryptoError> {
    let epsilon = derive_epsilon(predecessor, path);
    let child = ProjectivePoint::GENERATOR * epsilon + root.to_projective();
    PublicKey::from_affine(child.to_affine())
        .map_err(|_| CryptoError::InvalidKeyFormat("derived key is the identity point".into()))
}

/// Derives the child key for `(predecessor, path)` from a root key in any
/// accepted text form and returns it as uncompressed SEC1 hex
/// (130 characters, leading `04`, no `0x`).
pub fn derive_child_public_key(
    root_public_key: &str,
    predecessor: &str,
    path: &str,
) -> Result<String, CryptoError> {
    let root = parse_secp256k1_public_key(root_public_key)?;
    let child = derive_child_key(&root, predecessor, path)?;
    Ok(uncompressed_hex(&child))
}
