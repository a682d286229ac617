//! Normalized signature shapes handed from the signer client to the
//! adapters' finalizers.

use serde::{Deserialize, Serialize};

use crate::error::AdapterError;

/// ECDSA signature as `{r, s, v}`: 64-char hex scalars and an
/// Ethereum-style recovery byte (27 or 28).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsvSignature {
    pub r: String,
    pub s: String,
    pub v: u8,
}

impl RsvSignature {
    /// Builds a signature, checking hex widths and the `v` range.
    pub fn new(r: impl Into<String>, s: impl Into<String>, v: u8) -> Result<Self, AdapterError> {
        let signature = Self {
            r: r.into().to_lowercase(),
            s: s.into().to_lowercase(),
            v,
        };
        signature.validate()?;
        Ok(signature)
    }

    pub fn validate(&self) -> Result<(), AdapterError> {
        for (name, value) in [("r", &self.r), ("s", &self.s)] {
            if value.len() != 64 || !value.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(AdapterError::InvalidSignature(format!(
                    "{name} must be 64 hex characters"
                )));
            }
        }
        if self.v != 27 && self.v != 28 {
            return Err(AdapterError::InvalidSignature(format!(
                "v must be 27 or 28, got {}",
                self.v
            )));
        }
        Ok(())
    }

    pub fn r_bytes(&self) -> Result<[u8; 32], AdapterError> {
        decode_scalar("r", &self.r)
    }

    pub fn s_bytes(&self) -> Result<[u8; 32], AdapterError> {
        decode_scalar("s", &self.s)
    }

    /// `v - 27`: 0 or 1.
    pub fn recovery_id(&self) -> u8 {
        self.v.saturating_sub(27)
    }

    /// 64-byte `r ‖ s`.
    pub fn to_compact(&self) -> Result<[u8; 64], AdapterError> {
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(&self.r_bytes()?);
        out[32..].copy_from_slice(&self.s_bytes()?);
        Ok(out)
    }
}

fn decode_scalar(name: &str, value: &str) -> Result<[u8; 32], AdapterError> {
    let bytes = hex::decode(value)
        .map_err(|e| AdapterError::InvalidSignature(format!("{name} is not hex: {e}")))?;
    bytes
        .try_into()
        .map_err(|_| AdapterError::InvalidSignature(format!("{name} must be 32 bytes")))
}

/// Raw 64-byte Ed25519 signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ed25519Signature(pub [u8; 64]);

impl Ed25519Signature {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, AdapterError> {
        let array: [u8; 64] = bytes.try_into().map_err(|_| {
            AdapterError::InvalidSignature(format!(
                "ed25519 signature must be 64 bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(array))
    }

    pub fn to_bytes(&self) -> [u8; 64] {
        self.0
    }
}

/// Either signature family, as produced by the signer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signature {
    Ecdsa(RsvSignature),
    Ed25519(Ed25519Signature),
}

impl Signature {
    pub fn as_ecdsa(&self) -> Result<&RsvSignature, AdapterError> {
        match self {
            Self::Ecdsa(sig) => Ok(sig),
            Self::Ed25519(_) => Err(AdapterError::InvalidSignature(
                "expected an ECDSA signature, got Ed25519".into(),
            )),
        }
    }

    pub fn as_ed25519(&self) -> Result<&Ed25519Signature, AdapterError> {
        match self {
            Self::Ed25519(sig) => Ok(sig),
            Self::Ecdsa(_) => Err(AdapterError::InvalidSignature(
                "expected an Ed25519 signature, got ECDSA".into(),
            )),
        }
    }
}

impl From<RsvSignature> for Signature {
    fn from(sig: RsvSignature) -> Self {
        Self::Ecdsa(sig)
    }
}

impl From<Ed25519Signature> for Signature {
    fn from(sig: Ed25519Signature) -> Self {
        Self::Ed25519(sig)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsv_accepts_valid() {
        let sig = RsvSignature::new("a".repeat(64), "B".repeat(64), 28).unwrap();
        assert_eq!(sig.s, "b".repeat(64));
        assert_eq!(sig.recovery_id(), 1);
        assert_eq!(sig.r_bytes().unwrap(), [0xaa; 32]);
    }

    #[test]
    fn rsv_rejects_short_r() {
        let err = RsvSignature::new("ab", "b".repeat(64), 27).unwrap_err();
        assert!(err.to_string().contains("r must be 64 hex"));
    }

    #[test]
    fn rsv_rejects_bad_v() {
        assert!(RsvSignature::new("a".repeat(64), "b".repeat(64), 0).is_err());
        assert!(RsvSignature::new("a".repeat(64), "b".repeat(64), 29).is_err());
    }

    #[test]
    fn compact_concatenates_r_and_s() {
        let sig = RsvSignature::new("11".repeat(32), "22".repeat(32), 27).unwrap();
        let compact = sig.to_compact().unwrap();
        assert_eq!(&compact[..32], &[0x11; 32]);
        assert_eq!(&compact[32..], &[0x22; 32]);
    }

    #[test]
    fn ed25519_length_checked() {
        assert!(Ed25519Signature::from_slice(&[0u8; 63]).is_err());
        assert_eq!(Ed25519Signature::from_slice(&[1u8; 64]).unwrap().to_bytes(), [1u8; 64]);
    }

    #[test]
    fn signature_family_accessors() {
        let sig: Signature = Ed25519Signature([0u8; 64]).into();
        assert!(sig.as_ed25519().is_ok());
        assert!(sig.as_ecdsa().is_err());
    }
}
