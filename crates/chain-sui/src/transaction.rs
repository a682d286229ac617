//! Intent signing for SUI transaction data.
//!
//! Digest: `Blake2b-256(intent || tx_bytes)` with the transaction-data
//! intent `[scope 0, version 0, app 0]`. The wire signature is
//! `base64(flag || signature || public_key)`.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use crypto_utils::hash::blake2b_256;
use serde::{Deserialize, Serialize};

use crate::address::ED25519_FLAG;
use crate::error::SuiError;

const TRANSACTION_DATA_INTENT: [u8; 3] = [0, 0, 0];

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(s).map_err(serde::de::Error::custom)
    }
}

/// BCS `TransactionData` as returned by the fullnode, plus the signer key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedSuiTx {
    #[serde(with = "base64_bytes")]
    pub tx_bytes: Vec<u8>,
    /// Ed25519 public key, hex.
    pub public_key: String,
}

impl UnsignedSuiTx {
    pub fn digest(&self) -> [u8; 32] {
        let mut message = Vec::with_capacity(3 + self.tx_bytes.len());
        message.extend_from_slice(&TRANSACTION_DATA_INTENT);
        message.extend_from_slice(&self.tx_bytes);
        blake2b_256(&message)
    }

    fn public_key_bytes(&self) -> Result<[u8; 32], SuiError> {
        let bytes = hex::decode(self.public_key.trim_start_matches("0x"))
            .map_err(|e| SuiError::InvalidPublicKey(e.to_string()))?;
        bytes.try_into().map_err(|v: Vec<u8>| {
            SuiError::InvalidPublicKey(format!("expected 32 bytes, got {}", v.len()))
        })
    }

    pub fn serialized_signature(&self, signature: &[u8; 64]) -> Result<String, SuiError> {
        let mut out = Vec::with_capacity(1 + 64 + 32);
        out.push(ED25519_FLAG);
        out.extend_from_slice(signature);
        out.extend_from_slice(&self.public_key_bytes()?);
        Ok(BASE64.encode(out))
    }

    pub fn sign(&self, signature: &[u8; 64]) -> Result<SignedSuiTx, SuiError> {
        Ok(SignedSuiTx {
            tx_bytes: BASE64.encode(&self.tx_bytes),
            signatures: vec![self.serialized_signature(signature)?],
        })
    }
}

/// Arguments of `sui_executeTransactionBlock`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedSuiTx {
    pub tx_bytes: String,
    pub signatures: Vec<String>,
}

impl SignedSuiTx {
    pub fn to_json(&self) -> Result<String, SuiError> {
        serde_json::to_string(self).map_err(|e| SuiError::Encoding(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, SuiError> {
        serde_json::from_str(json).map_err(|e| SuiError::Encoding(e.to_string()))
    }
}
