use crypto_utils::hash::sha512_half;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::codec::encode_transaction;
use crate::error::XrpError;

/// `STX\0`, prepended to the fields a single signer signs.
pub const HASH_PREFIX_SIGN: [u8; 4] = [0x53, 0x54, 0x58, 0x00];
/// `TXN\0`, prepended to a signed blob to compute its id.
pub const HASH_PREFIX_TX_ID: [u8; 4] = [0x54, 0x58, 0x4e, 0x00];

/// A transaction in rippled's JSON form (`tx_json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct XrpTransaction(pub Map<String, Value>);

impl XrpTransaction {
    pub fn payment(account: &str, destination: &str, drops: u64, destination_tag: Option<u32>) -> Self {
        let mut fields = Map::new();
        fields.insert("TransactionType".into(), json!("Payment"));
        fields.insert("Account".into(), json!(account));
        fields.insert("Destination".into(), json!(destination));
        fields.insert("Amount".into(), json!(drops.to_string()));
        fields.insert("Flags".into(), json!(0));
        if let Some(tag) = destination_tag {
            fields.insert("DestinationTag".into(), json!(tag));
        }
        Self(fields)
    }

    pub fn set(&mut self, field: &str, value: Value) {
        self.0.insert(field.to_string(), value);
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    /// Whether `SigningPubKey` holds an `ED`-prefixed Ed25519 key.
    pub fn is_ed25519(&self) -> bool {
        self.get_str("SigningPubKey")
            .and_then(ed25519_key_hex)
            .is_some()
    }

    /// `STX\0 ‖ signing fields`. Ed25519 signers sign these bytes as is.
    pub fn signing_data(&self) -> Result<Vec<u8>, XrpError> {
        let mut data = HASH_PREFIX_SIGN.to_vec();
        data.extend_from_slice(&encode_transaction(&self.0, true)?);
        Ok(data)
    }

    /// SHA-512Half of [`Self::signing_data`], signed by secp256k1 keys.
    pub fn signing_hash(&self) -> Result<[u8; 32], XrpError> {
        Ok(sha512_half(&self.signing_data()?))
    }

    /// Fully serialized transaction, `TxnSignature` included.
    pub fn to_blob(&self) -> Result<Vec<u8>, XrpError> {
        encode_transaction(&self.0, false)
    }

    pub fn to_json(&self) -> Result<String, XrpError> {
        serde_json::to_string(self).map_err(|e| XrpError::Encoding(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, XrpError> {
        serde_json::from_str(json).map_err(|e| XrpError::Encoding(e.to_string()))
    }
}

/// The 64 hex chars after the `ED` marker of an Ed25519 `SigningPubKey`.
pub(crate) fn ed25519_key_hex(key: &str) -> Option<&str> {
    if key.len() != 66 {
        return None;
    }
    key.get(..2)
        .filter(|marker| marker.eq_ignore_ascii_case("ed"))
        .and_then(|_| key.get(2..))
}

/// Transaction id of a signed blob, uppercase hex.
pub fn transaction_hash(blob: &[u8]) -> String {
    let mut data = HASH_PREFIX_TX_ID.to_vec();
    data.extend_from_slice(blob);
    hex::encode_upper(sha512_half(&data))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment() -> XrpTransaction {
        let mut tx = XrpTransaction::payment(
            "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh",
            "rrrrrrrrrrrrrrrrrrrrBZbvji",
            25,
            Some(9),
        );
        tx.set("Fee", json!("10"));
        tx.set("Sequence", json!(1));
        tx
    }

    #[test]
    fn signing_data_is_prefixed() {
        let tx = payment();
        let data = tx.signing_data().unwrap();
        assert_eq!(&data[..4], b"STX\0");
        assert_eq!(&data[4..], encode_transaction(&tx.0, true).unwrap().as_slice());
        assert_eq!(tx.signing_hash().unwrap(), sha512_half(&data));
    }

    #[test]
    fn detects_ed25519_signing_key() {
        let mut tx = payment();
        assert!(!tx.is_ed25519());
        tx.set("SigningPubKey", json!(format!("ED{}", "11".repeat(32))));
        assert!(tx.is_ed25519());
        tx.set("SigningPubKey", json!(format!("02{}", "11".repeat(32))));
        assert!(!tx.is_ed25519());
    }

    #[test]
    fn non_ascii_signing_key_is_not_ed25519() {
        let mut tx = payment();
        tx.set("SigningPubKey", json!(format!("\u{20ac}{}", "A".repeat(63))));
        assert!(!tx.is_ed25519());
        tx.set("SigningPubKey", json!(format!("E\u{e9}{}", "A".repeat(63))));
        assert!(!tx.is_ed25519());
    }

    #[test]
    fn tx_id_uses_txn_prefix() {
        let blob = [1u8, 2, 3];
        assert_eq!(
            transaction_hash(&blob),
            hex::encode_upper(sha512_half(b"TXN\0\x01\x02\x03"))
        );
    }

    #[test]
    fn json_shape() {
        let json = payment().to_json().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["TransactionType"], "Payment");
        assert_eq!(value["Amount"], "25");
        assert_eq!(value["DestinationTag"], 9);
        assert_eq!(XrpTransaction::from_json(&json).unwrap(), payment());
    }
}
