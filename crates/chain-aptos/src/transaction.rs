//! BCS `RawTransaction`s with entry-function payloads.
//!
//! Signing message: `SHA3-256("APTOS::RawTransaction") || bcs(raw)`. The
//! Ed25519 key signs those bytes directly.

use crypto_utils::hash::sha3_256;
use serde::{Deserialize, Serialize};

use crate::address::AccountAddress;
use crate::bcs::BcsWriter;
use crate::error::AptosError;
use crate::type_tag::TypeTag;

const RAW_TRANSACTION_SALT: &[u8] = b"APTOS::RawTransaction";

/// `TransactionPayload::EntryFunction` variant index.
const PAYLOAD_ENTRY_FUNCTION: u32 = 2;
/// `TransactionAuthenticator::SingleSender`.
const AUTHENTICATOR_SINGLE_SENDER: u32 = 4;
/// `AccountAuthenticator::Ed25519`.
const ACCOUNT_AUTHENTICATOR_ED25519: u32 = 0;

mod hex_args {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(args: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error> {
        args.iter()
            .map(|arg| format!("0x{}", hex::encode(arg)))
            .collect::<Vec<_>>()
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Vec<u8>>, D::Error> {
        Vec::<String>::deserialize(deserializer)?
            .iter()
            .map(|arg| hex::decode(arg.trim_start_matches("0x")).map_err(serde::de::Error::custom))
            .collect()
    }
}

/// A call to `address::module::function<ty_args>(args)`. Each argument is
/// already BCS-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryFunction {
    pub module_address: AccountAddress,
    pub module_name: String,
    pub function_name: String,
    pub type_args: Vec<TypeTag>,
    #[serde(with = "hex_args")]
    pub args: Vec<Vec<u8>>,
}

impl EntryFunction {
    /// `0x1::aptos_account::transfer(to, amount)`: moves APT and creates
    /// the recipient account when missing.
    pub fn apt_transfer(to: &AccountAddress, amount: u64) -> Self {
        Self {
            module_address: AccountAddress::ONE,
            module_name: "aptos_account".into(),
            function_name: "transfer".into(),
            type_args: vec![],
            args: vec![to.0.to_vec(), amount.to_le_bytes().to_vec()],
        }
    }

    /// `0x1::aptos_account::transfer_coins<CoinType>(to, amount)`.
    pub fn coin_transfer(coin_type: TypeTag, to: &AccountAddress, amount: u64) -> Self {
        Self {
            module_address: AccountAddress::ONE,
            module_name: "aptos_account".into(),
            function_name: "transfer_coins".into(),
            type_args: vec![coin_type],
            args: vec![to.0.to_vec(), amount.to_le_bytes().to_vec()],
        }
    }

    fn write_bcs(&self, w: &mut BcsWriter) {
        w.fixed(&self.module_address.0)
            .str(&self.module_name)
            .str(&self.function_name);
        w.seq_len(self.type_args.len());
        for tag in &self.type_args {
            tag.write_bcs(w);
        }
        w.seq_len(self.args.len());
        for arg in &self.args {
            w.bytes(arg);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    pub sender: AccountAddress,
    pub sequence_number: u64,
    pub payload: EntryFunction,
    pub max_gas_amount: u64,
    pub gas_unit_price: u64,
    pub expiration_timestamp_secs: u64,
    pub chain_id: u8,
}

impl RawTransaction {
    pub fn to_bcs(&self) -> Vec<u8> {
        let mut w = BcsWriter::new();
        w.fixed(&self.sender.0).u64(self.sequence_number);
        w.variant(PAYLOAD_ENTRY_FUNCTION);
        self.payload.write_bcs(&mut w);
        w.u64(self.max_gas_amount)
            .u64(self.gas_unit_price)
            .u64(self.expiration_timestamp_secs)
            .u8(self.chain_id);
        w.into_bytes()
    }

    pub fn signing_message(&self) -> Vec<u8> {
        let mut message = sha3_256(RAW_TRANSACTION_SALT).to_vec();
        message.extend_from_slice(&self.to_bcs());
        message
    }
}

/// A raw transaction plus the key that will sign it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedAptosTx {
    pub raw: RawTransaction,
    /// Ed25519 public key, `0x`-prefixed hex.
    pub public_key: String,
}

impl UnsignedAptosTx {
    pub fn public_key_bytes(&self) -> Result<[u8; 32], AptosError> {
        let bytes = hex::decode(self.public_key.trim_start_matches("0x"))
            .map_err(|e| AptosError::InvalidPublicKey(e.to_string()))?;
        bytes.try_into().map_err(|v: Vec<u8>| {
            AptosError::InvalidPublicKey(format!("expected 32 bytes, got {}", v.len()))
        })
    }

    /// BCS `SignedTransaction` with a single-sender Ed25519 authenticator.
    pub fn to_signed_bcs(&self, signature: &[u8; 64]) -> Result<Vec<u8>, AptosError> {
        let public_key = self.public_key_bytes()?;
        let mut w = BcsWriter::new();
        w.fixed(&self.raw.to_bcs())
            .variant(AUTHENTICATOR_SINGLE_SENDER)
            .variant(ACCOUNT_AUTHENTICATOR_ED25519)
            .bytes(&public_key)
            .bytes(signature);
        Ok(w.into_bytes())
    }
}
