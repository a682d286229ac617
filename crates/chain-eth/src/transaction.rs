use alloy_primitives::{Address, Bytes, U256};
use alloy_rlp::{Encodable, RlpEncodable};
use crypto_utils::hash::keccak256;
use serde::{Deserialize, Serialize};

use crate::address::parse_address;
use crate::error::EthError;

/// An unsigned EIP-1559 (type 2) transaction plus its sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EthTransaction {
    /// Sender; not part of the encoding, kept so callers can check it.
    pub from: String,
    pub chain_id: u64,
    pub nonce: u64,
    pub max_priority_fee_per_gas: u128,
    pub max_fee_per_gas: u128,
    pub gas_limit: u64,
    /// Recipient as a 0x-prefixed hex string.
    pub to: String,
    /// Value in wei.
    pub value: u128,
    #[serde(default)]
    pub data: Bytes,
}

impl EthTransaction {
    pub fn validate(&self) -> Result<(), EthError> {
        parse_address(&self.from)?;
        parse_address(&self.to)?;
        if self.max_priority_fee_per_gas > self.max_fee_per_gas {
            return Err(EthError::TransactionBuildError(
                "max priority fee exceeds max fee".into(),
            ));
        }
        Ok(())
    }
}

/// Encodes the unsigned transaction as `0x02 || rlp(fields)`.
///
/// The RLP-encoded fields are:
/// `[chain_id, nonce, max_priority_fee_per_gas, max_fee_per_gas, gas_limit, to,
///   value, data, access_list]`
pub fn encode_unsigned_tx(tx: &EthTransaction) -> Result<Vec<u8>, EthError> {
    let fields = UnsignedTxFields {
        chain_id: tx.chain_id,
        nonce: tx.nonce,
        max_priority_fee_per_gas: tx.max_priority_fee_per_gas,
        max_fee_per_gas: tx.max_fee_per_gas,
        gas_limit: tx.gas_limit,
        to: Address::from(parse_address(&tx.to)?),
        value: tx.value,
        data: tx.data.clone(),
        access_list: Vec::new(),
    };
    Ok(typed_envelope(&fields))
}

/// Keccak-256 of the unsigned encoding; the digest the sender signs.
pub fn signing_hash(tx: &EthTransaction) -> Result<[u8; 32], EthError> {
    Ok(keccak256(&encode_unsigned_tx(tx)?))
}

/// Encodes the signed transaction with `(y_parity, r, s)` appended.
pub fn encode_signed_tx(
    tx: &EthTransaction,
    y_parity: u8,
    r: [u8; 32],
    s: [u8; 32],
) -> Result<Vec<u8>, EthError> {
    if y_parity > 1 {
        return Err(EthError::SigningError(format!(
            "y parity must be 0 or 1, got {y_parity}"
        )));
    }
    let fields = SignedTxFields {
        chain_id: tx.chain_id,
        nonce: tx.nonce,
        max_priority_fee_per_gas: tx.max_priority_fee_per_gas,
        max_fee_per_gas: tx.max_fee_per_gas,
        gas_limit: tx.gas_limit,
        to: Address::from(parse_address(&tx.to)?),
        value: tx.value,
        data: tx.data.clone(),
        access_list: Vec::new(),
        signature_y_parity: y_parity,
        signature_r: U256::from_be_bytes(r),
        signature_s: U256::from_be_bytes(s),
    };
    Ok(typed_envelope(&fields))
}

/// Transaction hash of raw signed bytes, `0x`-prefixed.
pub fn transaction_hash(raw_tx: &[u8]) -> String {
    format!("0x{}", hex::encode(keccak256(raw_tx)))
}

fn typed_envelope<T: Encodable>(fields: &T) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + fields.length());
    out.push(0x02);
    fields.encode(&mut out);
    out
}

// ---------------------------------------------------------------------------
// RLP-encodable structures
// ---------------------------------------------------------------------------

#[derive(RlpEncodable)]
struct UnsignedTxFields {
    chain_id: u64,
    nonce: u64,
    max_priority_fee_per_gas: u128,
    max_fee_per_gas: u128,
    gas_limit: u64,
    to: Address,
    value: u128,
    data: Bytes,
    access_list: Vec<AccessListItem>,
}

#[derive(RlpEncodable)]
struct SignedTxFields {
    chain_id: u64,
    nonce: u64,
    max_priority_fee_per_gas: u128,
    max_fee_per_gas: u128,
    gas_limit: u64,
    to: Address,
    value: u128,
    data: Bytes,
    access_list: Vec<AccessListItem>,
    signature_y_parity: u8,
    signature_r: U256,
    signature_s: U256,
}

/// EIP-2930 access list entry. Always empty here.
#[derive(Debug, Clone, RlpEncodable)]
struct AccessListItem {
    address: Address,
    storage_keys: Vec<[u8; 32]>,
}
