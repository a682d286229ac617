//! `MsgSend` transactions in `SIGN_MODE_DIRECT`.
//!
//! The signer signs `SHA-256(SignDoc)`, where the sign doc carries the
//! protobuf-encoded body and auth info verbatim. Those encoded bytes are
//! what gets persisted between preparation and finalization, so the
//! broadcast `TxRaw` embeds exactly the bytes that were hashed.

use cosmos_sdk_proto::cosmos::bank::v1beta1::MsgSend;
use cosmos_sdk_proto::cosmos::base::v1beta1::Coin;
use cosmos_sdk_proto::cosmos::crypto::secp256k1::PubKey;
use cosmos_sdk_proto::cosmos::tx::signing::v1beta1::SignMode;
use cosmos_sdk_proto::cosmos::tx::v1beta1::{
    mode_info, AuthInfo, Fee, ModeInfo, SignDoc, SignerInfo, TxBody, TxRaw,
};
use cosmos_sdk_proto::traits::Message;
use cosmos_sdk_proto::Any;
use crypto_utils::hash::sha256;
use serde::{Deserialize, Serialize};

use crate::error::CosmosError;

const MSG_SEND_TYPE_URL: &str = "/cosmos.bank.v1beta1.MsgSend";
const SECP256K1_PUBKEY_TYPE_URL: &str = "/cosmos.crypto.secp256k1.PubKey";

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

/// Everything a bank send needs, already resolved against chain state.
#[derive(Debug, Clone, PartialEq)]
pub struct SendParams {
    pub from: String,
    pub to: String,
    pub amount: u128,
    pub denom: String,
    pub memo: String,
    pub fee_amount: u128,
    pub gas_limit: u64,
    pub public_key: [u8; 33],
    pub account_number: u64,
    pub sequence: u64,
    pub chain_id: String,
}

/// The sign doc fields of an unsigned transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedCosmosTx {
    #[serde(with = "base64_bytes")]
    pub body_bytes: Vec<u8>,
    #[serde(with = "base64_bytes")]
    pub auth_info_bytes: Vec<u8>,
    pub chain_id: String,
    pub account_number: u64,
}

impl UnsignedCosmosTx {
    pub fn sign_doc(&self) -> SignDoc {
        SignDoc {
            body_bytes: self.body_bytes.clone(),
            auth_info_bytes: self.auth_info_bytes.clone(),
            chain_id: self.chain_id.clone(),
            account_number: self.account_number,
        }
    }

    pub fn sign_doc_bytes(&self) -> Vec<u8> {
        self.sign_doc().encode_to_vec()
    }

    pub fn sign_hash(&self) -> [u8; 32] {
        sha256(&self.sign_doc_bytes())
    }

    /// Protobuf `TxRaw` carrying one compact `r || s` signature.
    pub fn to_tx_raw(&self, signature: [u8; 64]) -> Vec<u8> {
        TxRaw {
            body_bytes: self.body_bytes.clone(),
            auth_info_bytes: self.auth_info_bytes.clone(),
            signatures: vec![signature.to_vec()],
        }
        .encode_to_vec()
    }
}

pub fn build_send(params: &SendParams) -> Result<UnsignedCosmosTx, CosmosError> {
    if params.amount == 0 {
        return Err(CosmosError::TransactionBuildError("amount must be > 0".into()));
    }
    if params.denom.is_empty() {
        return Err(CosmosError::TransactionBuildError("denom must not be empty".into()));
    }

    let send = MsgSend {
        from_address: params.from.clone(),
        to_address: params.to.clone(),
        amount: vec![Coin {
            denom: params.denom.clone(),
            amount: params.amount.to_string(),
        }],
    };
    let body = TxBody {
        messages: vec![Any {
            type_url: MSG_SEND_TYPE_URL.into(),
            value: send.encode_to_vec(),
        }],
        memo: params.memo.clone(),
        ..Default::default()
    };

    let public_key = Any {
        type_url: SECP256K1_PUBKEY_TYPE_URL.into(),
        value: PubKey {
            key: params.public_key.to_vec(),
        }
        .encode_to_vec(),
    };
    let auth_info = AuthInfo {
        signer_infos: vec![SignerInfo {
            public_key: Some(public_key),
            mode_info: Some(ModeInfo {
                sum: Some(mode_info::Sum::Single(mode_info::Single {
                    mode: SignMode::Direct as i32,
                })),
            }),
            sequence: params.sequence,
        }],
        fee: Some(Fee {
            amount: vec![Coin {
                denom: params.denom.clone(),
                amount: params.fee_amount.to_string(),
            }],
            gas_limit: params.gas_limit,
            ..Default::default()
        }),
        ..Default::default()
    };

    Ok(UnsignedCosmosTx {
        body_bytes: body.encode_to_vec(),
        auth_info_bytes: auth_info.encode_to_vec(),
        chain_id: params.chain_id.clone(),
        account_number: params.account_number,
    })
}

/// `ceil(gas_limit * gas_price)` in the fee denom.
pub fn fee_for_gas(gas_limit: u64, gas_price: f64) -> u128 {
    (gas_limit as f64 * gas_price).ceil().max(0.0) as u128
}
