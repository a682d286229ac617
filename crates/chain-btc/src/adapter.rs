use std::sync::Arc;

use adapter_core::{
    ensure_signatures, AdapterError, Balance, ChainAdapter, ChainKind, DerivationPath,
    DerivedAccount, KeyScheme, PreparedTransaction, PublicKey, RpcError, Signature,
};
use async_trait::async_trait;
use crypto_utils::keys::{compressed_bytes, parse_secp256k1_public_key};
use serde::{Deserialize, Serialize};
use signer_client::ChainSignatureContract;

use crate::address::{parse_address, pubkey_to_address, AddressType};
use crate::config::BtcConfig;
use crate::network::BtcNetwork;
use crate::rpc::BtcRpc;
use crate::transaction::{
    attach_signatures, build_p2wpkh_transaction, serialize_hex, sighashes, UnsignedBtcTx,
};
use crate::utxo::Utxo;

pub const BTC_DECIMALS: u8 = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BtcTransactionRequest {
    /// P2WPKH address of the sender; change returns here.
    pub from: String,
    /// Sender key, compressed or uncompressed SEC1 hex.
    pub from_public_key: String,
    pub to: String,
    pub value_sat: u64,
    #[serde(default)]
    pub fee_rate_sat_vbyte: Option<u64>,
}

pub struct BitcoinAdapter<R> {
    rpc: R,
    contract: Arc<dyn ChainSignatureContract>,
    network: BtcNetwork,
    address_type: AddressType,
    fee_target_blocks: u16,
}

impl<R: BtcRpc> BitcoinAdapter<R> {
    pub fn new(rpc: R, contract: Arc<dyn ChainSignatureContract>, config: &BtcConfig) -> Self {
        Self {
            rpc,
            contract,
            network: config.network,
            address_type: config.address_type,
            fee_target_blocks: config.fee_target_blocks,
        }
    }

    async fn fee_rate(&self, request: &BtcTransactionRequest) -> Result<u64, AdapterError> {
        if let Some(rate) = request.fee_rate_sat_vbyte {
            return Ok(rate.max(1));
        }
        let rate = self
            .rpc
            .fee_rate(self.fee_target_blocks)
            .await
            .map_err(AdapterError::preparation)?;
        Ok((rate.ceil() as u64).max(1))
    }

    /// The sender must be the P2WPKH address of the supplied key.
    fn sender_key(&self, request: &BtcTransactionRequest) -> Result<[u8; 33], AdapterError> {
        let key = parse_secp256k1_public_key(&request.from_public_key)
            .map_err(|e| AdapterError::InvalidKeyFormat(e.to_string()))?;
        let compressed = compressed_bytes(&key);

        let segwit = pubkey_to_address(&compressed, AddressType::P2wpkh, self.network)?;
        if segwit == request.from {
            return Ok(compressed);
        }
        let legacy = pubkey_to_address(&compressed, AddressType::P2pkh, self.network)?;
        if legacy == request.from {
            return Err(AdapterError::UnsupportedAddressType(
                "p2pkh spending; only p2wpkh inputs can be signed".into(),
            ));
        }
        Err(AdapterError::InvalidTransaction(format!(
            "{} is not the p2wpkh address of the supplied public key",
            request.from
        )))
    }
}

#[async_trait]
impl<R: BtcRpc> ChainAdapter for BitcoinAdapter<R> {
    type TransactionRequest = BtcTransactionRequest;
    type UnsignedTransaction = UnsignedBtcTx;

    fn chain(&self) -> ChainKind {
        ChainKind::Bitcoin
    }

    fn key_scheme(&self) -> KeyScheme {
        KeyScheme::Secp256k1
    }

    async fn get_balance(&self, address: &str) -> Result<Balance, AdapterError> {
        // Esplora answers 400 for malformed input too; only a well-formed
        // address may read as empty.
        parse_address(address, self.network)?;
        match self.rpc.get_balance(address).await {
            Ok(sat) => Ok(Balance::new(sat as u128, BTC_DECIMALS)),
            Err(RpcError::Status { status: 400 | 404, .. }) => {
                tracing::debug!(chain = "bitcoin", address, "unknown address, zero balance");
                Ok(Balance::zero(BTC_DECIMALS))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn derive_address_and_public_key(
        &self,
        owner_id: &str,
        path: &DerivationPath,
    ) -> Result<DerivedAccount, AdapterError> {
        let key = self
            .contract
            .get_derived_public_key(owner_id, path, KeyScheme::Secp256k1)
            .await?;
        let PublicKey::Secp256k1(uncompressed) = key else {
            return Err(AdapterError::InvalidKeyFormat("expected a secp256k1 key".into()));
        };
        let parsed = parse_secp256k1_public_key(&hex::encode(uncompressed))
            .map_err(|e| AdapterError::InvalidKeyFormat(e.to_string()))?;
        let compressed = compressed_bytes(&parsed);
        Ok(DerivedAccount {
            address: pubkey_to_address(&compressed, self.address_type, self.network)?,
            public_key: hex::encode(compressed),
        })
    }

    async fn prepare_transaction_for_signing(
        &self,
        request: BtcTransactionRequest,
    ) -> Result<PreparedTransaction<UnsignedBtcTx>, AdapterError> {
        let public_key = self.sender_key(&request)?;
        let script_pubkey = parse_address(&request.from, self.network)?
            .script_pubkey()
            .to_bytes();

        let utxos: Vec<Utxo> = self
            .rpc
            .list_utxos(&request.from)
            .await
            .map_err(AdapterError::preparation)?
            .into_iter()
            .map(|u| Utxo {
                txid: u.txid,
                vout: u.vout,
                amount_sat: u.value,
                script_pubkey: script_pubkey.clone(),
            })
            .collect();
        let fee_rate = self.fee_rate(&request).await?;

        let unsigned = build_p2wpkh_transaction(
            &utxos,
            &request.to,
            request.value_sat,
            &request.from,
            fee_rate,
            self.network,
            &public_key,
        )?;
        let hashes = sighashes(&unsigned)?;
        tracing::debug!(
            chain = "bitcoin",
            inputs = unsigned.tx.input.len(),
            outputs = unsigned.tx.output.len(),
            fee_sat = unsigned.fee_sat(),
            "prepared transaction"
        );
        Ok(PreparedTransaction::new(
            unsigned,
            hashes.into_iter().map(|h| h.to_vec()).collect(),
        ))
    }

    fn finalize_transaction_signing(
        &self,
        transaction: UnsignedBtcTx,
        signatures: &[Signature],
    ) -> Result<String, AdapterError> {
        ensure_signatures(signatures, transaction.tx.input.len())?;
        let pairs = signatures
            .iter()
            .map(|sig| -> Result<_, AdapterError> {
                let rsv = sig.as_ecdsa()?;
                Ok((rsv.r_bytes()?, rsv.s_bytes()?))
            })
            .collect::<Result<Vec<_>, AdapterError>>()?;
        let signed = attach_signatures(&transaction, &pairs)?;
        Ok(serialize_hex(&signed))
    }

    async fn broadcast_tx(&self, signed_transaction: &str) -> Result<String, AdapterError> {
        match self.rpc.broadcast(signed_transaction).await {
            Ok(txid) => {
                tracing::info!(chain = "bitcoin", txid = %txid, "broadcast accepted");
                Ok(txid)
            }
            Err(RpcError::Status { body, .. }) => {
                tracing::warn!(chain = "bitcoin", reason = %body, "broadcast rejected");
                Err(AdapterError::BroadcastFailed(body))
            }
            Err(e) => Err(e.into()),
        }
    }
}
