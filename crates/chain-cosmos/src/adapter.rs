use std::sync::Arc;

use adapter_core::{
    ensure_signatures, AdapterError, Balance, ChainAdapter, ChainKind, DerivationPath,
    DerivedAccount, KeyScheme, PreparedTransaction, PublicKey, RpcError, Signature,
};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use crypto_utils::der::normalize_low_s;
use crypto_utils::keys::{compressed_bytes, parse_secp256k1_public_key};
use serde::{Deserialize, Serialize};
use signer_client::ChainSignatureContract;

use crate::address::{parse_address, pubkey_to_address};
use crate::config::CosmosConfig;
use crate::error::CosmosError;
use crate::rpc::CosmosRpc;
use crate::transaction::{build_send, fee_for_gas, SendParams, UnsignedCosmosTx};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CosmosTransactionRequest {
    pub from: String,
    /// Sender key, compressed or uncompressed SEC1 hex.
    pub from_public_key: String,
    pub to: String,
    /// Amount in the configured denom's base unit.
    pub amount: u128,
    #[serde(default)]
    pub memo: String,
    #[serde(default)]
    pub gas_limit: Option<u64>,
}

pub struct CosmosAdapter<R> {
    rpc: R,
    contract: Arc<dyn ChainSignatureContract>,
    config: CosmosConfig,
}

impl<R: CosmosRpc> CosmosAdapter<R> {
    pub fn new(rpc: R, contract: Arc<dyn ChainSignatureContract>, config: CosmosConfig) -> Self {
        Self {
            rpc,
            contract,
            config,
        }
    }

    fn sender_key(&self, request: &CosmosTransactionRequest) -> Result<[u8; 33], AdapterError> {
        let key = parse_secp256k1_public_key(&request.from_public_key)
            .map_err(|e| AdapterError::InvalidKeyFormat(e.to_string()))?;
        let compressed = compressed_bytes(&key);
        if pubkey_to_address(&compressed, &self.config.prefix)? != request.from {
            return Err(CosmosError::InvalidAddress(format!(
                "{} does not belong to the supplied public key",
                request.from
            ))
            .into());
        }
        Ok(compressed)
    }
}

#[async_trait]
impl<R: CosmosRpc> ChainAdapter for CosmosAdapter<R> {
    type TransactionRequest = CosmosTransactionRequest;
    type UnsignedTransaction = UnsignedCosmosTx;

    fn chain(&self) -> ChainKind {
        ChainKind::Cosmos
    }

    fn key_scheme(&self) -> KeyScheme {
        KeyScheme::Secp256k1
    }

    async fn get_balance(&self, address: &str) -> Result<Balance, AdapterError> {
        let amount = self.rpc.balance(address, &self.config.denom).await?;
        tracing::debug!(chain = "cosmos", address, denom = %self.config.denom, amount = %amount, "balance");
        Ok(Balance::new(amount, self.config.decimals))
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
            address: pubkey_to_address(&compressed, &self.config.prefix)?,
            public_key: hex::encode(compressed),
        })
    }

    async fn prepare_transaction_for_signing(
        &self,
        request: CosmosTransactionRequest,
    ) -> Result<PreparedTransaction<UnsignedCosmosTx>, AdapterError> {
        let public_key = self.sender_key(&request)?;
        parse_address(&request.to, &self.config.prefix)?;

        let account = self
            .rpc
            .account(&request.from)
            .await
            .map_err(AdapterError::preparation)?;
        let gas_limit = request.gas_limit.unwrap_or(self.config.gas_limit);

        let unsigned = build_send(&SendParams {
            from: request.from,
            to: request.to,
            amount: request.amount,
            denom: self.config.denom.clone(),
            memo: request.memo,
            fee_amount: fee_for_gas(gas_limit, self.config.gas_price),
            gas_limit,
            public_key,
            account_number: account.account_number,
            sequence: account.sequence,
            chain_id: self.config.chain_id.clone(),
        })?;
        tracing::debug!(
            chain = "cosmos",
            chain_id = %unsigned.chain_id,
            account_number = account.account_number,
            sequence = account.sequence,
            "prepared transaction"
        );
        let hash = unsigned.sign_hash().to_vec();
        Ok(PreparedTransaction::new(unsigned, vec![hash]))
    }

    fn finalize_transaction_signing(
        &self,
        transaction: UnsignedCosmosTx,
        signatures: &[Signature],
    ) -> Result<String, AdapterError> {
        ensure_signatures(signatures, 1)?;
        let rsv = signatures[0].as_ecdsa()?;
        let (r, s, _) = normalize_low_s(&rsv.r_bytes()?, &rsv.s_bytes()?)
            .map_err(|e| AdapterError::InvalidSignature(e.to_string()))?;
        let mut compact = [0u8; 64];
        compact[..32].copy_from_slice(&r);
        compact[32..].copy_from_slice(&s);
        Ok(BASE64.encode(transaction.to_tx_raw(compact)))
    }

    async fn broadcast_tx(&self, signed_transaction: &str) -> Result<String, AdapterError> {
        let response = match self.rpc.broadcast(signed_transaction).await {
            Ok(response) => response,
            Err(RpcError::Status { body, .. }) => {
                tracing::warn!(chain = "cosmos", reason = %body, "broadcast rejected");
                return Err(AdapterError::BroadcastFailed(body));
            }
            Err(e) => return Err(e.into()),
        };
        if response.code != 0 {
            tracing::warn!(
                chain = "cosmos",
                code = response.code,
                reason = %response.raw_log,
                "broadcast rejected"
            );
            return Err(AdapterError::BroadcastFailed(response.raw_log));
        }
        tracing::info!(chain = "cosmos", txhash = %response.txhash, "broadcast accepted");
        Ok(response.txhash)
    }
}
