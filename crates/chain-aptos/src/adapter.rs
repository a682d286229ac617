use std::sync::Arc;

use adapter_core::{
    ensure_signatures, AdapterError, Balance, ChainAdapter, ChainKind, DerivationPath,
    DerivedAccount, KeyScheme, PreparedTransaction, PublicKey, RpcError, Signature,
};
use async_trait::async_trait;
use crypto_utils::keys::parse_ed25519_public_key;
use serde::{Deserialize, Serialize};
use signer_client::ChainSignatureContract;

use crate::address::AccountAddress;
use crate::config::AptosConfig;
use crate::error::AptosError;
use crate::rpc::AptosRpc;
use crate::transaction::{EntryFunction, RawTransaction, UnsignedAptosTx};
use crate::type_tag::TypeTag;

pub const APT_DECIMALS: u8 = 8;
const APTOS_COIN: &str = "0x1::aptos_coin::AptosCoin";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AptosTransactionRequest {
    pub from: String,
    /// Ed25519 public key, hex.
    pub from_public_key: String,
    pub to: String,
    /// Octas.
    pub amount: u64,
    /// Coin to send instead of APT, e.g. `0x1::aptos_coin::AptosCoin`.
    #[serde(default)]
    pub coin_type: Option<String>,
}

pub struct AptosAdapter<R> {
    rpc: R,
    contract: Arc<dyn ChainSignatureContract>,
    config: AptosConfig,
}

impl<R: AptosRpc> AptosAdapter<R> {
    pub fn new(rpc: R, contract: Arc<dyn ChainSignatureContract>, config: AptosConfig) -> Self {
        Self {
            rpc,
            contract,
            config,
        }
    }

    async fn gas_unit_price(&self) -> Result<u64, AdapterError> {
        match self.config.gas_unit_price {
            Some(price) => Ok(price),
            None => self.rpc.gas_price().await.map_err(AdapterError::preparation),
        }
    }
}

/// Pulls the chain's rejection message out of an Aptos error body.
fn rejection_reason(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl<R: AptosRpc> ChainAdapter for AptosAdapter<R> {
    type TransactionRequest = AptosTransactionRequest;
    type UnsignedTransaction = UnsignedAptosTx;

    fn chain(&self) -> ChainKind {
        ChainKind::Aptos
    }

    fn key_scheme(&self) -> KeyScheme {
        KeyScheme::Ed25519
    }

    async fn get_balance(&self, address: &str) -> Result<Balance, AdapterError> {
        match self.rpc.balance(address, APTOS_COIN).await {
            Ok(octas) => Ok(Balance::new(octas, APT_DECIMALS)),
            Err(e) if e.is_not_found() => Ok(Balance::zero(APT_DECIMALS)),
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
            .get_derived_public_key(owner_id, path, KeyScheme::Ed25519)
            .await?;
        let PublicKey::Ed25519(bytes) = key else {
            return Err(AdapterError::InvalidKeyFormat("expected an ed25519 key".into()));
        };
        Ok(DerivedAccount {
            address: AccountAddress::from_ed25519_public_key(&bytes).to_string(),
            public_key: format!("0x{}", hex::encode(bytes)),
        })
    }

    async fn prepare_transaction_for_signing(
        &self,
        request: AptosTransactionRequest,
    ) -> Result<PreparedTransaction<UnsignedAptosTx>, AdapterError> {
        let public_key = parse_ed25519_public_key(&request.from_public_key)
            .map_err(|e| AdapterError::InvalidKeyFormat(e.to_string()))?;
        let sender: AccountAddress = request.from.parse()?;
        if AccountAddress::from_ed25519_public_key(&public_key) != sender {
            return Err(AptosError::InvalidAddress(format!(
                "{} is not the address of the supplied public key",
                request.from
            ))
            .into());
        }
        let recipient: AccountAddress = request.to.parse()?;
        let payload = match &request.coin_type {
            Some(coin) => EntryFunction::coin_transfer(coin.parse::<TypeTag>()?, &recipient, request.amount),
            None => EntryFunction::apt_transfer(&recipient, request.amount),
        };

        let ledger = self
            .rpc
            .ledger_info()
            .await
            .map_err(AdapterError::preparation)?;
        let sequence_number = self
            .rpc
            .sequence_number(&sender.to_string())
            .await
            .map_err(AdapterError::preparation)?
            .unwrap_or(0);
        let gas_unit_price = self.gas_unit_price().await?;

        let raw = RawTransaction {
            sender,
            sequence_number,
            payload,
            max_gas_amount: self.config.max_gas_amount,
            gas_unit_price,
            expiration_timestamp_secs: ledger.ledger_timestamp_secs + self.config.expiration_secs,
            chain_id: ledger.chain_id,
        };
        tracing::debug!(
            chain = "aptos",
            sender = %sender,
            sequence_number,
            gas_unit_price,
            "prepared transaction"
        );
        let message = raw.signing_message();
        Ok(PreparedTransaction::new(
            UnsignedAptosTx {
                raw,
                public_key: format!("0x{}", hex::encode(public_key)),
            },
            vec![message],
        ))
    }

    fn finalize_transaction_signing(
        &self,
        transaction: UnsignedAptosTx,
        signatures: &[Signature],
    ) -> Result<String, AdapterError> {
        ensure_signatures(signatures, 1)?;
        let signature = signatures[0].as_ed25519()?;
        let signed = transaction.to_signed_bcs(&signature.to_bytes())?;
        Ok(format!("0x{}", hex::encode(signed)))
    }

    async fn broadcast_tx(&self, signed_transaction: &str) -> Result<String, AdapterError> {
        let bytes = hex::decode(signed_transaction.trim_start_matches("0x"))
            .map_err(|e| AdapterError::InvalidTransaction(format!("signed transaction hex: {e}")))?;
        match self.rpc.submit(bytes).await {
            Ok(hash) => {
                tracing::info!(chain = "aptos", hash = %hash, "broadcast accepted");
                Ok(hash)
            }
            Err(RpcError::Status { body, .. }) => {
                let reason = rejection_reason(&body);
                tracing::warn!(chain = "aptos", reason = %reason, "broadcast rejected");
                Err(AdapterError::BroadcastFailed(reason))
            }
            Err(e) => Err(e.into()),
        }
    }
}
