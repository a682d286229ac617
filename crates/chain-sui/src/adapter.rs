use std::sync::Arc;

use adapter_core::{
    ensure_signatures, AdapterError, Balance, ChainAdapter, ChainKind, DerivationPath,
    DerivedAccount, KeyScheme, PreparedTransaction, PublicKey, RpcError, Signature,
};
use async_trait::async_trait;
use crypto_utils::keys::parse_ed25519_public_key;
use serde::{Deserialize, Serialize};
use signer_client::ChainSignatureContract;

use crate::address::{parse_address, pubkey_to_address};
use crate::coins::select_coins;
use crate::config::SuiConfig;
use crate::error::SuiError;
use crate::rpc::SuiRpc;
use crate::transaction::{SignedSuiTx, UnsignedSuiTx};

pub const SUI_DECIMALS: u8 = 9;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiTransactionRequest {
    pub from: String,
    /// Ed25519 public key, hex.
    pub from_public_key: String,
    pub to: String,
    /// MIST.
    pub amount: u64,
    #[serde(default)]
    pub gas_budget: Option<u64>,
}

pub struct SuiAdapter<R> {
    rpc: R,
    contract: Arc<dyn ChainSignatureContract>,
    gas_budget: u64,
}

impl<R: SuiRpc> SuiAdapter<R> {
    pub fn new(rpc: R, contract: Arc<dyn ChainSignatureContract>, config: &SuiConfig) -> Self {
        Self {
            rpc,
            contract,
            gas_budget: config.gas_budget,
        }
    }
}

#[async_trait]
impl<R: SuiRpc> ChainAdapter for SuiAdapter<R> {
    type TransactionRequest = SuiTransactionRequest;
    type UnsignedTransaction = UnsignedSuiTx;

    fn chain(&self) -> ChainKind {
        ChainKind::Sui
    }

    fn key_scheme(&self) -> KeyScheme {
        KeyScheme::Ed25519
    }

    async fn get_balance(&self, address: &str) -> Result<Balance, AdapterError> {
        let mist = self.rpc.get_balance(address).await?;
        tracing::debug!(chain = "sui", address, mist = %mist, "balance");
        Ok(Balance::new(mist, SUI_DECIMALS))
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
            address: pubkey_to_address(&bytes),
            public_key: hex::encode(bytes),
        })
    }

    async fn prepare_transaction_for_signing(
        &self,
        request: SuiTransactionRequest,
    ) -> Result<PreparedTransaction<UnsignedSuiTx>, AdapterError> {
        let public_key = parse_ed25519_public_key(&request.from_public_key)
            .map_err(|e| AdapterError::InvalidKeyFormat(e.to_string()))?;
        let sender = pubkey_to_address(&public_key);
        if parse_address(&request.from)? != sender {
            return Err(SuiError::InvalidAddress(format!(
                "{} is not the address of the supplied public key",
                request.from
            ))
            .into());
        }
        let recipient = parse_address(&request.to)?;
        let gas_budget = request.gas_budget.unwrap_or(self.gas_budget);

        let coins = self
            .rpc
            .get_coins(&sender)
            .await
            .map_err(AdapterError::preparation)?;
        let selected = select_coins(&coins, request.amount, gas_budget)?;
        let input_coins: Vec<String> = selected.into_iter().map(|c| c.coin_object_id).collect();

        let tx_bytes = self
            .rpc
            .pay_sui(&sender, &input_coins, &[recipient], &[request.amount], gas_budget)
            .await
            .map_err(AdapterError::preparation)?;
        tracing::debug!(
            chain = "sui",
            sender = %sender,
            inputs = input_coins.len(),
            gas_budget,
            "prepared transaction"
        );

        let unsigned = UnsignedSuiTx {
            tx_bytes,
            public_key: hex::encode(public_key),
        };
        let digest = unsigned.digest().to_vec();
        Ok(PreparedTransaction::new(unsigned, vec![digest]))
    }

    /// Returns the JSON form of [`SignedSuiTx`].
    fn finalize_transaction_signing(
        &self,
        transaction: UnsignedSuiTx,
        signatures: &[Signature],
    ) -> Result<String, AdapterError> {
        ensure_signatures(signatures, 1)?;
        let signature = signatures[0].as_ed25519()?;
        Ok(transaction.sign(&signature.to_bytes())?.to_json()?)
    }

    async fn broadcast_tx(&self, signed_transaction: &str) -> Result<String, AdapterError> {
        let signed = SignedSuiTx::from_json(signed_transaction)?;
        let result = match self.rpc.execute(&signed.tx_bytes, &signed.signatures).await {
            Ok(result) => result,
            Err(RpcError::JsonRpc { message, .. }) => {
                tracing::warn!(chain = "sui", reason = %message, "broadcast rejected");
                return Err(AdapterError::BroadcastFailed(message));
            }
            Err(e) => return Err(e.into()),
        };
        if let Some(reason) = result.failure {
            tracing::warn!(chain = "sui", digest = %result.digest, reason = %reason, "execution failed");
            return Err(AdapterError::BroadcastFailed(reason));
        }
        tracing::info!(chain = "sui", digest = %result.digest, "broadcast accepted");
        Ok(result.digest)
    }
}
