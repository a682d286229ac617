use std::sync::Arc;

use adapter_core::{
    AdapterError, Balance, ChainAdapter, ChainKind, DerivationPath, DerivedAccount, KeyScheme,
    PreparedTransaction, PublicKey, RpcError, Signature,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use signer_client::ChainSignatureContract;

use crate::address::{address_to_bytes, pubkey_to_address};
use crate::rpc::SolanaRpc;
use crate::transaction::{build_sol_transfer, Instruction, SolTransaction};

pub const SOL_DECIMALS: u8 = 9;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolTransactionRequest {
    /// Fee payer and source of the transfer.
    pub from: String,
    pub to: String,
    pub lamports: u64,
    /// Appended after the transfer instruction.
    #[serde(default)]
    pub instructions: Vec<Instruction>,
}

pub struct SolanaAdapter<R> {
    rpc: R,
    contract: Arc<dyn ChainSignatureContract>,
}

impl<R: SolanaRpc> SolanaAdapter<R> {
    pub fn new(rpc: R, contract: Arc<dyn ChainSignatureContract>) -> Self {
        Self { rpc, contract }
    }

    /// Embeds `signature` for the signer `public_key` (Base58) and returns
    /// the base64 wire transaction.
    ///
    /// This is how Solana signatures are attached;
    /// [`ChainAdapter::finalize_transaction_signing`] is not supported.
    pub fn add_signature(
        &self,
        transaction: &mut SolTransaction,
        public_key: &str,
        signature: &Signature,
    ) -> Result<String, AdapterError> {
        let signer = address_to_bytes(public_key)?;
        let sig = signature.as_ed25519()?;
        transaction.add_signature(&signer, &sig.to_bytes())?;
        Ok(transaction.to_base64()?)
    }
}

#[async_trait]
impl<R: SolanaRpc> ChainAdapter for SolanaAdapter<R> {
    type TransactionRequest = SolTransactionRequest;
    type UnsignedTransaction = SolTransaction;

    fn chain(&self) -> ChainKind {
        ChainKind::Solana
    }

    fn key_scheme(&self) -> KeyScheme {
        KeyScheme::Ed25519
    }

    async fn get_balance(&self, address: &str) -> Result<Balance, AdapterError> {
        let lamports = self.rpc.get_balance(address).await?;
        tracing::debug!(chain = "solana", address, lamports, "balance");
        Ok(Balance::new(lamports as u128, SOL_DECIMALS))
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
        request: SolTransactionRequest,
    ) -> Result<PreparedTransaction<SolTransaction>, AdapterError> {
        let from = address_to_bytes(&request.from)?;
        let to = address_to_bytes(&request.to)?;
        let blockhash = self
            .rpc
            .get_latest_blockhash()
            .await
            .map_err(AdapterError::preparation)?;

        let transaction =
            build_sol_transfer(&from, &to, request.lamports, &request.instructions, &blockhash)?;
        let message = transaction.message.serialize()?;
        tracing::debug!(
            chain = "solana",
            accounts = transaction.message.account_keys.len(),
            instructions = transaction.message.instructions.len(),
            "prepared transaction"
        );
        Ok(PreparedTransaction::new(transaction, vec![message]))
    }

    fn finalize_transaction_signing(
        &self,
        _transaction: SolTransaction,
        _signatures: &[Signature],
    ) -> Result<String, AdapterError> {
        Err(AdapterError::NotImplemented(
            "solana signatures are attached with SolanaAdapter::add_signature".into(),
        ))
    }

    async fn broadcast_tx(&self, signed_transaction: &str) -> Result<String, AdapterError> {
        match self.rpc.send_transaction(signed_transaction).await {
            Ok(signature) => {
                tracing::info!(chain = "solana", signature = %signature, "broadcast accepted");
                Ok(signature)
            }
            Err(RpcError::JsonRpc { message, .. }) => {
                tracing::warn!(chain = "solana", reason = %message, "broadcast rejected");
                Err(AdapterError::BroadcastFailed(message))
            }
            Err(e) => Err(e.into()),
        }
    }
}
