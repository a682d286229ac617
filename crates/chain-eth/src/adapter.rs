use std::sync::Arc;

use adapter_core::{
    ensure_signatures, AdapterError, Balance, ChainAdapter, ChainKind, DerivationPath,
    DerivedAccount, KeyScheme, PreparedTransaction, PublicKey, RpcError, Signature,
};
use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use signer_client::ChainSignatureContract;

use crate::address::{parse_address, public_key_to_address};
use crate::eip712::TypedData;
use crate::message::{hash_message, signature_to_hex};
use crate::rpc::{CallRequest, EvmRpc};
use crate::transaction::{encode_signed_tx, signing_hash, EthTransaction};
use crate::user_operation::UserOperation;

pub const ETH_DECIMALS: u8 = 18;

/// A transfer or contract call. Unset fee fields are filled from the node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvmTransactionRequest {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub value: u128,
    #[serde(default)]
    pub data: Bytes,
    #[serde(default)]
    pub nonce: Option<u64>,
    #[serde(default)]
    pub gas_limit: Option<u64>,
    #[serde(default)]
    pub max_fee_per_gas: Option<u128>,
    #[serde(default)]
    pub max_priority_fee_per_gas: Option<u128>,
}

pub struct EvmAdapter<R> {
    rpc: R,
    contract: Arc<dyn ChainSignatureContract>,
    chain_id: Option<u64>,
}

impl<R: EvmRpc> EvmAdapter<R> {
    pub fn new(rpc: R, contract: Arc<dyn ChainSignatureContract>) -> Self {
        Self {
            rpc,
            contract,
            chain_id: None,
        }
    }

    /// Pins the chain id instead of asking the node.
    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    async fn chain_id(&self) -> Result<u64, RpcError> {
        match self.chain_id {
            Some(id) => Ok(id),
            None => self.rpc.chain_id().await,
        }
    }

    async fn fill(&self, request: EvmTransactionRequest) -> Result<EthTransaction, AdapterError> {
        parse_address(&request.from)?;
        parse_address(&request.to)?;

        let chain_id = self.chain_id().await.map_err(AdapterError::preparation)?;
        let nonce = match request.nonce {
            Some(nonce) => nonce,
            None => self
                .rpc
                .get_transaction_count(&request.from)
                .await
                .map_err(AdapterError::preparation)?,
        };
        let gas_limit = match request.gas_limit {
            Some(gas) => gas,
            None => {
                let call = CallRequest {
                    from: request.from.clone(),
                    to: request.to.clone(),
                    value: format!("0x{:x}", request.value),
                    data: format!("0x{}", hex::encode(&request.data)),
                };
                self.rpc
                    .estimate_gas(&call)
                    .await
                    .map_err(AdapterError::preparation)?
            }
        };
        let (max_fee_per_gas, max_priority_fee_per_gas) = self.fees(&request).await?;

        let tx = EthTransaction {
            from: request.from,
            chain_id,
            nonce,
            max_priority_fee_per_gas,
            max_fee_per_gas,
            gas_limit,
            to: request.to,
            value: request.value,
            data: request.data,
        };
        tx.validate()?;
        Ok(tx)
    }

    /// `maxFee = 2 * baseFee + tip` unless the caller set both.
    async fn fees(&self, request: &EvmTransactionRequest) -> Result<(u128, u128), AdapterError> {
        if let (Some(max_fee), Some(tip)) =
            (request.max_fee_per_gas, request.max_priority_fee_per_gas)
        {
            return Ok((max_fee, tip));
        }
        let tip = match request.max_priority_fee_per_gas {
            Some(tip) => tip,
            None => self
                .rpc
                .max_priority_fee_per_gas()
                .await
                .map_err(AdapterError::preparation)?,
        };
        let max_fee = match request.max_fee_per_gas {
            Some(max_fee) => max_fee,
            None => {
                let base_fee = self
                    .rpc
                    .base_fee_per_gas()
                    .await
                    .map_err(AdapterError::preparation)?;
                base_fee.saturating_mul(2).saturating_add(tip)
            }
        };
        Ok((max_fee, tip))
    }

    /// EIP-191 digest of a personal message.
    pub fn prepare_message_for_signing(&self, message: &str) -> PreparedTransaction<String> {
        let hash = hash_message(message.as_bytes());
        PreparedTransaction::new(message.to_string(), vec![hash.to_vec()])
    }

    /// EIP-712 digest of typed data.
    pub fn prepare_typed_data_for_signing(
        &self,
        typed_data: TypedData,
    ) -> Result<PreparedTransaction<TypedData>, AdapterError> {
        let hash = typed_data.signing_hash()?;
        Ok(PreparedTransaction::new(typed_data, vec![hash.to_vec()]))
    }

    /// ERC-4337 user-operation hash. Without an explicit entry point the
    /// canonical one for the operation's version is used.
    pub async fn prepare_user_operation_for_signing(
        &self,
        operation: UserOperation,
        entry_point: Option<Address>,
    ) -> Result<PreparedTransaction<UserOperation>, AdapterError> {
        let chain_id = self.chain_id().await.map_err(AdapterError::preparation)?;
        let entry_point = entry_point.unwrap_or_else(|| operation.default_entry_point());
        let hash = operation.hash(entry_point, chain_id)?;
        Ok(PreparedTransaction::new(operation, vec![hash.to_vec()]))
    }

    /// `0x{r}{s}{v}` for a message or typed-data signature.
    pub fn finalize_message_signing(&self, signatures: &[Signature]) -> Result<String, AdapterError> {
        ensure_signatures(signatures, 1)?;
        Ok(signature_to_hex(signatures[0].as_ecdsa()?)?)
    }

    pub fn finalize_user_operation_signing(
        &self,
        _operation: UserOperation,
        _signatures: &[Signature],
    ) -> Result<UserOperation, AdapterError> {
        Err(AdapterError::NotImplemented(
            "user operation signature embedding".into(),
        ))
    }
}

#[async_trait]
impl<R: EvmRpc> ChainAdapter for EvmAdapter<R> {
    type TransactionRequest = EvmTransactionRequest;
    type UnsignedTransaction = EthTransaction;

    fn chain(&self) -> ChainKind {
        ChainKind::Evm
    }

    fn key_scheme(&self) -> KeyScheme {
        KeyScheme::Secp256k1
    }

    async fn get_balance(&self, address: &str) -> Result<Balance, AdapterError> {
        parse_address(address)?;
        let wei = self.rpc.get_balance(address).await?;
        tracing::debug!(chain = "evm", address, wei = %wei, "balance");
        Ok(Balance::new(wei, ETH_DECIMALS))
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
        let PublicKey::Secp256k1(bytes) = key else {
            return Err(AdapterError::InvalidKeyFormat(
                "expected a secp256k1 key".into(),
            ));
        };
        Ok(DerivedAccount {
            address: public_key_to_address(&bytes)?,
            public_key: hex::encode(bytes),
        })
    }

    async fn prepare_transaction_for_signing(
        &self,
        request: EvmTransactionRequest,
    ) -> Result<PreparedTransaction<EthTransaction>, AdapterError> {
        let tx = self.fill(request).await?;
        let hash = signing_hash(&tx)?;
        tracing::debug!(
            chain = "evm",
            chain_id = tx.chain_id,
            nonce = tx.nonce,
            gas_limit = tx.gas_limit,
            "prepared transaction"
        );
        Ok(PreparedTransaction::new(tx, vec![hash.to_vec()]))
    }

    fn finalize_transaction_signing(
        &self,
        transaction: EthTransaction,
        signatures: &[Signature],
    ) -> Result<String, AdapterError> {
        ensure_signatures(signatures, 1)?;
        let rsv = signatures[0].as_ecdsa()?;
        let y_parity = rsv.recovery_id();
        let raw = encode_signed_tx(&transaction, y_parity, rsv.r_bytes()?, rsv.s_bytes()?)?;
        Ok(format!("0x{}", hex::encode(raw)))
    }

    async fn broadcast_tx(&self, signed_transaction: &str) -> Result<String, AdapterError> {
        match self.rpc.send_raw_transaction(signed_transaction).await {
            Ok(hash) => {
                tracing::info!(chain = "evm", tx_hash = %hash, "broadcast accepted");
                Ok(hash)
            }
            Err(RpcError::JsonRpc { message, .. }) => {
                tracing::warn!(chain = "evm", reason = %message, "broadcast rejected");
                Err(AdapterError::BroadcastFailed(message))
            }
            Err(other) => Err(other.into()),
        }
    }
}
