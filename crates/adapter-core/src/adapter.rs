use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::AdapterError;
use crate::signature::Signature;
use crate::types::{Balance, ChainKind, DerivationPath, DerivedAccount, KeyScheme, PreparedTransaction};

/// The contract every chain adapter implements.
///
/// A caller drives a transfer as: `prepare_transaction_for_signing`, send
/// `hashes_to_sign` to the signer, `finalize_transaction_signing` with the
/// returned signatures in the same order, then `broadcast_tx`. The
/// unsigned transaction can be parked between steps with
/// `serialize_transaction` / `deserialize_transaction`.
#[async_trait]
pub trait ChainAdapter: Send + Sync {
    type TransactionRequest: Send + Sync + 'static;
    type UnsignedTransaction: Serialize + DeserializeOwned + Send + Sync + 'static;

    fn chain(&self) -> ChainKind;

    /// Scheme of the keys this adapter signs with.
    fn key_scheme(&self) -> KeyScheme;

    /// Native balance. Unknown or unfunded accounts report zero.
    async fn get_balance(&self, address: &str) -> Result<Balance, AdapterError>;

    async fn derive_address_and_public_key(
        &self,
        owner_id: &str,
        path: &DerivationPath,
    ) -> Result<DerivedAccount, AdapterError>;

    async fn prepare_transaction_for_signing(
        &self,
        request: Self::TransactionRequest,
    ) -> Result<PreparedTransaction<Self::UnsignedTransaction>, AdapterError>;

    /// Attaches signatures and returns the chain's broadcastable encoding.
    fn finalize_transaction_signing(
        &self,
        transaction: Self::UnsignedTransaction,
        signatures: &[Signature],
    ) -> Result<String, AdapterError>;

    /// Submits a finalized transaction and returns its hash.
    async fn broadcast_tx(&self, signed_transaction: &str) -> Result<String, AdapterError>;

    fn serialize_transaction(
        &self,
        transaction: &Self::UnsignedTransaction,
    ) -> Result<String, AdapterError> {
        serde_json::to_string(transaction)
            .map_err(|e| AdapterError::InvalidTransaction(format!("serialize: {e}")))
    }

    fn deserialize_transaction(
        &self,
        serialized: &str,
    ) -> Result<Self::UnsignedTransaction, AdapterError> {
        serde_json::from_str(serialized)
            .map_err(|e| AdapterError::InvalidTransaction(format!("deserialize: {e}")))
    }
}

/// Fails with [`AdapterError::NoSignatureProvided`] on an empty slice and
/// checks the count against the number of digests that were prepared.
pub fn ensure_signatures(signatures: &[Signature], expected: usize) -> Result<(), AdapterError> {
    if signatures.is_empty() {
        return Err(AdapterError::NoSignatureProvided);
    }
    if signatures.len() != expected {
        return Err(AdapterError::InvalidSignature(format!(
            "expected {expected} signature(s), got {}",
            signatures.len()
        )));
    }
    Ok(())
}
