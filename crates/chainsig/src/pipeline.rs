//! The prepare, sign, finalize and broadcast sequence shared by every chain.

use adapter_core::{AdapterError, ChainAdapter, DerivationPath};
use signer_client::{ChainSignatureContract, SignRequest};

/// Prepares `request`, has the signer sign every digest under
/// `(owner_id, path)` and returns the finalized transaction.
///
/// Signatures come back in digest order, which is the order the
/// finalizer expects.
pub async fn sign_transaction<A: ChainAdapter>(
    adapter: &A,
    contract: &dyn ChainSignatureContract,
    owner_id: &str,
    path: &DerivationPath,
    request: A::TransactionRequest,
) -> Result<String, AdapterError> {
    let prepared = adapter.prepare_transaction_for_signing(request).await?;
    tracing::debug!(
        chain = %adapter.chain(),
        digests = prepared.hashes_to_sign.len(),
        "requesting signatures"
    );
    let signatures = contract
        .sign(&SignRequest {
            payloads: prepared.hashes_to_sign,
            path: path.clone(),
            key_scheme: adapter.key_scheme(),
            signer_account: owner_id.to_string(),
        })
        .await?;
    adapter.finalize_transaction_signing(prepared.transaction, &signatures)
}

/// [`sign_transaction`] followed by [`ChainAdapter::broadcast_tx`].
/// Returns the transaction hash.
pub async fn send_transaction<A: ChainAdapter>(
    adapter: &A,
    contract: &dyn ChainSignatureContract,
    owner_id: &str,
    path: &DerivationPath,
    request: A::TransactionRequest,
) -> Result<String, AdapterError> {
    let signed = sign_transaction(adapter, contract, owner_id, path, request).await?;
    adapter.broadcast_tx(&signed).await
}
