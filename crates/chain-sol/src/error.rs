use adapter_core::AdapterError;
use thiserror::Error;

/// Solana chain operation errors.
#[derive(Debug, Error)]
pub enum SolError {
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("transaction build error: {0}")]
    TransactionBuildError(String),

    #[error("signing error: {0}")]
    SigningError(String),

    #[error("serialization error: {0}")]
    SerializationError(String),
}

impl From<SolError> for AdapterError {
    fn from(err: SolError) -> Self {
        match err {
            SolError::InvalidPublicKey(msg) => AdapterError::InvalidKeyFormat(msg),
            SolError::SigningError(msg) => AdapterError::InvalidSignature(msg),
            other => AdapterError::InvalidTransaction(other.to_string()),
        }
    }
}
