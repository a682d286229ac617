use adapter_core::AdapterError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CosmosError {
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("transaction build error: {0}")]
    TransactionBuildError(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("signing error: {0}")]
    SigningError(String),
}

impl From<CosmosError> for AdapterError {
    fn from(err: CosmosError) -> Self {
        match err {
            CosmosError::InvalidPublicKey(msg) => AdapterError::InvalidKeyFormat(msg),
            CosmosError::SigningError(msg) => AdapterError::InvalidSignature(msg),
            other => AdapterError::InvalidTransaction(other.to_string()),
        }
    }
}
