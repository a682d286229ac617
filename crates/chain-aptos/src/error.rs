use adapter_core::AdapterError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AptosError {
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid type tag: {0}")]
    InvalidTypeTag(String),

    #[error("transaction build error: {0}")]
    TransactionBuildError(String),

    #[error("signing error: {0}")]
    SigningError(String),
}

impl From<AptosError> for AdapterError {
    fn from(err: AptosError) -> Self {
        match err {
            AptosError::InvalidPublicKey(msg) => AdapterError::InvalidKeyFormat(msg),
            AptosError::SigningError(msg) => AdapterError::InvalidSignature(msg),
            other => AdapterError::InvalidTransaction(other.to_string()),
        }
    }
}
