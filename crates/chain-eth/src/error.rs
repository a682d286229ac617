use adapter_core::AdapterError;
use thiserror::Error;

/// EVM chain operation errors.
#[derive(Debug, Error)]
pub enum EthError {
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("transaction build error: {0}")]
    TransactionBuildError(String),

    #[error("signing error: {0}")]
    SigningError(String),

    #[error("typed data error: {0}")]
    TypedData(String),

    #[error("invalid user operation: {0}")]
    InvalidUserOperation(String),

    #[error("unsupported chain: {0}")]
    UnsupportedChain(u64),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<EthError> for AdapterError {
    fn from(err: EthError) -> Self {
        match err {
            EthError::InvalidPublicKey(msg) => AdapterError::InvalidKeyFormat(msg),
            EthError::SigningError(msg) => AdapterError::InvalidSignature(msg),
            other => AdapterError::InvalidTransaction(other.to_string()),
        }
    }
}
