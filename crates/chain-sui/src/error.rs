use adapter_core::AdapterError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SuiError {
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("insufficient funds: have {available} MIST, need {required} MIST")]
    InsufficientFunds { available: u128, required: u128 },

    #[error("encoding error: {0}")]
    Encoding(String),
}

impl From<SuiError> for AdapterError {
    fn from(err: SuiError) -> Self {
        match err {
            SuiError::InvalidPublicKey(msg) => AdapterError::InvalidKeyFormat(msg),
            e @ SuiError::InsufficientFunds { .. } => AdapterError::preparation(e),
            other => AdapterError::InvalidTransaction(other.to_string()),
        }
    }
}
