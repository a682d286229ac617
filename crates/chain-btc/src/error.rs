use adapter_core::AdapterError;
use thiserror::Error;

/// Bitcoin chain operation errors.
#[derive(Debug, Error)]
pub enum BtcError {
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("unsupported address type: {0}")]
    UnsupportedAddressType(String),

    #[error("transaction build error: {0}")]
    TransactionBuildError(String),

    #[error("insufficient funds: have {available} sat, need {required} sat")]
    InsufficientFunds { available: u64, required: u64 },

    #[error("signing error: {0}")]
    SigningError(String),
}

impl From<BtcError> for AdapterError {
    fn from(err: BtcError) -> Self {
        match err {
            BtcError::InvalidPublicKey(msg) => AdapterError::InvalidKeyFormat(msg),
            BtcError::UnsupportedAddressType(kind) => AdapterError::UnsupportedAddressType(kind),
            BtcError::SigningError(msg) => AdapterError::InvalidSignature(msg),
            err @ BtcError::InsufficientFunds { .. } => AdapterError::preparation(err),
            other => AdapterError::InvalidTransaction(other.to_string()),
        }
    }
}
