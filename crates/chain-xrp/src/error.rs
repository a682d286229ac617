use adapter_core::AdapterError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XrpError {
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("invalid field {field}: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("encoding error: {0}")]
    Encoding(String),
}

impl XrpError {
    pub(crate) fn field(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<XrpError> for AdapterError {
    fn from(err: XrpError) -> Self {
        match err {
            XrpError::InvalidPublicKey(msg) => AdapterError::InvalidKeyFormat(msg),
            other => AdapterError::InvalidTransaction(other.to_string()),
        }
    }
}
