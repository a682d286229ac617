use thiserror::Error;

use crate::rpc::RpcError;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by every chain adapter.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("invalid key format: {0}")]
    InvalidKeyFormat(String),

    #[error("unsupported address type: {0}")]
    UnsupportedAddressType(String),

    #[error("unrecognized signature format: {0}")]
    UnrecognizedSignatureFormat(String),

    #[error("transaction preparation failed: {0}")]
    TransactionPreparationFailed(#[source] BoxError),

    #[error("no signature provided")]
    NoSignatureProvided,

    #[error("broadcast failed: {0}")]
    BroadcastFailed(String),

    #[error("not implemented: {0}")]
    NotImplemented(String),

    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("rpc error: {0}")]
    Rpc(#[from] RpcError),

    #[error("signer error: {0}")]
    Signer(String),
}

impl AdapterError {
    /// Wraps any error raised while assembling an unsigned transaction.
    pub fn preparation<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::TransactionPreparationFailed(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_key_format() {
        let err = AdapterError::InvalidKeyFormat("bad prefix".into());
        assert_eq!(err.to_string(), "invalid key format: bad prefix");
    }

    #[test]
    fn display_unsupported_address_type() {
        let err = AdapterError::UnsupportedAddressType("p2tr".into());
        assert_eq!(err.to_string(), "unsupported address type: p2tr");
    }

    #[test]
    fn display_no_signature() {
        assert_eq!(
            AdapterError::NoSignatureProvided.to_string(),
            "no signature provided"
        );
    }

    #[test]
    fn preparation_keeps_source() {
        use std::error::Error as _;

        let inner = std::io::Error::new(std::io::ErrorKind::Other, "nonce lookup failed");
        let err = AdapterError::preparation(inner);
        assert_eq!(
            err.to_string(),
            "transaction preparation failed: nonce lookup failed"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn preparation_from_string() {
        let err = AdapterError::preparation("insufficient funds");
        assert!(err.to_string().contains("insufficient funds"));
    }

    #[test]
    fn rpc_error_converts() {
        let err: AdapterError = RpcError::Decode("missing result".into()).into();
        assert!(matches!(err, AdapterError::Rpc(_)));
    }
}
