use adapter_core::{AdapterError, RpcError};
use crypto_utils::CryptoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignerError {
    #[error("unrecognized signature format: {0}")]
    UnrecognizedSignatureFormat(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(#[from] CryptoError),

    #[error("rpc error: {0}")]
    Rpc(#[from] RpcError),

    #[error("contract call failed: {0}")]
    CallFailed(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("no function-call transport configured")]
    NoFunctionCaller,
}

impl SignerError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Rpc(e) if e.is_retryable())
    }
}

impl From<SignerError> for AdapterError {
    fn from(err: SignerError) -> Self {
        match err {
            SignerError::UnrecognizedSignatureFormat(msg) => {
                AdapterError::UnrecognizedSignatureFormat(msg)
            }
            SignerError::InvalidPublicKey(e) => AdapterError::InvalidKeyFormat(e.to_string()),
            SignerError::Rpc(e) => AdapterError::Rpc(e),
            other => AdapterError::Signer(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_unrecognized() {
        let err = SignerError::UnrecognizedSignatureFormat("{}".into());
        assert_eq!(err.to_string(), "unrecognized signature format: {}");
    }

    #[test]
    fn display_no_function_caller() {
        assert_eq!(
            SignerError::NoFunctionCaller.to_string(),
            "no function-call transport configured"
        );
    }

    #[test]
    fn maps_onto_adapter_taxonomy() {
        let err: AdapterError = SignerError::UnrecognizedSignatureFormat("x".into()).into();
        assert!(matches!(err, AdapterError::UnrecognizedSignatureFormat(_)));

        let err: AdapterError =
            SignerError::InvalidPublicKey(CryptoError::InvalidKeyFormat("bad".into())).into();
        assert!(matches!(err, AdapterError::InvalidKeyFormat(_)));

        let err: AdapterError = SignerError::CallFailed("panicked".into()).into();
        assert!(matches!(err, AdapterError::Signer(_)));
    }

    #[test]
    fn only_transient_rpc_errors_retry() {
        let transient = SignerError::Rpc(RpcError::Status {
            status: 502,
            body: String::new(),
        });
        assert!(transient.is_retryable());
        assert!(!SignerError::CallFailed("x".into()).is_retryable());
    }
}
