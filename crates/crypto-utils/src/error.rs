use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid key format: {0}")]
    InvalidKeyFormat(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("invalid DER encoding: {0}")]
    InvalidDer(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}
