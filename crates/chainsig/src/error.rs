use adapter_core::{AdapterError, ChainKind, RpcError};
use signer_client::SignerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainsigError {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid toml: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("logging error: {0}")]
    Logging(String),

    #[error("http client error: {0}")]
    Http(#[from] RpcError),

    #[error("signer error: {0}")]
    Signer(#[from] SignerError),

    #[error("{0} adapter is not configured")]
    NotConfigured(ChainKind),

    #[error(transparent)]
    Adapter(#[from] AdapterError),
}
