//! # adapter-core
//!
//! Chain-agnostic pieces shared by every adapter: the [`ChainAdapter`]
//! contract, signature and account types, the error taxonomy, and the
//! HTTP/JSON-RPC plumbing with bounded retry.

pub mod adapter;
pub mod config;
pub mod error;
pub mod retry;
pub mod rpc;
pub mod signature;
pub mod types;

pub use adapter::{ensure_signatures, ChainAdapter};
pub use config::HttpConfig;
pub use error::{AdapterError, BoxError};
pub use retry::RetryPolicy;
pub use rpc::{HttpClient, RpcError};
pub use signature::{Ed25519Signature, RsvSignature, Signature};
pub use types::{Balance, ChainKind, DerivationPath, DerivedAccount, KeyScheme, PreparedTransaction, PublicKey};
