//! # signer-client
//!
//! Client for the remote threshold-signature contract: derived public
//! keys, signature deposits, and `sign` requests whose responses are
//! normalized into [`adapter_core::Signature`] values.
//!
//! [`NearChainSignatureContract`] talks to the deployed contract.
//! [`LocalSigner`] implements the same trait in-process from a root
//! secret, for development networks and tests.

pub mod config;
pub mod contract;
pub mod error;
pub mod local;
pub mod near;
pub mod normalize;

pub use config::{NearNetwork, SignerConfig};
pub use contract::{derive_secp256k1_public_key, ChainSignatureContract, SignRequest};
pub use error::SignerError;
pub use local::LocalSigner;
pub use near::{FunctionCall, FunctionCallTransport, NearChainSignatureContract, NearRpcClient, ViewTransport};
pub use normalize::normalize_signature;
