//! EVM chain support for the chain-signatures adapter layer.
//!
//! This crate provides:
//! - Ethereum address derivation from secp256k1 public keys (EIP-55 helpers included)
//! - EIP-1559 transaction encoding and signature embedding
//! - EIP-191 personal-message and EIP-712 typed-data hashing
//! - ERC-4337 user-operation hashing (entry point v0.6 and v0.7)
//! - [`EvmAdapter`], the [`adapter_core::ChainAdapter`] implementation

pub mod abi;
pub mod adapter;
pub mod address;
pub mod chains;
pub mod config;
pub mod eip712;
pub mod error;
pub mod message;
pub mod rpc;
pub mod transaction;
pub mod user_operation;

pub use adapter::{EvmAdapter, EvmTransactionRequest};
pub use config::EvmConfig;
pub use eip712::TypedData;
pub use error::EthError;
pub use rpc::{EvmRpc, HttpEvmRpc};
pub use user_operation::UserOperation;
