//! Aptos support: single-key Ed25519 accounts, BCS-encoded entry
//! function transactions, and the fullnode REST API.

pub mod adapter;
pub mod address;
pub mod bcs;
pub mod config;
pub mod error;
pub mod rpc;
pub mod transaction;
pub mod type_tag;

pub use adapter::{AptosAdapter, AptosTransactionRequest};
pub use address::AccountAddress;
pub use config::{AptosConfig, AptosNetwork};
pub use error::AptosError;
pub use rpc::{AptosRpc, HttpAptosRpc, LedgerInfo};
pub use transaction::{EntryFunction, RawTransaction, UnsignedAptosTx};
pub use type_tag::{StructTag, TypeTag};
