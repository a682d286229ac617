//! SUI support: Ed25519 accounts, transaction bytes built by the fullnode
//! (`unsafe_paySui`), intent-prefixed Blake2b digests and serialized
//! signatures.

pub mod adapter;
pub mod address;
pub mod coins;
pub mod config;
pub mod error;
pub mod rpc;
pub mod transaction;

pub use adapter::{SuiAdapter, SuiTransactionRequest};
pub use address::{parse_address, pubkey_to_address};
pub use coins::{select_coins, SuiCoin};
pub use config::{SuiConfig, SuiNetwork};
pub use error::SuiError;
pub use rpc::{ExecutionResult, HttpSuiRpc, SuiRpc};
pub use transaction::{SignedSuiTx, UnsignedSuiTx};
