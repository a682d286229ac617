//! Cosmos SDK support: bech32 accounts, `MsgSend` in direct sign mode,
//! and the LCD REST API for account state and broadcast.

pub mod adapter;
pub mod address;
pub mod config;
pub mod error;
pub mod rpc;
pub mod transaction;

pub use adapter::{CosmosAdapter, CosmosTransactionRequest};
pub use address::{parse_address, pubkey_to_address};
pub use config::CosmosConfig;
pub use error::CosmosError;
pub use rpc::{AccountInfo, CosmosRpc, LcdClient, TxResponse};
pub use transaction::{build_send, SendParams, UnsignedCosmosTx};
