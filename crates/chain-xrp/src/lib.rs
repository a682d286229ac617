//! XRP Ledger support: classic addresses, the canonical binary codec for
//! Payment transactions, signing hashes for secp256k1 and Ed25519 keys, and
//! rippled's JSON-RPC interface.

pub mod adapter;
pub mod address;
pub mod codec;
pub mod config;
pub mod error;
pub mod rpc;
pub mod transaction;

pub use adapter::{XrpAdapter, XrpTransactionRequest};
pub use address::{account_id_to_address, address_to_account_id, public_key_to_address, validate_address};
pub use codec::{encode_transaction, encode_vl_length};
pub use config::{XrpConfig, XrpNetwork};
pub use error::XrpError;
pub use rpc::{AccountInfo, HttpXrplRpc, SubmitResult, XrplRpc};
pub use transaction::{transaction_hash, XrpTransaction, HASH_PREFIX_SIGN, HASH_PREFIX_TX_ID};
