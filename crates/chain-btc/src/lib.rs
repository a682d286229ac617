//! Bitcoin support for the chain-signatures adapter layer.
//!
//! P2WPKH (and legacy P2PKH) address derivation, largest-first coin
//! selection, BIP-143 sighashes for threshold signing, witness assembly
//! from `(r, s)` signatures, and an Esplora REST backend.

pub mod adapter;
pub mod address;
pub mod config;
pub mod error;
pub mod network;
pub mod rpc;
pub mod transaction;
pub mod utxo;

pub use adapter::{BitcoinAdapter, BtcTransactionRequest};
pub use address::AddressType;
pub use config::BtcConfig;
pub use error::BtcError;
pub use network::BtcNetwork;
pub use rpc::{BtcRpc, EsploraClient};
pub use transaction::UnsignedBtcTx;
pub use utxo::{select_utxos, Utxo, UtxoSelection};
