//! Solana support for the chain-signatures adapter layer.
//!
//! The legacy message wire format is built by hand (compact-u16 lengths,
//! canonical account ordering) rather than through `solana-sdk`. Ed25519
//! keys come from the threshold signer, which signs the serialized message
//! bytes directly.

pub mod adapter;
pub mod address;
pub mod config;
pub mod error;
pub mod rpc;
pub mod transaction;

pub use adapter::{SolTransactionRequest, SolanaAdapter};
pub use address::{address_to_bytes, pubkey_to_address, validate_address};
pub use config::{SolCluster, SolConfig};
pub use error::SolError;
pub use rpc::{HttpSolanaRpc, SolanaRpc};
pub use transaction::{
    build_sol_transfer, decode_compact_u16, encode_compact_u16, AccountMeta, CompiledInstruction,
    Instruction, Message, SolTransaction, SYSTEM_PROGRAM_ID,
};
