//! # crypto-utils
//!
//! Hashing, DER encoding, public-key format conversion and the child-key
//! derivation used to map `(owner, path)` pairs onto keys held by the MPC
//! signer network.

pub mod der;
pub mod error;
pub mod hash;
pub mod kdf;
pub mod keys;

pub use error::CryptoError;
