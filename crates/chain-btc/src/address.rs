use std::fmt;
use std::str::FromStr;

use bitcoin::address::{Address, NetworkUnchecked};
use bitcoin::CompressedPublicKey;
use serde::{Deserialize, Serialize};

use crate::error::BtcError;
use crate::network::BtcNetwork;

/// Address encodings a derived key can be shown as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressType {
    /// Native SegWit v0, bech32 (`bc1q...` / `tb1q...`).
    #[default]
    P2wpkh,
    /// Legacy Base58Check (`1...` / `m...`).
    P2pkh,
}

impl FromStr for AddressType {
    type Err = BtcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "p2wpkh" | "segwit" | "bech32" => Ok(Self::P2wpkh),
            "p2pkh" | "legacy" => Ok(Self::P2pkh),
            other => Err(BtcError::UnsupportedAddressType(other.to_string())),
        }
    }
}

impl fmt::Display for AddressType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::P2wpkh => f.write_str("p2wpkh"),
            Self::P2pkh => f.write_str("p2pkh"),
        }
    }
}

pub fn parse_compressed_key(pubkey_bytes: &[u8; 33]) -> Result<CompressedPublicKey, BtcError> {
    CompressedPublicKey::from_slice(pubkey_bytes)
        .map_err(|e| BtcError::InvalidPublicKey(format!("failed to parse compressed public key: {e}")))
}

/// Address of a compressed secp256k1 key in the requested encoding.
pub fn pubkey_to_address(
    pubkey_bytes: &[u8; 33],
    address_type: AddressType,
    network: BtcNetwork,
) -> Result<String, BtcError> {
    let key = parse_compressed_key(pubkey_bytes)?;
    let net = network.to_bitcoin_network();
    let address = match address_type {
        AddressType::P2wpkh => Address::p2wpkh(&key, net),
        AddressType::P2pkh => Address::p2pkh(key.pubkey_hash(), net),
    };
    Ok(address.to_string())
}

/// Parses an address and checks it belongs to `network`.
pub fn parse_address(address: &str, network: BtcNetwork) -> Result<Address, BtcError> {
    address
        .parse::<Address<NetworkUnchecked>>()
        .map_err(|e| BtcError::InvalidAddress(format!("{address}: {e}")))?
        .require_network(network.to_bitcoin_network())
        .map_err(|e| BtcError::InvalidAddress(format!("{address}: {e}")))
}
