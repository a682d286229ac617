use bitcoin::Network;
use serde::{Deserialize, Serialize};

pub const MAINNET_API: &str = "https://mempool.space/api";
pub const TESTNET_API: &str = "https://mempool.space/testnet/api";
pub const SIGNET_API: &str = "https://mempool.space/signet/api";
pub const REGTEST_API: &str = "http://127.0.0.1:3002";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BtcNetwork {
    Mainnet,
    #[default]
    Testnet,
    Signet,
    Regtest,
}

impl BtcNetwork {
    pub fn to_bitcoin_network(self) -> Network {
        match self {
            BtcNetwork::Mainnet => Network::Bitcoin,
            BtcNetwork::Testnet => Network::Testnet,
            BtcNetwork::Signet => Network::Signet,
            BtcNetwork::Regtest => Network::Regtest,
        }
    }

    /// Esplora-compatible REST endpoint.
    pub fn default_api_url(self) -> &'static str {
        match self {
            BtcNetwork::Mainnet => MAINNET_API,
            BtcNetwork::Testnet => TESTNET_API,
            BtcNetwork::Signet => SIGNET_API,
            BtcNetwork::Regtest => REGTEST_API,
        }
    }
}

impl std::fmt::Display for BtcNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BtcNetwork::Mainnet => write!(f, "mainnet"),
            BtcNetwork::Testnet => write!(f, "testnet"),
            BtcNetwork::Signet => write!(f, "signet"),
            BtcNetwork::Regtest => write!(f, "regtest"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_to_bitcoin_network() {
        assert_eq!(BtcNetwork::Mainnet.to_bitcoin_network(), Network::Bitcoin);
        assert_eq!(BtcNetwork::Regtest.to_bitcoin_network(), Network::Regtest);
    }

    #[test]
    fn display_matches_serde_name() {
        for network in [
            BtcNetwork::Mainnet,
            BtcNetwork::Testnet,
            BtcNetwork::Signet,
            BtcNetwork::Regtest,
        ] {
            let json = serde_json::to_string(&network).unwrap();
            assert_eq!(json, format!("\"{network}\""));
        }
    }

    #[test]
    fn default_is_testnet() {
        assert_eq!(BtcNetwork::default(), BtcNetwork::Testnet);
        assert!(BtcNetwork::default().default_api_url().contains("testnet"));
    }
}
