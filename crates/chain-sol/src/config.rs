use serde::{Deserialize, Serialize};

pub const MAINNET_RPC: &str = "https://api.mainnet-beta.solana.com";
pub const DEVNET_RPC: &str = "https://api.devnet.solana.com";
pub const TESTNET_RPC: &str = "https://api.testnet.solana.com";
pub const LOCALNET_RPC: &str = "http://127.0.0.1:8899";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolCluster {
    #[serde(alias = "mainnet-beta")]
    Mainnet,
    #[default]
    Devnet,
    Testnet,
    Localnet,
}

impl SolCluster {
    pub fn default_rpc_url(self) -> &'static str {
        match self {
            Self::Mainnet => MAINNET_RPC,
            Self::Devnet => DEVNET_RPC,
            Self::Testnet => TESTNET_RPC,
            Self::Localnet => LOCALNET_RPC,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolConfig {
    pub cluster: SolCluster,
    pub rpc_url: Option<String>,
}

impl SolConfig {
    pub fn rpc_url(&self) -> &str {
        self.rpc_url
            .as_deref()
            .unwrap_or_else(|| self.cluster.default_rpc_url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_devnet() {
        let config: SolConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.rpc_url(), DEVNET_RPC);
    }

    #[test]
    fn mainnet_beta_alias() {
        let config: SolConfig = serde_json::from_str(r#"{"cluster": "mainnet-beta"}"#).unwrap();
        assert_eq!(config.cluster, SolCluster::Mainnet);
        assert_eq!(config.rpc_url(), MAINNET_RPC);
    }
}
