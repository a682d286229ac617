use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuiNetwork {
    Mainnet,
    #[default]
    Testnet,
    Devnet,
    Localnet,
}

impl SuiNetwork {
    pub fn default_rpc_url(self) -> &'static str {
        match self {
            Self::Mainnet => "https://fullnode.mainnet.sui.io:443",
            Self::Testnet => "https://fullnode.testnet.sui.io:443",
            Self::Devnet => "https://fullnode.devnet.sui.io:443",
            Self::Localnet => "http://127.0.0.1:9000",
        }
    }
}

fn default_gas_budget() -> u64 {
    10_000_000
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiConfig {
    pub network: SuiNetwork,
    pub rpc_url: Option<String>,
    /// MIST reserved for gas on every transfer.
    #[serde(default = "default_gas_budget")]
    pub gas_budget: u64,
}

impl Default for SuiConfig {
    fn default() -> Self {
        Self {
            network: SuiNetwork::default(),
            rpc_url: None,
            gas_budget: default_gas_budget(),
        }
    }
}

impl SuiConfig {
    pub fn rpc_url(&self) -> &str {
        self.rpc_url
            .as_deref()
            .unwrap_or_else(|| self.network.default_rpc_url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config: SuiConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.gas_budget, 10_000_000);
        assert_eq!(config.rpc_url(), "https://fullnode.testnet.sui.io:443");
    }
}
