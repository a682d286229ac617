use adapter_core::RetryPolicy;
use serde::Deserialize;

/// NEAR network hosting the signer contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NearNetwork {
    Mainnet,
    #[default]
    Testnet,
}

impl NearNetwork {
    pub fn default_contract_id(self) -> &'static str {
        match self {
            Self::Mainnet => "v1.signer",
            Self::Testnet => "v1.signer-prod.testnet",
        }
    }

    pub fn default_rpc_url(self) -> &'static str {
        match self {
            Self::Mainnet => "https://rpc.mainnet.near.org",
            Self::Testnet => "https://rpc.testnet.near.org",
        }
    }
}

/// 300 Tgas, the per-call maximum.
pub const DEFAULT_SIGN_GAS: u64 = 300_000_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SignerConfig {
    pub network: NearNetwork,
    pub contract_id: Option<String>,
    pub rpc_url: Option<String>,
    pub sign_gas: u64,
    pub retry: RetryPolicy,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            network: NearNetwork::default(),
            contract_id: None,
            rpc_url: None,
            sign_gas: DEFAULT_SIGN_GAS,
            retry: RetryPolicy::default(),
        }
    }
}

impl SignerConfig {
    pub fn contract_id(&self) -> &str {
        self.contract_id
            .as_deref()
            .unwrap_or_else(|| self.network.default_contract_id())
    }

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
    fn testnet_defaults() {
        let config = SignerConfig::default();
        assert_eq!(config.contract_id(), "v1.signer-prod.testnet");
        assert_eq!(config.rpc_url(), "https://rpc.testnet.near.org");
    }

    #[test]
    fn mainnet_contract() {
        assert_eq!(NearNetwork::Mainnet.default_contract_id(), "v1.signer");
    }

    #[test]
    fn overrides_win() {
        let config: SignerConfig = serde_json::from_str(
            r#"{"network":"mainnet","contract_id":"signer.example.near","rpc_url":"http://localhost:3030"}"#,
        )
        .unwrap();
        assert_eq!(config.contract_id(), "signer.example.near");
        assert_eq!(config.rpc_url(), "http://localhost:3030");
        assert_eq!(config.sign_gas, DEFAULT_SIGN_GAS);
    }
}
