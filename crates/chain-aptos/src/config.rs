use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AptosNetwork {
    Mainnet,
    #[default]
    Testnet,
    Devnet,
    Local,
}

impl AptosNetwork {
    pub fn default_rpc_url(self) -> &'static str {
        match self {
            Self::Mainnet => "https://fullnode.mainnet.aptoslabs.com/v1",
            Self::Testnet => "https://fullnode.testnet.aptoslabs.com/v1",
            Self::Devnet => "https://fullnode.devnet.aptoslabs.com/v1",
            Self::Local => "http://127.0.0.1:8080/v1",
        }
    }
}

fn default_max_gas_amount() -> u64 {
    200_000
}

fn default_expiration_secs() -> u64 {
    600
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AptosConfig {
    pub network: AptosNetwork,
    /// Fullnode REST base including `/v1`.
    pub rpc_url: Option<String>,
    #[serde(default = "default_max_gas_amount")]
    pub max_gas_amount: u64,
    /// Fixed gas unit price; estimated from the node when unset.
    pub gas_unit_price: Option<u64>,
    /// Lifetime of a prepared transaction, relative to the ledger clock.
    #[serde(default = "default_expiration_secs")]
    pub expiration_secs: u64,
}

impl Default for AptosConfig {
    fn default() -> Self {
        Self {
            network: AptosNetwork::default(),
            rpc_url: None,
            max_gas_amount: default_max_gas_amount(),
            gas_unit_price: None,
            expiration_secs: default_expiration_secs(),
        }
    }
}

impl AptosConfig {
    pub fn rpc_url(&self) -> &str {
        self.rpc_url
            .as_deref()
            .unwrap_or_else(|| self.network.default_rpc_url())
    }
}
