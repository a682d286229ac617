use serde::{Deserialize, Serialize};

use crate::address::AddressType;
use crate::network::BtcNetwork;

fn default_fee_target_blocks() -> u16 {
    6
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BtcConfig {
    pub network: BtcNetwork,
    /// Esplora base URL; the network's public instance when unset.
    pub api_url: Option<String>,
    pub address_type: AddressType,
    #[serde(default = "default_fee_target_blocks")]
    pub fee_target_blocks: u16,
}

impl Default for BtcConfig {
    fn default() -> Self {
        Self {
            network: BtcNetwork::default(),
            api_url: None,
            address_type: AddressType::default(),
            fee_target_blocks: default_fee_target_blocks(),
        }
    }
}

impl BtcConfig {
    pub fn api_url(&self) -> &str {
        self.api_url
            .as_deref()
            .unwrap_or_else(|| self.network.default_api_url())
    }
}
