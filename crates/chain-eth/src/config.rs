use serde::{Deserialize, Serialize};

use crate::chains::get_chain;
use crate::error::EthError;

/// EVM adapter settings. A missing `rpc_url` falls back to the public
/// endpoint of a known `chain_id`; a missing `chain_id` is read from the
/// node with `eth_chainId`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvmConfig {
    pub chain_id: Option<u64>,
    pub rpc_url: Option<String>,
}

impl EvmConfig {
    pub fn for_chain(chain_id: u64) -> Self {
        Self {
            chain_id: Some(chain_id),
            rpc_url: None,
        }
    }

    pub fn resolved_rpc_url(&self) -> Result<String, EthError> {
        if let Some(url) = &self.rpc_url {
            return Ok(url.clone());
        }
        let chain_id = self
            .chain_id
            .ok_or_else(|| EthError::Config("either rpc_url or chain_id is required".into()))?;
        get_chain(chain_id)
            .map(|c| c.rpc_url.to_string())
            .ok_or(EthError::UnsupportedChain(chain_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_url_wins() {
        let config = EvmConfig {
            chain_id: Some(1),
            rpc_url: Some("http://localhost:8545".into()),
        };
        assert_eq!(config.resolved_rpc_url().unwrap(), "http://localhost:8545");
    }

    #[test]
    fn known_chain_falls_back_to_public_endpoint() {
        let url = EvmConfig::for_chain(8453).resolved_rpc_url().unwrap();
        assert_eq!(url, "https://mainnet.base.org");
    }

    #[test]
    fn unknown_chain_without_url_rejected() {
        let err = EvmConfig::for_chain(424242).resolved_rpc_url().unwrap_err();
        assert!(matches!(err, EthError::UnsupportedChain(424242)));
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: EvmConfig = serde_json::from_str(r#"{"chain_id": 10}"#).unwrap();
        assert_eq!(config, EvmConfig::for_chain(10));
    }
}
