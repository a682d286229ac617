use serde::{Deserialize, Serialize};

/// Network parameters for one Cosmos SDK chain. Defaults target the
/// Cosmos Hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CosmosConfig {
    /// LCD (REST) endpoint.
    pub rpc_url: String,
    pub chain_id: String,
    /// Bech32 account prefix.
    pub prefix: String,
    /// Fee and transfer denom.
    pub denom: String,
    pub decimals: u8,
    pub gas_limit: u64,
    /// Price per gas unit in `denom`.
    pub gas_price: f64,
}

impl Default for CosmosConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://cosmos-rest.publicnode.com".into(),
            chain_id: "cosmoshub-4".into(),
            prefix: "cosmos".into(),
            denom: "uatom".into(),
            decimals: 6,
            gas_limit: 200_000,
            gas_price: 0.025,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_override() {
        let config: CosmosConfig = serde_json::from_str(
            r#"{"chain_id": "osmosis-1", "prefix": "osmo", "denom": "uosmo"}"#,
        )
        .unwrap();
        assert_eq!(config.prefix, "osmo");
        assert_eq!(config.gas_limit, 200_000);
        assert_eq!(config.decimals, 6);
    }
}
