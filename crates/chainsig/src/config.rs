use std::path::Path;

use adapter_core::{HttpConfig, RetryPolicy};
use chain_aptos::AptosConfig;
use chain_btc::BtcConfig;
use chain_cosmos::CosmosConfig;
use chain_eth::EvmConfig;
use chain_sol::SolConfig;
use chain_sui::SuiConfig;
use chain_xrp::XrpConfig;
use serde::Deserialize;
use signer_client::SignerConfig;

use crate::error::ChainsigError;
use crate::logging::LoggingConfig;

/// Top-level settings. A chain whose section is absent gets no adapter.
///
/// ```toml
/// [signer]
/// network = "testnet"
///
/// [http]
/// timeout_secs = 20
///
/// [evm]
/// chain_id = 11155111
///
/// [btc]
/// network = "testnet"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub signer: SignerConfig,
    pub http: HttpConfig,
    pub retry: RetryPolicy,
    pub logging: LoggingConfig,
    pub evm: Option<EvmConfig>,
    pub btc: Option<BtcConfig>,
    pub cosmos: Option<CosmosConfig>,
    pub sol: Option<SolConfig>,
    pub aptos: Option<AptosConfig>,
    pub sui: Option<SuiConfig>,
    pub xrp: Option<XrpConfig>,
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self, ChainsigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ChainsigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loading config");
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> Result<(), ChainsigError> {
        if self.retry.max_attempts == 0 {
            return Err(ChainsigError::Config("retry.max_attempts must be at least 1".into()));
        }
        if let Some(evm) = &self.evm {
            evm.resolved_rpc_url()
                .map_err(|e| ChainsigError::Config(format!("evm: {e}")))?;
        }
        if let Some(cosmos) = &self.cosmos {
            if !(cosmos.gas_price.is_finite() && cosmos.gas_price >= 0.0) {
                return Err(ChainsigError::Config("cosmos.gas_price must be a non-negative number".into()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use adapter_core::KeyScheme;
    use signer_client::NearNetwork;

    use super::*;
    use crate::logging::LogFormat;

    #[test]
    fn empty_config_has_no_chains() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.evm.is_none() && config.xrp.is_none());
        assert_eq!(config.signer.contract_id(), "v1.signer-prod.testnet");
    }

    #[test]
    fn full_config() {
        let config = Config::from_toml_str(
            r#"
            [signer]
            network = "mainnet"

            [logging]
            level = "debug"
            format = "json"

            [retry]
            max_attempts = 2

            [evm]
            chain_id = 1

            [cosmos]
            chain_id = "osmosis-1"
            prefix = "osmo"
            denom = "uosmo"

            [sol]

            [xrp]
            network = "mainnet"
            key_scheme = "ed25519"
            "#,
        )
        .unwrap();
        assert_eq!(config.signer.network, NearNetwork::Mainnet);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.retry.max_attempts, 2);
        assert_eq!(config.evm.unwrap().chain_id, Some(1));
        let cosmos = config.cosmos.unwrap();
        assert_eq!(cosmos.prefix, "osmo");
        assert_eq!(cosmos.gas_limit, CosmosConfig::default().gas_limit);
        assert_eq!(config.sol, Some(SolConfig::default()));
        assert_eq!(config.xrp.unwrap().key_scheme, KeyScheme::Ed25519);
        assert!(config.btc.is_none());
    }

    #[test]
    fn rejects_bad_sections() {
        assert!(matches!(
            Config::from_toml_str("[evm]\nchain_id = 424242"),
            Err(ChainsigError::Config(_))
        ));
        assert!(matches!(
            Config::from_toml_str("[retry]\nmax_attempts = 0"),
            Err(ChainsigError::Config(_))
        ));
        assert!(matches!(
            Config::from_toml_str("[dogecoin]"),
            Err(ChainsigError::Toml(_))
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        assert!(matches!(
            Config::load("/nonexistent/chainsig.toml"),
            Err(ChainsigError::Io(_))
        ));
    }
}
