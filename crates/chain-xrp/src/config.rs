use adapter_core::KeyScheme;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum XrpNetwork {
    Mainnet,
    #[default]
    Testnet,
    Devnet,
}

impl XrpNetwork {
    pub fn default_rpc_url(self) -> &'static str {
        match self {
            Self::Mainnet => "https://s1.ripple.com:51234/",
            Self::Testnet => "https://s.altnet.rippletest.net:51234/",
            Self::Devnet => "https://s.devnet.rippletest.net:51234/",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct XrpConfig {
    pub network: XrpNetwork,
    pub rpc_url: Option<String>,
    /// Key type the signer derives for XRP accounts.
    pub key_scheme: KeyScheme,
    /// Ledgers a prepared transaction stays valid for.
    pub last_ledger_offset: u32,
}

impl Default for XrpConfig {
    fn default() -> Self {
        Self {
            network: XrpNetwork::default(),
            rpc_url: None,
            key_scheme: KeyScheme::Secp256k1,
            last_ledger_offset: 20,
        }
    }
}

impl XrpConfig {
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
    fn ed25519_accounts_from_config() {
        let config: XrpConfig =
            serde_json::from_str(r#"{"network":"mainnet","key_scheme":"ed25519"}"#).unwrap();
        assert_eq!(config.key_scheme, KeyScheme::Ed25519);
        assert_eq!(config.last_ledger_offset, 20);
        assert_eq!(config.rpc_url(), "https://s1.ripple.com:51234/");
    }
}
