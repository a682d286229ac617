//! # chainsig
//!
//! One entry point over every chain adapter: loads a [`Config`], sets up
//! logging, connects the signer contract and builds an adapter for each
//! configured chain.
//!
//! ```no_run
//! # async fn run() -> Result<(), chainsig::ChainsigError> {
//! use chainsig::{Chainsig, Config};
//! use chainsig::adapter_core::ChainAdapter;
//!
//! let config = Config::load("chainsig.toml")?;
//! chainsig::logging::init(&config.logging)?;
//! let contract = Chainsig::connect_signer(&config, None)?;
//! let chains = Chainsig::from_config(&config, contract)?;
//! let account = chains
//!     .evm()?
//!     .derive_address_and_public_key("alice.near", &"ethereum-1".into())
//!     .await?;
//! println!("{}", account.address);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;

use std::sync::Arc;

use adapter_core::{ChainKind, HttpClient};
use chain_aptos::{AptosAdapter, HttpAptosRpc};
use chain_btc::{BitcoinAdapter, EsploraClient};
use chain_cosmos::{CosmosAdapter, LcdClient};
use chain_eth::{EvmAdapter, HttpEvmRpc};
use chain_sol::{HttpSolanaRpc, SolanaAdapter};
use chain_sui::{HttpSuiRpc, SuiAdapter};
use chain_xrp::{HttpXrplRpc, XrpAdapter};
use signer_client::{ChainSignatureContract, FunctionCallTransport, NearChainSignatureContract, NearRpcClient};

pub use config::Config;
pub use error::ChainsigError;
pub use pipeline::{send_transaction, sign_transaction};

pub use adapter_core;
pub use chain_aptos as aptos;
pub use chain_btc as btc;
pub use chain_cosmos as cosmos;
pub use chain_eth as evm;
pub use chain_sol as sol;
pub use chain_sui as sui;
pub use chain_xrp as xrp;
pub use signer_client;

/// Adapters for the configured chains, sharing one signer contract.
pub struct Chainsig {
    contract: Arc<dyn ChainSignatureContract>,
    evm: Option<EvmAdapter<HttpEvmRpc>>,
    btc: Option<BitcoinAdapter<EsploraClient>>,
    cosmos: Option<CosmosAdapter<LcdClient>>,
    sol: Option<SolanaAdapter<HttpSolanaRpc>>,
    aptos: Option<AptosAdapter<HttpAptosRpc>>,
    sui: Option<SuiAdapter<HttpSuiRpc>>,
    xrp: Option<XrpAdapter<HttpXrplRpc>>,
}

impl Chainsig {
    /// Signer contract client for `config.signer`. Without a
    /// function-call transport the client can derive keys but not sign.
    pub fn connect_signer(
        config: &Config,
        caller: Option<Arc<dyn FunctionCallTransport>>,
    ) -> Result<Arc<dyn ChainSignatureContract>, ChainsigError> {
        let http = HttpClient::new(&config.http, config.signer.retry)?;
        let view = Arc::new(NearRpcClient::new(http, config.signer.rpc_url()));
        let mut contract =
            NearChainSignatureContract::new(config.signer.contract_id(), view).with_retry(config.signer.retry);
        if let Some(caller) = caller {
            contract = contract.with_function_caller(caller);
        }
        tracing::info!(
            contract_id = config.signer.contract_id(),
            network = ?config.signer.network,
            "signer contract configured"
        );
        Ok(Arc::new(contract))
    }

    pub fn from_config(config: &Config, contract: Arc<dyn ChainSignatureContract>) -> Result<Self, ChainsigError> {
        let http = HttpClient::new(&config.http, config.retry)?;

        let evm = match &config.evm {
            Some(evm) => {
                let url = evm
                    .resolved_rpc_url()
                    .map_err(|e| ChainsigError::Config(format!("evm: {e}")))?;
                let adapter = EvmAdapter::new(HttpEvmRpc::new(http.clone(), url), contract.clone());
                Some(match evm.chain_id {
                    Some(chain_id) => adapter.with_chain_id(chain_id),
                    None => adapter,
                })
            }
            None => None,
        };
        let btc = config.btc.as_ref().map(|btc| {
            BitcoinAdapter::new(EsploraClient::new(http.clone(), btc.api_url()), contract.clone(), btc)
        });
        let cosmos = config.cosmos.as_ref().map(|cosmos| {
            CosmosAdapter::new(
                LcdClient::new(http.clone(), cosmos.rpc_url.clone()),
                contract.clone(),
                cosmos.clone(),
            )
        });
        let sol = config
            .sol
            .as_ref()
            .map(|sol| SolanaAdapter::new(HttpSolanaRpc::new(http.clone(), sol.rpc_url()), contract.clone()));
        let aptos = config.aptos.as_ref().map(|aptos| {
            AptosAdapter::new(
                HttpAptosRpc::new(http.clone(), aptos.rpc_url()),
                contract.clone(),
                aptos.clone(),
            )
        });
        let sui = config
            .sui
            .as_ref()
            .map(|sui| SuiAdapter::new(HttpSuiRpc::new(http.clone(), sui.rpc_url()), contract.clone(), sui));
        let xrp = config
            .xrp
            .as_ref()
            .map(|xrp| XrpAdapter::new(HttpXrplRpc::new(http.clone(), xrp.rpc_url()), contract.clone(), xrp));

        let chainsig = Self {
            contract,
            evm,
            btc,
            cosmos,
            sol,
            aptos,
            sui,
            xrp,
        };
        tracing::info!(chains = ?chainsig.configured_chains(), "adapters ready");
        Ok(chainsig)
    }

    pub fn contract(&self) -> &Arc<dyn ChainSignatureContract> {
        &self.contract
    }

    pub fn configured_chains(&self) -> Vec<ChainKind> {
        [
            (ChainKind::Evm, self.evm.is_some()),
            (ChainKind::Bitcoin, self.btc.is_some()),
            (ChainKind::Cosmos, self.cosmos.is_some()),
            (ChainKind::Solana, self.sol.is_some()),
            (ChainKind::Aptos, self.aptos.is_some()),
            (ChainKind::Sui, self.sui.is_some()),
            (ChainKind::Xrp, self.xrp.is_some()),
        ]
        .into_iter()
        .filter_map(|(chain, present)| present.then_some(chain))
        .collect()
    }

    pub fn evm(&self) -> Result<&EvmAdapter<HttpEvmRpc>, ChainsigError> {
        self.evm.as_ref().ok_or(ChainsigError::NotConfigured(ChainKind::Evm))
    }

    pub fn btc(&self) -> Result<&BitcoinAdapter<EsploraClient>, ChainsigError> {
        self.btc.as_ref().ok_or(ChainsigError::NotConfigured(ChainKind::Bitcoin))
    }

    pub fn cosmos(&self) -> Result<&CosmosAdapter<LcdClient>, ChainsigError> {
        self.cosmos.as_ref().ok_or(ChainsigError::NotConfigured(ChainKind::Cosmos))
    }

    pub fn sol(&self) -> Result<&SolanaAdapter<HttpSolanaRpc>, ChainsigError> {
        self.sol.as_ref().ok_or(ChainsigError::NotConfigured(ChainKind::Solana))
    }

    pub fn aptos(&self) -> Result<&AptosAdapter<HttpAptosRpc>, ChainsigError> {
        self.aptos.as_ref().ok_or(ChainsigError::NotConfigured(ChainKind::Aptos))
    }

    pub fn sui(&self) -> Result<&SuiAdapter<HttpSuiRpc>, ChainsigError> {
        self.sui.as_ref().ok_or(ChainsigError::NotConfigured(ChainKind::Sui))
    }

    pub fn xrp(&self) -> Result<&XrpAdapter<HttpXrplRpc>, ChainsigError> {
        self.xrp.as_ref().ok_or(ChainsigError::NotConfigured(ChainKind::Xrp))
    }
}

#[cfg(test)]
mod tests {
    use signer_client::LocalSigner;

    use super::*;

    fn signer() -> Arc<dyn ChainSignatureContract> {
        Arc::new(LocalSigner::from_seed(b"chainsig").unwrap())
    }

    #[test]
    fn builds_only_configured_adapters() {
        let config = Config::from_toml_str("[evm]\nchain_id = 1\n\n[xrp]\n\n[sui]\n").unwrap();
        let chains = Chainsig::from_config(&config, signer()).unwrap();
        assert_eq!(
            chains.configured_chains(),
            vec![ChainKind::Evm, ChainKind::Sui, ChainKind::Xrp]
        );
        assert!(chains.evm().is_ok());
        assert!(matches!(
            chains.btc(),
            Err(ChainsigError::NotConfigured(ChainKind::Bitcoin))
        ));
    }

    #[test]
    fn signer_client_from_config() {
        let contract = Chainsig::connect_signer(&Config::default(), None);
        assert!(contract.is_ok());
    }
}
