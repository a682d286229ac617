//! Well-known EVM networks and their public endpoints.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EvmChain {
    pub chain_id: u64,
    pub name: &'static str,
    pub rpc_url: &'static str,
    pub is_testnet: bool,
}

const fn chain(chain_id: u64, name: &'static str, rpc_url: &'static str, is_testnet: bool) -> EvmChain {
    EvmChain {
        chain_id,
        name,
        rpc_url,
        is_testnet,
    }
}

const KNOWN_CHAINS: &[EvmChain] = &[
    chain(1, "Ethereum", "https://eth.llamarpc.com", false),
    chain(10, "Optimism", "https://mainnet.optimism.io", false),
    chain(56, "BNB Smart Chain", "https://bsc-dataseed.binance.org", false),
    chain(137, "Polygon", "https://polygon-rpc.com", false),
    chain(8453, "Base", "https://mainnet.base.org", false),
    chain(42161, "Arbitrum One", "https://arb1.arbitrum.io/rpc", false),
    chain(43114, "Avalanche C-Chain", "https://api.avax.network/ext/bc/C/rpc", false),
    chain(84532, "Base Sepolia", "https://sepolia.base.org", true),
    chain(11155111, "Sepolia", "https://rpc.sepolia.org", true),
];

pub fn get_chain(chain_id: u64) -> Option<&'static EvmChain> {
    KNOWN_CHAINS.iter().find(|c| c.chain_id == chain_id)
}

pub fn known_chains() -> &'static [EvmChain] {
    KNOWN_CHAINS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_id() {
        let sepolia = get_chain(11155111).unwrap();
        assert_eq!(sepolia.name, "Sepolia");
        assert!(sepolia.is_testnet);
        assert!(!get_chain(1).unwrap().is_testnet);
    }

    #[test]
    fn unknown_chain_is_none() {
        assert!(get_chain(999_999).is_none());
    }

    #[test]
    fn ids_are_unique_and_urls_https() {
        let mut ids: Vec<u64> = known_chains().iter().map(|c| c.chain_id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), known_chains().len());
        assert!(known_chains().iter().all(|c| c.rpc_url.starts_with("https://")));
    }
}
