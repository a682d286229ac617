//! Esplora REST backend (mempool.space, blockstream.info).

use std::collections::HashMap;

use adapter_core::{HttpClient, RpcError};
use async_trait::async_trait;
use serde::Deserialize;

/// An unspent output as reported by the indexer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddressUtxo {
    pub txid: String,
    pub vout: u32,
    pub value: u64,
}

#[async_trait]
pub trait BtcRpc: Send + Sync {
    /// Confirmed plus mempool balance in satoshis.
    async fn get_balance(&self, address: &str) -> Result<u64, RpcError>;

    async fn list_utxos(&self, address: &str) -> Result<Vec<AddressUtxo>, RpcError>;

    /// Fee rate in sat/vB for confirmation within `target_blocks`.
    async fn fee_rate(&self, target_blocks: u16) -> Result<f64, RpcError>;

    /// Posts raw transaction hex, returning the txid.
    async fn broadcast(&self, tx_hex: &str) -> Result<String, RpcError>;
}

#[derive(Debug, Deserialize)]
struct AddressStats {
    chain_stats: TxoStats,
    mempool_stats: TxoStats,
}

#[derive(Debug, Deserialize)]
struct TxoStats {
    funded_txo_sum: u64,
    spent_txo_sum: u64,
}

impl TxoStats {
    fn balance(&self) -> i128 {
        self.funded_txo_sum as i128 - self.spent_txo_sum as i128
    }
}

pub struct EsploraClient {
    http: HttpClient,
    base_url: String,
}

impl EsploraClient {
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl BtcRpc for EsploraClient {
    async fn get_balance(&self, address: &str) -> Result<u64, RpcError> {
        let url = format!("{}/address/{address}", self.base_url);
        let stats: AddressStats = self.http.get_json(&url).await?;
        let total = stats.chain_stats.balance() + stats.mempool_stats.balance();
        Ok(total.max(0) as u64)
    }

    async fn list_utxos(&self, address: &str) -> Result<Vec<AddressUtxo>, RpcError> {
        let url = format!("{}/address/{address}/utxo", self.base_url);
        self.http.get_json(&url).await
    }

    async fn fee_rate(&self, target_blocks: u16) -> Result<f64, RpcError> {
        let url = format!("{}/fee-estimates", self.base_url);
        let estimates: HashMap<String, f64> = self.http.get_json(&url).await?;
        Ok(pick_fee_rate(&estimates, target_blocks))
    }

    async fn broadcast(&self, tx_hex: &str) -> Result<String, RpcError> {
        let url = format!("{}/tx", self.base_url);
        let txid = self.http.submit_post_text(&url, tx_hex.to_string()).await?;
        Ok(txid.trim().to_string())
    }
}

/// Rate for the fastest target not sooner than `target_blocks`; falls
/// back to 1 sat/vB when the indexer has no estimate.
pub fn pick_fee_rate(estimates: &HashMap<String, f64>, target_blocks: u16) -> f64 {
    estimates
        .iter()
        .filter_map(|(blocks, rate)| blocks.parse::<u16>().ok().map(|b| (b, *rate)))
        .filter(|(blocks, _)| *blocks >= target_blocks)
        .min_by_key(|(blocks, _)| *blocks)
        .map(|(_, rate)| rate)
        .unwrap_or(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_stats_balance() {
        let json = r#"{
            "address": "bc1q...",
            "chain_stats": {"funded_txo_count": 2, "funded_txo_sum": 150000, "spent_txo_count": 1, "spent_txo_sum": 50000, "tx_count": 3},
            "mempool_stats": {"funded_txo_count": 0, "funded_txo_sum": 0, "spent_txo_count": 1, "spent_txo_sum": 20000, "tx_count": 1}
        }"#;
        let stats: AddressStats = serde_json::from_str(json).unwrap();
        assert_eq!(stats.chain_stats.balance() + stats.mempool_stats.balance(), 80_000);
    }

    #[test]
    fn utxo_listing_ignores_status() {
        let json = r#"[{"txid": "ab", "vout": 1, "status": {"confirmed": true, "block_height": 1}, "value": 1234}]"#;
        let utxos: Vec<AddressUtxo> = serde_json::from_str(json).unwrap();
        assert_eq!(
            utxos,
            vec![AddressUtxo {
                txid: "ab".into(),
                vout: 1,
                value: 1234
            }]
        );
    }

    #[test]
    fn fee_rate_selection() {
        let estimates: HashMap<String, f64> = [("1", 30.0), ("3", 20.5), ("6", 12.0), ("144", 1.5)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        assert_eq!(pick_fee_rate(&estimates, 6), 12.0);
        assert_eq!(pick_fee_rate(&estimates, 2), 20.5);
        assert_eq!(pick_fee_rate(&estimates, 500), 1.0);
        assert_eq!(pick_fee_rate(&HashMap::new(), 6), 1.0);
    }
}
