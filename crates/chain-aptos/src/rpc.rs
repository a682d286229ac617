//! Aptos fullnode REST collaborator (`/v1`).

use adapter_core::{HttpClient, RpcError};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

const SIGNED_TRANSACTION_BCS: &str = "application/x.aptos.signed_transaction+bcs";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerInfo {
    pub chain_id: u8,
    pub ledger_timestamp_secs: u64,
}

#[async_trait]
pub trait AptosRpc: Send + Sync {
    async fn ledger_info(&self) -> Result<LedgerInfo, RpcError>;

    /// `None` when the account resource does not exist yet.
    async fn sequence_number(&self, address: &str) -> Result<Option<u64>, RpcError>;

    async fn gas_price(&self) -> Result<u64, RpcError>;

    /// Octas of `coin_type` held by `address`.
    async fn balance(&self, address: &str, coin_type: &str) -> Result<u128, RpcError>;

    /// Submits a BCS signed transaction and returns its hash. Never retried.
    async fn submit(&self, signed_bcs: Vec<u8>) -> Result<String, RpcError>;
}

#[derive(Deserialize)]
struct LedgerResponse {
    chain_id: u8,
    ledger_timestamp: String,
}

#[derive(Deserialize)]
struct AccountResponse {
    sequence_number: String,
}

#[derive(Deserialize)]
struct GasEstimate {
    gas_estimate: u64,
}

#[derive(Deserialize)]
struct PendingTransaction {
    hash: String,
}

fn parse_u64(field: &str, value: &str) -> Result<u64, RpcError> {
    value
        .parse()
        .map_err(|e| RpcError::Decode(format!("{field}: {e}")))
}

pub struct HttpAptosRpc {
    http: HttpClient,
    base_url: String,
}

impl HttpAptosRpc {
    /// `base_url` includes the `/v1` suffix.
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl AptosRpc for HttpAptosRpc {
    async fn ledger_info(&self) -> Result<LedgerInfo, RpcError> {
        let info: LedgerResponse = self.http.get_json(&self.base_url).await?;
        Ok(LedgerInfo {
            chain_id: info.chain_id,
            ledger_timestamp_secs: parse_u64("ledger_timestamp", &info.ledger_timestamp)? / 1_000_000,
        })
    }

    async fn sequence_number(&self, address: &str) -> Result<Option<u64>, RpcError> {
        let url = format!("{}/accounts/{address}", self.base_url);
        match self.http.get_json::<AccountResponse>(&url).await {
            Ok(account) => parse_u64("sequence_number", &account.sequence_number).map(Some),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn gas_price(&self) -> Result<u64, RpcError> {
        let url = format!("{}/estimate_gas_price", self.base_url);
        let estimate: GasEstimate = self.http.get_json(&url).await?;
        Ok(estimate.gas_estimate)
    }

    async fn balance(&self, address: &str, coin_type: &str) -> Result<u128, RpcError> {
        let url = format!("{}/view", self.base_url);
        let body = json!({
            "function": "0x1::coin::balance",
            "type_arguments": [coin_type],
            "arguments": [address],
        });
        let values: Vec<String> = self.http.read_post_json(&url, &body).await?;
        let first = values
            .first()
            .ok_or_else(|| RpcError::Decode("empty view result".into()))?;
        first
            .parse()
            .map_err(|e| RpcError::Decode(format!("balance: {e}")))
    }

    async fn submit(&self, signed_bcs: Vec<u8>) -> Result<String, RpcError> {
        let url = format!("{}/transactions", self.base_url);
        let pending: PendingTransaction = self
            .http
            .submit_post_bytes(&url, SIGNED_TRANSACTION_BCS, signed_bcs)
            .await?;
        Ok(pending.hash)
    }
}
