//! Cosmos LCD (REST) collaborator.

use adapter_core::{HttpClient, RpcError};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountInfo {
    pub account_number: u64,
    pub sequence: u64,
}

/// The `tx_response` of a sync broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TxResponse {
    pub txhash: String,
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub raw_log: String,
}

#[async_trait]
pub trait CosmosRpc: Send + Sync {
    async fn account(&self, address: &str) -> Result<AccountInfo, RpcError>;

    async fn balance(&self, address: &str, denom: &str) -> Result<u128, RpcError>;

    /// Sync-mode broadcast of base64 `TxRaw` bytes. Never retried.
    async fn broadcast(&self, tx_bytes_base64: &str) -> Result<TxResponse, RpcError>;
}

pub struct LcdClient {
    http: HttpClient,
    base_url: String,
}

impl LcdClient {
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

/// Finds `account_number`/`sequence` on a `BaseAccount` or on the base
/// account nested inside vesting and module accounts.
fn parse_account(account: &Value) -> Result<AccountInfo, RpcError> {
    let base = [
        account,
        &account["base_account"],
        &account["base_vesting_account"]["base_account"],
    ]
    .into_iter()
    .find(|v| v.get("account_number").is_some())
    .ok_or_else(|| RpcError::Decode(format!("no base account in {account}")))?;

    let field = |name: &str| -> Result<u64, RpcError> {
        match &base[name] {
            Value::String(s) => s
                .parse()
                .map_err(|e| RpcError::Decode(format!("{name}: {e}"))),
            Value::Number(n) => n
                .as_u64()
                .ok_or_else(|| RpcError::Decode(format!("{name}: {n}"))),
            // proto3 JSON omits zero values
            Value::Null => Ok(0),
            other => Err(RpcError::Decode(format!("{name}: {other}"))),
        }
    };
    Ok(AccountInfo {
        account_number: field("account_number")?,
        sequence: field("sequence")?,
    })
}

#[derive(Deserialize)]
struct AccountResponse {
    account: Value,
}

#[derive(Deserialize)]
struct BalanceResponse {
    balance: Option<CoinAmount>,
}

#[derive(Deserialize)]
struct CoinAmount {
    amount: String,
}

#[derive(Deserialize)]
struct BroadcastResponse {
    tx_response: TxResponse,
}

#[async_trait]
impl CosmosRpc for LcdClient {
    async fn account(&self, address: &str) -> Result<AccountInfo, RpcError> {
        let url = format!("{}/cosmos/auth/v1beta1/accounts/{address}", self.base_url);
        let response: AccountResponse = self.http.get_json(&url).await?;
        parse_account(&response.account)
    }

    async fn balance(&self, address: &str, denom: &str) -> Result<u128, RpcError> {
        let url = format!(
            "{}/cosmos/bank/v1beta1/balances/{address}/by_denom?denom={denom}",
            self.base_url
        );
        let response: BalanceResponse = self.http.get_json(&url).await?;
        match response.balance {
            Some(coin) => coin
                .amount
                .parse()
                .map_err(|e| RpcError::Decode(format!("balance amount: {e}"))),
            None => Ok(0),
        }
    }

    async fn broadcast(&self, tx_bytes_base64: &str) -> Result<TxResponse, RpcError> {
        let url = format!("{}/cosmos/tx/v1beta1/txs", self.base_url);
        let body = json!({ "tx_bytes": tx_bytes_base64, "mode": "BROADCAST_MODE_SYNC" });
        let response: BroadcastResponse = self.http.submit_post_json(&url, &body).await?;
        Ok(response.tx_response)
    }
}
