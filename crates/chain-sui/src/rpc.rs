//! SUI fullnode JSON-RPC collaborator.

use adapter_core::{HttpClient, RpcError};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::coins::SuiCoin;

pub const SUI_COIN_TYPE: &str = "0x2::sui::SUI";
const COINS_PAGE_LIMIT: u32 = 50;
/// Pages fetched before giving up on listing coins.
const MAX_COIN_PAGES: usize = 20;

/// Outcome of `sui_executeTransactionBlock`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub digest: String,
    /// `None` on success, the effects error otherwise.
    pub failure: Option<String>,
}

#[async_trait]
pub trait SuiRpc: Send + Sync {
    /// Total MIST across the owner's SUI coins.
    async fn get_balance(&self, owner: &str) -> Result<u128, RpcError>;

    async fn get_coins(&self, owner: &str) -> Result<Vec<SuiCoin>, RpcError>;

    /// Builds `TransactionData` bytes paying `amounts` to `recipients`
    /// out of `input_coins`.
    async fn pay_sui(
        &self,
        signer: &str,
        input_coins: &[String],
        recipients: &[String],
        amounts: &[u64],
        gas_budget: u64,
    ) -> Result<Vec<u8>, RpcError>;

    /// Executes a signed transaction. Never retried.
    async fn execute(&self, tx_bytes: &str, signatures: &[String]) -> Result<ExecutionResult, RpcError>;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalanceResponse {
    total_balance: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoinPage {
    data: Vec<CoinObject>,
    next_cursor: Option<String>,
    has_next_page: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoinObject {
    coin_object_id: String,
    balance: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionBytes {
    tx_bytes: String,
}

#[derive(Deserialize)]
struct ExecuteResponse {
    digest: String,
    #[serde(default)]
    effects: Option<Value>,
}

fn parse_amount<T: std::str::FromStr>(field: &str, value: &str) -> Result<T, RpcError>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| RpcError::Decode(format!("{field}: {e}")))
}

pub struct HttpSuiRpc {
    http: HttpClient,
    url: String,
}

impl HttpSuiRpc {
    pub fn new(http: HttpClient, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }
}

#[async_trait]
impl SuiRpc for HttpSuiRpc {
    async fn get_balance(&self, owner: &str) -> Result<u128, RpcError> {
        let response: BalanceResponse = self
            .http
            .call(&self.url, "suix_getBalance", json!([owner, SUI_COIN_TYPE]))
            .await?;
        parse_amount("totalBalance", &response.total_balance)
    }

    async fn get_coins(&self, owner: &str) -> Result<Vec<SuiCoin>, RpcError> {
        let mut coins = Vec::new();
        let mut cursor: Option<String> = None;
        for _ in 0..MAX_COIN_PAGES {
            let page: CoinPage = self
                .http
                .call(
                    &self.url,
                    "suix_getCoins",
                    json!([owner, SUI_COIN_TYPE, cursor, COINS_PAGE_LIMIT]),
                )
                .await?;
            for coin in page.data {
                coins.push(SuiCoin {
                    balance: parse_amount("balance", &coin.balance)?,
                    coin_object_id: coin.coin_object_id,
                });
            }
            if !page.has_next_page || page.next_cursor.is_none() {
                return Ok(coins);
            }
            cursor = page.next_cursor;
        }
        tracing::warn!(chain = "sui", owner, pages = MAX_COIN_PAGES, "coin listing truncated");
        Ok(coins)
    }

    async fn pay_sui(
        &self,
        signer: &str,
        input_coins: &[String],
        recipients: &[String],
        amounts: &[u64],
        gas_budget: u64,
    ) -> Result<Vec<u8>, RpcError> {
        let amounts: Vec<String> = amounts.iter().map(u64::to_string).collect();
        let response: TransactionBytes = self
            .http
            .call(
                &self.url,
                "unsafe_paySui",
                json!([signer, input_coins, recipients, amounts, gas_budget.to_string()]),
            )
            .await?;
        BASE64
            .decode(&response.tx_bytes)
            .map_err(|e| RpcError::Decode(format!("txBytes: {e}")))
    }

    async fn execute(&self, tx_bytes: &str, signatures: &[String]) -> Result<ExecutionResult, RpcError> {
        let response: ExecuteResponse = self
            .http
            .call_once(
                &self.url,
                "sui_executeTransactionBlock",
                &json!([
                    tx_bytes,
                    signatures,
                    { "showEffects": true },
                    "WaitForLocalExecution"
                ]),
            )
            .await?;
        Ok(ExecutionResult {
            digest: response.digest,
            failure: response.effects.as_ref().and_then(execution_failure),
        })
    }
}

/// The error of a non-`success` effects status.
fn execution_failure(effects: &Value) -> Option<String> {
    let status = &effects["status"];
    match status["status"].as_str() {
        Some("success") | None => None,
        Some(other) => Some(
            status["error"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| other.to_string()),
        ),
    }
}
