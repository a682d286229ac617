//! Ethereum JSON-RPC collaborator.

use adapter_core::{HttpClient, RpcError};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};

/// Fields of an `eth_estimateGas` call object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CallRequest {
    pub from: String,
    pub to: String,
    /// Hex quantity.
    pub value: String,
    /// Hex data.
    pub data: String,
}

/// The node calls the EVM adapter needs.
#[async_trait]
pub trait EvmRpc: Send + Sync {
    async fn chain_id(&self) -> Result<u64, RpcError>;

    async fn get_balance(&self, address: &str) -> Result<u128, RpcError>;

    /// Transaction count at the `pending` tag.
    async fn get_transaction_count(&self, address: &str) -> Result<u64, RpcError>;

    async fn estimate_gas(&self, call: &CallRequest) -> Result<u64, RpcError>;

    /// `baseFeePerGas` of the latest block.
    async fn base_fee_per_gas(&self) -> Result<u128, RpcError>;

    async fn max_priority_fee_per_gas(&self) -> Result<u128, RpcError>;

    /// Submits a raw signed transaction. Never retried.
    async fn send_raw_transaction(&self, raw_tx: &str) -> Result<String, RpcError>;
}

pub struct HttpEvmRpc {
    http: HttpClient,
    url: String,
}

impl HttpEvmRpc {
    pub fn new(http: HttpClient, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    async fn quantity(&self, method: &str, params: Value) -> Result<u128, RpcError> {
        let hex: String = self.http.call(&self.url, method, params).await?;
        parse_quantity(&hex)
    }
}

#[async_trait]
impl EvmRpc for HttpEvmRpc {
    async fn chain_id(&self) -> Result<u64, RpcError> {
        narrow(self.quantity("eth_chainId", json!([])).await?)
    }

    async fn get_balance(&self, address: &str) -> Result<u128, RpcError> {
        self.quantity("eth_getBalance", json!([address, "latest"])).await
    }

    async fn get_transaction_count(&self, address: &str) -> Result<u64, RpcError> {
        narrow(
            self.quantity("eth_getTransactionCount", json!([address, "pending"]))
                .await?,
        )
    }

    async fn estimate_gas(&self, call: &CallRequest) -> Result<u64, RpcError> {
        narrow(self.quantity("eth_estimateGas", json!([call])).await?)
    }

    async fn base_fee_per_gas(&self) -> Result<u128, RpcError> {
        let block: Value = self
            .http
            .call(&self.url, "eth_getBlockByNumber", json!(["latest", false]))
            .await?;
        let base_fee = block
            .get("baseFeePerGas")
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::Decode("latest block has no baseFeePerGas".into()))?;
        parse_quantity(base_fee)
    }

    async fn max_priority_fee_per_gas(&self) -> Result<u128, RpcError> {
        self.quantity("eth_maxPriorityFeePerGas", json!([])).await
    }

    async fn send_raw_transaction(&self, raw_tx: &str) -> Result<String, RpcError> {
        self.http
            .call_once(&self.url, "eth_sendRawTransaction", &json!([raw_tx]))
            .await
    }
}

/// Parses a `0x`-prefixed hex quantity.
pub fn parse_quantity(hex: &str) -> Result<u128, RpcError> {
    let digits = hex
        .strip_prefix("0x")
        .ok_or_else(|| RpcError::Decode(format!("quantity {hex:?} lacks 0x prefix")))?;
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16)
        .map_err(|e| RpcError::Decode(format!("quantity {hex:?}: {e}")))
}

fn narrow(value: u128) -> Result<u64, RpcError> {
    u64::try_from(value).map_err(|_| RpcError::Decode(format!("{value} exceeds u64")))
}
