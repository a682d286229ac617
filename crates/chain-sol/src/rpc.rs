//! Solana JSON-RPC collaborator.

use adapter_core::{HttpClient, RpcError};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

#[async_trait]
pub trait SolanaRpc: Send + Sync {
    /// Lamports held by `address`. Unknown accounts report zero.
    async fn get_balance(&self, address: &str) -> Result<u64, RpcError>;

    async fn get_latest_blockhash(&self) -> Result<[u8; 32], RpcError>;

    /// Submits a base64 wire transaction and returns its signature. Never retried.
    async fn send_transaction(&self, wire_base64: &str) -> Result<String, RpcError>;
}

#[derive(Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LatestBlockhash {
    blockhash: String,
}

pub struct HttpSolanaRpc {
    http: HttpClient,
    url: String,
    commitment: &'static str,
}

impl HttpSolanaRpc {
    pub fn new(http: HttpClient, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
            commitment: "confirmed",
        }
    }
}

#[async_trait]
impl SolanaRpc for HttpSolanaRpc {
    async fn get_balance(&self, address: &str) -> Result<u64, RpcError> {
        let result: WithContext<u64> = self
            .http
            .call(
                &self.url,
                "getBalance",
                json!([address, { "commitment": self.commitment }]),
            )
            .await?;
        Ok(result.value)
    }

    async fn get_latest_blockhash(&self) -> Result<[u8; 32], RpcError> {
        let result: WithContext<LatestBlockhash> = self
            .http
            .call(
                &self.url,
                "getLatestBlockhash",
                json!([{ "commitment": self.commitment }]),
            )
            .await?;
        crate::address::address_to_bytes(&result.value.blockhash)
            .map_err(|e| RpcError::Decode(format!("blockhash: {e}")))
    }

    async fn send_transaction(&self, wire_base64: &str) -> Result<String, RpcError> {
        self.http
            .call_once(
                &self.url,
                "sendTransaction",
                &json!([wire_base64, { "encoding": "base64", "preflightCommitment": self.commitment }]),
            )
            .await
    }
}
