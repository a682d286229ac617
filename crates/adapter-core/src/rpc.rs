//! Thin reqwest wrapper used by every chain's RPC backend.
//!
//! Reads (`get_json`, `read_post_json`, `call`) go through the retry
//! policy. Submissions (`submit_*`, `call_once`) make exactly one attempt
//! so a broadcast is never replayed.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::HttpConfig;
use crate::retry::{retry_with_backoff, RetryPolicy};

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("http status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("json-rpc error {code}: {message}")]
    JsonRpc { code: i64, message: String },

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl RpcError {
    /// Transport failures, HTTP 429 and 5xx are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(e) => !e.is_decode() && !e.is_builder(),
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::JsonRpc { .. } | Self::Decode(_) => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'a str,
    method: &'a str,
    params: &'a Value,
    id: u64,
}

impl<'a> JsonRpcRequest<'a> {
    fn new(method: &'a str, params: &'a Value) -> Self {
        Self {
            jsonrpc: "2.0",
            method,
            params,
            id: 1,
        }
    }
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcErrorObject>,
}

#[derive(Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpClient {
    pub fn new(config: &HttpConfig, retry: RetryPolicy) -> Result<Self, RpcError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client, retry })
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    // ---------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, RpcError> {
        retry_with_backoff(&self.retry, url, RpcError::is_retryable, move || async move {
            tracing::debug!(url, "GET");
            let response = self.client.get(url).send().await?;
            decode_json(response).await
        })
        .await
    }

    /// POST that does not change chain state (view functions, queries).
    pub async fn read_post_json<T, B>(&self, url: &str, body: &B) -> Result<T, RpcError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        retry_with_backoff(&self.retry, url, RpcError::is_retryable, move || async move {
            tracing::debug!(url, "POST (read)");
            let response = self.client.post(url).json(body).send().await?;
            decode_json(response).await
        })
        .await
    }

    /// JSON-RPC 2.0 read with retry.
    pub async fn call<T: DeserializeOwned>(
        &self,
        url: &str,
        method: &str,
        params: Value,
    ) -> Result<T, RpcError> {
        let params = &params;
        retry_with_backoff(&self.retry, method, RpcError::is_retryable, move || {
            self.call_once(url, method, params)
        })
        .await
    }

    // ---------------------------------------------------------------
    // Submissions (single attempt)
    // ---------------------------------------------------------------

    /// JSON-RPC 2.0 call without retry.
    pub async fn call_once<T: DeserializeOwned>(
        &self,
        url: &str,
        method: &str,
        params: &Value,
    ) -> Result<T, RpcError> {
        tracing::debug!(url, method, "json-rpc call");
        let request = JsonRpcRequest::new(method, params);
        let response = self.client.post(url).json(&request).send().await?;
        let envelope: JsonRpcResponse = decode_json(response).await?;

        if let Some(error) = envelope.error {
            return Err(RpcError::JsonRpc {
                code: error.code,
                message: error.message,
            });
        }
        let result = envelope.result.unwrap_or(Value::Null);
        serde_json::from_value(result)
            .map_err(|e| RpcError::Decode(format!("{method} result: {e}")))
    }

    pub async fn submit_post_json<T, B>(&self, url: &str, body: &B) -> Result<T, RpcError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        tracing::debug!(url, "POST (submit)");
        let response = self.client.post(url).json(body).send().await?;
        decode_json(response).await
    }

    /// POSTs a raw body and returns the response body as text.
    pub async fn submit_post_text(&self, url: &str, body: String) -> Result<String, RpcError> {
        tracing::debug!(url, "POST text (submit)");
        let response = self.client.post(url).body(body).send().await?;
        let response = check_status(response).await?;
        Ok(response.text().await?)
    }

    pub async fn submit_post_bytes<T: DeserializeOwned>(
        &self,
        url: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<T, RpcError> {
        tracing::debug!(url, content_type, "POST bytes (submit)");
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await?;
        decode_json(response).await
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, RpcError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RpcError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn decode_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, RpcError> {
    let response = check_status(response).await?;
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| RpcError::Decode(e.to_string()))
}
