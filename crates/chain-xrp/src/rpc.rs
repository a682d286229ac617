//! rippled JSON-RPC collaborator.
//!
//! rippled wraps every answer in `{"result": {...}}` and reports failures
//! in-band with `status: "error"` rather than as JSON-RPC 2.0 errors.

use adapter_core::{HttpClient, RpcError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    /// Drops.
    pub balance: u64,
    pub sequence: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubmitResult {
    pub engine_result: String,
    #[serde(default)]
    pub engine_result_message: String,
}

impl SubmitResult {
    pub fn is_success(&self) -> bool {
        self.engine_result == "tesSUCCESS"
    }
}

#[async_trait]
pub trait XrplRpc: Send + Sync {
    /// `None` when the account does not exist yet (`actNotFound`).
    async fn account_info(&self, address: &str) -> Result<Option<AccountInfo>, RpcError>;

    /// Open ledger fee in drops.
    async fn open_ledger_fee(&self) -> Result<u64, RpcError>;

    async fn ledger_current_index(&self) -> Result<u32, RpcError>;

    /// Submits a signed blob (uppercase hex). Never retried.
    async fn submit(&self, tx_blob: &str) -> Result<SubmitResult, RpcError>;
}

#[derive(Serialize)]
struct Request<'a> {
    method: &'a str,
    params: [Value; 1],
}

#[derive(Deserialize)]
struct Envelope {
    result: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AccountData {
    balance: String,
    sequence: u32,
}

#[derive(Deserialize)]
struct AccountInfoResult {
    account_data: AccountData,
}

#[derive(Deserialize)]
struct FeeDrops {
    open_ledger_fee: String,
}

#[derive(Deserialize)]
struct FeeResult {
    drops: FeeDrops,
}

#[derive(Deserialize)]
struct LedgerCurrentResult {
    ledger_current_index: u32,
}

/// Splits rippled's in-band error from a successful result.
fn into_result(result: Value) -> Result<Value, RpcError> {
    if result.get("status").and_then(Value::as_str) != Some("error") {
        return Ok(result);
    }
    let code = result.get("error_code").and_then(Value::as_i64).unwrap_or(-1);
    let error = result.get("error").and_then(Value::as_str).unwrap_or("unknown");
    let message = match result.get("error_message").and_then(Value::as_str) {
        Some(detail) => format!("{error}: {detail}"),
        None => error.to_string(),
    };
    Err(RpcError::JsonRpc { code, message })
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, RpcError> {
    serde_json::from_value(value).map_err(|e| RpcError::Decode(e.to_string()))
}

fn parse_drops(field: &str, value: &str) -> Result<u64, RpcError> {
    value
        .parse()
        .map_err(|_| RpcError::Decode(format!("{field}: {value} is not a drop amount")))
}

pub struct HttpXrplRpc {
    http: HttpClient,
    url: String,
}

impl HttpXrplRpc {
    pub fn new(http: HttpClient, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    async fn read(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let envelope: Envelope = self
            .http
            .read_post_json(&self.url, &Request { method, params: [params] })
            .await?;
        Ok(envelope.result)
    }
}

#[async_trait]
impl XrplRpc for HttpXrplRpc {
    async fn account_info(&self, address: &str) -> Result<Option<AccountInfo>, RpcError> {
        let result = self
            .read(
                "account_info",
                json!({ "account": address, "ledger_index": "current" }),
            )
            .await?;
        if result.get("error").and_then(Value::as_str) == Some("actNotFound") {
            return Ok(None);
        }
        let info: AccountInfoResult = decode(into_result(result)?)?;
        Ok(Some(AccountInfo {
            balance: parse_drops("Balance", &info.account_data.balance)?,
            sequence: info.account_data.sequence,
        }))
    }

    async fn open_ledger_fee(&self) -> Result<u64, RpcError> {
        let fee: FeeResult = decode(into_result(self.read("fee", json!({})).await?)?)?;
        parse_drops("open_ledger_fee", &fee.drops.open_ledger_fee)
    }

    async fn ledger_current_index(&self) -> Result<u32, RpcError> {
        let current: LedgerCurrentResult =
            decode(into_result(self.read("ledger_current", json!({})).await?)?)?;
        Ok(current.ledger_current_index)
    }

    async fn submit(&self, tx_blob: &str) -> Result<SubmitResult, RpcError> {
        let envelope: Envelope = self
            .http
            .submit_post_json(
                &self.url,
                &Request {
                    method: "submit",
                    params: [json!({ "tx_blob": tx_blob })],
                },
            )
            .await?;
        decode(into_result(envelope.result)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_band_errors() {
        let err = into_result(json!({
            "status": "error",
            "error": "invalidParams",
            "error_code": 31,
            "error_message": "Missing field 'account'."
        }))
        .unwrap_err();
        match err {
            RpcError::JsonRpc { code, message } => {
                assert_eq!(code, 31);
                assert_eq!(message, "invalidParams: Missing field 'account'.");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(into_result(json!({ "status": "success" })).is_ok());
    }

    #[test]
    fn account_info_decodes() {
        let info: AccountInfoResult = decode(json!({
            "account_data": { "Account": "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh", "Balance": "99999999990", "Sequence": 3 },
            "status": "success"
        }))
        .unwrap();
        assert_eq!(info.account_data.sequence, 3);
        assert_eq!(parse_drops("Balance", &info.account_data.balance).unwrap(), 99_999_999_990);
    }

    #[test]
    fn submit_result() {
        let result: SubmitResult = decode(json!({
            "engine_result": "terQUEUED",
            "engine_result_message": "Held until escalated fee drops.",
            "status": "success"
        }))
        .unwrap();
        assert!(!result.is_success());
    }
}
