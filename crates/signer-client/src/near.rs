//! Signer contract deployed on NEAR.
//!
//! View methods go over NEAR JSON-RPC (`query` / `call_function`) and are
//! retried. `sign` is a state-changing function call that needs a signed
//! NEAR transaction, so it goes through a caller-supplied
//! [`FunctionCallTransport`] and is never retried here.

use std::sync::Arc;

use adapter_core::retry::retry_with_backoff;
use adapter_core::{DerivationPath, HttpClient, KeyScheme, PublicKey, RetryPolicy, Signature};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use crypto_utils::keys::{near_key_to_uncompressed_hex, parse_ed25519_public_key};
use futures::future::try_join_all;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::SignerConfig;
use crate::contract::{derive_secp256k1_public_key, ChainSignatureContract, SignRequest};
use crate::error::SignerError;
use crate::normalize::normalize_signature;

/// Read-only contract calls.
#[async_trait]
pub trait ViewTransport: Send + Sync {
    async fn view_function(
        &self,
        contract_id: &str,
        method: &str,
        args: &Value,
    ) -> Result<Value, SignerError>;
}

/// A state-changing function call on the signer contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionCall {
    pub signer_account: String,
    pub contract_id: String,
    pub method: String,
    pub args: Value,
    pub gas: u64,
    pub deposit: u128,
}

/// Submits [`FunctionCall`]s as the signing account and returns the
/// call's decoded JSON return value.
#[async_trait]
pub trait FunctionCallTransport: Send + Sync {
    async fn call_function(&self, call: FunctionCall) -> Result<Value, SignerError>;
}

/// [`ViewTransport`] over a NEAR JSON-RPC endpoint.
pub struct NearRpcClient {
    http: HttpClient,
    rpc_url: String,
}

impl NearRpcClient {
    pub fn new(http: HttpClient, rpc_url: impl Into<String>) -> Self {
        Self {
            http,
            rpc_url: rpc_url.into(),
        }
    }
}

#[derive(Deserialize)]
struct CallFunctionResult {
    #[serde(default)]
    result: Option<Vec<u8>>,
    #[serde(default)]
    error: Option<String>,
}

#[async_trait]
impl ViewTransport for NearRpcClient {
    async fn view_function(
        &self,
        contract_id: &str,
        method: &str,
        args: &Value,
    ) -> Result<Value, SignerError> {
        let encoded_args = serde_json::to_vec(args)
            .map_err(|e| SignerError::InvalidRequest(format!("args: {e}")))?;
        let params = json!({
            "request_type": "call_function",
            "finality": "final",
            "account_id": contract_id,
            "method_name": method,
            "args_base64": BASE64.encode(encoded_args),
        });

        let response: CallFunctionResult = self.http.call_once(&self.rpc_url, "query", &params).await?;
        if let Some(error) = response.error {
            return Err(SignerError::CallFailed(format!("{method}: {error}")));
        }
        let bytes = response
            .result
            .ok_or_else(|| SignerError::InvalidResponse(format!("{method}: empty result")))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| SignerError::InvalidResponse(format!("{method}: {e}")))
    }
}

#[derive(Serialize)]
enum Payload {
    Ecdsa(String),
    Eddsa(String),
}

#[derive(Serialize)]
struct ContractSignRequest {
    payload_v2: Payload,
    path: String,
    domain_id: u32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Deposit {
    Number(u64),
    Text(String),
}

pub struct NearChainSignatureContract {
    contract_id: String,
    view: Arc<dyn ViewTransport>,
    caller: Option<Arc<dyn FunctionCallTransport>>,
    retry: RetryPolicy,
    sign_gas: u64,
}

impl NearChainSignatureContract {
    pub fn new(contract_id: impl Into<String>, view: Arc<dyn ViewTransport>) -> Self {
        let defaults = SignerConfig::default();
        Self {
            contract_id: contract_id.into(),
            view,
            caller: None,
            retry: defaults.retry,
            sign_gas: defaults.sign_gas,
        }
    }

    /// Builds a client for the configured network using NEAR JSON-RPC for
    /// view calls. Retry is applied at this layer, so the HTTP client
    /// should not retry on its own.
    pub fn from_config(config: &SignerConfig, http: HttpClient) -> Self {
        let view = Arc::new(NearRpcClient::new(http, config.rpc_url()));
        Self {
            contract_id: config.contract_id().to_string(),
            view,
            caller: None,
            retry: config.retry,
            sign_gas: config.sign_gas,
        }
    }

    pub fn with_function_caller(mut self, caller: Arc<dyn FunctionCallTransport>) -> Self {
        self.caller = Some(caller);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn contract_id(&self) -> &str {
        &self.contract_id
    }

    async fn view<T: DeserializeOwned>(&self, method: &str, args: Value) -> Result<T, SignerError> {
        let args = &args;
        let value = retry_with_backoff(&self.retry, method, SignerError::is_retryable, move || {
            self.view.view_function(&self.contract_id, method, args)
        })
        .await?;
        serde_json::from_value(value)
            .map_err(|e| SignerError::InvalidResponse(format!("{method}: {e}")))
    }

    fn sign_args(payload: &[u8], path: &DerivationPath, scheme: KeyScheme) -> Value {
        let encoded = hex::encode(payload);
        let payload_v2 = match scheme {
            KeyScheme::Secp256k1 => Payload::Ecdsa(encoded),
            KeyScheme::Ed25519 => Payload::Eddsa(encoded),
        };
        let request = ContractSignRequest {
            payload_v2,
            path: path.as_path_string(),
            domain_id: scheme.domain_id(),
        };
        json!({ "request": request })
    }
}

#[async_trait]
impl ChainSignatureContract for NearChainSignatureContract {
    async fn get_public_key(&self) -> Result<String, SignerError> {
        let key: String = self.view("public_key", json!({})).await?;
        Ok(near_key_to_uncompressed_hex(&key)?)
    }

    async fn get_derived_public_key(
        &self,
        owner_id: &str,
        path: &DerivationPath,
        scheme: KeyScheme,
    ) -> Result<PublicKey, SignerError> {
        match scheme {
            KeyScheme::Secp256k1 => {
                let root = self.get_public_key().await?;
                derive_secp256k1_public_key(&root, owner_id, path)
            }
            KeyScheme::Ed25519 => {
                let key: String = self
                    .view(
                        "derived_public_key",
                        json!({
                            "path": path.as_path_string(),
                            "predecessor": owner_id,
                            "domain_id": scheme.domain_id(),
                        }),
                    )
                    .await?;
                Ok(PublicKey::Ed25519(parse_ed25519_public_key(&key)?))
            }
        }
    }

    async fn get_current_signature_deposit(&self) -> Result<u128, SignerError> {
        let deposit: Deposit = self.view("experimental_signature_deposit", json!({})).await?;
        match deposit {
            Deposit::Number(n) => Ok(u128::from(n)),
            Deposit::Text(text) => text
                .parse()
                .map_err(|e| SignerError::InvalidResponse(format!("deposit {text:?}: {e}"))),
        }
    }

    async fn sign(&self, request: &SignRequest) -> Result<Vec<Signature>, SignerError> {
        let caller = self.caller.as_ref().ok_or(SignerError::NoFunctionCaller)?;
        if request.payloads.is_empty() {
            return Err(SignerError::InvalidRequest("no payloads to sign".into()));
        }
        let deposit = self.get_current_signature_deposit().await?;

        tracing::info!(
            contract = %self.contract_id,
            signer = %request.signer_account,
            path = %request.path,
            payloads = request.payloads.len(),
            "requesting signatures"
        );

        let calls = request.payloads.iter().map(|payload| {
            let call = FunctionCall {
                signer_account: request.signer_account.clone(),
                contract_id: self.contract_id.clone(),
                method: "sign".to_string(),
                args: Self::sign_args(payload, &request.path, request.key_scheme),
                gas: self.sign_gas,
                deposit,
            };
            async move {
                let raw = caller.call_function(call).await?;
                normalize_signature(&raw)
            }
        });

        try_join_all(calls).await
    }
}
