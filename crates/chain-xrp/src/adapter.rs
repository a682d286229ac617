use std::sync::Arc;

use adapter_core::{
    ensure_signatures, AdapterError, Balance, ChainAdapter, ChainKind, DerivationPath,
    DerivedAccount, KeyScheme, PreparedTransaction, PublicKey, RpcError, Signature,
};
use async_trait::async_trait;
use crypto_utils::der::{encode_der, normalize_low_s};
use crypto_utils::keys::{compressed_bytes, parse_ed25519_public_key, parse_secp256k1_public_key};
use serde::{Deserialize, Serialize};
use serde_json::json;
use signer_client::ChainSignatureContract;

use crate::address::{public_key_to_address, ED25519_KEY_PREFIX};
use crate::config::XrpConfig;
use crate::error::XrpError;
use crate::rpc::XrplRpc;
use crate::transaction::{ed25519_key_hex, transaction_hash, XrpTransaction};

pub const XRP_DECIMALS: u8 = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XrpTransactionRequest {
    pub from: String,
    /// Compressed secp256k1 key (66 hex chars) or `ED`-prefixed Ed25519
    /// key, as returned by derivation.
    pub from_public_key: String,
    pub to: String,
    /// Drops.
    pub amount: u64,
    #[serde(default)]
    pub destination_tag: Option<u32>,
}

/// Signing public key bytes as the ledger expects them in `SigningPubKey`.
fn signing_public_key(text: &str) -> Result<[u8; 33], XrpError> {
    if let Some(key_hex) = ed25519_key_hex(text) {
        let key = parse_ed25519_public_key(key_hex)
            .map_err(|e| XrpError::InvalidPublicKey(e.to_string()))?;
        let mut out = [0u8; 33];
        out[0] = ED25519_KEY_PREFIX;
        out[1..].copy_from_slice(&key);
        return Ok(out);
    }
    let key = parse_secp256k1_public_key(text).map_err(|e| XrpError::InvalidPublicKey(e.to_string()))?;
    Ok(compressed_bytes(&key))
}

pub struct XrpAdapter<R> {
    rpc: R,
    contract: Arc<dyn ChainSignatureContract>,
    key_scheme: KeyScheme,
    last_ledger_offset: u32,
}

impl<R: XrplRpc> XrpAdapter<R> {
    pub fn new(rpc: R, contract: Arc<dyn ChainSignatureContract>, config: &XrpConfig) -> Self {
        Self {
            rpc,
            contract,
            key_scheme: config.key_scheme,
            last_ledger_offset: config.last_ledger_offset,
        }
    }
}

#[async_trait]
impl<R: XrplRpc> ChainAdapter for XrpAdapter<R> {
    type TransactionRequest = XrpTransactionRequest;
    type UnsignedTransaction = XrpTransaction;

    fn chain(&self) -> ChainKind {
        ChainKind::Xrp
    }

    fn key_scheme(&self) -> KeyScheme {
        self.key_scheme
    }

    async fn get_balance(&self, address: &str) -> Result<Balance, AdapterError> {
        match self.rpc.account_info(address).await? {
            Some(info) => {
                tracing::debug!(chain = "xrp", address, drops = info.balance, "balance");
                Ok(Balance::new(info.balance.into(), XRP_DECIMALS))
            }
            None => {
                tracing::debug!(chain = "xrp", address, "account not found, zero balance");
                Ok(Balance::zero(XRP_DECIMALS))
            }
        }
    }

    async fn derive_address_and_public_key(
        &self,
        owner_id: &str,
        path: &DerivationPath,
    ) -> Result<DerivedAccount, AdapterError> {
        let key = self
            .contract
            .get_derived_public_key(owner_id, path, self.key_scheme)
            .await?;
        let signing_key = match key {
            PublicKey::Secp256k1(bytes) => signing_public_key(&hex::encode(bytes))?,
            PublicKey::Ed25519(bytes) => signing_public_key(&format!("ED{}", hex::encode(bytes)))?,
        };
        Ok(DerivedAccount {
            address: public_key_to_address(&signing_key)?,
            public_key: hex::encode_upper(signing_key),
        })
    }

    async fn prepare_transaction_for_signing(
        &self,
        request: XrpTransactionRequest,
    ) -> Result<PreparedTransaction<XrpTransaction>, AdapterError> {
        let signing_key = signing_public_key(&request.from_public_key)?;
        if public_key_to_address(&signing_key)? != request.from {
            return Err(XrpError::InvalidAddress(format!(
                "{} does not belong to the supplied public key",
                request.from
            ))
            .into());
        }

        let account = self
            .rpc
            .account_info(&request.from)
            .await
            .map_err(AdapterError::preparation)?
            .ok_or_else(|| AdapterError::AccountNotFound(request.from.clone()))?;
        let fee = self
            .rpc
            .open_ledger_fee()
            .await
            .map_err(AdapterError::preparation)?;
        let last_ledger = self
            .rpc
            .ledger_current_index()
            .await
            .map_err(AdapterError::preparation)?
            .saturating_add(self.last_ledger_offset);

        let mut tx = XrpTransaction::payment(
            &request.from,
            &request.to,
            request.amount,
            request.destination_tag,
        );
        tx.set("Sequence", json!(account.sequence));
        tx.set("Fee", json!(fee.to_string()));
        tx.set("LastLedgerSequence", json!(last_ledger));
        tx.set("SigningPubKey", json!(hex::encode_upper(signing_key)));

        let payload = if tx.is_ed25519() {
            tx.signing_data()?
        } else {
            tx.signing_hash()?.to_vec()
        };
        tracing::debug!(
            chain = "xrp",
            from = %request.from,
            sequence = account.sequence,
            fee,
            last_ledger,
            "prepared payment"
        );
        Ok(PreparedTransaction::new(tx, vec![payload]))
    }

    /// Returns the signed transaction in JSON form.
    fn finalize_transaction_signing(
        &self,
        mut transaction: XrpTransaction,
        signatures: &[Signature],
    ) -> Result<String, AdapterError> {
        ensure_signatures(signatures, 1)?;
        let txn_signature = if transaction.is_ed25519() {
            hex::encode_upper(signatures[0].as_ed25519()?.to_bytes())
        } else {
            let rsv = signatures[0].as_ecdsa()?;
            let (r, s, _) = normalize_low_s(&rsv.r_bytes()?, &rsv.s_bytes()?)
                .map_err(|e| AdapterError::InvalidSignature(e.to_string()))?;
            hex::encode_upper(encode_der(&r, &s))
        };
        transaction.set("TxnSignature", json!(txn_signature));
        Ok(transaction.to_json()?)
    }

    async fn broadcast_tx(&self, signed_transaction: &str) -> Result<String, AdapterError> {
        let transaction = XrpTransaction::from_json(signed_transaction)?;
        if transaction.get_str("TxnSignature").is_none() {
            return Err(AdapterError::InvalidTransaction("transaction is not signed".into()));
        }
        let blob = transaction.to_blob()?;
        let result = match self.rpc.submit(&hex::encode_upper(&blob)).await {
            Ok(result) => result,
            Err(RpcError::JsonRpc { message, .. }) => {
                tracing::warn!(chain = "xrp", reason = %message, "submit rejected");
                return Err(AdapterError::BroadcastFailed(message));
            }
            Err(e) => return Err(e.into()),
        };
        if !result.is_success() {
            let reason = format!("{}: {}", result.engine_result, result.engine_result_message);
            tracing::warn!(chain = "xrp", reason = %reason, "broadcast rejected");
            return Err(AdapterError::BroadcastFailed(reason));
        }
        let hash = transaction_hash(&blob);
        tracing::info!(chain = "xrp", hash = %hash, "broadcast accepted");
        Ok(hash)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use crypto_utils::der::decode_der;
    use crypto_utils::hash::sha512_half;
    use ed25519_dalek::{Verifier as _, VerifyingKey};
    use k256::ecdsa::signature::hazmat::PrehashVerifier;
    use signer_client::{LocalSigner, SignRequest};

    use super::*;
    use crate::rpc::{AccountInfo, SubmitResult};

    struct MockRippled {
        account: Option<AccountInfo>,
        engine_result: &'static str,
        submitted: Mutex<Vec<String>>,
    }

    impl MockRippled {
        fn funded() -> Self {
            Self {
                account: Some(AccountInfo {
                    balance: 25_000_000,
                    sequence: 41,
                }),
                engine_result: "tesSUCCESS",
                submitted: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl XrplRpc for MockRippled {
        async fn account_info(&self, _address: &str) -> Result<Option<AccountInfo>, RpcError> {
            Ok(self.account.clone())
        }

        async fn open_ledger_fee(&self) -> Result<u64, RpcError> {
            Ok(12)
        }

        async fn ledger_current_index(&self) -> Result<u32, RpcError> {
            Ok(1_000)
        }

        async fn submit(&self, tx_blob: &str) -> Result<SubmitResult, RpcError> {
            self.submitted.lock().unwrap().push(tx_blob.to_string());
            Ok(SubmitResult {
                engine_result: self.engine_result.into(),
                engine_result_message: "message".into(),
            })
        }
    }

    fn adapter(rpc: MockRippled, scheme: KeyScheme) -> (XrpAdapter<MockRippled>, Arc<LocalSigner>) {
        let signer = Arc::new(LocalSigner::from_seed(b"xrp tests").unwrap());
        let config = XrpConfig {
            key_scheme: scheme,
            ..XrpConfig::default()
        };
        (XrpAdapter::new(rpc, signer.clone(), &config), signer)
    }

    async fn sign(signer: &LocalSigner, payloads: Vec<Vec<u8>>, scheme: KeyScheme) -> Vec<Signature> {
        signer
            .sign(&SignRequest {
                payloads,
                path: "xrp-0".into(),
                key_scheme: scheme,
                signer_account: "carol.testnet".into(),
            })
            .await
            .unwrap()
    }

    async fn request(adapter: &XrpAdapter<MockRippled>) -> XrpTransactionRequest {
        let account = adapter
            .derive_address_and_public_key("carol.testnet", &"xrp-0".into())
            .await
            .unwrap();
        XrpTransactionRequest {
            from: account.address,
            from_public_key: account.public_key,
            to: "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh".into(),
            amount: 1_500_000,
            destination_tag: None,
        }
    }

    #[tokio::test]
    async fn autofills_and_signs_with_secp256k1() {
        let (adapter, signer) = adapter(MockRippled::funded(), KeyScheme::Secp256k1);
        let request = request(&adapter).await;
        assert!(request.from.starts_with('r'));
        assert_eq!(request.from_public_key.len(), 66);

        let prepared = adapter.prepare_transaction_for_signing(request.clone()).await.unwrap();
        let tx = &prepared.transaction;
        assert_eq!(tx.0["Sequence"], 41);
        assert_eq!(tx.0["Fee"], "12");
        assert_eq!(tx.0["LastLedgerSequence"], 1_020);
        assert_eq!(prepared.hashes_to_sign, vec![tx.signing_hash().unwrap().to_vec()]);

        let signatures = sign(&signer, prepared.hashes_to_sign.clone(), KeyScheme::Secp256k1).await;
        let json = adapter
            .finalize_transaction_signing(prepared.transaction.clone(), &signatures)
            .unwrap();
        let signed = XrpTransaction::from_json(&json).unwrap();
        let der_hex = signed.get_str("TxnSignature").unwrap();
        assert_eq!(der_hex, der_hex.to_uppercase());

        let (r, s) = decode_der(&hex::decode(der_hex).unwrap()).unwrap();
        let mut compact = [0u8; 64];
        compact[..32].copy_from_slice(&r);
        compact[32..].copy_from_slice(&s);
        let signature = k256::ecdsa::Signature::from_slice(&compact).unwrap();
        assert!(signature.normalize_s().is_none(), "signature must be low-S");
        let key = k256::ecdsa::VerifyingKey::from_sec1_bytes(
            &hex::decode(&request.from_public_key).unwrap(),
        )
        .unwrap();
        key.verify_prehash(&prepared.hashes_to_sign[0], &signature).unwrap();

        let hash = adapter.broadcast_tx(&json).await.unwrap();
        let blob = adapter.rpc.submitted.lock().unwrap()[0].clone();
        let mut preimage = b"TXN\0".to_vec();
        preimage.extend_from_slice(&hex::decode(&blob).unwrap());
        assert_eq!(hash, hex::encode_upper(sha512_half(&preimage)));
    }

    #[tokio::test]
    async fn ed25519_signature_is_raw_and_key_is_ed_prefixed() {
        let (adapter, signer) = adapter(MockRippled::funded(), KeyScheme::Ed25519);
        let request = request(&adapter).await;
        assert!(request.from_public_key.starts_with("ED"));

        let prepared = adapter.prepare_transaction_for_signing(request).await.unwrap();
        assert_eq!(&prepared.hashes_to_sign[0][..4], b"STX\0");
        let signatures = sign(&signer, prepared.hashes_to_sign.clone(), KeyScheme::Ed25519).await;
        let json = adapter
            .finalize_transaction_signing(prepared.transaction.clone(), &signatures)
            .unwrap();

        let signed = XrpTransaction::from_json(&json).unwrap();
        let txn_signature = signed.get_str("TxnSignature").unwrap();
        let signing_key = signed.get_str("SigningPubKey").unwrap();
        assert_eq!(txn_signature.len(), 128);
        assert!(signing_key.starts_with("ED"));

        let key: [u8; 32] = hex::decode(&signing_key[2..]).unwrap().try_into().unwrap();
        let sig: [u8; 64] = hex::decode(txn_signature).unwrap().try_into().unwrap();
        VerifyingKey::from_bytes(&key)
            .unwrap()
            .verify(
                &prepared.hashes_to_sign[0],
                &ed25519_dalek::Signature::from_bytes(&sig),
            )
            .unwrap();
    }

    #[tokio::test]
    async fn unknown_account_has_zero_balance() {
        let rpc = MockRippled {
            account: None,
            ..MockRippled::funded()
        };
        let (adapter, _) = adapter(rpc, KeyScheme::Secp256k1);
        assert_eq!(
            adapter.get_balance("rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh").await.unwrap(),
            Balance::zero(6)
        );

        let request = request(&adapter).await;
        let err = adapter.prepare_transaction_for_signing(request).await.unwrap_err();
        assert!(matches!(err, AdapterError::AccountNotFound(_)));
    }

    #[tokio::test]
    async fn engine_result_is_reported_verbatim() {
        let rpc = MockRippled {
            engine_result: "terQUEUED",
            ..MockRippled::funded()
        };
        let (adapter, signer) = adapter(rpc, KeyScheme::Secp256k1);
        let prepared = adapter
            .prepare_transaction_for_signing(request(&adapter).await)
            .await
            .unwrap();
        let signatures = sign(&signer, prepared.hashes_to_sign.clone(), KeyScheme::Secp256k1).await;
        let json = adapter
            .finalize_transaction_signing(prepared.transaction, &signatures)
            .unwrap();
        match adapter.broadcast_tx(&json).await.unwrap_err() {
            AdapterError::BroadcastFailed(reason) => assert_eq!(reason, "terQUEUED: message"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_public_key_is_rejected() {
        let (adapter, _) = adapter(MockRippled::funded(), KeyScheme::Ed25519);
        for bad_key in [format!("\u{20ac}{}", "A".repeat(63)), format!("ED{}", "ZZ".repeat(32))] {
            let request = XrpTransactionRequest {
                from_public_key: bad_key,
                ..request(&adapter).await
            };
            let err = adapter.prepare_transaction_for_signing(request).await.unwrap_err();
            assert!(matches!(err, AdapterError::InvalidKeyFormat(_)), "{err:?}");
        }
    }

    #[tokio::test]
    async fn finalize_requires_a_signature() {
        let (adapter, _) = adapter(MockRippled::funded(), KeyScheme::Secp256k1);
        let tx = XrpTransaction::payment("rrrrrrrrrrrrrrrrrrrrBZbvji", "rrrrrrrrrrrrrrrrrrrrBZbvji", 1, None);
        assert!(matches!(
            adapter.finalize_transaction_signing(tx, &[]),
            Err(AdapterError::NoSignatureProvided)
        ));
    }

    #[tokio::test]
    async fn unsigned_transactions_are_not_broadcast() {
        let (adapter, _) = adapter(MockRippled::funded(), KeyScheme::Secp256k1);
        let tx = XrpTransaction::payment("rrrrrrrrrrrrrrrrrrrrBZbvji", "rrrrrrrrrrrrrrrrrrrrBZbvji", 1, None);
        let err = adapter.broadcast_tx(&tx.to_json().unwrap()).await.unwrap_err();
        assert!(matches!(err, AdapterError::InvalidTransaction(_)));
    }
}
