use bitcoin::absolute::LockTime;
use bitcoin::ecdsa::Signature as BitcoinSignature;
use bitcoin::hashes::Hash;
use bitcoin::secp256k1::ecdsa::Signature as SecpSignature;
use bitcoin::script::ScriptBuf;
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::transaction::Version;
use bitcoin::{Amount, OutPoint, Sequence, Transaction, TxIn, TxOut, Txid, Witness};
use serde::{Deserialize, Serialize};

use crate::address::{parse_address, parse_compressed_key};
use crate::error::BtcError;
use crate::network::BtcNetwork;
use crate::utxo::{select_utxos, Utxo};

/// Estimated virtual size of a P2WPKH input: 41 bytes non-witness plus
/// ~107 witness bytes / 4.
const P2WPKH_INPUT_VBYTES: u64 = 68;

const OUTPUT_VBYTES: u64 = 31;

/// Version, locktime, segwit marker/flag and counts.
const TX_OVERHEAD_VBYTES: u64 = 11;

/// Outputs below this are non-standard; smaller change goes to the fee.
pub const DUST_THRESHOLD_SAT: u64 = 546;

/// An unsigned P2WPKH transaction plus what is needed to sign it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedBtcTx {
    /// Consensus-encoded as hex when serialized.
    #[serde(with = "consensus_hex")]
    pub tx: Transaction,
    /// Outputs being spent, in input order.
    pub prevouts: Vec<Utxo>,
    /// Compressed sender key, hex.
    pub public_key: String,
}

impl UnsignedBtcTx {
    pub fn fee_sat(&self) -> u64 {
        let spent: u64 = self.prevouts.iter().map(|u| u.amount_sat).sum();
        let created: u64 = self.tx.output.iter().map(|o| o.value.to_sat()).sum();
        spent.saturating_sub(created)
    }

    fn public_key_bytes(&self) -> Result<[u8; 33], BtcError> {
        hex::decode(&self.public_key)
            .ok()
            .and_then(|bytes| <[u8; 33]>::try_from(bytes).ok())
            .ok_or_else(|| BtcError::InvalidPublicKey("expected 33-byte compressed hex".into()))
    }
}

pub fn estimate_fee(
    num_inputs: usize,
    num_outputs: usize,
    fee_rate_sat_vbyte: u64,
) -> Result<u64, BtcError> {
    let inputs = (num_inputs as u64).checked_mul(P2WPKH_INPUT_VBYTES);
    let outputs = (num_outputs as u64).checked_mul(OUTPUT_VBYTES);
    inputs
        .zip(outputs)
        .and_then(|(i, o)| TX_OVERHEAD_VBYTES.checked_add(i)?.checked_add(o))
        .and_then(|vsize| vsize.checked_mul(fee_rate_sat_vbyte))
        .ok_or_else(|| {
            BtcError::TransactionBuildError(format!(
                "fee overflows at {fee_rate_sat_vbyte} sat/vB for {num_inputs} inputs"
            ))
        })
}

/// Selects inputs and builds a payment to `recipient` with change back to
/// `change_address` when the change is at least the dust threshold.
/// Every input must be locked to the P2WPKH script of `public_key`.
pub fn build_p2wpkh_transaction(
    utxos: &[Utxo],
    recipient: &str,
    amount_sat: u64,
    change_address: &str,
    fee_rate_sat_vbyte: u64,
    network: BtcNetwork,
    public_key: &[u8; 33],
) -> Result<UnsignedBtcTx, BtcError> {
    let recipient_addr = parse_address(recipient, network)?;
    let change_addr = parse_address(change_address, network)?;
    if amount_sat < DUST_THRESHOLD_SAT {
        return Err(BtcError::TransactionBuildError(format!(
            "amount {amount_sat} sat is below the dust threshold"
        )));
    }

    let key = parse_compressed_key(public_key)?;
    let own_script = ScriptBuf::new_p2wpkh(&key.wpubkey_hash());

    let selection = select_utxos(utxos, amount_sat, fee_rate_sat_vbyte)?;

    let mut inputs = Vec::with_capacity(selection.selected.len());
    for utxo in &selection.selected {
        if utxo.script_pubkey != own_script.as_bytes() {
            return Err(BtcError::TransactionBuildError(format!(
                "utxo {}:{} is not locked to the sender key",
                utxo.txid, utxo.vout
            )));
        }
        let txid: Txid = utxo
            .txid
            .parse()
            .map_err(|e| BtcError::TransactionBuildError(format!("invalid txid {}: {e}", utxo.txid)))?;
        inputs.push(TxIn {
            previous_output: OutPoint::new(txid, utxo.vout),
            script_sig: ScriptBuf::new(),
            sequence: Sequence::ENABLE_RBF_NO_LOCKTIME,
            witness: Witness::default(),
        });
    }

    let change_sat = selection
        .total_sat
        .saturating_sub(amount_sat.saturating_add(selection.fee_sat));

    let mut outputs = vec![TxOut {
        value: Amount::from_sat(amount_sat),
        script_pubkey: recipient_addr.script_pubkey(),
    }];
    if change_sat >= DUST_THRESHOLD_SAT {
        outputs.push(TxOut {
            value: Amount::from_sat(change_sat),
            script_pubkey: change_addr.script_pubkey(),
        });
    }

    Ok(UnsignedBtcTx {
        tx: Transaction {
            version: Version::TWO,
            lock_time: LockTime::ZERO,
            input: inputs,
            output: outputs,
        },
        prevouts: selection.selected,
        public_key: hex::encode(public_key),
    })
}

/// BIP-143 `SIGHASH_ALL` digest for every input, in input order.
pub fn sighashes(unsigned: &UnsignedBtcTx) -> Result<Vec<[u8; 32]>, BtcError> {
    let key = parse_compressed_key(&unsigned.public_key_bytes()?)?;
    let script_pubkey = ScriptBuf::new_p2wpkh(&key.wpubkey_hash());
    let mut cache = SighashCache::new(&unsigned.tx);

    unsigned
        .prevouts
        .iter()
        .enumerate()
        .map(|(index, prevout)| {
            cache
                .p2wpkh_signature_hash(
                    index,
                    &script_pubkey,
                    Amount::from_sat(prevout.amount_sat),
                    EcdsaSighashType::All,
                )
                .map(|hash| hash.to_byte_array())
                .map_err(|e| BtcError::SigningError(format!("sighash for input {index}: {e}")))
        })
        .collect()
}

/// Fills each input's witness with `[DER(r, low-s) || 0x01, pubkey]`.
pub fn attach_signatures(
    unsigned: &UnsignedBtcTx,
    signatures: &[([u8; 32], [u8; 32])],
) -> Result<Transaction, BtcError> {
    if signatures.len() != unsigned.tx.input.len() {
        return Err(BtcError::SigningError(format!(
            "{} inputs but {} signatures",
            unsigned.tx.input.len(),
            signatures.len()
        )));
    }
    let public_key = unsigned.public_key_bytes()?;

    let mut signed = unsigned.tx.clone();
    for (input, (r, s)) in signed.input.iter_mut().zip(signatures) {
        let mut compact = [0u8; 64];
        compact[..32].copy_from_slice(r);
        compact[32..].copy_from_slice(s);
        let mut signature = SecpSignature::from_compact(&compact)
            .map_err(|e| BtcError::SigningError(e.to_string()))?;
        signature.normalize_s();
        let sig = BitcoinSignature {
            signature,
            sighash_type: EcdsaSighashType::All,
        };

        let mut witness = Witness::new();
        witness.push(sig.to_vec());
        witness.push(public_key);
        input.witness = witness;
    }
    Ok(signed)
}

pub fn serialize_hex(tx: &Transaction) -> String {
    hex::encode(bitcoin::consensus::serialize(tx))
}

mod consensus_hex {
    use bitcoin::Transaction;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(tx: &Transaction, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::serialize_hex(tx))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Transaction, D::Error> {
        let text = String::deserialize(deserializer)?;
        let bytes = hex::decode(&text).map_err(serde::de::Error::custom)?;
        bitcoin::consensus::deserialize(&bytes).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use bitcoin::secp256k1::{ecdsa, Message, PublicKey as SecpPublicKey, Secp256k1};
    use k256::ecdsa::signature::hazmat::PrehashSigner;
    use k256::ecdsa::SigningKey;

    use super::*;
    use crate::address::{pubkey_to_address, AddressType};

    const RECIPIENT: &str = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4";

    fn signing_key() -> SigningKey {
        SigningKey::from_bytes(&[0x42u8; 32].into()).unwrap()
    }

    fn compressed(key: &SigningKey) -> [u8; 33] {
        key.verifying_key()
            .to_encoded_point(true)
            .as_bytes()
            .try_into()
            .unwrap()
    }

    fn own_utxo(key: &[u8; 33], txid_byte: &str, amount_sat: u64) -> Utxo {
        let pk = parse_compressed_key(key).unwrap();
        Utxo {
            txid: txid_byte.repeat(64),
            vout: 0,
            amount_sat,
            script_pubkey: ScriptBuf::new_p2wpkh(&pk.wpubkey_hash()).to_bytes(),
        }
    }

    fn build(utxos: &[Utxo], amount: u64, key: &[u8; 33]) -> Result<UnsignedBtcTx, BtcError> {
        let change = pubkey_to_address(key, AddressType::P2wpkh, BtcNetwork::Mainnet).unwrap();
        build_p2wpkh_transaction(utxos, RECIPIENT, amount, &change, 1, BtcNetwork::Mainnet, key)
    }

    #[test]
    fn estimate_fee_basic() {
        assert_eq!(estimate_fee(1, 2, 1).unwrap(), 141);
        assert_eq!(estimate_fee(2, 2, 10).unwrap() - estimate_fee(1, 2, 10).unwrap(), 680);
        assert_eq!(estimate_fee(5, 5, 0).unwrap(), 0);
    }

    #[test]
    fn estimate_fee_rejects_overflowing_rate() {
        assert!(matches!(
            estimate_fee(1, 2, u64::MAX / 10),
            Err(BtcError::TransactionBuildError(_))
        ));
        assert!(estimate_fee(usize::MAX, 2, 1).is_err());
    }

    #[test]
    fn single_utxo_produces_one_change_output() {
        let key = compressed(&signing_key());
        let unsigned = build(&[own_utxo(&key, "a", 100_000)], 50_000, &key).unwrap();

        assert_eq!(unsigned.tx.input.len(), 1);
        assert_eq!(unsigned.tx.output.len(), 2);
        assert_eq!(unsigned.tx.output[0].value.to_sat(), 50_000);
        let fee = estimate_fee(1, 2, 1).unwrap();
        assert_eq!(unsigned.tx.output[1].value.to_sat(), 100_000 - 50_000 - fee);
        assert_eq!(unsigned.fee_sat(), fee);
    }

    #[test]
    fn dust_change_goes_to_fee() {
        let key = compressed(&signing_key());
        let unsigned = build(&[own_utxo(&key, "b", 100_000)], 99_700, &key).unwrap();
        assert_eq!(unsigned.tx.output.len(), 1);
        assert_eq!(unsigned.fee_sat(), 300);
    }

    #[test]
    fn foreign_utxo_rejected() {
        let key = compressed(&signing_key());
        let mut utxo = own_utxo(&key, "c", 100_000);
        utxo.script_pubkey = hex::decode(format!("0014{}", "ab".repeat(20))).unwrap();
        let err = build(&[utxo], 50_000, &key).unwrap_err();
        assert!(err.to_string().contains("not locked to the sender key"));
    }

    #[test]
    fn dust_amount_rejected() {
        let key = compressed(&signing_key());
        assert!(build(&[own_utxo(&key, "d", 100_000)], 100, &key).is_err());
    }

    #[test]
    fn wrong_network_recipient_rejected() {
        let key = compressed(&signing_key());
        let change = pubkey_to_address(&key, AddressType::P2wpkh, BtcNetwork::Testnet).unwrap();
        let err = build_p2wpkh_transaction(
            &[own_utxo(&key, "e", 100_000)],
            RECIPIENT,
            50_000,
            &change,
            1,
            BtcNetwork::Testnet,
            &key,
        )
        .unwrap_err();
        assert!(matches!(err, BtcError::InvalidAddress(_)));
    }

    #[test]
    fn one_sighash_per_input() {
        let key = compressed(&signing_key());
        let utxos = [own_utxo(&key, "1", 30_000), own_utxo(&key, "2", 30_000)];
        let unsigned = build(&utxos, 50_000, &key).unwrap();
        let hashes = sighashes(&unsigned).unwrap();
        assert_eq!(hashes.len(), 2);
        assert_ne!(hashes[0], hashes[1]);
    }

    #[test]
    fn attached_witness_verifies() {
        let signer = signing_key();
        let key = compressed(&signer);
        let unsigned = build(&[own_utxo(&key, "f", 100_000)], 50_000, &key).unwrap();
        let hashes = sighashes(&unsigned).unwrap();

        let sig: k256::ecdsa::Signature = signer.sign_prehash(&hashes[0]).unwrap();
        let bytes = sig.to_bytes();
        let r: [u8; 32] = bytes[..32].try_into().unwrap();
        let s: [u8; 32] = bytes[32..].try_into().unwrap();

        let signed = attach_signatures(&unsigned, &[(r, s)]).unwrap();
        let witness = &signed.input[0].witness;
        assert_eq!(witness.len(), 2);

        let der_with_type = witness.nth(0).unwrap();
        assert_eq!(*der_with_type.last().unwrap(), 0x01);
        let der = &der_with_type[..der_with_type.len() - 1];

        let secp = Secp256k1::verification_only();
        let message = Message::from_digest(hashes[0]);
        let signature = ecdsa::Signature::from_der(der).unwrap();
        let public_key = SecpPublicKey::from_slice(&key).unwrap();
        secp.verify_ecdsa(&message, &signature, &public_key).unwrap();
        assert_eq!(witness.nth(1).unwrap(), key.as_slice());
    }

    #[test]
    fn high_s_is_normalized_in_witness() {
        let key = compressed(&signing_key());
        let unsigned = build(&[own_utxo(&key, "9", 100_000)], 50_000, &key).unwrap();
        let r = [0x11u8; 32];
        let s: [u8; 32] =
            hex::decode("fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364140")
                .unwrap()
                .try_into()
                .unwrap();
        let signed = attach_signatures(&unsigned, &[(r, s)]).unwrap();
        let der_with_type = signed.input[0].witness.nth(0).unwrap();
        let (_, s_out) =
            crypto_utils::der::decode_der(&der_with_type[..der_with_type.len() - 1]).unwrap();
        assert_eq!(s_out[31], 0x01);
        assert!(s_out[..31].iter().all(|&b| b == 0));
    }

    #[test]
    fn signature_count_must_match_inputs() {
        let key = compressed(&signing_key());
        let unsigned = build(&[own_utxo(&key, "8", 100_000)], 50_000, &key).unwrap();
        assert!(attach_signatures(&unsigned, &[]).is_err());
    }

    #[test]
    fn unsigned_transaction_serde_roundtrip() {
        let key = compressed(&signing_key());
        let unsigned = build(&[own_utxo(&key, "7", 100_000)], 50_000, &key).unwrap();
        let json = serde_json::to_string(&unsigned).unwrap();
        let restored: UnsignedBtcTx = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, unsigned);
        assert_eq!(sighashes(&restored).unwrap(), sighashes(&unsigned).unwrap());
    }
}
