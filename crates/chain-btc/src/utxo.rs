use serde::{Deserialize, Serialize};

use crate::error::BtcError;
use crate::transaction::estimate_fee;

/// A spendable output owned by the sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    /// Display-order (big-endian) hex txid.
    pub txid: String,
    pub vout: u32,
    pub amount_sat: u64,
    /// Locking script of the output.
    pub script_pubkey: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct UtxoSelection {
    pub selected: Vec<Utxo>,
    pub total_sat: u64,
    /// Fee for the selected inputs with a recipient and a change output.
    pub fee_sat: u64,
}

/// Largest-first selection: adds outputs in descending value until
/// `target + fee(inputs, 2 outputs)` is covered, so no more inputs are
/// taken than needed.
pub fn select_utxos(
    utxos: &[Utxo],
    target_sat: u64,
    fee_rate_sat_vbyte: u64,
) -> Result<UtxoSelection, BtcError> {
    if utxos.is_empty() {
        return Err(BtcError::TransactionBuildError("no UTXOs available".into()));
    }

    let mut sorted: Vec<&Utxo> = utxos.iter().collect();
    sorted.sort_by(|a, b| b.amount_sat.cmp(&a.amount_sat));

    let mut selected = Vec::new();
    let mut total_sat = 0u64;
    let mut required = target_sat;

    for utxo in sorted {
        selected.push(utxo.clone());
        total_sat = total_sat.saturating_add(utxo.amount_sat);
        let fee_sat = estimate_fee(selected.len(), 2, fee_rate_sat_vbyte)?;
        required = target_sat.saturating_add(fee_sat);
        if total_sat >= required {
            return Ok(UtxoSelection {
                selected,
                total_sat,
                fee_sat,
            });
        }
    }

    Err(BtcError::InsufficientFunds {
        available: total_sat,
        required,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_utxo(txid: &str, amount_sat: u64) -> Utxo {
        Utxo {
            txid: txid.to_string(),
            vout: 0,
            amount_sat,
            script_pubkey: vec![0xaa; 22],
        }
    }

    #[test]
    fn single_large_utxo_suffices() {
        let utxos = vec![make_utxo("a", 100_000), make_utxo("b", 50_000)];
        let selection = select_utxos(&utxos, 40_000, 1).unwrap();
        assert_eq!(selection.selected.len(), 1);
        assert_eq!(selection.total_sat, 100_000);
        assert_eq!(selection.fee_sat, 141);
    }

    #[test]
    fn largest_first_ordering() {
        let utxos = vec![
            make_utxo("small", 1_000),
            make_utxo("large", 100_000),
            make_utxo("medium", 50_000),
        ];
        let selection = select_utxos(&utxos, 120_000, 1).unwrap();
        let picked: Vec<&str> = selection.selected.iter().map(|u| u.txid.as_str()).collect();
        assert_eq!(picked, ["large", "medium"]);
    }

    #[test]
    fn never_takes_more_than_needed() {
        let utxos = vec![make_utxo("a", 30_000), make_utxo("b", 30_000), make_utxo("c", 30_000)];
        let selection = select_utxos(&utxos, 55_000, 1).unwrap();
        assert_eq!(selection.selected.len(), 2);
    }

    #[test]
    fn insufficient_funds_reports_shortfall() {
        let utxos = vec![make_utxo("a", 1_000)];
        let err = select_utxos(&utxos, 500_000, 1).unwrap_err();
        match err {
            BtcError::InsufficientFunds {
                available,
                required,
            } => {
                assert_eq!(available, 1_000);
                assert_eq!(required, 500_141);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn empty_set_rejected() {
        assert!(select_utxos(&[], 1_000, 1).is_err());
    }

    #[test]
    fn overflowing_fee_rate_is_an_error() {
        let utxos = vec![make_utxo("a", 100_000)];
        let err = select_utxos(&utxos, 50_000, u64::MAX / 10).unwrap_err();
        assert!(matches!(err, BtcError::TransactionBuildError(_)));
    }

    #[test]
    fn high_fee_rate_pulls_in_more_inputs() {
        let utxos = vec![make_utxo("a", 50_000), make_utxo("b", 50_000)];
        assert_eq!(select_utxos(&utxos, 40_000, 1).unwrap().selected.len(), 1);
        assert_eq!(select_utxos(&utxos, 40_000, 100).unwrap().selected.len(), 2);
    }
}
