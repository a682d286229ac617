use serde::{Deserialize, Serialize};

use crate::error::SuiError;

/// A `0x2::coin::Coin<0x2::sui::SUI>` object owned by the sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiCoin {
    pub coin_object_id: String,
    pub balance: u64,
}

/// Largest-first selection of coins covering `amount + gas_budget`.
/// `unsafe_paySui` merges the inputs and pays gas from the first one.
pub fn select_coins(coins: &[SuiCoin], amount: u64, gas_budget: u64) -> Result<Vec<SuiCoin>, SuiError> {
    let required = amount as u128 + gas_budget as u128;
    let mut sorted = coins.to_vec();
    sorted.sort_by(|a, b| b.balance.cmp(&a.balance));

    let mut selected = Vec::new();
    let mut total: u128 = 0;
    for coin in sorted {
        if total >= required {
            break;
        }
        total += coin.balance as u128;
        selected.push(coin);
    }

    if total < required {
        return Err(SuiError::InsufficientFunds {
            available: total,
            required,
        });
    }
    Ok(selected)
}
