//! Static-type ABI encoding, just enough for `abi.encode(...)` over words.

use alloy_primitives::U256;

/// A single statically-sized ABI value.
#[derive(Debug, Clone, Copy)]
pub enum AbiParam {
    /// A 20-byte address, left-padded to 32 bytes.
    Address([u8; 20]),
    /// A 256-bit unsigned integer.
    Uint(U256),
    /// A `bytes32` value (typically a keccak digest of a dynamic field).
    Word([u8; 32]),
}

impl From<u64> for AbiParam {
    fn from(value: u64) -> Self {
        AbiParam::Uint(U256::from(value))
    }
}

impl From<u128> for AbiParam {
    fn from(value: u128) -> Self {
        AbiParam::Uint(U256::from(value))
    }
}

/// `abi.encode(params...)` for static types: one 32-byte word per value.
pub fn encode_params(params: &[AbiParam]) -> Vec<u8> {
    let mut data = Vec::with_capacity(params.len() * 32);
    for param in params {
        data.extend_from_slice(&encode_param(param));
    }
    data
}

fn encode_param(param: &AbiParam) -> [u8; 32] {
    match param {
        AbiParam::Address(addr) => {
            let mut word = [0u8; 32];
            word[12..].copy_from_slice(addr);
            word
        }
        AbiParam::Uint(value) => value.to_be_bytes::<32>(),
        AbiParam::Word(word) => *word,
    }
}
