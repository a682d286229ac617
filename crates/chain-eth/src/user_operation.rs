//! ERC-4337 user operations and their entry-point hashes.

use alloy_primitives::{Address, Bytes, U256};
use crypto_utils::hash::keccak256;
use serde::{Deserialize, Serialize};

use crate::abi::{encode_params, AbiParam};
use crate::error::EthError;

pub const ENTRY_POINT_V06: &str = "0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789";
pub const ENTRY_POINT_V07: &str = "0x0000000071727De22E5E9d8BAf0edAc6f37da032";

/// Entry point v0.6 user operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationV6 {
    pub sender: Address,
    pub nonce: U256,
    pub init_code: Bytes,
    pub call_data: Bytes,
    pub call_gas_limit: U256,
    pub verification_gas_limit: U256,
    pub pre_verification_gas: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
    pub paymaster_and_data: Bytes,
    #[serde(default)]
    pub signature: Bytes,
}

/// Entry point v0.7 user operation in its unpacked RPC form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationV7 {
    pub sender: Address,
    pub nonce: U256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory_data: Option<Bytes>,
    pub call_data: Bytes,
    pub call_gas_limit: U256,
    pub verification_gas_limit: U256,
    pub pre_verification_gas: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_verification_gas_limit: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_post_op_gas_limit: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_data: Option<Bytes>,
    #[serde(default)]
    pub signature: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserOperation {
    V6(UserOperationV6),
    V7(UserOperationV7),
}

impl UserOperation {
    /// The canonical entry point for this operation's version.
    pub fn default_entry_point(&self) -> Address {
        let address = match self {
            UserOperation::V6(_) => ENTRY_POINT_V06,
            UserOperation::V7(_) => ENTRY_POINT_V07,
        };
        address.parse().unwrap_or_default()
    }

    /// `keccak256(abi.encode(keccak256(pack(op)), entryPoint, chainId))`.
    pub fn hash(&self, entry_point: Address, chain_id: u64) -> Result<[u8; 32], EthError> {
        let packed = match self {
            UserOperation::V6(op) => op.pack(),
            UserOperation::V7(op) => op.pack()?,
        };
        Ok(keccak256(&encode_params(&[
            AbiParam::Word(keccak256(&packed)),
            AbiParam::Address(entry_point.0 .0),
            AbiParam::from(chain_id),
        ])))
    }
}

impl UserOperationV6 {
    fn pack(&self) -> Vec<u8> {
        encode_params(&[
            AbiParam::Address(self.sender.0 .0),
            AbiParam::Uint(self.nonce),
            AbiParam::Word(keccak256(&self.init_code)),
            AbiParam::Word(keccak256(&self.call_data)),
            AbiParam::Uint(self.call_gas_limit),
            AbiParam::Uint(self.verification_gas_limit),
            AbiParam::Uint(self.pre_verification_gas),
            AbiParam::Uint(self.max_fee_per_gas),
            AbiParam::Uint(self.max_priority_fee_per_gas),
            AbiParam::Word(keccak256(&self.paymaster_and_data)),
        ])
    }
}

impl UserOperationV7 {
    pub fn init_code(&self) -> Vec<u8> {
        match self.factory {
            Some(factory) => {
                let mut code = factory.to_vec();
                if let Some(data) = &self.factory_data {
                    code.extend_from_slice(data);
                }
                code
            }
            None => Vec::new(),
        }
    }

    pub fn paymaster_and_data(&self) -> Result<Vec<u8>, EthError> {
        let Some(paymaster) = self.paymaster else {
            return Ok(Vec::new());
        };
        let verification = self.paymaster_verification_gas_limit.unwrap_or_default();
        let post_op = self.paymaster_post_op_gas_limit.unwrap_or_default();

        let mut out = paymaster.to_vec();
        out.extend_from_slice(&to_u128(verification, "paymasterVerificationGasLimit")?.to_be_bytes());
        out.extend_from_slice(&to_u128(post_op, "paymasterPostOpGasLimit")?.to_be_bytes());
        if let Some(data) = &self.paymaster_data {
            out.extend_from_slice(data);
        }
        Ok(out)
    }

    fn pack(&self) -> Result<Vec<u8>, EthError> {
        let account_gas_limits = pack_u128_pair(
            to_u128(self.verification_gas_limit, "verificationGasLimit")?,
            to_u128(self.call_gas_limit, "callGasLimit")?,
        );
        let gas_fees = pack_u128_pair(
            to_u128(self.max_priority_fee_per_gas, "maxPriorityFeePerGas")?,
            to_u128(self.max_fee_per_gas, "maxFeePerGas")?,
        );

        Ok(encode_params(&[
            AbiParam::Address(self.sender.0 .0),
            AbiParam::Uint(self.nonce),
            AbiParam::Word(keccak256(&self.init_code())),
            AbiParam::Word(keccak256(&self.call_data)),
            AbiParam::Word(account_gas_limits),
            AbiParam::Uint(self.pre_verification_gas),
            AbiParam::Word(gas_fees),
            AbiParam::Word(keccak256(&self.paymaster_and_data()?)),
        ]))
    }
}

fn pack_u128_pair(high: u128, low: u128) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[..16].copy_from_slice(&high.to_be_bytes());
    word[16..].copy_from_slice(&low.to_be_bytes());
    word
}

fn to_u128(value: U256, field: &str) -> Result<u128, EthError> {
    u128::try_from(value)
        .map_err(|_| EthError::InvalidUserOperation(format!("{field} does not fit in 128 bits")))
}
