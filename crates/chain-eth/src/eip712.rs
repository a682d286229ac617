//! EIP-712 typed structured data hashing.
//!
//! `signing_hash = keccak256(0x19 0x01 || domainSeparator || hashStruct(message))`
//! with `hashStruct(s) = keccak256(typeHash(s) || encodeData(s))`.
//! Nested structs, fixed and dynamic arrays, `bytes`/`string`, `bytesN`,
//! `uintN`/`intN`, `bool` and `address` are supported.

use std::collections::{BTreeMap, BTreeSet};

use alloy_primitives::U256;
use crypto_utils::hash::keccak256;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::address::parse_address;
use crate::error::EthError;

const DOMAIN_TYPE: &str = "EIP712Domain";

/// Domain fields in the order EIP-712 lists them.
const DOMAIN_FIELDS: [(&str, &str); 5] = [
    ("name", "string"),
    ("version", "string"),
    ("chainId", "uint256"),
    ("verifyingContract", "address"),
    ("salt", "bytes32"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedDataField {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// `eth_signTypedData_v4` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedData {
    pub types: BTreeMap<String, Vec<TypedDataField>>,
    pub primary_type: String,
    pub domain: Map<String, Value>,
    pub message: Value,
}

impl TypedData {
    pub fn from_json(json: &str) -> Result<Self, EthError> {
        serde_json::from_str(json).map_err(|e| EthError::TypedData(format!("invalid json: {e}")))
    }

    pub fn domain_separator(&self) -> Result<[u8; 32], EthError> {
        let mut types = self.types.clone();
        types
            .entry(DOMAIN_TYPE.to_string())
            .or_insert_with(|| self.inferred_domain_fields());
        Encoder { types: &types }.hash_struct(DOMAIN_TYPE, &Value::Object(self.domain.clone()))
    }

    pub fn struct_hash(&self) -> Result<[u8; 32], EthError> {
        Encoder { types: &self.types }.hash_struct(&self.primary_type, &self.message)
    }

    /// The digest a signer signs.
    pub fn signing_hash(&self) -> Result<[u8; 32], EthError> {
        let mut preimage = Vec::with_capacity(66);
        preimage.extend_from_slice(&[0x19, 0x01]);
        preimage.extend_from_slice(&self.domain_separator()?);
        preimage.extend_from_slice(&self.struct_hash()?);
        Ok(keccak256(&preimage))
    }

    fn inferred_domain_fields(&self) -> Vec<TypedDataField> {
        DOMAIN_FIELDS
            .iter()
            .filter(|(name, _)| self.domain.contains_key(*name))
            .map(|(name, type_name)| TypedDataField {
                name: name.to_string(),
                type_name: type_name.to_string(),
            })
            .collect()
    }
}

struct Encoder<'a> {
    types: &'a BTreeMap<String, Vec<TypedDataField>>,
}

impl Encoder<'_> {
    fn fields(&self, type_name: &str) -> Result<&[TypedDataField], EthError> {
        self.types
            .get(type_name)
            .map(Vec::as_slice)
            .ok_or_else(|| EthError::TypedData(format!("unknown type {type_name}")))
    }

    /// `Primary(type name,...)` followed by every referenced struct type,
    /// sorted by name.
    fn encode_type(&self, primary: &str) -> Result<String, EthError> {
        let mut deps = BTreeSet::new();
        self.collect_dependencies(primary, &mut deps);
        deps.remove(primary);

        let mut out = self.format_type(primary)?;
        for dep in &deps {
            out.push_str(&self.format_type(dep)?);
        }
        Ok(out)
    }

    fn format_type(&self, name: &str) -> Result<String, EthError> {
        let members: Vec<String> = self
            .fields(name)?
            .iter()
            .map(|f| format!("{} {}", f.type_name, f.name))
            .collect();
        Ok(format!("{name}({})", members.join(",")))
    }

    fn collect_dependencies(&self, type_name: &str, found: &mut BTreeSet<String>) {
        let base = base_type(type_name);
        if found.contains(base) {
            return;
        }
        let Some(fields) = self.types.get(base) else {
            return;
        };
        found.insert(base.to_string());
        for field in fields {
            self.collect_dependencies(&field.type_name, found);
        }
    }

    fn type_hash(&self, type_name: &str) -> Result<[u8; 32], EthError> {
        Ok(keccak256(self.encode_type(type_name)?.as_bytes()))
    }

    fn hash_struct(&self, type_name: &str, value: &Value) -> Result<[u8; 32], EthError> {
        let object = value
            .as_object()
            .ok_or_else(|| EthError::TypedData(format!("{type_name} value must be an object")))?;

        let mut encoded = Vec::with_capacity(32 * (1 + self.fields(type_name)?.len()));
        encoded.extend_from_slice(&self.type_hash(type_name)?);
        for field in self.fields(type_name)? {
            let member = object.get(&field.name).unwrap_or(&Value::Null);
            let word = self
                .encode_field(&field.type_name, member)
                .map_err(|e| EthError::TypedData(format!("{type_name}.{}: {e}", field.name)))?;
            encoded.extend_from_slice(&word);
        }
        Ok(keccak256(&encoded))
    }

    fn encode_field(&self, type_name: &str, value: &Value) -> Result<[u8; 32], EthError> {
        if let Some(element) = array_element_type(type_name) {
            let items = value
                .as_array()
                .ok_or_else(|| EthError::TypedData(format!("{type_name} expects an array")))?;
            let mut concatenated = Vec::with_capacity(items.len() * 32);
            for item in items {
                concatenated.extend_from_slice(&self.encode_field(element, item)?);
            }
            return Ok(keccak256(&concatenated));
        }

        if self.types.contains_key(type_name) {
            if value.is_null() {
                return Ok([0u8; 32]);
            }
            return self.hash_struct(type_name, value);
        }

        encode_atomic(type_name, value)
    }
}

fn base_type(type_name: &str) -> &str {
    type_name.split('[').next().unwrap_or(type_name)
}

fn array_element_type(type_name: &str) -> Option<&str> {
    if !type_name.ends_with(']') {
        return None;
    }
    type_name.rfind('[').map(|idx| &type_name[..idx])
}

fn encode_atomic(type_name: &str, value: &Value) -> Result<[u8; 32], EthError> {
    if value.is_null() {
        return Err(EthError::TypedData(format!("missing {type_name} value")));
    }
    match type_name {
        "string" => {
            let text = value
                .as_str()
                .ok_or_else(|| EthError::TypedData("string expected".into()))?;
            Ok(keccak256(text.as_bytes()))
        }
        "bytes" => Ok(keccak256(&decode_hex_value(value)?)),
        "bool" => {
            let flag = match value {
                Value::Bool(b) => *b,
                Value::String(s) => s == "true",
                _ => return Err(EthError::TypedData("bool expected".into())),
            };
            Ok(U256::from(flag as u8).to_be_bytes::<32>())
        }
        "address" => {
            let text = value
                .as_str()
                .ok_or_else(|| EthError::TypedData("address string expected".into()))?;
            let mut word = [0u8; 32];
            word[12..].copy_from_slice(&parse_address(text)?);
            Ok(word)
        }
        t if t.starts_with("uint") => Ok(parse_integer(value)?.to_be_bytes::<32>()),
        t if t.starts_with("int") => Ok(parse_signed(value)?.to_be_bytes::<32>()),
        t if t.starts_with("bytes") => {
            let width: usize = t[5..]
                .parse()
                .map_err(|_| EthError::TypedData(format!("unknown type {t}")))?;
            let bytes = decode_hex_value(value)?;
            if width == 0 || width > 32 || bytes.len() > width {
                return Err(EthError::TypedData(format!(
                    "{t} cannot hold {} bytes",
                    bytes.len()
                )));
            }
            let mut word = [0u8; 32];
            word[..bytes.len()].copy_from_slice(&bytes);
            Ok(word)
        }
        other => Err(EthError::TypedData(format!("unknown type {other}"))),
    }
}

fn decode_hex_value(value: &Value) -> Result<Vec<u8>, EthError> {
    let text = value
        .as_str()
        .ok_or_else(|| EthError::TypedData("hex string expected".into()))?;
    hex::decode(text.strip_prefix("0x").unwrap_or(text))
        .map_err(|e| EthError::TypedData(format!("invalid hex: {e}")))
}

fn parse_integer(value: &Value) -> Result<U256, EthError> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(U256::from)
            .ok_or_else(|| EthError::TypedData(format!("unsigned integer expected, got {n}"))),
        Value::String(text) => {
            let parsed = match text.strip_prefix("0x") {
                Some(digits) => U256::from_str_radix(digits, 16),
                None => U256::from_str_radix(text, 10),
            };
            parsed.map_err(|e| EthError::TypedData(format!("bad integer {text:?}: {e}")))
        }
        _ => Err(EthError::TypedData("integer expected".into())),
    }
}

/// Two's-complement 256-bit encoding of a signed value.
fn parse_signed(value: &Value) -> Result<U256, EthError> {
    let (negative, magnitude) = match value {
        Value::Number(n) => match n.as_i64() {
            Some(v) if v < 0 => (true, U256::from(v.unsigned_abs())),
            Some(v) => (false, U256::from(v as u64)),
            None => (false, parse_integer(value)?),
        },
        Value::String(text) => match text.strip_prefix('-') {
            Some(rest) => (true, parse_integer(&Value::String(rest.to_string()))?),
            None => (false, parse_integer(value)?),
        },
        _ => return Err(EthError::TypedData("integer expected".into())),
    };
    Ok(if negative {
        U256::ZERO.wrapping_sub(magnitude)
    } else {
        magnitude
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAIL: &str = r#"{
        "types": {
            "EIP712Domain": [
                {"name": "name", "type": "string"},
                {"name": "version", "type": "string"},
                {"name": "chainId", "type": "uint256"},
                {"name": "verifyingContract", "type": "address"}
            ],
            "Person": [
                {"name": "name", "type": "string"},
                {"name": "wallet", "type": "address"}
            ],
            "Mail": [
                {"name": "from", "type": "Person"},
                {"name": "to", "type": "Person"},
                {"name": "contents", "type": "string"}
            ]
        },
        "primaryType": "Mail",
        "domain": {
            "name": "Ether Mail",
            "version": "1",
            "chainId": 1,
            "verifyingContract": "0xCcCCccccCCCCcCCCCCCcCcCccCcCCCcCcccccccC"
        },
        "message": {
            "from": {"name": "Cow", "wallet": "0xCD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826"},
            "to": {"name": "Bob", "wallet": "0xbBbBBBBbbBBBbbbBbbBbbbbBBbBbbbbBbBbbBBbB"},
            "contents": "Hello, Bob!"
        }
    }"#;

    #[test]
    fn mail_encode_type() {
        let data = TypedData::from_json(MAIL).unwrap();
        let encoder = Encoder { types: &data.types };
        assert_eq!(
            encoder.encode_type("Mail").unwrap(),
            "Mail(Person from,Person to,string contents)Person(string name,address wallet)"
        );
        assert_eq!(
            hex::encode(encoder.type_hash("Mail").unwrap()),
            "a0cedeb2dc280ba39b857546d74f5549c3a1d7bdc2dd96bf881f76108e23dac2"
        );
    }

    #[test]
    fn mail_known_hashes() {
        let data = TypedData::from_json(MAIL).unwrap();
        assert_eq!(
            hex::encode(data.domain_separator().unwrap()),
            "f2cee375fa42b42143804025fc449deafd50cc031ca257e0b194a650a912090f"
        );
        assert_eq!(
            hex::encode(data.struct_hash().unwrap()),
            "c52c0ee5d84264471806290a3f2c4cecfc5490626bf912d01f240d7a274b371e"
        );
        assert_eq!(
            hex::encode(data.signing_hash().unwrap()),
            "be609aee343fb3c4b28e1df9e632fca64fcfaede20f02e86244efddf30957bd2"
        );
    }

    #[test]
    fn domain_type_inferred_when_absent() {
        let mut data = TypedData::from_json(MAIL).unwrap();
        data.types.remove("EIP712Domain");
        assert_eq!(
            hex::encode(data.domain_separator().unwrap()),
            "f2cee375fa42b42143804025fc449deafd50cc031ca257e0b194a650a912090f"
        );
    }

    #[test]
    fn dependencies_sorted_by_name() {
        let mut types = BTreeMap::new();
        let field = |name: &str, t: &str| TypedDataField {
            name: name.into(),
            type_name: t.into(),
        };
        types.insert("Zed".to_string(), vec![field("b", "Bravo[]"), field("a", "Alpha")]);
        types.insert("Alpha".to_string(), vec![field("x", "uint8")]);
        types.insert("Bravo".to_string(), vec![field("y", "bool")]);
        let encoder = Encoder { types: &types };
        assert_eq!(
            encoder.encode_type("Zed").unwrap(),
            "Zed(Bravo[] b,Alpha a)Alpha(uint8 x)Bravo(bool y)"
        );
    }

    #[test]
    fn arrays_hash_concatenated_elements() {
        let types = BTreeMap::new();
        let encoder = Encoder { types: &types };
        let word = encoder
            .encode_field("uint256[]", &serde_json::json!([1, 2]))
            .unwrap();
        let mut expected = Vec::new();
        expected.extend_from_slice(&U256::from(1u8).to_be_bytes::<32>());
        expected.extend_from_slice(&U256::from(2u8).to_be_bytes::<32>());
        assert_eq!(word, keccak256(&expected));
    }

    #[test]
    fn negative_int_is_twos_complement() {
        assert_eq!(encode_atomic("int256", &serde_json::json!(-1)).unwrap(), [0xff; 32]);
        assert_eq!(encode_atomic("int64", &serde_json::json!("-1")).unwrap(), [0xff; 32]);
    }

    #[test]
    fn fixed_bytes_right_padded() {
        let word = encode_atomic("bytes4", &serde_json::json!("0xdeadbeef")).unwrap();
        assert_eq!(&word[..4], &[0xde, 0xad, 0xbe, 0xef]);
        assert!(word[4..].iter().all(|&b| b == 0));
        assert!(encode_atomic("bytes2", &serde_json::json!("0xdeadbeef")).is_err());
    }

    #[test]
    fn unknown_type_rejected() {
        let mut data = TypedData::from_json(MAIL).unwrap();
        data.primary_type = "Parcel".into();
        let err = data.struct_hash().unwrap_err();
        assert!(err.to_string().contains("unknown type Parcel"));
    }

    #[test]
    fn missing_atomic_value_rejected() {
        let mut data = TypedData::from_json(MAIL).unwrap();
        data.message.as_object_mut().unwrap().remove("contents");
        assert!(data.struct_hash().is_err());
    }
}
