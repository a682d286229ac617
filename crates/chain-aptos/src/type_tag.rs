//! Move type tags, parsed from their canonical string form
//! (`0x1::aptos_coin::AptosCoin`, `vector<u8>`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::address::AccountAddress;
use crate::bcs::BcsWriter;
use crate::error::AptosError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeTag {
    Bool,
    U8,
    U16,
    U32,
    U64,
    U128,
    U256,
    Address,
    Signer,
    Vector(Box<TypeTag>),
    Struct(Box<StructTag>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructTag {
    pub address: AccountAddress,
    pub module: String,
    pub name: String,
    pub type_args: Vec<TypeTag>,
}

impl TypeTag {
    /// `0x1::aptos_coin::AptosCoin`
    pub fn aptos_coin() -> Self {
        Self::Struct(Box::new(StructTag {
            address: AccountAddress::ONE,
            module: "aptos_coin".into(),
            name: "AptosCoin".into(),
            type_args: vec![],
        }))
    }

    pub fn write_bcs(&self, w: &mut BcsWriter) {
        match self {
            Self::Bool => {
                w.variant(0);
            }
            Self::U8 => {
                w.variant(1);
            }
            Self::U64 => {
                w.variant(2);
            }
            Self::U128 => {
                w.variant(3);
            }
            Self::Address => {
                w.variant(4);
            }
            Self::Signer => {
                w.variant(5);
            }
            Self::Vector(inner) => {
                w.variant(6);
                inner.write_bcs(w);
            }
            Self::Struct(tag) => {
                w.variant(7);
                w.fixed(&tag.address.0).str(&tag.module).str(&tag.name);
                w.seq_len(tag.type_args.len());
                for arg in &tag.type_args {
                    arg.write_bcs(w);
                }
            }
            Self::U16 => {
                w.variant(8);
            }
            Self::U32 => {
                w.variant(9);
            }
            Self::U256 => {
                w.variant(10);
            }
        }
    }
}

fn short_address(address: &AccountAddress) -> String {
    let digits = hex::encode(address.0);
    let trimmed = digits.trim_start_matches('0');
    format!("0x{}", if trimmed.is_empty() { "0" } else { trimmed })
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::U8 => f.write_str("u8"),
            Self::U16 => f.write_str("u16"),
            Self::U32 => f.write_str("u32"),
            Self::U64 => f.write_str("u64"),
            Self::U128 => f.write_str("u128"),
            Self::U256 => f.write_str("u256"),
            Self::Address => f.write_str("address"),
            Self::Signer => f.write_str("signer"),
            Self::Vector(inner) => write!(f, "vector<{inner}>"),
            Self::Struct(tag) => {
                write!(f, "{}::{}::{}", short_address(&tag.address), tag.module, tag.name)?;
                if !tag.type_args.is_empty() {
                    let args: Vec<String> = tag.type_args.iter().map(ToString::to_string).collect();
                    write!(f, "<{}>", args.join(", "))?;
                }
                Ok(())
            }
        }
    }
}

/// Splits on commas that are not nested inside `<...>`.
fn split_top_level(s: &str) -> Result<Vec<&str>, AptosError> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        if depth < 0 {
            return Err(AptosError::InvalidTypeTag(format!("unbalanced '>' in {s}")));
        }
    }
    if depth != 0 {
        return Err(AptosError::InvalidTypeTag(format!("unbalanced '<' in {s}")));
    }
    parts.push(&s[start..]);
    Ok(parts)
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl FromStr for TypeTag {
    type Err = AptosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let primitive = match s {
            "bool" => Some(Self::Bool),
            "u8" => Some(Self::U8),
            "u16" => Some(Self::U16),
            "u32" => Some(Self::U32),
            "u64" => Some(Self::U64),
            "u128" => Some(Self::U128),
            "u256" => Some(Self::U256),
            "address" => Some(Self::Address),
            "signer" => Some(Self::Signer),
            _ => None,
        };
        if let Some(tag) = primitive {
            return Ok(tag);
        }

        let (head, generics) = match s.find('<') {
            Some(open) => {
                let inner = s[open + 1..]
                    .strip_suffix('>')
                    .ok_or_else(|| AptosError::InvalidTypeTag(format!("missing '>' in {s}")))?;
                (&s[..open], Some(inner))
            }
            None => (s, None),
        };

        if head == "vector" {
            let inner = generics
                .ok_or_else(|| AptosError::InvalidTypeTag("vector needs a type argument".into()))?;
            return Ok(Self::Vector(Box::new(inner.parse()?)));
        }

        let segments: Vec<&str> = head.split("::").collect();
        let [address, module, name] = segments.as_slice() else {
            return Err(AptosError::InvalidTypeTag(format!("expected address::module::name, got {s}")));
        };
        if !is_identifier(module) || !is_identifier(name) {
            return Err(AptosError::InvalidTypeTag(format!("bad identifier in {s}")));
        }
        let type_args = match generics {
            Some(inner) => split_top_level(inner)?
                .into_iter()
                .map(str::parse::<TypeTag>)
                .collect::<Result<Vec<_>, _>>()?,
            None => vec![],
        };

        Ok(Self::Struct(Box::new(StructTag {
            address: address
                .parse()
                .map_err(|e| AptosError::InvalidTypeTag(format!("{s}: {e}")))?,
            module: (*module).to_string(),
            name: (*name).to_string(),
            type_args,
        })))
    }
}

impl TryFrom<String> for TypeTag {
    type Error = AptosError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TypeTag> for String {
    fn from(tag: TypeTag) -> Self {
        tag.to_string()
    }
}
