//! Canonical binary codec for the XRPL transaction fields this crate
//! produces.
//!
//! Each field is written as a field header (type code and field code
//! packed into one to three bytes) followed by its value. Fields are
//! emitted in ascending `(type code, field code)` order regardless of
//! their order in the JSON object. Fields outside [`FIELDS`] are
//! rejected rather than silently dropped, since a dropped field would
//! change the signing hash.
//!
//! | type      | code | value                                        |
//! |-----------|------|----------------------------------------------|
//! | UInt16    | 1    | big-endian u16                               |
//! | UInt32    | 2    | big-endian u32                               |
//! | Hash256   | 5    | 32 raw bytes                                 |
//! | Amount    | 6    | XRP drops: `0x40 << 56 | drops`, big-endian |
//! | Blob      | 7    | VL length prefix, bytes                      |
//! | AccountID | 8    | VL length prefix (20), account id            |

use serde_json::{Map, Value};

use crate::address::address_to_account_id;
use crate::error::XrpError;

const MAX_DROPS: u64 = 100_000_000_000_000_000;
const POSITIVE_NATIVE_AMOUNT: u64 = 0x4000_0000_0000_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FieldType {
    UInt16 = 1,
    UInt32 = 2,
    Hash256 = 5,
    Amount = 6,
    Blob = 7,
    AccountId = 8,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub name: &'static str,
    pub field_type: FieldType,
    pub nth: u8,
    /// Part of the data a signature covers.
    pub signing: bool,
}

const fn field(name: &'static str, field_type: FieldType, nth: u8) -> FieldDef {
    FieldDef {
        name,
        field_type,
        nth,
        signing: true,
    }
}

pub const FIELDS: &[FieldDef] = &[
    field("TransactionType", FieldType::UInt16, 2),
    field("NetworkID", FieldType::UInt32, 1),
    field("Flags", FieldType::UInt32, 2),
    field("SourceTag", FieldType::UInt32, 3),
    field("Sequence", FieldType::UInt32, 4),
    field("DestinationTag", FieldType::UInt32, 14),
    field("LastLedgerSequence", FieldType::UInt32, 27),
    field("SetFlag", FieldType::UInt32, 33),
    field("ClearFlag", FieldType::UInt32, 34),
    field("TicketSequence", FieldType::UInt32, 41),
    field("AccountTxnID", FieldType::Hash256, 9),
    field("InvoiceID", FieldType::Hash256, 17),
    field("Amount", FieldType::Amount, 1),
    field("Fee", FieldType::Amount, 8),
    field("SendMax", FieldType::Amount, 9),
    field("DeliverMin", FieldType::Amount, 10),
    field("SigningPubKey", FieldType::Blob, 3),
    FieldDef {
        name: "TxnSignature",
        field_type: FieldType::Blob,
        nth: 4,
        signing: false,
    },
    field("Account", FieldType::AccountId, 1),
    field("Destination", FieldType::AccountId, 3),
    field("RegularKey", FieldType::AccountId, 8),
];

const TRANSACTION_TYPES: &[(&str, u16)] = &[
    ("Payment", 0),
    ("AccountSet", 3),
    ("SetRegularKey", 5),
    ("AccountDelete", 21),
];

pub fn field_def(name: &str) -> Option<&'static FieldDef> {
    FIELDS.iter().find(|f| f.name == name)
}

pub fn transaction_type_code(name: &str) -> Option<u16> {
    TRANSACTION_TYPES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, code)| *code)
}

fn field_header(field_type: FieldType, nth: u8) -> Vec<u8> {
    let type_code = field_type as u8;
    match (type_code < 16, nth < 16) {
        (true, true) => vec![(type_code << 4) | nth],
        (true, false) => vec![type_code << 4, nth],
        (false, true) => vec![nth, type_code],
        (false, false) => vec![0, type_code, nth],
    }
}

/// Variable-length prefix for Blob and AccountID values.
pub fn encode_vl_length(len: usize) -> Result<Vec<u8>, XrpError> {
    match len {
        0..=192 => Ok(vec![len as u8]),
        193..=12_480 => {
            let n = len - 193;
            Ok(vec![193 + (n >> 8) as u8, (n & 0xff) as u8])
        }
        12_481..=918_744 => {
            let n = len - 12_481;
            Ok(vec![
                241 + (n >> 16) as u8,
                ((n >> 8) & 0xff) as u8,
                (n & 0xff) as u8,
            ])
        }
        _ => Err(XrpError::Encoding(format!("blob of {len} bytes is too long"))),
    }
}

fn as_u32(def: &FieldDef, value: &Value) -> Result<u32, XrpError> {
    value
        .as_u64()
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| XrpError::field(def.name, format!("expected a u32, got {value}")))
}

fn as_hex(def: &FieldDef, value: &Value) -> Result<Vec<u8>, XrpError> {
    let text = value
        .as_str()
        .ok_or_else(|| XrpError::field(def.name, "expected a hex string"))?;
    hex::decode(text).map_err(|e| XrpError::field(def.name, e.to_string()))
}

fn encode_value(def: &FieldDef, value: &Value, out: &mut Vec<u8>) -> Result<(), XrpError> {
    match def.field_type {
        FieldType::UInt16 => {
            let code = match value {
                Value::String(name) if def.name == "TransactionType" => transaction_type_code(name)
                    .ok_or_else(|| XrpError::field(def.name, format!("unsupported type {name}")))?,
                other => other
                    .as_u64()
                    .and_then(|v| u16::try_from(v).ok())
                    .ok_or_else(|| XrpError::field(def.name, format!("expected a u16, got {other}")))?,
            };
            out.extend_from_slice(&code.to_be_bytes());
        }
        FieldType::UInt32 => out.extend_from_slice(&as_u32(def, value)?.to_be_bytes()),
        FieldType::Hash256 => {
            let bytes = as_hex(def, value)?;
            if bytes.len() != 32 {
                return Err(XrpError::field(def.name, "expected 32 bytes"));
            }
            out.extend_from_slice(&bytes);
        }
        FieldType::Amount => {
            let drops: u64 = match value {
                Value::String(text) => text
                    .parse()
                    .map_err(|_| XrpError::field(def.name, format!("{text} is not a drop amount")))?,
                Value::Object(_) => {
                    return Err(XrpError::field(def.name, "issued currency amounts are not supported"))
                }
                other => return Err(XrpError::field(def.name, format!("expected drops, got {other}"))),
            };
            if drops > MAX_DROPS {
                return Err(XrpError::field(def.name, "amount exceeds the XRP supply"));
            }
            out.extend_from_slice(&(POSITIVE_NATIVE_AMOUNT | drops).to_be_bytes());
        }
        FieldType::Blob => {
            let bytes = as_hex(def, value)?;
            out.extend_from_slice(&encode_vl_length(bytes.len())?);
            out.extend_from_slice(&bytes);
        }
        FieldType::AccountId => {
            let address = value
                .as_str()
                .ok_or_else(|| XrpError::field(def.name, "expected a classic address"))?;
            out.extend_from_slice(&encode_vl_length(20)?);
            out.extend_from_slice(&address_to_account_id(address)?);
        }
    }
    Ok(())
}

/// Serializes a transaction JSON object. With `signing_only` set,
/// fields a signature does not cover are left out.
pub fn encode_transaction(fields: &Map<String, Value>, signing_only: bool) -> Result<Vec<u8>, XrpError> {
    let mut defs = Vec::with_capacity(fields.len());
    for (name, value) in fields {
        let def = field_def(name).ok_or_else(|| XrpError::UnknownField(name.clone()))?;
        if signing_only && !def.signing {
            continue;
        }
        defs.push((def, value));
    }
    defs.sort_by_key(|(def, _)| (def.field_type, def.nth));

    let mut out = Vec::new();
    for (def, value) in defs {
        out.extend_from_slice(&field_header(def.field_type, def.nth));
        encode_value(def, value, &mut out)?;
    }
    Ok(out)
}
