//! Legacy Solana transaction wire format.
//!
//! ```text
//! Transaction:
//!   num_signatures          compact-u16
//!   signatures              64 bytes * num_signatures
//!   message:
//!     num_required_sigs     u8
//!     num_readonly_signed   u8
//!     num_readonly_unsigned u8
//!     num_accounts          compact-u16
//!     account_keys          32 bytes * num_accounts
//!     recent_blockhash      32 bytes
//!     num_instructions      compact-u16
//!     instructions[]        (see below)
//!
//! Instruction:
//!   program_id_index        u8
//!   num_accounts            compact-u16
//!   account_indices         u8 * num_accounts
//!   data_len                compact-u16
//!   data                    u8 * data_len
//! ```
//!
//! The signer signs the serialized message bytes, not a digest of them.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::SolError;

/// The System Program: 32 zero bytes, `11111111111111111111111111111111`.
pub const SYSTEM_PROGRAM_ID: [u8; 32] = [0u8; 32];

/// System Program `Transfer` instruction index (little-endian u32).
const SYSTEM_TRANSFER_IX_INDEX: u32 = 2;

const SIGNATURE_LEN: usize = 64;

// ---------------------------------------------------------------------------
// Compact-u16
// ---------------------------------------------------------------------------

/// Encode a `u16` in Solana's compact-u16 (7 bits per byte, high bit =
/// continuation) format. At most 3 bytes.
pub fn encode_compact_u16(value: u16) -> Vec<u8> {
    let mut val = value as u32;
    let mut out = Vec::with_capacity(3);
    loop {
        let mut byte = (val & 0x7f) as u8;
        val >>= 7;
        if val > 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if val == 0 {
            return out;
        }
    }
}

/// Decode a compact-u16 from the front of `data`.
///
/// Returns `(value, bytes_consumed)`.
pub fn decode_compact_u16(data: &[u8]) -> Result<(u16, usize), SolError> {
    let mut value: u32 = 0;
    for (i, byte) in data.iter().take(3).enumerate() {
        value |= ((byte & 0x7f) as u32) << (7 * i);
        if byte & 0x80 == 0 {
            return u16::try_from(value)
                .map(|v| (v, i + 1))
                .map_err(|_| SolError::SerializationError("compact-u16 value overflow".into()));
        }
    }
    Err(SolError::SerializationError(
        "unexpected end of data while decoding compact-u16".into(),
    ))
}

fn push_len(buf: &mut Vec<u8>, len: usize, what: &str) -> Result<(), SolError> {
    let len = u16::try_from(len)
        .map_err(|_| SolError::SerializationError(format!("too many {what}: {len}")))?;
    buf.extend_from_slice(&encode_compact_u16(len));
    Ok(())
}

/// Cursor over wire bytes.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], SolError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| {
                SolError::SerializationError(format!("truncated: need {n} bytes at offset {}", self.pos))
            })?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, SolError> {
        Ok(self.take(1)?[0])
    }

    fn compact_u16(&mut self) -> Result<usize, SolError> {
        let (value, consumed) = decode_compact_u16(&self.data[self.pos..])?;
        self.pos += consumed;
        Ok(value as usize)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], SolError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn finish(&self) -> Result<(), SolError> {
        if self.pos != self.data.len() {
            return Err(SolError::SerializationError(format!(
                "{} trailing bytes",
                self.data.len() - self.pos
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Instructions
// ---------------------------------------------------------------------------

mod base58_key {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(key: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&bs58::encode(key).into_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        let s = String::deserialize(deserializer)?;
        crate::address::address_to_bytes(&s).map_err(serde::de::Error::custom)
    }
}

mod base64_data {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(s).map_err(serde::de::Error::custom)
    }
}

/// An account reference in an instruction. Keys are Base58 in JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountMeta {
    #[serde(with = "base58_key")]
    pub pubkey: [u8; 32],
    pub is_signer: bool,
    pub is_writable: bool,
}

/// An instruction before compilation. `data` is base64 in JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instruction {
    #[serde(with = "base58_key")]
    pub program_id: [u8; 32],
    pub accounts: Vec<AccountMeta>,
    #[serde(with = "base64_data")]
    pub data: Vec<u8>,
}

impl Instruction {
    /// System Program transfer of `lamports` from `from` to `to`.
    pub fn system_transfer(from: &[u8; 32], to: &[u8; 32], lamports: u64) -> Self {
        let mut data = Vec::with_capacity(12);
        data.extend_from_slice(&SYSTEM_TRANSFER_IX_INDEX.to_le_bytes());
        data.extend_from_slice(&lamports.to_le_bytes());
        Self {
            program_id: SYSTEM_PROGRAM_ID,
            accounts: vec![
                AccountMeta {
                    pubkey: *from,
                    is_signer: true,
                    is_writable: true,
                },
                AccountMeta {
                    pubkey: *to,
                    is_signer: false,
                    is_writable: true,
                },
            ],
            data,
        }
    }
}

/// An instruction whose account references are indices into the
/// message's `account_keys`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    pub program_id_index: u8,
    pub account_indices: Vec<u8>,
    pub data: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    pub num_required_signatures: u8,
    pub num_readonly_signed: u8,
    pub num_readonly_unsigned: u8,
}

/// A compiled legacy message.
///
/// `account_keys` are in canonical order: writable signers (fee payer
/// first), read-only signers, writable non-signers, read-only non-signers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: MessageHeader,
    pub account_keys: Vec<[u8; 32]>,
    pub recent_blockhash: [u8; 32],
    pub instructions: Vec<CompiledInstruction>,
}

impl Message {
    /// Compile `instructions` with `fee_payer` as the first signer.
    pub fn compile(
        instructions: &[Instruction],
        fee_payer: &[u8; 32],
        recent_blockhash: &[u8; 32],
    ) -> Result<Self, SolError> {
        struct Entry {
            pubkey: [u8; 32],
            is_signer: bool,
            is_writable: bool,
        }

        impl Entry {
            fn rank(&self) -> u8 {
                match (self.is_signer, self.is_writable) {
                    (true, true) => 0,
                    (true, false) => 1,
                    (false, true) => 2,
                    (false, false) => 3,
                }
            }
        }

        let mut entries: Vec<Entry> = Vec::new();
        let mut upsert = |pubkey: [u8; 32], is_signer: bool, is_writable: bool| {
            if let Some(entry) = entries.iter_mut().find(|e| e.pubkey == pubkey) {
                entry.is_signer |= is_signer;
                entry.is_writable |= is_writable;
            } else {
                entries.push(Entry {
                    pubkey,
                    is_signer,
                    is_writable,
                });
            }
        };

        upsert(*fee_payer, true, true);
        for ix in instructions {
            for meta in &ix.accounts {
                upsert(meta.pubkey, meta.is_signer, meta.is_writable);
            }
            upsert(ix.program_id, false, false);
        }

        // Stable: the fee payer stays at index 0.
        entries.sort_by_key(Entry::rank);

        if entries.len() > u8::MAX as usize + 1 {
            return Err(SolError::TransactionBuildError(format!(
                "{} accounts exceed the legacy message limit",
                entries.len()
            )));
        }

        let count = |pred: fn(&Entry) -> bool| entries.iter().filter(|e| pred(e)).count() as u8;
        let header = MessageHeader {
            num_required_signatures: count(|e| e.is_signer),
            num_readonly_signed: count(|e| e.is_signer && !e.is_writable),
            num_readonly_unsigned: count(|e| !e.is_signer && !e.is_writable),
        };
        let account_keys: Vec<[u8; 32]> = entries.iter().map(|e| e.pubkey).collect();

        let index_of = |key: &[u8; 32]| -> Result<u8, SolError> {
            account_keys
                .iter()
                .position(|k| k == key)
                .map(|i| i as u8)
                .ok_or_else(|| SolError::TransactionBuildError("account not in account keys".into()))
        };

        let instructions = instructions
            .iter()
            .map(|ix| {
                Ok(CompiledInstruction {
                    program_id_index: index_of(&ix.program_id)?,
                    account_indices: ix
                        .accounts
                        .iter()
                        .map(|meta| index_of(&meta.pubkey))
                        .collect::<Result<_, SolError>>()?,
                    data: ix.data.clone(),
                })
            })
            .collect::<Result<Vec<_>, SolError>>()?;

        Ok(Self {
            header,
            account_keys,
            recent_blockhash: *recent_blockhash,
            instructions,
        })
    }

    /// Keys that must sign, in signature-slot order.
    pub fn signer_keys(&self) -> &[[u8; 32]] {
        let n = (self.header.num_required_signatures as usize).min(self.account_keys.len());
        &self.account_keys[..n]
    }

    /// The bytes that get signed.
    pub fn serialize(&self) -> Result<Vec<u8>, SolError> {
        let mut buf = Vec::with_capacity(256);
        buf.push(self.header.num_required_signatures);
        buf.push(self.header.num_readonly_signed);
        buf.push(self.header.num_readonly_unsigned);

        push_len(&mut buf, self.account_keys.len(), "account keys")?;
        for key in &self.account_keys {
            buf.extend_from_slice(key);
        }
        buf.extend_from_slice(&self.recent_blockhash);

        push_len(&mut buf, self.instructions.len(), "instructions")?;
        for ix in &self.instructions {
            buf.push(ix.program_id_index);
            push_len(&mut buf, ix.account_indices.len(), "instruction accounts")?;
            buf.extend_from_slice(&ix.account_indices);
            push_len(&mut buf, ix.data.len(), "instruction data bytes")?;
            buf.extend_from_slice(&ix.data);
        }
        Ok(buf)
    }

    fn read(reader: &mut Reader<'_>) -> Result<Self, SolError> {
        let first = reader.u8()?;
        if first & 0x80 != 0 {
            return Err(SolError::SerializationError(format!(
                "versioned message (v{}) is not supported",
                first & 0x7f
            )));
        }
        let header = MessageHeader {
            num_required_signatures: first,
            num_readonly_signed: reader.u8()?,
            num_readonly_unsigned: reader.u8()?,
        };

        let num_keys = reader.compact_u16()?;
        let account_keys = (0..num_keys)
            .map(|_| reader.array::<32>())
            .collect::<Result<Vec<_>, _>>()?;
        let recent_blockhash = reader.array::<32>()?;

        let num_instructions = reader.compact_u16()?;
        let mut instructions = Vec::with_capacity(num_instructions);
        for _ in 0..num_instructions {
            let program_id_index = reader.u8()?;
            let n = reader.compact_u16()?;
            let account_indices = reader.take(n)?.to_vec();
            let len = reader.compact_u16()?;
            let data = reader.take(len)?.to_vec();
            instructions.push(CompiledInstruction {
                program_id_index,
                account_indices,
                data,
            });
        }

        Ok(Self {
            header,
            account_keys,
            recent_blockhash,
            instructions,
        })
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, SolError> {
        let mut reader = Reader::new(bytes);
        let message = Self::read(&mut reader)?;
        reader.finish()?;
        Ok(message)
    }
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A legacy transaction with one signature slot per required signer.
/// Unfilled slots hold zeros.
///
/// Serializes (serde) as the base64 wire encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolTransaction {
    pub signatures: Vec<[u8; SIGNATURE_LEN]>,
    pub message: Message,
}

impl SolTransaction {
    pub fn new(message: Message) -> Self {
        let slots = message.signer_keys().len();
        Self {
            signatures: vec![[0u8; SIGNATURE_LEN]; slots],
            message,
        }
    }

    /// Place `signature` in the slot belonging to `pubkey`.
    pub fn add_signature(&mut self, pubkey: &[u8; 32], signature: &[u8]) -> Result<(), SolError> {
        let signature: [u8; SIGNATURE_LEN] = signature.try_into().map_err(|_| {
            SolError::SigningError(format!(
                "signature must be {SIGNATURE_LEN} bytes, got {}",
                signature.len()
            ))
        })?;
        let slot = self
            .message
            .signer_keys()
            .iter()
            .position(|k| k == pubkey)
            .ok_or_else(|| {
                SolError::SigningError(format!(
                    "unknown signer {}",
                    crate::address::pubkey_to_address(pubkey)
                ))
            })?;
        self.signatures[slot] = signature;
        Ok(())
    }

    pub fn is_fully_signed(&self) -> bool {
        self.signatures.iter().all(|sig| sig.iter().any(|b| *b != 0))
    }

    pub fn serialize(&self) -> Result<Vec<u8>, SolError> {
        let message = self.message.serialize()?;
        let mut wire = Vec::with_capacity(3 + self.signatures.len() * SIGNATURE_LEN + message.len());
        push_len(&mut wire, self.signatures.len(), "signatures")?;
        for sig in &self.signatures {
            wire.extend_from_slice(sig);
        }
        wire.extend_from_slice(&message);
        Ok(wire)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, SolError> {
        let mut reader = Reader::new(bytes);
        let count = reader.compact_u16()?;
        let signatures = (0..count)
            .map(|_| reader.array::<SIGNATURE_LEN>())
            .collect::<Result<Vec<_>, _>>()?;
        let message = Message::read(&mut reader)?;
        reader.finish()?;

        if signatures.len() != message.header.num_required_signatures as usize {
            return Err(SolError::SerializationError(format!(
                "{} signatures for {} required signers",
                signatures.len(),
                message.header.num_required_signatures
            )));
        }
        Ok(Self {
            signatures,
            message,
        })
    }

    pub fn to_base64(&self) -> Result<String, SolError> {
        Ok(BASE64.encode(self.serialize()?))
    }

    pub fn from_base64(encoded: &str) -> Result<Self, SolError> {
        let bytes = BASE64
            .decode(encoded)
            .map_err(|e| SolError::SerializationError(format!("base64: {e}")))?;
        Self::deserialize(&bytes)
    }
}

impl Serialize for SolTransaction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let encoded = self.to_base64().map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&encoded)
    }
}

impl<'de> Deserialize<'de> for SolTransaction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Self::from_base64(&encoded).map_err(serde::de::Error::custom)
    }
}

/// Native SOL transfer, followed by any extra instructions, paid by `from`.
pub fn build_sol_transfer(
    from: &[u8; 32],
    to: &[u8; 32],
    lamports: u64,
    extra_instructions: &[Instruction],
    recent_blockhash: &[u8; 32],
) -> Result<SolTransaction, SolError> {
    if lamports == 0 {
        return Err(SolError::TransactionBuildError("lamports must be > 0".into()));
    }
    let mut instructions = Vec::with_capacity(1 + extra_instructions.len());
    instructions.push(Instruction::system_transfer(from, to, lamports));
    instructions.extend_from_slice(extra_instructions);
    let message = Message::compile(&instructions, from, recent_blockhash)?;
    Ok(SolTransaction::new(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEMO_PROGRAM: &str = "MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr";

    fn memo(signer: &[u8; 32], text: &str) -> Instruction {
        Instruction {
            program_id: crate::address::address_to_bytes(MEMO_PROGRAM).unwrap(),
            accounts: vec![AccountMeta {
                pubkey: *signer,
                is_signer: true,
                is_writable: false,
            }],
            data: text.as_bytes().to_vec(),
        }
    }

    #[test]
    fn compact_u16_vectors() {
        let cases: &[(u16, &[u8])] = &[
            (0, &[0x00]),
            (0x7f, &[0x7f]),
            (0x80, &[0x80, 0x01]),
            (0xff, &[0xff, 0x01]),
            (0x3fff, &[0xff, 0x7f]),
            (0x4000, &[0x80, 0x80, 0x01]),
            (0xffff, &[0xff, 0xff, 0x03]),
        ];
        for (value, bytes) in cases {
            assert_eq!(encode_compact_u16(*value), *bytes, "encode {value}");
            assert_eq!(decode_compact_u16(bytes).unwrap(), (*value, bytes.len()));
        }
    }

    #[test]
    fn compact_u16_rejects_truncated_and_overflow() {
        assert!(decode_compact_u16(&[]).is_err());
        assert!(decode_compact_u16(&[0x80]).is_err());
        assert!(decode_compact_u16(&[0xff, 0xff, 0x07]).is_err());
    }

    #[test]
    fn transfer_instruction_data() {
        let ix = Instruction::system_transfer(&[1; 32], &[2; 32], 1_000_000);
        assert_eq!(&ix.data[..4], &[2, 0, 0, 0]);
        assert_eq!(&ix.data[4..], &1_000_000u64.to_le_bytes());
    }

    #[test]
    fn transfer_message_layout() {
        let from = [1u8; 32];
        let to = [2u8; 32];
        let tx = build_sol_transfer(&from, &to, 5_000, &[], &[9u8; 32]).unwrap();
        let msg = &tx.message;

        assert_eq!(
            msg.header,
            MessageHeader {
                num_required_signatures: 1,
                num_readonly_signed: 0,
                num_readonly_unsigned: 1,
            }
        );
        assert_eq!(msg.account_keys, vec![from, to, SYSTEM_PROGRAM_ID]);
        assert_eq!(msg.instructions[0].program_id_index, 2);
        assert_eq!(msg.instructions[0].account_indices, vec![0, 1]);

        let bytes = msg.serialize().unwrap();
        assert_eq!(bytes.len(), 3 + 1 + 96 + 32 + 1 + (1 + 1 + 2 + 1 + 12));
        assert_eq!(&bytes[..4], &[1, 0, 1, 3]);
        assert_eq!(tx.signatures, vec![[0u8; 64]]);
    }

    #[test]
    fn extra_signer_ordering() {
        let payer = [1u8; 32];
        let cosigner = [7u8; 32];
        let tx = build_sol_transfer(&payer, &[2; 32], 1, &[memo(&cosigner, "hi")], &[0; 32]).unwrap();
        let msg = &tx.message;
        // writable signer, readonly signer, writable, readonly programs
        assert_eq!(msg.account_keys[0], payer);
        assert_eq!(msg.account_keys[1], cosigner);
        assert_eq!(msg.header.num_required_signatures, 2);
        assert_eq!(msg.header.num_readonly_signed, 1);
        assert_eq!(msg.header.num_readonly_unsigned, 2);
        assert_eq!(tx.signatures.len(), 2);
    }

    #[test]
    fn zero_lamports_rejected() {
        assert!(build_sol_transfer(&[1; 32], &[2; 32], 0, &[], &[0; 32]).is_err());
    }

    #[test]
    fn add_signature_fills_matching_slot() {
        let payer = [1u8; 32];
        let cosigner = [7u8; 32];
        let mut tx =
            build_sol_transfer(&payer, &[2; 32], 1, &[memo(&cosigner, "x")], &[0; 32]).unwrap();

        tx.add_signature(&cosigner, &[0xcc; 64]).unwrap();
        assert_eq!(tx.signatures[1], [0xcc; 64]);
        assert!(!tx.is_fully_signed());

        tx.add_signature(&payer, &[0xaa; 64]).unwrap();
        assert!(tx.is_fully_signed());
    }

    #[test]
    fn add_signature_rejects_strangers_and_bad_lengths() {
        let mut tx = build_sol_transfer(&[1; 32], &[2; 32], 1, &[], &[0; 32]).unwrap();
        assert!(matches!(
            tx.add_signature(&[2; 32], &[0; 64]),
            Err(SolError::SigningError(_))
        ));
        assert!(matches!(
            tx.add_signature(&[1; 32], &[0; 63]),
            Err(SolError::SigningError(_))
        ));
    }

    #[test]
    fn wire_roundtrip_through_serde() {
        let mut tx =
            build_sol_transfer(&[1; 32], &[2; 32], 42, &[memo(&[1; 32], "note")], &[3; 32]).unwrap();
        tx.add_signature(&[1; 32], &[0x11; 64]).unwrap();

        let json = serde_json::to_string(&tx).unwrap();
        let back: SolTransaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tx);
    }

    #[test]
    fn deserialize_rejects_trailing_bytes_and_versioned() {
        let tx = build_sol_transfer(&[1; 32], &[2; 32], 1, &[], &[0; 32]).unwrap();
        let mut wire = tx.serialize().unwrap();
        wire.push(0);
        assert!(SolTransaction::deserialize(&wire).is_err());

        let mut versioned = tx.message.serialize().unwrap();
        versioned.insert(0, 0x80);
        assert!(Message::deserialize(&versioned).is_err());
    }

    #[test]
    fn instruction_json_uses_base58_and_base64() {
        let ix = memo(&[0u8; 32], "hi");
        let json = serde_json::to_value(&ix).unwrap();
        assert_eq!(json["programId"], MEMO_PROGRAM);
        assert_eq!(json["accounts"][0]["pubkey"], "11111111111111111111111111111111");
        assert_eq!(json["data"], "aGk=");
        let back: Instruction = serde_json::from_value(json).unwrap();
        assert_eq!(back, ix);
    }
}
