//! ECDSA signature encodings: strict DER and low-S normalization.

use k256::ecdsa::Signature;

use crate::error::CryptoError;

/// Encodes `(r, s)` as a DER `SEQUENCE { INTEGER r, INTEGER s }`.
///
/// Leading zero bytes are stripped from each integer and a single `0x00`
/// is prepended when the first remaining byte has its high bit set.
pub fn encode_der(r: &[u8; 32], s: &[u8; 32]) -> Vec<u8> {
    let r = der_integer(r);
    let s = der_integer(s);

    let mut out = Vec::with_capacity(6 + r.len() + s.len());
    out.push(0x30);
    out.push((4 + r.len() + s.len()) as u8);
    out.push(0x02);
    out.push(r.len() as u8);
    out.extend_from_slice(&r);
    out.push(0x02);
    out.push(s.len() as u8);
    out.extend_from_slice(&s);
    out
}

fn der_integer(value: &[u8; 32]) -> Vec<u8> {
    let first = value.iter().position(|&b| b != 0).unwrap_or(31);
    let trimmed = &value[first..];
    let mut out = Vec::with_capacity(33);
    if trimmed[0] & 0x80 != 0 {
        out.push(0x00);
    }
    out.extend_from_slice(trimmed);
    out
}

/// Decodes a DER signature back into 32-byte `(r, s)`.
pub fn decode_der(der: &[u8]) -> Result<([u8; 32], [u8; 32]), CryptoError> {
    if der.len() < 8 || der[0] != 0x30 {
        return Err(CryptoError::InvalidDer("missing sequence header".into()));
    }
    if der[1] as usize != der.len() - 2 {
        return Err(CryptoError::InvalidDer("sequence length mismatch".into()));
    }

    let (r, rest) = read_integer(&der[2..])?;
    let (s, rest) = read_integer(rest)?;
    if !rest.is_empty() {
        return Err(CryptoError::InvalidDer("trailing bytes".into()));
    }
    Ok((r, s))
}

fn read_integer(input: &[u8]) -> Result<([u8; 32], &[u8]), CryptoError> {
    if input.len() < 2 || input[0] != 0x02 {
        return Err(CryptoError::InvalidDer("expected integer tag".into()));
    }
    let len = input[1] as usize;
    if len == 0 || input.len() < 2 + len {
        return Err(CryptoError::InvalidDer("integer length out of range".into()));
    }
    let body = &input[2..2 + len];
    let significant = match body {
        [0x00, rest @ ..] if !rest.is_empty() => rest,
        _ => body,
    };
    if significant.len() > 32 {
        return Err(CryptoError::InvalidDer("integer wider than 32 bytes".into()));
    }

    let mut out = [0u8; 32];
    out[32 - significant.len()..].copy_from_slice(significant);
    Ok((out, &input[2 + len..]))
}

/// Rewrites `s` to `n - s` when it is in the upper half of the curve order.
///
/// Returns the (possibly unchanged) pair and whether a flip happened. A
/// flip inverts the recovery parity, which callers using recoverable
/// signatures must account for.
pub fn normalize_low_s(r: &[u8; 32], s: &[u8; 32]) -> Result<([u8; 32], [u8; 32], bool), CryptoError> {
    let signature = Signature::from_scalars(*r, *s)
        .map_err(|e| CryptoError::InvalidSignature(format!("r or s out of range: {e}")))?;

    let (normalized, flipped) = match signature.normalize_s() {
        Some(low) => (low, true),
        None => (signature, false),
    };

    let bytes = normalized.to_bytes();
    let mut r_out = [0u8; 32];
    let mut s_out = [0u8; 32];
    r_out.copy_from_slice(&bytes[..32]);
    s_out.copy_from_slice(&bytes[32..]);
    Ok((r_out, s_out, flipped))
}

#[cfg(test)]
mod tests {
    use super::*;

    const N_MINUS_ONE: &str = "fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364140";

    fn arr(hex_str: &str) -> [u8; 32] {
        hex::decode(hex_str).unwrap().try_into().unwrap()
    }

    #[test]
    fn high_bit_gets_zero_pad() {
        let r = [0xffu8; 32];
        let s = [0x01u8; 32];
        let der = encode_der(&r, &s);
        assert_eq!(der[0], 0x30);
        assert_eq!(der[2], 0x02);
        assert_eq!(der[3], 33);
        assert_eq!(der[4], 0x00);
        assert_eq!(der.len(), 2 + 2 + 33 + 2 + 32);
        assert_eq!(decode_der(&der).unwrap(), (r, s));
    }

    #[test]
    fn leading_zeros_are_stripped() {
        let mut r = [0x11u8; 32];
        r[0] = 0x00;
        r[1] = 0x00;
        let mut s = [0x22u8; 32];
        s[0] = 0x00;
        s[1] = 0x80;
        let der = encode_der(&r, &s);
        assert_eq!(der[3], 30);
        // s keeps one zero byte because its first significant byte is 0x80.
        let s_len_index = 4 + 30 + 1;
        assert_eq!(der[s_len_index], 32);
        assert_eq!(der[s_len_index + 1], 0x00);
        assert_eq!(der[s_len_index + 2], 0x80);
        assert_eq!(decode_der(&der).unwrap(), (r, s));
    }

    #[test]
    fn all_zero_integer_encodes_as_single_byte() {
        let der = encode_der(&[0u8; 32], &[1u8; 32]);
        assert_eq!(&der[2..5], &[0x02, 0x01, 0x00]);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode_der(&[0x31, 0x00]).is_err());
        assert!(decode_der(&[0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01]).is_err());
        let mut der = encode_der(&[1u8; 32], &[2u8; 32]);
        der.push(0x00);
        assert!(decode_der(&der).is_err());
    }

    #[test]
    fn high_s_is_flipped() {
        let r = [0x33u8; 32];
        let (r2, s2, flipped) = normalize_low_s(&r, &arr(N_MINUS_ONE)).unwrap();
        assert!(flipped);
        assert_eq!(r2, r);
        let mut one = [0u8; 32];
        one[31] = 1;
        assert_eq!(s2, one);
    }

    #[test]
    fn low_s_is_untouched() {
        let r = [0x33u8; 32];
        let mut s = [0u8; 32];
        s[31] = 5;
        let (_, s2, flipped) = normalize_low_s(&r, &s).unwrap();
        assert!(!flipped);
        assert_eq!(s2, s);
    }

    #[test]
    fn zero_scalar_rejected() {
        assert!(normalize_low_s(&[0u8; 32], &[1u8; 32]).is_err());
    }
}
