//! Maps the signer's response shapes onto [`Signature`].
//!
//! ECDSA responses arrive in one of three layouts:
//!
//! ```text
//! { "big_r": { "affine_point": "02…" }, "s": { "scalar": "…" }, "recovery_id": 0 }
//! { "big_r": "03…", "s": "…", "recovery_id": 1 }
//! { "bigR": { "x": "…", "y": "…" }, "s": "…", "recoveryId": 0 }
//! ```
//!
//! and Ed25519 responses as `{ "scheme": "Ed25519", "signature": [64 bytes] }`.
//! For ECDSA, `r` is the X coordinate of `big_r` (the SEC1 prefix byte is
//! dropped) and `v = recovery_id + 27`.

use adapter_core::{Ed25519Signature, RsvSignature, Signature};
use alloy_primitives::U256;
use serde::Deserialize;
use serde_json::Value;

use crate::error::SignerError;

#[derive(Deserialize)]
struct AffinePoint {
    affine_point: String,
}

#[derive(Deserialize)]
struct ScalarValue {
    scalar: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BigUint {
    Number(u64),
    Text(String),
}

#[derive(Deserialize)]
struct BigPoint {
    x: BigUint,
    #[allow(dead_code)]
    #[serde(default)]
    y: Option<BigUint>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSignature {
    AffinePoint {
        big_r: AffinePoint,
        s: ScalarValue,
        recovery_id: u8,
    },
    FlatHex {
        big_r: String,
        s: String,
        recovery_id: u8,
    },
    BigInt {
        #[serde(rename = "bigR")]
        big_r: BigPoint,
        s: BigUint,
        #[serde(rename = "recoveryId")]
        recovery_id: u8,
    },
    Ed25519 {
        scheme: String,
        signature: Vec<u8>,
    },
}

/// Normalizes one raw signer response.
pub fn normalize_signature(raw: &Value) -> Result<Signature, SignerError> {
    let parsed: RawSignature = serde_json::from_value(raw.clone())
        .map_err(|_| SignerError::UnrecognizedSignatureFormat(raw.to_string()))?;

    match parsed {
        RawSignature::AffinePoint {
            big_r,
            s,
            recovery_id,
        } => ecdsa(strip_point_prefix(&big_r.affine_point)?, normalize_hex(&s.scalar)?, recovery_id),
        RawSignature::FlatHex {
            big_r,
            s,
            recovery_id,
        } => ecdsa(strip_point_prefix(&big_r)?, normalize_hex(&s)?, recovery_id),
        RawSignature::BigInt {
            big_r,
            s,
            recovery_id,
        } => ecdsa(big_uint_hex(&big_r.x)?, big_uint_hex(&s)?, recovery_id),
        RawSignature::Ed25519 { scheme, signature } => {
            if !scheme.eq_ignore_ascii_case("ed25519") {
                return Err(SignerError::UnrecognizedSignatureFormat(format!(
                    "unknown scheme {scheme}"
                )));
            }
            let signature = Ed25519Signature::from_slice(&signature)
                .map_err(|e| SignerError::UnrecognizedSignatureFormat(e.to_string()))?;
            Ok(Signature::Ed25519(signature))
        }
    }
}

fn ecdsa(r: String, s: String, recovery_id: u8) -> Result<Signature, SignerError> {
    if recovery_id > 1 {
        return Err(SignerError::UnrecognizedSignatureFormat(format!(
            "recovery id {recovery_id} out of range"
        )));
    }
    let signature = RsvSignature::new(r, s, recovery_id + 27)
        .map_err(|e| SignerError::UnrecognizedSignatureFormat(e.to_string()))?;
    Ok(Signature::Ecdsa(signature))
}

/// `02`/`03` + 64 hex chars of X. Drops the prefix byte.
fn strip_point_prefix(point: &str) -> Result<String, SignerError> {
    let point = point.strip_prefix("0x").unwrap_or(point);
    if point.len() != 66 {
        return Err(SignerError::UnrecognizedSignatureFormat(format!(
            "big_r must be a 33-byte compressed point, got {} hex chars",
            point.len()
        )));
    }
    let x = point.get(2..).ok_or_else(|| {
        SignerError::UnrecognizedSignatureFormat(format!("big_r is not hex: {point:?}"))
    })?;
    normalize_hex(x)
}

fn normalize_hex(value: &str) -> Result<String, SignerError> {
    let value = value.strip_prefix("0x").unwrap_or(value);
    if value.len() != 64 || !value.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(SignerError::UnrecognizedSignatureFormat(format!(
            "expected 64 hex chars, got {value:?}"
        )));
    }
    Ok(value.to_lowercase())
}

fn big_uint_hex(value: &BigUint) -> Result<String, SignerError> {
    let parsed = match value {
        BigUint::Number(n) => U256::from(*n),
        BigUint::Text(text) => {
            let result = match text.strip_prefix("0x") {
                Some(hex_digits) => U256::from_str_radix(hex_digits, 16),
                None => U256::from_str_radix(text, 10),
            };
            result.map_err(|e| {
                SignerError::UnrecognizedSignatureFormat(format!("bad integer {text:?}: {e}"))
            })?
        }
    };
    Ok(hex::encode(parsed.to_be_bytes::<32>()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const R: &str = "a1b2c3d4e5f60718293a4b5c6d7e8f90a1b2c3d4e5f60718293a4b5c6d7e8f90";
    const S: &str = "0f1e2d3c4b5a69788796a5b4c3d2e1f00f1e2d3c4b5a69788796a5b4c3d2e1f0";

    fn rsv(sig: Signature) -> RsvSignature {
        match sig {
            Signature::Ecdsa(rsv) => rsv,
            Signature::Ed25519(_) => panic!("expected ecdsa"),
        }
    }

    #[test]
    fn affine_point_shape() {
        let raw = json!({
            "big_r": { "affine_point": format!("02{}", R.to_uppercase()) },
            "s": { "scalar": S },
            "recovery_id": 0
        });
        let sig = rsv(normalize_signature(&raw).unwrap());
        assert_eq!(sig.r, R);
        assert_eq!(sig.s, S);
        assert_eq!(sig.v, 27);
    }

    #[test]
    fn flat_hex_shape() {
        let raw = json!({ "big_r": format!("03{R}"), "s": S, "recovery_id": 1 });
        let sig = rsv(normalize_signature(&raw).unwrap());
        assert_eq!(sig.r, R);
        assert_eq!(sig.v, 28);
    }

    #[test]
    fn big_int_shape_decimal_and_hex() {
        let r_decimal = U256::from_str_radix(R, 16).unwrap().to_string();
        let raw = json!({
            "bigR": { "x": r_decimal, "y": "1" },
            "s": format!("0x{S}"),
            "recoveryId": 1
        });
        let sig = rsv(normalize_signature(&raw).unwrap());
        assert_eq!(sig.r, R);
        assert_eq!(sig.s, S);
        assert_eq!(sig.v, 28);
    }

    #[test]
    fn big_int_small_values_are_left_padded() {
        let raw = json!({ "bigR": { "x": 5 }, "s": "16", "recoveryId": 0 });
        let sig = rsv(normalize_signature(&raw).unwrap());
        assert_eq!(sig.r, format!("{}05", "0".repeat(62)));
        assert_eq!(sig.s, format!("{}10", "0".repeat(62)));
    }

    #[test]
    fn every_ecdsa_shape_yields_v_27_or_28() {
        let shapes = [
            json!({"big_r": {"affine_point": format!("02{R}")}, "s": {"scalar": S}, "recovery_id": 1}),
            json!({"big_r": format!("02{R}"), "s": S, "recovery_id": 0}),
            json!({"bigR": {"x": format!("0x{R}")}, "s": format!("0x{S}"), "recoveryId": 1}),
        ];
        for raw in shapes {
            let sig = rsv(normalize_signature(&raw).unwrap());
            assert!(sig.v == 27 || sig.v == 28);
        }
    }

    #[test]
    fn ed25519_shape() {
        let raw = json!({ "scheme": "Ed25519", "signature": vec![9u8; 64] });
        match normalize_signature(&raw).unwrap() {
            Signature::Ed25519(sig) => assert_eq!(sig.to_bytes(), [9u8; 64]),
            Signature::Ecdsa(_) => panic!("expected ed25519"),
        }
    }

    #[test]
    fn ed25519_wrong_length_rejected() {
        let raw = json!({ "scheme": "Ed25519", "signature": vec![9u8; 10] });
        assert!(matches!(
            normalize_signature(&raw),
            Err(SignerError::UnrecognizedSignatureFormat(_))
        ));
    }

    #[test]
    fn unknown_shape_rejected() {
        let raw = json!({ "signature": "deadbeef" });
        let err = normalize_signature(&raw).unwrap_err();
        assert!(matches!(err, SignerError::UnrecognizedSignatureFormat(_)));
    }

    #[test]
    fn bad_recovery_id_rejected() {
        let raw = json!({ "big_r": format!("02{R}"), "s": S, "recovery_id": 2 });
        assert!(normalize_signature(&raw).is_err());
    }

    #[test]
    fn short_big_r_rejected() {
        let raw = json!({ "big_r": R, "s": S, "recovery_id": 0 });
        assert!(normalize_signature(&raw).is_err());
    }

    #[test]
    fn non_ascii_big_r_rejected() {
        let raw = json!({
            "big_r": format!("\u{20ac}{}", "a".repeat(63)),
            "s": S,
            "recovery_id": 0
        });
        assert!(matches!(
            normalize_signature(&raw),
            Err(SignerError::UnrecognizedSignatureFormat(_))
        ));
    }
}
