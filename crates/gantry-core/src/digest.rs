//! Canonical JSON and SHA-256 digests for structured content.
//!
//! Module and provider configuration is hashed in canonical form so that
//! key order and float spelling never change a version:
//! - object keys sorted by UTF-16 code units (RFC 8785 ordering)
//! - integer-valued floats written as integers
//! - NaN and infinities rejected as malformed content

use serde_json::{Map, Number, Value};
use sha2::{Digest, Sha256};

use crate::error::{ContractError, Result};

fn utf16_key(key: &str) -> Vec<u16> {
    key.encode_utf16().collect()
}

fn canonical_number(n: &Number) -> Result<Number> {
    if n.is_i64() || n.is_u64() {
        return Ok(n.clone());
    }
    let Some(f) = n.as_f64() else {
        return Ok(n.clone());
    };
    if !f.is_finite() {
        return Err(ContractError::MalformedContent(
            "non-finite number in content".to_string(),
        ));
    }
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Ok(Number::from(f as i64))
    } else {
        Ok(n.clone())
    }
}

/// Rebuild a value with normalized numbers and sorted object keys.
fn canonicalize(value: &Value) -> Result<Value> {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| utf16_key(a).cmp(&utf16_key(b)));

            let mut sorted = Map::new();
            for (key, inner) in entries {
                sorted.insert(key.clone(), canonicalize(inner)?);
            }
            Ok(Value::Object(sorted))
        }
        Value::Array(items) => Ok(Value::Array(
            items.iter().map(canonicalize).collect::<Result<Vec<_>>>()?,
        )),
        Value::Number(n) => Ok(Value::Number(canonical_number(n)?)),
        other => Ok(other.clone()),
    }
}

/// Serialize a JSON value in canonical compact form.
pub fn canonical_json(value: &Value) -> Result<String> {
    let canonical = canonicalize(value)?;
    Ok(serde_json::to_string(&canonical)?)
}

/// SHA-256 hex digest of raw bytes.
pub fn digest_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// SHA-256 hex digest of the canonical form of a JSON value.
pub fn digest_json(value: &Value) -> Result<String> {
    Ok(digest_bytes(canonical_json(value)?.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_order_does_not_matter() {
        let a = json!({"name": "api", "type": "container", "spec": {"b": 1, "a": 2}});
        let b = json!({"spec": {"a": 2, "b": 1}, "type": "container", "name": "api"});
        assert_eq!(canonical_json(&a).unwrap(), canonical_json(&b).unwrap());
        assert_eq!(digest_json(&a).unwrap(), digest_json(&b).unwrap());
    }

    #[test]
    fn test_integer_valued_floats_collapse() {
        let value = json!({"replicas": 3.0, "ratio": 0.5});
        assert_eq!(
            canonical_json(&value).unwrap(),
            r#"{"ratio":0.5,"replicas":3}"#
        );
    }

    #[test]
    fn test_array_order_is_significant() {
        let a = json!({"command": ["make", "test"]});
        let b = json!({"command": ["test", "make"]});
        assert_ne!(digest_json(&a).unwrap(), digest_json(&b).unwrap());
    }

    #[test]
    fn test_digest_is_lowercase_sha256_hex() {
        let digest = digest_bytes(b"module-a");
        assert_eq!(digest.len(), 64);
        assert!(digest
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_null_and_nested_arrays_are_kept() {
        let value = json!({"z": [null, {"y": 1, "x": 2}]});
        assert_eq!(
            canonical_json(&value).unwrap(),
            r#"{"z":[null,{"x":2,"y":1}]}"#
        );
    }
}
