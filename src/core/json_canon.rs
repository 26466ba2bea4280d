//! Canonical JSON encoder for content addressing.
//!
//! Canonical rules:
//! - object keys sorted by UTF-8 byte order, recursively
//! - lists keep positional order
//! - no insignificant whitespace
//!
//! Two semantically equal values serialize identically regardless of key
//! order, which is what lets the serialized text act as a cache key.
//! Finiteness of numeric payloads is enforced by the value model before
//! anything reaches this encoder (`tree::assert_numeric_tree`); JSON values
//! themselves cannot carry NaN/Infinity.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CanonJsonError {
    #[error("json encode failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serialize a value to canonical JSON bytes.
pub fn to_canon_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, CanonJsonError> {
    let value = serde_json::to_value(value)?;
    let canon = canon_value(value);
    Ok(serde_json::to_vec(&canon)?)
}

/// Recursively sort object keys; arrays keep positional order.
pub fn canon_value(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut canon = Map::new();
            for (key, value) in entries {
                canon.insert(key, canon_value(value));
            }
            Value::Object(canon)
        }
        Value::Array(values) => Value::Array(values.into_iter().map(canon_value).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn canon_json_sorts_keys_recursively() {
        let value = json!({
            "b": 1,
            "a": { "d": 4, "c": 3 },
            "aa": [ {"z": 1, "y": 2} ]
        });

        let bytes = to_canon_json_bytes(&value).unwrap();
        let expected = br#"{"a":{"c":3,"d":4},"aa":[{"y":2,"z":1}],"b":1}"#;
        assert_eq!(bytes, expected);
    }

    #[test]
    fn canon_json_is_deterministic_for_hashmap() {
        let mut map_a = HashMap::new();
        map_a.insert("b".to_string(), 2u32);
        map_a.insert("a".to_string(), 1u32);

        let mut map_b = HashMap::new();
        map_b.insert("a".to_string(), 1u32);
        map_b.insert("b".to_string(), 2u32);

        let bytes_a = to_canon_json_bytes(&map_a).unwrap();
        let bytes_b = to_canon_json_bytes(&map_b).unwrap();
        assert_eq!(bytes_a, bytes_b);
    }

    #[test]
    fn lists_keep_positional_order() {
        let bytes = to_canon_json_bytes(&json!([3, 1, 2])).unwrap();
        assert_eq!(bytes, b"[3,1,2]");
    }
}
