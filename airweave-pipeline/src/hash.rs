//! Canonical-JSON content hashing for change detection.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Recursively sorts object keys. Arrays keep their order; scalars pass
/// through unchanged. Timestamps are expected to already be RFC3339
/// strings (the caller's responsibility, see `BaseEntity::hashable_value`).
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sorted: Vec<(&String, &Value)> = map.iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(b.0));
            let mut out = serde_json::Map::new();
            for (k, v) in sorted {
                out.insert(k.clone(), canonicalize(v));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// SHA-256 over the canonical (sorted-key, no-whitespace) JSON
/// representation of `value`.
pub fn content_hash(value: &Value) -> String {
    let canonical = canonicalize(value);
    let bytes = serde_json::to_vec(&canonical).expect("canonical value always serializes");
    let digest = Sha256::digest(&bytes);
    hex::encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_order_does_not_affect_hash() {
        let a = json!({"b": 1, "a": 2});
        let b = json!({"a": 2, "b": 1});
        assert_eq!(content_hash(&a), content_hash(&b));
    }

    #[test]
    fn different_values_hash_differently() {
        assert_ne!(content_hash(&json!({"a": 1})), content_hash(&json!({"a": 2})));
    }

    #[test]
    fn nested_object_key_order_does_not_affect_hash() {
        let a = json!({"outer": {"y": 1, "x": 2}});
        let b = json!({"outer": {"x": 2, "y": 1}});
        assert_eq!(content_hash(&a), content_hash(&b));
    }
}
