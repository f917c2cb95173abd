//! Cache key generation
//!
//! Keys are opaque to the cache, so adapters build them here to make sure
//! every distinguishing parameter ends up in the key in a stable order.

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::Result;

/// Build `namespace:<json>` from serializable parameters.
///
/// Object keys are sorted at every depth, so two filter sets with the same
/// fields produce the same key regardless of construction order. `None`
/// fields are part of the key; an empty parameter object yields
/// `namespace:all`.
pub fn cache_key<P: Serialize + ?Sized>(namespace: &str, params: &P) -> Result<String> {
    let value = canonical(serde_json::to_value(params)?);

    let is_empty = match &value {
        Value::Null => true,
        Value::Object(map) => map.values().all(|v| v.is_null()),
        _ => false,
    };

    if is_empty {
        return Ok(format!("{}:all", namespace));
    }

    Ok(format!("{}:{}", namespace, serde_json::to_string(&value)?))
}

/// Rebuild objects with sorted keys, recursively.
///
/// serde_json's default `Map` is already sorted, but the `preserve_order`
/// feature switches it to insertion order and any crate in the tree can
/// enable it. Keys must not change when that happens.
fn canonical(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, canonical(v)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonical).collect()),
        other => other,
    }
}

/// Key for an AI completion: SHA-256 over the system and user prompt.
pub fn prompt_key(system: &str, prompt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(system.as_bytes());
    hasher.update(b"|");
    hasher.update(prompt.as_bytes());

    format!("ai:{:x}", hasher.finalize())
}
