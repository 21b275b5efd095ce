use crate::error::{AppError, AppResult};
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::Digest;

pub fn to_canonical_json_bytes<T: Serialize>(value: &T) -> AppResult<Vec<u8>> {
    let mut json_value = serde_json::to_value(value)
        .map_err(|e| AppError::internal(format!("json serialize error: {e}")))?;
    sort_json_value(&mut json_value);
    serde_json::to_vec(&json_value)
        .map_err(|e| AppError::internal(format!("json encode error: {e}")))
}

/// Pretty-printed output in declaration order, for files people read.
pub fn to_pretty_json_bytes<T: Serialize>(value: &T) -> AppResult<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(value)
        .map_err(|e| AppError::internal(format!("json encode error: {e}")))?;
    bytes.push(b'\n');
    Ok(bytes)
}

pub fn determinism_hash_hex(bytes: &[u8]) -> String {
    let digest = sha2::Sha256::digest(bytes);
    hex::encode(digest)
}

/// Hash of `value` with every field in `volatile_fields` blanked first, so
/// the hash field itself and wall-clock stamps do not feed the digest.
pub fn determinism_hash_for_json_value(
    mut value: Value,
    volatile_fields: &[&str],
) -> AppResult<String> {
    let obj = value
        .as_object_mut()
        .ok_or_else(|| AppError::validation("determinism hash value must be an object"))?;
    for field in volatile_fields {
        obj.insert((*field).to_string(), Value::String(String::new()));
    }
    let bytes = to_canonical_json_bytes(&value)?;
    Ok(determinism_hash_hex(&bytes))
}

/// First 8 hex chars of the SHA-256 of `seed`.
pub fn short_id(seed: &str) -> String {
    let mut hex = determinism_hash_hex(seed.as_bytes());
    hex.truncate(8);
    hex
}

fn sort_json_value(value: &mut Value) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<String> = map.keys().cloned().collect();
            keys.sort();
            let mut new_map = Map::new();
            for key in keys {
                if let Some(mut v) = map.remove(&key) {
                    sort_json_value(&mut v);
                    new_map.insert(key, v);
                }
            }
            *map = new_map;
        }
        Value::Array(items) => {
            for item in items {
                sort_json_value(item);
            }
        }
        _ => {}
    }
}
