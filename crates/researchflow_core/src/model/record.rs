//! Record contract and lenient field readers.
//!
//! Project files and history files may be hand-edited or written by older
//! versions, so every reader here is total: a missing key, a wrong JSON type
//! or a non-object input yields the caller's default.

use serde_json::Value;
use uuid::Uuid;

/// Symmetric conversion between an entity and its JSON record.
///
/// # Invariants
/// - `T::from_record(&t.to_record()) == t` for every valid `t`.
/// - `from_record` is total over arbitrary input.
pub trait Record: Sized {
    fn to_record(&self) -> Value;
    fn from_record(value: &Value) -> Self;
}

/// Mints a fresh entity id. Ids are never reused.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Wires a `Record` impl into serde so `#[serde(from/into = "Value")]` works.
macro_rules! record_serde {
    ($ty:ty) => {
        impl From<$ty> for serde_json::Value {
            fn from(value: $ty) -> Self {
                $crate::model::record::Record::to_record(&value)
            }
        }

        impl From<serde_json::Value> for $ty {
            fn from(value: serde_json::Value) -> Self {
                <$ty as $crate::model::record::Record>::from_record(&value)
            }
        }
    };
}
pub(crate) use record_serde;

pub(crate) fn str_field(value: &Value, key: &str, default: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

/// Like `str_field`, but also accepts numbers and bools (e.g. `"year": 2021`).
pub(crate) fn text_field(value: &Value, key: &str, default: &str) -> String {
    match value.get(key) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        _ => default.to_string(),
    }
}

pub(crate) fn opt_str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

pub(crate) fn f64_field(value: &Value, key: &str, default: f64) -> f64 {
    value.get(key).and_then(Value::as_f64).unwrap_or(default)
}

pub(crate) fn bool_field(value: &Value, key: &str, default: bool) -> bool {
    value.get(key).and_then(Value::as_bool).unwrap_or(default)
}

pub(crate) fn list_field<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Reads a list of strings, skipping non-string entries.
pub(crate) fn string_list(value: &Value, key: &str) -> Vec<String> {
    list_field(value, key)
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}

/// Reads an id, minting a new one when the field is absent or blank.
pub(crate) fn id_field(value: &Value, key: &str) -> String {
    match value.get(key).and_then(Value::as_str) {
        Some(id) if !id.trim().is_empty() => id.to_string(),
        _ => new_id(),
    }
}

/// Removes later duplicates while keeping first-seen order.
pub(crate) fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
