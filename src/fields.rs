//! Total lookups into the loosely shaped listing JSON.
//!
//! None of these fail: a missing key, a null parent or a parent of the wrong
//! JSON type all yield the supplied default.

use serde_json::Value;

/// `obj[key]`, or `default` when `obj` is not an object or lacks `key`.
pub fn get_or(obj: &Value, key: &str, default: Value) -> Value {
    obj.as_object()
        .and_then(|map| map.get(key))
        .cloned()
        .unwrap_or(default)
}

/// `obj[outer][inner]`, or `default` when either level is missing or
/// `obj[outer]` is not an object.
pub fn nested_get(obj: &Value, outer: &str, inner: &str, default: Value) -> Value {
    obj.as_object()
        .and_then(|map| map.get(outer))
        .and_then(Value::as_object)
        .and_then(|map| map.get(inner))
        .cloned()
        .unwrap_or(default)
}

/// [`get_or`] with the empty-string default used for listing fields.
pub fn text_or_empty(obj: &Value, key: &str) -> Value {
    get_or(obj, key, empty())
}

/// [`nested_get`] with the empty-string default used for listing fields.
pub fn nested_or_empty(obj: &Value, outer: &str, inner: &str) -> Value {
    nested_get(obj, outer, inner, empty())
}

pub fn empty() -> Value {
    Value::String(String::new())
}
