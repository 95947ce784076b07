//! Structural comparison of serializable values
//!
//! Typed equality is unreliable for Kubernetes objects: a typed struct and an
//! untyped map with the same fields never compare equal, and defaulted fields
//! that serialize identically may differ in memory. Comparing the serialized
//! JSON trees sidesteps both.

use serde::Serialize;
use serde_json::{Number, Value};

/// Compare two values by their JSON representation.
///
/// Object key order is irrelevant and all numbers compare as `f64`, so
/// `{"a": 1}` equals `{"a": 1.0}`. Returns false if either value fails to
/// serialize.
///
/// `serde_json` encodes non-finite floats as `null` rather than failing, so
/// `NaN` and the infinities compare equal to `null`, to `None` and to each
/// other.
pub fn structurally_equal<A, B>(a: &A, b: &B) -> bool
where
    A: Serialize + ?Sized,
    B: Serialize + ?Sized,
{
    match (canonical_value(a), canonical_value(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn canonical_value<T: Serialize + ?Sized>(value: &T) -> Option<Value> {
    serde_json::to_value(value).ok().map(canonicalize)
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Number(n) => n
            .as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Number(n)),
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, canonicalize(v)))
                .collect(),
        ),
        other => other,
    }
}
