//! Portable JSON values
//!
//! The one normalization step applied at the serialization edge. Internal
//! computation stays in native numeric types; this walk only guarantees the
//! written artifact is plain JSON: integers stay integers, floats stay
//! floats, non-finite floats become `null` and `-0.0` becomes `0.0`.

use serde::Serialize;
use serde_json::{Number, Value};

/// Recursively normalize a JSON value.
pub fn to_portable(value: Value) -> Value {
    match value {
        Value::Number(n) => portable_number(n),
        Value::Array(items) => Value::Array(items.into_iter().map(to_portable).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, v)| (key, to_portable(v)))
                .collect(),
        ),
        other => other,
    }
}

fn portable_number(n: Number) -> Value {
    if n.is_i64() || n.is_u64() {
        return Value::Number(n);
    }
    match n.as_f64() {
        Some(f) if f.is_finite() => {
            let f = if f == 0.0 { 0.0 } else { f };
            Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
        }
        _ => Value::Null,
    }
}

/// Serialize then normalize.
pub fn to_portable_value<T: Serialize>(value: &T) -> serde_json::Result<Value> {
    Ok(to_portable(serde_json::to_value(value)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_integers_and_floats_keep_their_kind() {
        let v = to_portable(json!({"n": 150, "neg": -3, "r2": 0.25, "whole": 2.0}));
        assert!(v["n"].is_u64());
        assert!(v["neg"].is_i64());
        assert!(v["r2"].is_f64());
        assert!(v["whole"].is_f64());
        assert_eq!(serde_json::to_string(&v["whole"]).unwrap(), "2.0");
    }

    #[test]
    fn test_negative_zero_normalized() {
        let v = to_portable(json!([-0.0]));
        assert_eq!(serde_json::to_string(&v).unwrap(), "[0.0]");
    }

    #[test]
    fn test_nested_structures_are_walked() {
        #[derive(Serialize)]
        struct Inner {
            scores: Vec<f64>,
            flag: bool,
        }
        let v = to_portable_value(&vec![Inner {
            scores: vec![0.5, f64::NAN, f64::INFINITY],
            flag: true,
        }])
        .unwrap();
        assert_eq!(v, json!([{"scores": [0.5, null, null], "flag": true}]));
    }
}
