//! Deterministic JSON encoding.
//!
//! Object keys are sorted recursively and no insignificant whitespace is
//! emitted, so equal values always encode to identical bytes regardless of
//! how their maps were built.

use serde::Serialize;
use serde_json::Value;

use crate::hasher::HashError;

/// Encode a JSON value with recursively sorted object keys.
pub fn canonicalize(value: &Value) -> String {
    let mut out = String::new();
    write_value(value, &mut out);
    out
}

/// Serialize any value to JSON and canonicalize it.
pub fn canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<String, HashError> {
    let value = serde_json::to_value(value).map_err(|e| HashError::Serialization(e.to_string()))?;
    Ok(canonicalize(&value))
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            out.push_str(&value.to_string());
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_value(item, out);
            }
            out.push('}');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn sorts_top_level_keys() {
        assert_eq!(canonicalize(&json!({"z": 1, "a": 2, "m": 3})), r#"{"a":2,"m":3,"z":1}"#);
    }

    #[test]
    fn sorts_nested_keys() {
        let value = json!({"b": {"y": [ {"d": 1, "c": 2} ], "x": null}, "a": true});
        assert_eq!(
            canonicalize(&value),
            r#"{"a":true,"b":{"x":null,"y":[{"c":2,"d":1}]}}"#
        );
    }

    #[test]
    fn arrays_keep_order() {
        assert_eq!(canonicalize(&json!([3, 1, 2])), "[3,1,2]");
    }

    #[test]
    fn scalars() {
        assert_eq!(canonicalize(&json!(null)), "null");
        assert_eq!(canonicalize(&json!(false)), "false");
        assert_eq!(canonicalize(&json!(-17)), "-17");
        assert_eq!(canonicalize(&json!(3.14)), "3.14");
        assert_eq!(canonicalize(&json!("")), r#""""#);
    }

    #[test]
    fn strings_are_escaped() {
        assert_eq!(canonicalize(&json!("a\"b\nc")), r#""a\"b\nc""#);
        assert_eq!(canonicalize(&json!({"k\"": 1})), r#"{"k\"":1}"#);
    }

    #[test]
    fn canonical_json_of_struct() {
        #[derive(Serialize)]
        struct Sample {
            zeta: u8,
            alpha: &'static str,
        }
        let encoded = canonical_json(&Sample { zeta: 1, alpha: "x" }).unwrap();
        assert_eq!(encoded, r#"{"alpha":"x","zeta":1}"#);
    }

    proptest! {
        #[test]
        fn key_insertion_order_is_irrelevant(
            entries in proptest::collection::btree_map("[a-z]{1,6}", 0i64..1000, 0..12)
        ) {
            let forward: serde_json::Map<String, Value> =
                entries.iter().map(|(k, v)| (k.clone(), json!(v))).collect();
            let reverse: serde_json::Map<String, Value> =
                entries.iter().rev().map(|(k, v)| (k.clone(), json!(v))).collect();
            prop_assert_eq!(
                canonicalize(&Value::Object(forward)),
                canonicalize(&Value::Object(reverse))
            );
        }
    }
}
