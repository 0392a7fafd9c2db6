//! # Deterministic configuration merge.
//!
//! Deep merge over JSON maps: a key present in a later source always wins;
//! when both sides hold a nested map at the same key the merge recurses;
//! arrays and primitives are replaced outright, never concatenated.

use serde_json::Value;

use crate::error::EngineError;

/// Pairwise deep merge: keys from `overlay` override keys from `base`;
/// nested maps merge recursively; anything else is replaced by `overlay`.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(a), Value::Object(b)) => {
            let mut out = a.clone();
            for (k, v) in b {
                let merged = match out.get(k) {
                    Some(prev) => deep_merge(prev, v),
                    None => v.clone(),
                };
                out.insert(k.clone(), merged);
            }
            Value::Object(out)
        }
        (_, other) => other.clone(),
    }
}

/// Three-way configuration merge:
/// library defaults ← page-wide options ← element-derived options ←
/// call-site overrides, later sources winning per key.
///
/// Fails with a configuration error if any argument is not a plain map.
pub fn merge(
    defaults: &Value,
    global: &Value,
    element: &Value,
    overrides: &Value,
) -> Result<Value, EngineError> {
    for (name, v) in [
        ("defaults", defaults),
        ("global", global),
        ("element", element),
        ("overrides", overrides),
    ] {
        if !v.is_object() {
            return Err(EngineError::config(format!(
                "merge source '{name}' is not a plain map"
            )));
        }
    }
    let mut out = defaults.clone();
    for layer in [global, element, overrides] {
        out = deep_merge(&out, layer);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_disjoint_keys_union() {
        let a = json!({"x": 1});
        let b = json!({"y": 2});
        assert_eq!(deep_merge(&a, &b), json!({"x": 1, "y": 2}));
    }

    #[test]
    fn test_later_wins_per_leaf_and_siblings_survive() {
        let a = json!({"retry": {"max_attempts": 3, "jitter": 0.1}, "swap": "inner"});
        let b = json!({"retry": {"max_attempts": 5}});
        let out = deep_merge(&a, &b);
        assert_eq!(out["retry"]["max_attempts"], 5);
        assert_eq!(out["retry"]["jitter"], 0.1);
        assert_eq!(out["swap"], "inner");
    }

    #[test]
    fn test_arrays_are_replaced_not_concatenated() {
        let a = json!({"before": ["a", "b"]});
        let b = json!({"before": ["c"]});
        assert_eq!(deep_merge(&a, &b)["before"], json!(["c"]));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let a = json!({"x": {"y": 1}, "z": [1, 2]});
        assert_eq!(deep_merge(&a, &a), a);
    }

    #[test]
    fn test_non_map_source_is_rejected() {
        let obj = json!({});
        let arr = json!([]);
        let err = merge(&obj, &arr, &obj, &obj).unwrap_err();
        assert_eq!(err.as_label(), "config_error");
    }

    #[test]
    fn test_four_way_precedence() {
        let defaults = json!({"swap": "inner", "validate": false});
        let global = json!({"validate": true});
        let element = json!({"swap": "outer"});
        let overrides = json!({"swap": "none"});
        let out = merge(&defaults, &global, &element, &overrides).unwrap();
        assert_eq!(out["swap"], "none");
        assert_eq!(out["validate"], true);
    }
}
