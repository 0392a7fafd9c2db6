//! # Element-attribute-derived options.
//!
//! Reads the `mw-*` vocabulary off an element into a JSON option map that
//! participates in the configuration merge. One attribute per HTTP verb
//! carries the target URL; the remaining attributes map one-to-one onto
//! recognized config keys.

use serde_json::{json, Map, Value};

use crate::dom::Element;
use crate::error::EngineError;

/// Verb attributes in resolution order.
const VERBS: &[(&str, &str)] = &[
    ("mw-get", "GET"),
    ("mw-post", "POST"),
    ("mw-put", "PUT"),
    ("mw-patch", "PATCH"),
    ("mw-delete", "DELETE"),
];

/// True when the element carries any http-verb attribute. This is the
/// short-circuit marker check used by trigger delegation.
pub(crate) fn is_marked(el: &Element) -> bool {
    VERBS.iter().any(|(attr, _)| el.has_attr(attr))
}

/// Derives the option map from an element's `mw-*` attributes.
pub fn options_from(el: &Element) -> Result<Value, EngineError> {
    let mut out = Map::new();

    for (attr, method) in VERBS {
        if let Some(url) = el.attr(attr) {
            out.insert("method".into(), json!(method));
            out.insert("url".into(), json!(url));
            break;
        }
    }

    for (attr, key) in [
        ("mw-target", "target"),
        ("mw-swap", "swap"),
        ("mw-serialize", "serialize"),
        ("mw-sync", "sync"),
        ("mw-confirm", "confirm"),
        ("mw-trigger", "trigger"),
        ("mw-indicator", "indicator"),
        ("mw-collect", "collect"),
    ] {
        if let Some(v) = el.attr(attr) {
            out.insert(key.into(), json!(v));
        }
    }

    for (attr, key) in [("mw-before", "before"), ("mw-after", "after")] {
        if let Some(v) = el.attr(attr) {
            let names: Vec<String> = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            out.insert(key.into(), json!(names));
        }
    }

    for (attr, key) in [("mw-validate", "validate"), ("mw-focus", "focus")] {
        if let Some(v) = el.attr(attr) {
            out.insert(key.into(), json!(v.trim() != "false"));
        }
    }

    if let Some(v) = el.attr("mw-retry") {
        let trimmed = v.trim();
        let value = match trimmed {
            "true" => json!(true),
            "false" => json!(false),
            _ if trimmed.starts_with('{') => serde_json::from_str(trimmed)
                .map_err(|e| EngineError::config(format!("invalid mw-retry JSON: {e}")))?,
            _ => json!(trimmed),
        };
        out.insert("retry".into(), value);
    }

    Ok(Value::Object(out))
}
