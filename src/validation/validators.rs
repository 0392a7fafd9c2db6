//! # Built-in validators.
//!
//! A validator is a pure predicate over a field value and rule parameters.
//! Every validator except `required` passes empty values; presence is
//! `required`'s job alone.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::dom::{Document, Element};
use crate::model::FieldValue;

/// Extra context a validator may consult (`equalto` reads sibling fields).
pub struct ValidatorCx {
    pub field: Element,
    pub document: Document,
}

/// Named validation predicate.
pub type Validator =
    Arc<dyn Fn(&FieldValue, &HashMap<String, String>, &ValidatorCx) -> bool + Send + Sync>;

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern"))
}

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^https?://\S+$").expect("url pattern"))
}

fn text_len(value: &FieldValue) -> Option<usize> {
    value.as_text().map(|s| s.chars().count())
}

fn param_f64(params: &HashMap<String, String>, key: &str) -> Option<f64> {
    params.get(key).and_then(|v| v.parse().ok())
}

fn param_usize(params: &HashMap<String, String>, key: &str) -> Option<usize> {
    params.get(key).and_then(|v| v.parse().ok())
}

/// The built-in validator set, keyed by rule name.
pub fn builtin_validators() -> HashMap<String, Validator> {
    let mut out: HashMap<String, Validator> = HashMap::new();

    out.insert(
        "required".into(),
        Arc::new(|value, _, _| !value.is_empty()),
    );

    out.insert(
        "minlength".into(),
        Arc::new(|value, params, _| {
            if value.is_empty() {
                return true;
            }
            match (text_len(value), param_usize(params, "min")) {
                (Some(len), Some(min)) => len >= min,
                _ => true,
            }
        }),
    );

    out.insert(
        "maxlength".into(),
        Arc::new(|value, params, _| {
            match (text_len(value), param_usize(params, "max")) {
                (Some(len), Some(max)) => len <= max,
                _ => true,
            }
        }),
    );

    out.insert(
        "length".into(),
        Arc::new(|value, params, _| {
            if value.is_empty() {
                return true;
            }
            let Some(len) = text_len(value) else { return true };
            if let Some(min) = param_usize(params, "min") {
                if len < min {
                    return false;
                }
            }
            if let Some(max) = param_usize(params, "max") {
                if len > max {
                    return false;
                }
            }
            true
        }),
    );

    out.insert(
        "range".into(),
        Arc::new(|value, params, _| {
            if value.is_empty() {
                return true;
            }
            let Some(n) = value.as_text().and_then(|s| s.trim().parse::<f64>().ok()) else {
                return false;
            };
            if let Some(min) = param_f64(params, "min") {
                if n < min {
                    return false;
                }
            }
            if let Some(max) = param_f64(params, "max") {
                if n > max {
                    return false;
                }
            }
            true
        }),
    );

    out.insert(
        "regex".into(),
        Arc::new(|value, params, _| {
            if value.is_empty() {
                return true;
            }
            let (Some(text), Some(pattern)) = (value.as_text(), params.get("pattern")) else {
                return true;
            };
            match Regex::new(pattern) {
                Ok(re) => re.is_match(text),
                Err(e) => {
                    tracing::warn!(pattern = %pattern, error = %e, "invalid regex rule, skipping");
                    true
                }
            }
        }),
    );

    out.insert(
        "email".into(),
        Arc::new(|value, _, _| {
            if value.is_empty() {
                return true;
            }
            value.as_text().map(|s| email_re().is_match(s)).unwrap_or(true)
        }),
    );

    out.insert(
        "number".into(),
        Arc::new(|value, _, _| {
            if value.is_empty() {
                return true;
            }
            value
                .as_text()
                .map(|s| s.trim().parse::<f64>().is_ok())
                .unwrap_or(true)
        }),
    );

    out.insert(
        "url".into(),
        Arc::new(|value, _, _| {
            if value.is_empty() {
                return true;
            }
            value.as_text().map(|s| url_re().is_match(s)).unwrap_or(true)
        }),
    );

    out.insert(
        "equalto".into(),
        Arc::new(|value, params, cx| {
            if value.is_empty() {
                return true;
            }
            let Some(text) = value.as_text() else { return true };
            let Some(other) = params.get("other") else { return true };
            // The conventional "*.FieldName" prefix scopes to the same form.
            let other_name = other.strip_prefix("*.").unwrap_or(other);
            let scope = cx
                .field
                .enclosing_form()
                .unwrap_or_else(|| cx.document.root());
            let Some(other_el) = scope
                .descendants()
                .into_iter()
                .find(|el| el.name().as_deref() == Some(other_name))
            else {
                return true;
            };
            text == other_el.value()
        }),
    );

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    fn cx() -> ValidatorCx {
        let document = Document::new();
        let field = document.create_element("input");
        document.root().append_child(&field);
        ValidatorCx { field, document }
    }

    fn run(name: &str, value: FieldValue, params: &[(&str, &str)]) -> bool {
        let validators = builtin_validators();
        let params: HashMap<String, String> = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        validators[name](&value, &params, &cx())
    }

    #[test]
    fn test_required() {
        assert!(!run("required", FieldValue::Text("  ".into()), &[]));
        assert!(!run("required", FieldValue::Flag(false), &[]));
        assert!(run("required", FieldValue::Flag(true), &[]));
        assert!(run("required", FieldValue::Text("x".into()), &[]));
    }

    #[test]
    fn test_empty_passes_everything_but_required() {
        let empty = FieldValue::Text("".into());
        for name in ["length", "range", "regex", "email", "number", "url", "equalto"] {
            assert!(run(name, empty.clone(), &[]), "{name} should pass empty");
        }
    }

    #[test]
    fn test_length_counts_chars() {
        assert!(run("length", FieldValue::Text("héllo".into()), &[("min", "5"), ("max", "5")]));
        assert!(!run("length", FieldValue::Text("hi".into()), &[("min", "3")]));
        assert!(!run("maxlength", FieldValue::Text("toolong".into()), &[("max", "3")]));
        assert!(run("minlength", FieldValue::Text("abcd".into()), &[("min", "3")]));
    }

    #[test]
    fn test_range_and_number() {
        assert!(run("range", FieldValue::Text("5".into()), &[("min", "1"), ("max", "10")]));
        assert!(!run("range", FieldValue::Text("11".into()), &[("max", "10")]));
        assert!(!run("range", FieldValue::Text("abc".into()), &[("max", "10")]));
        assert!(run("number", FieldValue::Text("3.14".into()), &[]));
        assert!(!run("number", FieldValue::Text("pi".into()), &[]));
    }

    #[test]
    fn test_email_and_url() {
        assert!(run("email", FieldValue::Text("bob@example.com".into()), &[]));
        assert!(!run("email", FieldValue::Text("bob@nodot".into()), &[]));
        assert!(run("url", FieldValue::Text("https://example.com".into()), &[]));
        assert!(!run("url", FieldValue::Text("ftp://example.com".into()), &[]));
    }

    #[test]
    fn test_regex_invalid_pattern_passes() {
        assert!(run("regex", FieldValue::Text("anything".into()), &[("pattern", "([")]));
        assert!(run("regex", FieldValue::Text("abc".into()), &[("pattern", "^a")]));
        assert!(!run("regex", FieldValue::Text("xbc".into()), &[("pattern", "^a")]));
    }

    #[test]
    fn test_equalto_reads_sibling_in_form() {
        let document = Document::new();
        let form = document.create_element("form");
        document.root().append_child(&form);

        let password = document.create_element("input");
        password.set_attr("name", "Password");
        password.set_value("hunter2");
        form.append_child(&password);

        let confirm = document.create_element("input");
        confirm.set_attr("name", "Confirm");
        form.append_child(&confirm);

        let validators = builtin_validators();
        let params: HashMap<String, String> =
            [("other".to_string(), "*.Password".to_string())].into();
        let cx = ValidatorCx {
            field: confirm,
            document,
        };
        assert!(validators["equalto"](&FieldValue::Text("hunter2".into()), &params, &cx));
        assert!(!validators["equalto"](&FieldValue::Text("Hunter2".into()), &params, &cx));
    }
}
