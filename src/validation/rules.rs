//! # Declarative rule parsing.
//!
//! Rules ride on `data-val-*` attributes: `data-val-<rule>` carries the
//! failure message, `data-val-<rule>-<param>` carries a parameter. An
//! attribute is a parameter exactly when a shorter `data-val-*` attribute
//! on the same element is its prefix, so `data-val-length-min` binds to
//! `data-val-length` without a hardcoded rule table.

use std::collections::HashMap;

use crate::dom::Element;

const PREFIX: &str = "data-val-";

/// One parsed validation rule.
#[derive(Clone, Debug, PartialEq)]
pub struct Rule {
    /// Rule name ("required", "length", "regex", ...).
    pub name: String,
    /// Failure message from the rule attribute's value.
    pub message: String,
    /// Parameter name → value.
    pub params: HashMap<String, String>,
}

/// Parses the element's `data-val-*` attributes into rules, in declaration
/// order. Validation itself is gated by `data-val="true"`, not here.
pub fn parse_rules(el: &Element) -> Vec<Rule> {
    let attrs = el.attrs();
    let val_attrs: Vec<(&String, &String)> = attrs
        .iter()
        .filter(|(name, _)| name.starts_with(PREFIX))
        .map(|(name, value)| (name, value))
        .collect();

    let is_param = |name: &str| {
        val_attrs
            .iter()
            .any(|(base, _)| base.as_str() != name && name.starts_with(&format!("{base}-")))
    };

    let mut rules = Vec::new();
    for (name, message) in &val_attrs {
        if is_param(name) {
            continue;
        }
        let rule_name = &name[PREFIX.len()..];
        let param_prefix = format!("{name}-");
        let params = val_attrs
            .iter()
            .filter_map(|(pname, pvalue)| {
                pname
                    .strip_prefix(param_prefix.as_str())
                    .map(|p| (p.to_string(), (*pvalue).clone()))
            })
            .collect();
        rules.push(Rule {
            name: rule_name.to_string(),
            message: (*message).clone(),
            params,
        });
    }
    rules
}
