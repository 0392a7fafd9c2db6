//! # Trigger specs.
//!
//! A `trigger` option is a comma-separated list of specs. Each spec is:
//!
//! ```text
//! [selector@]event [delay:<N>ms] [throttle:<N>ms]
//! ```
//!
//! The optional selector scopes the trigger to matching descendants, so a
//! single marked container can own many interactive children. `delay`
//! debounces, `throttle` rate-limits. A spec may carry both; the throttle
//! gate runs first and only events that pass it arm the debounce.

use std::time::Duration;

use crate::dom::Selector;
use crate::error::EngineError;

/// One parsed trigger spec.
#[derive(Clone, Debug, PartialEq)]
pub struct TriggerSpec {
    /// Event name ("click", "change", ...).
    pub event: String,
    /// Optional sub-selector scoping the trigger to matching descendants.
    pub selector: Option<String>,
    /// Debounce window.
    pub delay: Option<Duration>,
    /// Minimum interval between fires.
    pub throttle: Option<Duration>,
}

impl TriggerSpec {
    /// A bare event trigger with no modifiers.
    pub fn event(name: &str) -> Self {
        Self {
            event: name.to_string(),
            selector: None,
            delay: None,
            throttle: None,
        }
    }
}

/// Parses a comma-separated trigger list.
pub fn parse_triggers(input: &str) -> Result<Vec<TriggerSpec>, EngineError> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_one)
        .collect()
}

fn parse_one(spec: &str) -> Result<TriggerSpec, EngineError> {
    let mut tokens = spec.split_whitespace();
    let head = tokens
        .next()
        .ok_or_else(|| EngineError::config("empty trigger spec"))?;

    let (selector, event) = match head.rsplit_once('@') {
        Some((sel, ev)) if !sel.is_empty() => {
            // Validate the selector eagerly so bad markup fails at init.
            Selector::parse(sel)?;
            (Some(sel.to_string()), ev)
        }
        _ => (None, head),
    };
    if event.is_empty() {
        return Err(EngineError::config(format!("trigger '{spec}' has no event")));
    }

    let mut out = TriggerSpec {
        event: event.to_string(),
        selector,
        delay: None,
        throttle: None,
    };
    for token in tokens {
        if let Some(ms) = token.strip_prefix("delay:") {
            out.delay = Some(parse_ms(spec, ms)?);
        } else if let Some(ms) = token.strip_prefix("throttle:") {
            out.throttle = Some(parse_ms(spec, ms)?);
        } else {
            return Err(EngineError::config(format!(
                "trigger '{spec}': unknown modifier '{token}'"
            )));
        }
    }
    Ok(out)
}

fn parse_ms(spec: &str, text: &str) -> Result<Duration, EngineError> {
    text.strip_suffix("ms")
        .and_then(|n| n.parse::<u64>().ok())
        .map(Duration::from_millis)
        .ok_or_else(|| {
            EngineError::config(format!("trigger '{spec}': expected '<N>ms', got '{text}'"))
        })
}

/// The natural trigger for an element that declares none.
pub fn default_trigger_for(tag: &str, type_attr: Option<&str>) -> &'static str {
    match tag {
        "form" => "submit",
        "select" | "textarea" => "change",
        "input" => match type_attr {
            Some("submit") | Some("button") | Some("reset") | Some("image") => "click",
            _ => "change",
        },
        _ => "click",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_event() {
        assert_eq!(parse_triggers("click").unwrap(), vec![TriggerSpec::event("click")]);
    }

    #[test]
    fn test_modifiers() {
        let specs = parse_triggers("input delay:300ms, click throttle:200ms").unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].event, "input");
        assert_eq!(specs[0].delay, Some(Duration::from_millis(300)));
        assert_eq!(specs[1].throttle, Some(Duration::from_millis(200)));
    }

    #[test]
    fn test_sub_selector() {
        let specs = parse_triggers(".row@click").unwrap();
        assert_eq!(specs[0].selector.as_deref(), Some(".row"));
        assert_eq!(specs[0].event, "click");
    }

    #[test]
    fn test_both_modifiers_on_one_spec() {
        let specs = parse_triggers("click delay:300ms throttle:100ms").unwrap();
        assert_eq!(specs[0].delay, Some(Duration::from_millis(300)));
        assert_eq!(specs[0].throttle, Some(Duration::from_millis(100)));
    }

    #[test]
    fn test_rejects_bad_specs() {
        assert!(parse_triggers("click delay:soon").is_err());
        assert!(parse_triggers("click frobnicate:1ms").is_err());
        assert!(parse_triggers(".row@").is_err());
    }

    #[test]
    fn test_default_triggers() {
        assert_eq!(default_trigger_for("form", None), "submit");
        assert_eq!(default_trigger_for("input", Some("text")), "change");
        assert_eq!(default_trigger_for("input", Some("submit")), "click");
        assert_eq!(default_trigger_for("select", None), "change");
        assert_eq!(default_trigger_for("button", None), "click");
    }
}
