//! # Interaction-affordance state.
//!
//! Captures an element's affordance state before a request, applies the
//! busy affordance, and restores the snapshot exactly afterwards. Restore
//! must reverse precisely what apply did: `aria-busy` is removed when it
//! was previously absent, and text content is only ever restored for
//! button-like elements (overwriting other field types would destroy
//! composite-widget internals).

use crate::config::Config;
use crate::dom::{Element, Selector};
use crate::error::EngineError;

/// Snapshot of one element's affordance state, plus what apply changed.
#[derive(Clone, Debug)]
pub struct StateSnapshot {
    element: Element,
    disabled: bool,
    aria_busy: Option<String>,
    classes: Vec<String>,
    /// Text content; captured for button-like elements only.
    text: Option<String>,
    /// Enclosing form and its prior `aria-busy`, when one exists.
    form: Option<(Element, Option<String>)>,
    /// Indicator element that apply un-hid.
    shown_indicator: Option<Element>,
}

/// Parsed `class, selector` / `class@selector` indicator spec. Either part
/// may be omitted.
#[derive(Debug, Default, PartialEq)]
pub struct IndicatorSpec {
    pub class: Option<String>,
    pub selector: Option<String>,
}

impl IndicatorSpec {
    /// Parses the compact indicator grammar.
    pub fn parse(input: &str) -> Result<Self, EngineError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(EngineError::config("empty indicator spec"));
        }
        let (class_part, selector_part) = if let Some((a, b)) = input.split_once('@') {
            (a.trim(), Some(b.trim()))
        } else if let Some((a, b)) = input.split_once(',') {
            (a.trim(), Some(b.trim()))
        } else if input.starts_with(['#', '.', '[']) && input.len() > 1 && !input[1..].contains(' ')
        {
            // A bare ".spinner"-style token is ambiguous; treat leading '#'
            // or '[' as a selector, leading '.' as a class.
            if input.starts_with('.') {
                (input.trim_start_matches('.'), None)
            } else {
                ("", Some(input))
            }
        } else {
            (input, None)
        };

        Ok(IndicatorSpec {
            class: (!class_part.is_empty()).then(|| class_part.trim_start_matches('.').to_string()),
            selector: selector_part
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string()),
        })
    }
}

/// Snapshots the element's current affordance state.
pub fn capture(element: &Element) -> StateSnapshot {
    let button_like = is_button_like(element);
    StateSnapshot {
        element: element.clone(),
        disabled: element.disabled(),
        aria_busy: element.attr("aria-busy"),
        classes: element.classes(),
        text: button_like.then(|| element.text()),
        form: element
            .enclosing_form()
            .filter(|f| *f != *element)
            .map(|f| {
                let busy = f.attr("aria-busy");
                (f, busy)
            }),
        shown_indicator: None,
    }
}

/// Applies the busy affordance, recording what changed on the snapshot.
///
/// Debounced interactions keep the element enabled (the user is still
/// typing) but still surface the busy markers.
pub fn apply(
    element: &Element,
    config: &Config,
    debounced: bool,
    snapshot: &mut StateSnapshot,
) -> Result<(), EngineError> {
    element.set_attr("aria-busy", "true");
    if let Some((form, _)) = &snapshot.form {
        form.set_attr("aria-busy", "true");
    }
    if !debounced {
        element.set_disabled(true);
    }

    if let Some(spec) = &config.indicator {
        let spec = IndicatorSpec::parse(spec)?;
        if let Some(class) = spec.class {
            element.add_class(&class);
        }
        if let Some(selector) = spec.selector {
            let sel = Selector::parse(&selector)?;
            if let Some(indicator) = element.document().root().query_first(&sel) {
                if indicator.hidden() {
                    indicator.set_hidden(false);
                    snapshot.shown_indicator = Some(indicator);
                }
            }
        }
    }
    Ok(())
}

/// Restores exactly the captured state and re-hides any shown indicator.
pub fn restore(snapshot: &StateSnapshot) {
    let el = &snapshot.element;
    el.set_disabled(snapshot.disabled);
    match &snapshot.aria_busy {
        Some(v) => el.set_attr("aria-busy", v),
        None => el.remove_attr("aria-busy"),
    }
    if let Some((form, busy)) = &snapshot.form {
        match busy {
            Some(v) => form.set_attr("aria-busy", v),
            None => form.remove_attr("aria-busy"),
        }
    }
    el.set_classes(snapshot.classes.clone());
    if let Some(text) = &snapshot.text {
        el.set_text(text);
    }
    if let Some(indicator) = &snapshot.shown_indicator {
        indicator.set_hidden(true);
    }
}

/// Buttons and button-like inputs are the only elements whose text content
/// the state manager may rewrite.
fn is_button_like(el: &Element) -> bool {
    match el.tag().as_str() {
        "button" => true,
        "input" => matches!(
            el.type_attr().as_deref(),
            Some("submit") | Some("button") | Some("reset")
        ),
        _ => false,
    }
}
