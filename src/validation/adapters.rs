//! # Field adapters.
//!
//! An adapter answers four questions about a field: does it apply, what is
//! the field's value, which element should carry error styling, and which
//! element's blur means "touched". The default adapter understands native
//! controls; [`CompositeAdapter`] understands hidden-input-backed widgets.
//! Resolution is first-match-wins with the default always last.

use serde_json::Value;

use crate::dom::{Element, Selector};
use crate::model::{FieldValue, FilePart};

/// Adapter for one family of form fields.
pub trait FieldAdapter: Send + Sync + 'static {
    /// Registry and diagnostics name.
    fn name(&self) -> &str;

    /// True when this adapter understands `field`.
    fn matches(&self, field: &Element) -> bool;

    /// The field's current value.
    fn value(&self, field: &Element) -> FieldValue;

    /// The element to decorate with error styling.
    fn visible_element(&self, field: &Element) -> Element {
        field.clone()
    }

    /// The element whose blur marks the field touched.
    fn blur_target(&self, field: &Element) -> Element {
        self.visible_element(field)
    }
}

/// Native controls: inputs, selects, textareas.
pub struct DefaultAdapter;

impl FieldAdapter for DefaultAdapter {
    fn name(&self) -> &str {
        "default"
    }

    fn matches(&self, _field: &Element) -> bool {
        true
    }

    fn value(&self, field: &Element) -> FieldValue {
        match field.tag().as_str() {
            "select" => {
                let selected: Vec<String> = field
                    .children()
                    .into_iter()
                    .filter(|opt| opt.tag() == "option" && opt.checked())
                    .map(|opt| opt.value())
                    .collect();
                if field.has_attr("multiple") {
                    FieldValue::List(selected)
                } else {
                    FieldValue::Text(selected.into_iter().next().unwrap_or_else(|| field.value()))
                }
            }
            "input" => match field.type_attr().as_deref() {
                Some("checkbox") => FieldValue::Flag(field.checked()),
                Some("radio") => FieldValue::Text(radio_group_value(field)),
                Some("file") => FieldValue::File(FilePart {
                    filename: field.value(),
                    content_type: field
                        .attr("data-content-type")
                        .unwrap_or_else(|| "application/octet-stream".to_string()),
                    bytes: field.text().into_bytes(),
                }),
                _ => FieldValue::Text(field.value()),
            },
            _ => FieldValue::Text(field.value()),
        }
    }
}

/// The checked member's value of the radio group `field` belongs to.
fn radio_group_value(field: &Element) -> String {
    let Some(name) = field.name() else {
        return if field.checked() { field.value() } else { String::new() };
    };
    let scope = field
        .enclosing_form()
        .unwrap_or_else(|| field.document().root());
    scope
        .descendants()
        .into_iter()
        .find(|el| {
            el.tag() == "input"
                && el.type_attr().as_deref() == Some("radio")
                && el.name().as_deref() == Some(name.as_str())
                && el.checked()
        })
        .map(|el| el.value())
        .unwrap_or_default()
}

/// Hidden-input-backed composite widgets.
///
/// The widget renders its own UI inside a wrapper marked `data-widget` and
/// mirrors its state into a hidden input. The wrapper carries the real
/// value in `data-widget-value`: plain text, a JSON array (multi-valued
/// widgets), or the legacy `{"name": ..., "value": ...}` object shape.
pub struct CompositeAdapter;

impl CompositeAdapter {
    fn wrapper(field: &Element) -> Option<Element> {
        field
            .ancestors()
            .into_iter()
            .find(|a| a.has_attr("data-widget"))
    }
}

impl FieldAdapter for CompositeAdapter {
    fn name(&self) -> &str {
        "composite"
    }

    fn matches(&self, field: &Element) -> bool {
        field.tag() == "input"
            && field.type_attr().as_deref() == Some("hidden")
            && Self::wrapper(field).is_some()
    }

    fn value(&self, field: &Element) -> FieldValue {
        let Some(wrapper) = Self::wrapper(field) else {
            return FieldValue::Text(field.value());
        };
        let Some(raw) = wrapper.attr("data-widget-value") else {
            return FieldValue::Text(field.value());
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(items)) => FieldValue::List(
                items
                    .into_iter()
                    .map(|v| match v {
                        Value::String(s) => s,
                        other => other.to_string(),
                    })
                    .collect(),
            ),
            Ok(Value::Object(map)) => {
                // Legacy {name, value} shape flattens to its value.
                let v = map.get("value").cloned().unwrap_or(Value::Null);
                match v {
                    Value::String(s) => FieldValue::Text(s),
                    Value::Null => FieldValue::Text(String::new()),
                    other => FieldValue::Text(other.to_string()),
                }
            }
            Ok(Value::String(s)) => FieldValue::Text(s),
            _ => FieldValue::Text(raw),
        }
    }

    fn visible_element(&self, field: &Element) -> Element {
        let Some(wrapper) = Self::wrapper(field) else {
            return field.clone();
        };
        let focus = Selector::parse(".widget-focus").ok();
        focus
            .and_then(|sel| wrapper.query(&sel).into_iter().next())
            .unwrap_or(wrapper)
    }
}
