//! # Minimal selector grammar.
//!
//! Supports exactly what the attribute vocabulary needs: `tag`, `#id`,
//! `.class`, `[attr]`, and compounds of a tag with one qualifier
//! (`input.widget`, `span[data-valmsg-for]`). Anything else is a
//! configuration error.

use crate::dom::Element;
use crate::error::EngineError;

/// One parsed simple selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    tag: Option<String>,
    id: Option<String>,
    class: Option<String>,
    attr: Option<String>,
}

impl Selector {
    /// Parses a simple selector.
    pub fn parse(input: &str) -> Result<Self, EngineError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(EngineError::config("empty selector"));
        }

        let mut sel = Selector {
            tag: None,
            id: None,
            class: None,
            attr: None,
        };

        let mut rest = input;
        // Leading tag name, if the selector does not start with a qualifier.
        if !rest.starts_with(['#', '.', '[']) {
            let end = rest
                .find(['#', '.', '['])
                .unwrap_or(rest.len());
            let (tag, tail) = rest.split_at(end);
            if !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                return Err(EngineError::config(format!("invalid selector '{input}'")));
            }
            sel.tag = Some(tag.to_ascii_lowercase());
            rest = tail;
        }

        match rest.chars().next() {
            None => {}
            Some('#') => sel.id = Some(rest[1..].to_string()),
            Some('.') => sel.class = Some(rest[1..].to_string()),
            Some('[') => {
                let body = rest
                    .strip_prefix('[')
                    .and_then(|r| r.strip_suffix(']'))
                    .ok_or_else(|| EngineError::config(format!("invalid selector '{input}'")))?;
                sel.attr = Some(body.to_string());
            }
            _ => return Err(EngineError::config(format!("invalid selector '{input}'"))),
        }

        if sel.id.as_deref() == Some("") || sel.class.as_deref() == Some("") {
            return Err(EngineError::config(format!("invalid selector '{input}'")));
        }
        Ok(sel)
    }

    /// True when the element matches every qualifier of this selector.
    pub fn matches(&self, el: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if el.tag() != *tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if el.attr("id").as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        if let Some(class) = &self.class {
            if !el.has_class(class) {
                return false;
            }
        }
        if let Some(attr) = &self.attr {
            if !el.has_attr(attr) {
                return false;
            }
        }
        true
    }
}
