//! # Response swap strategies.
//!
//! A [`Swap`] writes the response body into the resolved target element.
//! Named strategies live in the engine's swap registry; `"inner"` is the
//! default. `"outer"` morphs the target in place when the body is a single
//! well-formed fragment, so the element identity (and any listeners bound
//! by node id) survives the swap.

use crate::dom::Element;
use crate::error::EngineError;

/// One swap strategy, applied to the resolved target.
pub trait Swap: Send + Sync + 'static {
    fn apply(&self, target: &Element, body: &str) -> Result<(), EngineError>;
}

/// Replaces the target's content, keeping the element itself.
pub struct InnerSwap;

impl Swap for InnerSwap {
    fn apply(&self, target: &Element, body: &str) -> Result<(), EngineError> {
        target.clear_children();
        target.set_text(body);
        Ok(())
    }
}

/// Replaces the target itself. The target node is morphed in place rather
/// than detached, so the swap survives without invalidating handles.
pub struct OuterSwap;

impl Swap for OuterSwap {
    fn apply(&self, target: &Element, body: &str) -> Result<(), EngineError> {
        match parse_fragment(body) {
            Some(frag) => {
                target.clear_children();
                for (name, _) in target.attrs() {
                    if !frag.attrs.iter().any(|(n, _)| *n == name) {
                        target.remove_attr(&name);
                    }
                }
                for (name, value) in &frag.attrs {
                    target.set_attr(name, value);
                }
                let classes = frag
                    .attrs
                    .iter()
                    .find(|(n, _)| n == "class")
                    .map(|(_, v)| v.split_whitespace().map(str::to_string).collect())
                    .unwrap_or_default();
                target.set_classes(classes);
                target.set_text(&frag.inner);
            }
            None => {
                // Not a single-root fragment; fall back to raw content.
                target.clear_children();
                target.set_text(body);
            }
        }
        Ok(())
    }
}

/// Discards the body. Useful for fire-and-forget interactions.
pub struct NoneSwap;

impl Swap for NoneSwap {
    fn apply(&self, _target: &Element, _body: &str) -> Result<(), EngineError> {
        Ok(())
    }
}

/// A parsed single-root fragment: `<tag attrs>inner</tag>`.
struct Fragment {
    attrs: Vec<(String, String)>,
    inner: String,
}

/// Minimal single-root fragment recognizer. Returns `None` for anything
/// that is not exactly one element with a matching close tag.
fn parse_fragment(body: &str) -> Option<Fragment> {
    let body = body.trim();
    let rest = body.strip_prefix('<')?;
    let open_end = rest.find('>')?;
    let open = &rest[..open_end];
    let tag = open
        .split_whitespace()
        .next()
        .filter(|t| !t.is_empty() && t.chars().all(|c| c.is_ascii_alphanumeric()))?
        .to_ascii_lowercase();

    let close = format!("</{tag}>");
    let after_open = &rest[open_end + 1..];
    let inner = after_open.strip_suffix(close.as_str())?;
    // Nested same-tag elements would need a real parser.
    if inner.contains(&format!("<{tag}")) || inner.contains(close.as_str()) {
        return None;
    }

    let mut attrs = Vec::new();
    let attr_text = open[tag.len()..].trim();
    let mut chars = attr_text.char_indices().peekable();
    while let Some((start, c)) = chars.next() {
        if c.is_whitespace() {
            continue;
        }
        let mut end = attr_text.len();
        let mut eq = None;
        for (i, c2) in attr_text[start..].char_indices() {
            let i = start + i;
            if c2 == '=' && eq.is_none() {
                eq = Some(i);
            }
            if c2 == '"' && eq.is_some() && i > eq.unwrap() + 1 {
                end = i + 1;
                break;
            }
            if c2.is_whitespace() && eq.is_none() {
                end = i;
                break;
            }
        }
        let token = &attr_text[start..end];
        match token.split_once('=') {
            Some((name, value)) => {
                let value = value.trim_matches('"');
                attrs.push((name.trim().to_string(), value.to_string()));
            }
            None => attrs.push((token.trim().to_string(), String::new())),
        }
        while let Some((i, _)) = chars.peek() {
            if *i < end {
                chars.next();
            } else {
                break;
            }
        }
    }
    attrs.retain(|(n, _)| !n.is_empty());

    Some(Fragment {
        attrs,
        inner: inner.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    fn target() -> Element {
        let doc = Document::new();
        let div = doc.create_element("div");
        div.set_attr("id", "panel");
        doc.root().append_child(&div);
        div
    }

    #[test]
    fn test_inner_replaces_content_keeps_element() {
        let el = target();
        let child = el.document().create_element("span");
        el.append_child(&child);
        InnerSwap.apply(&el, "hello").unwrap();
        assert_eq!(el.text(), "hello");
        assert!(el.children().is_empty());
        assert_eq!(el.attr("id").as_deref(), Some("panel"));
    }

    #[test]
    fn test_outer_morphs_attributes_in_place() {
        let el = target();
        let id = el.node_id();
        OuterSwap
            .apply(&el, r#"<div class="fresh" data-state="done">updated</div>"#)
            .unwrap();
        assert_eq!(el.node_id(), id);
        assert_eq!(el.text(), "updated");
        assert_eq!(el.attr("data-state").as_deref(), Some("done"));
        assert!(el.has_class("fresh"));
        assert!(el.attr("id").is_none());
    }

    #[test]
    fn test_outer_falls_back_on_raw_bodies() {
        let el = target();
        OuterSwap.apply(&el, "plain text, not markup").unwrap();
        assert_eq!(el.text(), "plain text, not markup");
    }

    #[test]
    fn test_none_swap_leaves_target_untouched() {
        let el = target();
        el.set_text("before");
        NoneSwap.apply(&el, "after").unwrap();
        assert_eq!(el.text(), "before");
    }

    #[test]
    fn test_fragment_recognizer() {
        assert!(parse_fragment("<div>x</div>").is_some());
        assert!(parse_fragment("<div>x</div><div>y</div>").is_none());
        assert!(parse_fragment("no markup").is_none());
        assert!(parse_fragment("<div><div>nested</div></div>").is_none());
        let frag = parse_fragment(r#"<span title="a b">t</span>"#).unwrap();
        assert_eq!(frag.attrs, vec![("title".to_string(), "a b".to_string())]);
        assert_eq!(frag.inner, "t");
    }
}
