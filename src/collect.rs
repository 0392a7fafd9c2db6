//! # Field collection.
//!
//! Resolves the collection source (form, element, selector scope) and reads
//! name/value pairs out of it through the adapter chain. Radio groups
//! collapse to one pair; disabled fields never contribute.

use std::collections::HashSet;

use crate::config::CollectSource;
use crate::dom::{Element, Selector};
use crate::error::EngineError;
use crate::model::{Collected, FieldValue};
use crate::validation::FieldValidator;

/// Collects field data for an interaction rooted at `element`.
pub fn collect(
    element: &Element,
    source: &CollectSource,
    validator: &FieldValidator,
) -> Result<Collected, EngineError> {
    let roots: Vec<Element> = match source {
        CollectSource::None => return Ok(Collected::default()),
        CollectSource::SelfOnly => vec![element.clone()],
        CollectSource::Form => vec![element.enclosing_form().ok_or_else(|| {
            EngineError::config("collect source 'form' but the element has no enclosing form")
        })?],
        CollectSource::Auto => {
            vec![element.enclosing_form().unwrap_or_else(|| element.clone())]
        }
        CollectSource::Selector(sel) => {
            let sel = Selector::parse(sel)?;
            let matches = element.document().root().query_first(&sel);
            match matches {
                Some(first) => {
                    let mut all = vec![first];
                    let rest: Vec<Element> = element
                        .document()
                        .root()
                        .query(&sel)
                        .into_iter()
                        .filter(|el| !all.contains(el))
                        .collect();
                    all.extend(rest);
                    all
                }
                None => Vec::new(),
            }
        }
    };

    let from_form = roots.len() == 1 && roots[0].tag() == "form";
    let mut pairs = Vec::new();
    let mut seen_radio_groups: HashSet<String> = HashSet::new();

    for root in &roots {
        let mut fields = vec![root.clone()];
        fields.extend(root.descendants());
        for field in fields {
            if !matches!(field.tag().as_str(), "input" | "select" | "textarea") {
                continue;
            }
            let Some(name) = field.name() else { continue };
            if field.disabled() {
                continue;
            }
            if field.type_attr().as_deref() == Some("radio") {
                // One pair per group, from whichever member is checked.
                if !seen_radio_groups.insert(name.clone()) {
                    continue;
                }
            }
            let value = validator.adapter_for(&field).value(&field);
            // Unchecked lone checkboxes still contribute their flag; file
            // fields with no selection do not.
            if let FieldValue::File(f) = &value {
                if f.filename.is_empty() {
                    continue;
                }
            }
            pairs.push((name, value));
        }
    }

    Ok(Collected {
        source: roots.into_iter().next(),
        from_form,
        pairs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    fn form_fixture() -> (Document, Element) {
        let doc = Document::new();
        let form = doc.create_element("form");
        doc.root().append_child(&form);

        let q = doc.create_element("input");
        q.set_attr("name", "q");
        q.set_value("bob");
        form.append_child(&q);

        let sub = doc.create_element("input");
        sub.set_attr("type", "checkbox");
        sub.set_attr("name", "subscribe");
        sub.set_checked(true);
        form.append_child(&sub);

        for v in ["a", "b"] {
            let r = doc.create_element("input");
            r.set_attr("type", "radio");
            r.set_attr("name", "choice");
            r.set_value(v);
            if v == "b" {
                r.set_checked(true);
            }
            form.append_child(&r);
        }

        (doc, form)
    }

    #[test]
    fn test_auto_collects_enclosing_form() {
        let (_, form) = form_fixture();
        let button = form.document().create_element("button");
        form.append_child(&button);

        let data = collect(&button, &CollectSource::Auto, &FieldValidator::default()).unwrap();
        assert!(data.from_form);
        assert_eq!(data.get("q"), Some(&FieldValue::Text("bob".into())));
        assert_eq!(data.get("subscribe"), Some(&FieldValue::Flag(true)));
        assert_eq!(data.get("choice"), Some(&FieldValue::Text("b".into())));
        assert_eq!(data.pairs.len(), 3);
    }

    #[test]
    fn test_auto_without_form_reads_self() {
        let doc = Document::new();
        let input = doc.create_element("input");
        input.set_attr("name", "q");
        input.set_value("solo");
        doc.root().append_child(&input);

        let data = collect(&input, &CollectSource::Auto, &FieldValidator::default()).unwrap();
        assert!(!data.from_form);
        assert_eq!(data.pairs.len(), 1);
        assert_eq!(data.get("q"), Some(&FieldValue::Text("solo".into())));
    }

    #[test]
    fn test_disabled_fields_are_skipped() {
        let (doc, form) = form_fixture();
        let extra = doc.create_element("input");
        extra.set_attr("name", "off");
        extra.set_disabled(true);
        form.append_child(&extra);

        let data = collect(&form, &CollectSource::Form, &FieldValidator::default()).unwrap();
        assert!(data.get("off").is_none());
    }

    #[test]
    fn test_form_source_requires_a_form() {
        let doc = Document::new();
        let button = doc.create_element("button");
        doc.root().append_child(&button);
        assert!(collect(&button, &CollectSource::Form, &FieldValidator::default()).is_err());
    }

    #[test]
    fn test_none_collects_nothing() {
        let (_, form) = form_fixture();
        let data = collect(&form, &CollectSource::None, &FieldValidator::default()).unwrap();
        assert!(data.pairs.is_empty());
        assert!(data.source.is_none());
    }

    #[test]
    fn test_selector_source() {
        let (doc, _) = form_fixture();
        let panel = doc.create_element("div");
        panel.set_attr("id", "filters");
        doc.root().append_child(&panel);
        let input = doc.create_element("input");
        input.set_attr("name", "page");
        input.set_value("2");
        panel.append_child(&input);

        let data = collect(
            &doc.root(),
            &CollectSource::Selector("#filters".into()),
            &FieldValidator::default(),
        )
        .unwrap();
        assert!(!data.from_form);
        assert_eq!(data.get("page"), Some(&FieldValue::Text("2".into())));
        // Fields outside the selector scope stay out.
        assert!(data.get("q").is_none());
    }
}
