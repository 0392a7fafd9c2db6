//! # Element handle.
//!
//! [`Element`] is a cheap clone of `(document, node id)`. Equality is node
//! identity within the same store. Mutators lock the arena for the duration
//! of the call only.

use crate::dom::document::{Document, NodeId};
use crate::dom::Selector;

/// Handle to one element in a [`Document`].
#[derive(Clone)]
pub struct Element {
    pub(crate) doc: Document,
    pub(crate) id: NodeId,
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.doc.same_store(&other.doc)
    }
}
impl Eq for Element {}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{} #{:?}>", self.tag(), self.id.0)
    }
}

impl Element {
    /// The stable identity token for this element.
    pub fn node_id(&self) -> NodeId {
        self.id
    }

    /// The owning document.
    pub fn document(&self) -> Document {
        self.doc.clone()
    }

    /// Lowercased tag name.
    pub fn tag(&self) -> String {
        self.doc.read(|s| s.nodes[self.id.0 as usize].tag.clone())
    }

    // --- attributes ---

    /// Reads an attribute value.
    pub fn attr(&self, name: &str) -> Option<String> {
        self.doc.read(|s| {
            s.nodes[self.id.0 as usize]
                .attrs
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone())
        })
    }

    /// True when the attribute is present (any value).
    pub fn has_attr(&self, name: &str) -> bool {
        self.doc
            .read(|s| s.nodes[self.id.0 as usize].attrs.iter().any(|(n, _)| n == name))
    }

    /// Sets an attribute. Re-setting replaces the value in place, keeping
    /// the attribute's original position.
    pub fn set_attr(&self, name: &str, value: &str) {
        self.doc.write(|s| {
            let attrs = &mut s.nodes[self.id.0 as usize].attrs;
            match attrs.iter_mut().find(|(n, _)| n == name) {
                Some((_, v)) => *v = value.to_string(),
                None => attrs.push((name.to_string(), value.to_string())),
            }
        });
    }

    /// Removes an attribute if present.
    pub fn remove_attr(&self, name: &str) {
        self.doc.write(|s| {
            s.nodes[self.id.0 as usize].attrs.retain(|(n, _)| n != name);
        });
    }

    /// Snapshot of all attributes, in declaration order.
    pub fn attrs(&self) -> Vec<(String, String)> {
        self.doc.read(|s| s.nodes[self.id.0 as usize].attrs.clone())
    }

    /// The `name` attribute, when present and non-empty.
    pub fn name(&self) -> Option<String> {
        self.attr("name").filter(|n| !n.is_empty())
    }

    /// The `type` attribute, lowercased.
    pub fn type_attr(&self) -> Option<String> {
        self.attr("type").map(|t| t.to_ascii_lowercase())
    }

    // --- classes ---

    /// Adds a class if absent.
    pub fn add_class(&self, class: &str) {
        self.doc.write(|s| {
            let classes = &mut s.nodes[self.id.0 as usize].classes;
            if !classes.iter().any(|c| c == class) {
                classes.push(class.to_string());
            }
        });
    }

    /// Removes a class if present.
    pub fn remove_class(&self, class: &str) {
        self.doc.write(|s| {
            s.nodes[self.id.0 as usize].classes.retain(|c| c != class);
        });
    }

    /// True when the class is present.
    pub fn has_class(&self, class: &str) -> bool {
        self.doc
            .read(|s| s.nodes[self.id.0 as usize].classes.iter().any(|c| c == class))
    }

    /// Snapshot of the class list, in insertion order.
    pub fn classes(&self) -> Vec<String> {
        self.doc.read(|s| s.nodes[self.id.0 as usize].classes.clone())
    }

    /// Replaces the whole class list.
    pub fn set_classes(&self, classes: Vec<String>) {
        self.doc.write(|s| {
            s.nodes[self.id.0 as usize].classes = classes;
        });
    }

    // --- content and form state ---

    /// Text content of this element.
    pub fn text(&self) -> String {
        self.doc.read(|s| s.nodes[self.id.0 as usize].text.clone())
    }

    /// Replaces the text content.
    pub fn set_text(&self, text: &str) {
        self.doc.write(|s| {
            s.nodes[self.id.0 as usize].text = text.to_string();
        });
    }

    /// Form-control value (empty string when unset).
    pub fn value(&self) -> String {
        self.doc
            .read(|s| s.nodes[self.id.0 as usize].value.clone().unwrap_or_default())
    }

    /// Sets the form-control value.
    pub fn set_value(&self, value: &str) {
        self.doc.write(|s| {
            s.nodes[self.id.0 as usize].value = Some(value.to_string());
        });
    }

    /// Checked state (checkboxes, radios, selected options).
    pub fn checked(&self) -> bool {
        self.doc.read(|s| s.nodes[self.id.0 as usize].checked)
    }

    /// Sets the checked state.
    pub fn set_checked(&self, checked: bool) {
        self.doc.write(|s| {
            s.nodes[self.id.0 as usize].checked = checked;
        });
    }

    /// Disabled state.
    pub fn disabled(&self) -> bool {
        self.doc.read(|s| s.nodes[self.id.0 as usize].disabled)
    }

    /// Sets the disabled state.
    pub fn set_disabled(&self, disabled: bool) {
        self.doc.write(|s| {
            s.nodes[self.id.0 as usize].disabled = disabled;
        });
    }

    /// Own hidden flag (does not consult ancestors).
    pub fn hidden(&self) -> bool {
        self.doc.read(|s| s.nodes[self.id.0 as usize].hidden)
    }

    /// Sets the hidden flag.
    pub fn set_hidden(&self, hidden: bool) {
        self.doc.write(|s| {
            s.nodes[self.id.0 as usize].hidden = hidden;
        });
    }

    /// Visible = neither this element nor any ancestor is hidden.
    pub fn is_visible(&self) -> bool {
        if self.hidden() {
            return false;
        }
        self.ancestors().iter().all(|a| !a.hidden())
    }

    /// Moves keyboard focus to this element.
    pub fn focus(&self) {
        let id = self.id;
        self.doc.write(|s| s.focused = Some(id));
    }

    // --- tree ---

    /// Parent element, if attached.
    pub fn parent(&self) -> Option<Element> {
        let pid = self.doc.read(|s| s.nodes[self.id.0 as usize].parent)?;
        Some(self.doc.element(pid))
    }

    /// Ancestors from the parent upward to the root.
    pub fn ancestors(&self) -> Vec<Element> {
        let mut out = Vec::new();
        let mut cur = self.parent();
        while let Some(el) = cur {
            cur = el.parent();
            out.push(el);
        }
        out
    }

    /// Direct children, in document order.
    pub fn children(&self) -> Vec<Element> {
        self.doc.read(|s| {
            s.nodes[self.id.0 as usize]
                .children
                .iter()
                .map(|id| self.doc.element(*id))
                .collect()
        })
    }

    /// Appends `child` as the last child of this element.
    pub fn append_child(&self, child: &Element) {
        debug_assert!(self.doc.same_store(&child.doc));
        self.doc.write(|s| {
            s.nodes[child.id.0 as usize].parent = Some(self.id);
            s.nodes[self.id.0 as usize].children.push(child.id);
        });
    }

    /// Removes all children from this element.
    pub fn clear_children(&self) {
        self.doc.write(|s| {
            let children = std::mem::take(&mut s.nodes[self.id.0 as usize].children);
            for c in children {
                s.nodes[c.0 as usize].parent = None;
            }
        });
    }

    /// Preorder walk of all descendants (excluding self).
    pub fn descendants(&self) -> Vec<Element> {
        let mut out = Vec::new();
        let mut stack: Vec<Element> = self.children();
        stack.reverse();
        while let Some(el) = stack.pop() {
            out.push(el.clone());
            let mut kids = el.children();
            kids.reverse();
            stack.extend(kids);
        }
        out
    }

    /// The nearest `form` ancestor, including self.
    pub fn enclosing_form(&self) -> Option<Element> {
        if self.tag() == "form" {
            return Some(self.clone());
        }
        self.ancestors().into_iter().find(|a| a.tag() == "form")
    }

    /// First descendant (or self) matching the selector.
    pub fn query_first(&self, selector: &Selector) -> Option<Element> {
        if selector.matches(self) {
            return Some(self.clone());
        }
        self.descendants().into_iter().find(|el| selector.matches(el))
    }

    /// All descendants (excluding self) matching the selector.
    pub fn query(&self, selector: &Selector) -> Vec<Element> {
        self.descendants()
            .into_iter()
            .filter(|el| selector.matches(el))
            .collect()
    }
}
