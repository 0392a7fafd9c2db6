//! # Arena-backed element store.
//!
//! Nodes live in a flat arena indexed by [`NodeId`]; an [`Element`] handle is
//! a `(document, id)` pair. All access goes through short-lived internal
//! locks, so handles are cheap to clone and safe to hold across await
//! points without pinning any lock.

use std::sync::{Arc, RwLock};

use crate::dom::Element;

/// Stable per-node identity token inside one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

/// Mutable payload of one node.
#[derive(Debug, Default, Clone)]
pub(crate) struct NodeData {
    pub tag: String,
    /// Attributes in declaration order. Rule parsing depends on first-seen
    /// order, so this is a Vec, not a map.
    pub attrs: Vec<(String, String)>,
    pub classes: Vec<String>,
    /// Text content. For leaf "rendering" purposes only.
    pub text: String,
    /// Form-control value.
    pub value: Option<String>,
    pub checked: bool,
    pub disabled: bool,
    pub hidden: bool,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

pub(crate) struct Store {
    pub nodes: Vec<NodeData>,
    pub root: NodeId,
    pub focused: Option<NodeId>,
}

/// An in-memory element tree.
///
/// Clones share the same underlying store.
#[derive(Clone)]
pub struct Document {
    pub(crate) inner: Arc<RwLock<Store>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates a document with a single `body` root element.
    pub fn new() -> Self {
        let root = NodeData {
            tag: "body".to_string(),
            ..NodeData::default()
        };
        Self {
            inner: Arc::new(RwLock::new(Store {
                nodes: vec![root],
                root: NodeId(0),
                focused: None,
            })),
        }
    }

    /// The document root element.
    pub fn root(&self) -> Element {
        let id = self.inner.read().expect("dom lock").root;
        self.element(id)
    }

    /// Creates a detached element with the given tag.
    pub fn create_element(&self, tag: &str) -> Element {
        let id = {
            let mut store = self.inner.write().expect("dom lock");
            let id = NodeId(store.nodes.len() as u32);
            store.nodes.push(NodeData {
                tag: tag.to_string(),
                ..NodeData::default()
            });
            id
        };
        self.element(id)
    }

    /// The currently focused element, if any.
    pub fn focused(&self) -> Option<Element> {
        let id = self.inner.read().expect("dom lock").focused?;
        Some(self.element(id))
    }

    pub(crate) fn element(&self, id: NodeId) -> Element {
        Element {
            doc: self.clone(),
            id,
        }
    }

    pub(crate) fn same_store(&self, other: &Document) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn read<R>(&self, f: impl FnOnce(&Store) -> R) -> R {
        f(&self.inner.read().expect("dom lock"))
    }

    pub(crate) fn write<R>(&self, f: impl FnOnce(&mut Store) -> R) -> R {
        f(&mut self.inner.write().expect("dom lock"))
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let store = self.inner.read().expect("dom lock");
        f.debug_struct("Document")
            .field("nodes", &store.nodes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_is_body() {
        let doc = Document::new();
        assert_eq!(doc.root().tag(), "body");
    }

    #[test]
    fn test_created_elements_are_detached() {
        let doc = Document::new();
        let el = doc.create_element("div");
        assert!(el.parent().is_none());
        assert_eq!(doc.root().children().len(), 0);
    }
}
