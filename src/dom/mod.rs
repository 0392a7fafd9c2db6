//! In-memory host document facade.
//!
//! The engine reads and writes element attributes, classes, form values,
//! and subtree content through this module; it never owns rendering. The
//! arena-backed [`Document`] is the embedding and test host: a production
//! embedder feeds events in via `Engine::dispatch` and reads mutations back
//! out of the document.

mod document;
mod element;
mod event;
mod selector;

pub use document::{Document, NodeId};
pub use element::Element;
pub use event::{DomEvent, FORCE_TRIGGER};
pub use selector::Selector;
