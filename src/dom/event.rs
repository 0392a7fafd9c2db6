//! # Host events fed into the engine.
//!
//! A [`DomEvent`] is the raw input to trigger delegation: an event type and
//! the element it targeted. The engine marks `prevent_default` when the
//! non-modified trigger path consumes the event; the embedder reads the
//! flag back to suppress its native default action.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::dom::Element;

/// Synthetic event type that always matches an element's trigger,
/// regardless of its declared spec. Used for externally-driven value
/// changes (third-party widgets).
pub const FORCE_TRIGGER: &str = "markwire:force";

/// A raw host event entering trigger delegation.
#[derive(Clone, Debug)]
pub struct DomEvent {
    /// Event type ("click", "submit", "input", "blur", ...).
    pub event_type: String,
    /// The deepest element the event targeted.
    pub target: Element,
    default_prevented: Arc<AtomicBool>,
}

impl DomEvent {
    /// Creates a new event of the given type targeting `target`.
    pub fn new(event_type: &str, target: Element) -> Self {
        Self {
            event_type: event_type.to_string(),
            target,
            default_prevented: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Creates the synthetic force-trigger event for `target`.
    pub fn force(target: Element) -> Self {
        Self::new(FORCE_TRIGGER, target)
    }

    /// Suppresses the host's native default action.
    pub fn prevent_default(&self) {
        self.default_prevented.store(true, Ordering::Relaxed);
    }

    /// True when the engine consumed the event's default action.
    pub fn default_prevented(&self) -> bool {
        self.default_prevented.load(Ordering::Relaxed)
    }
}
