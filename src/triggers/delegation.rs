//! # Event delegation.
//!
//! The engine listens at the document root and resolves each dispatched
//! event by walking from the event target upward until it finds a marked
//! element whose trigger spec matches. Per-node debounce generations and
//! throttle timestamps live here; the engine consults them before running
//! a pipeline.
//!
//! ```text
//! dispatch(event)
//!    └── resolve: target → ancestors, first marked element with a
//!        matching spec wins (force events match unconditionally)
//!           └── throttle_ok / arm_debounce gate the actual run
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::is_marked;
use crate::dom::{DomEvent, Element, NodeId, Selector, FORCE_TRIGGER};
use crate::error::EngineError;
use crate::triggers::spec::{default_trigger_for, parse_triggers, TriggerSpec};

/// A resolved trigger: the owning marked element and the matched spec.
#[derive(Clone, Debug)]
pub struct Resolution {
    pub element: Element,
    pub spec: TriggerSpec,
}

#[derive(Default)]
struct NodeTimers {
    debounce_gen: u64,
    last_fire: Option<Instant>,
}

/// Delegated-listener bookkeeping.
#[derive(Default)]
pub struct Delegate {
    listened: RwLock<HashSet<String>>,
    timers: RwLock<HashMap<NodeId, NodeTimers>>,
}

impl Delegate {
    /// Records a root-level listener for `event_type`. Idempotent; returns
    /// `true` the first time, so the host binds each listener exactly once.
    pub fn register(&self, event_type: &str) -> bool {
        self.listened
            .write()
            .expect("delegate lock")
            .insert(event_type.to_string())
    }

    /// True when a listener for `event_type` has been registered.
    pub fn is_listening(&self, event_type: &str) -> bool {
        self.listened
            .read()
            .expect("delegate lock")
            .contains(event_type)
    }

    /// Resolves a dispatched event to a marked element and matching spec.
    ///
    /// The walk starts at the event target and continues upward past
    /// non-matching marked elements. Force events match any marked element
    /// and bypass delay and throttle modifiers.
    pub fn resolve(&self, event: &DomEvent) -> Result<Option<Resolution>, EngineError> {
        let forced = event.event_type == FORCE_TRIGGER;
        let mut chain = vec![event.target.clone()];
        chain.extend(event.target.ancestors());

        for candidate in chain {
            if !is_marked(&candidate) {
                continue;
            }
            if forced {
                return Ok(Some(Resolution {
                    element: candidate,
                    spec: TriggerSpec::event(FORCE_TRIGGER),
                }));
            }
            for spec in specs_for(&candidate)? {
                if spec.event != event.event_type {
                    continue;
                }
                if let Some(sel) = &spec.selector {
                    let sel = Selector::parse(sel)?;
                    if !sel.matches(&event.target) {
                        continue;
                    }
                }
                return Ok(Some(Resolution {
                    element: candidate,
                    spec,
                }));
            }
        }
        Ok(None)
    }

    /// Throttle gate: `true` records a fire, `false` drops the event.
    pub fn throttle_ok(&self, node: NodeId, interval: Duration) -> bool {
        let mut timers = self.timers.write().expect("delegate lock");
        let entry = timers.entry(node).or_default();
        let now = Instant::now();
        if let Some(last) = entry.last_fire {
            if now.duration_since(last) < interval {
                return false;
            }
        }
        entry.last_fire = Some(now);
        true
    }

    /// Arms a debounce for the node, invalidating any pending one. The
    /// returned generation is checked with [`Delegate::debounce_current`]
    /// after the delay elapses.
    pub fn arm_debounce(&self, node: NodeId) -> u64 {
        let mut timers = self.timers.write().expect("delegate lock");
        let entry = timers.entry(node).or_default();
        entry.debounce_gen += 1;
        entry.debounce_gen
    }

    /// True when `generation` is still the latest armed debounce for `node`.
    pub fn debounce_current(&self, node: NodeId, generation: u64) -> bool {
        self.timers
            .read()
            .expect("delegate lock")
            .get(&node)
            .map(|t| t.debounce_gen == generation)
            .unwrap_or(false)
    }

    /// Drops all listeners and per-node timers.
    pub fn teardown(&self) {
        self.listened.write().expect("delegate lock").clear();
        self.timers.write().expect("delegate lock").clear();
    }
}

/// The element's trigger specs: its `mw-trigger` attribute, or the natural
/// default for its tag.
fn specs_for(el: &Element) -> Result<Vec<TriggerSpec>, EngineError> {
    match el.attr("mw-trigger") {
        Some(raw) => parse_triggers(&raw),
        None => Ok(vec![TriggerSpec::event(default_trigger_for(
            &el.tag(),
            el.type_attr().as_deref(),
        ))]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    fn marked_button() -> (Document, Element) {
        let doc = Document::new();
        let button = doc.create_element("button");
        button.set_attr("mw-get", "/api/items");
        doc.root().append_child(&button);
        (doc, button)
    }

    #[test]
    fn test_register_is_idempotent() {
        let d = Delegate::default();
        assert!(d.register("click"));
        assert!(!d.register("click"));
        assert!(d.is_listening("click"));
    }

    #[test]
    fn test_resolve_walks_ancestors() {
        let (doc, button) = marked_button();
        let icon = doc.create_element("span");
        button.append_child(&icon);

        let hit = Delegate::default()
            .resolve(&DomEvent::new("click", icon))
            .unwrap()
            .unwrap();
        assert_eq!(hit.element, button);
        assert_eq!(hit.spec.event, "click");
    }

    #[test]
    fn test_resolve_respects_event_type() {
        let (_, button) = marked_button();
        let d = Delegate::default();
        assert!(d.resolve(&DomEvent::new("change", button)).unwrap().is_none());
    }

    #[test]
    fn test_sub_selector_scopes_to_target() {
        let doc = Document::new();
        let list = doc.create_element("ul");
        list.set_attr("mw-get", "/api/rows");
        list.set_attr("mw-trigger", ".row@click");
        doc.root().append_child(&list);

        let row = doc.create_element("li");
        row.add_class("row");
        let other = doc.create_element("li");
        list.append_child(&row);
        list.append_child(&other);

        let d = Delegate::default();
        assert!(d.resolve(&DomEvent::new("click", row)).unwrap().is_some());
        assert!(d.resolve(&DomEvent::new("click", other)).unwrap().is_none());
    }

    #[test]
    fn test_force_matches_any_marked_element() {
        let (_, button) = marked_button();
        button.set_attr("mw-trigger", "change");
        let hit = Delegate::default()
            .resolve(&DomEvent::force(button.clone()))
            .unwrap()
            .unwrap();
        assert_eq!(hit.element, button);
        assert!(hit.spec.delay.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_window() {
        let (_, button) = marked_button();
        let d = Delegate::default();
        let node = button.node_id();
        let interval = Duration::from_millis(200);

        assert!(d.throttle_ok(node, interval));
        tokio::time::advance(Duration::from_millis(50)).await;
        assert!(!d.throttle_ok(node, interval));
        tokio::time::advance(Duration::from_millis(200)).await;
        assert!(d.throttle_ok(node, interval));
    }

    #[test]
    fn test_debounce_generations() {
        let (_, button) = marked_button();
        let d = Delegate::default();
        let node = button.node_id();

        let g1 = d.arm_debounce(node);
        let g2 = d.arm_debounce(node);
        assert!(!d.debounce_current(node, g1));
        assert!(d.debounce_current(node, g2));

        d.teardown();
        assert!(!d.debounce_current(node, g2));
    }
}
