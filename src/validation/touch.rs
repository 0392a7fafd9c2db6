//! # Touched/invalid bookkeeping.
//!
//! Validation UX rules: errors surface on blur (the field becomes touched)
//! and re-check on debounced input once the field is already invalid.
//! Generations invalidate pending debounce timers; the epoch bumps on
//! teardown so timers armed before a teardown never fire after it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use crate::dom::NodeId;

#[derive(Default)]
struct FieldTouch {
    touched: bool,
    invalid: bool,
    debounce_gen: u64,
}

/// Per-field interaction state, keyed by node.
#[derive(Default)]
pub struct TouchState {
    fields: RwLock<HashMap<NodeId, FieldTouch>>,
    epoch: AtomicU64,
}

impl TouchState {
    /// Marks the field touched (blur happened at least once).
    pub fn mark_touched(&self, node: NodeId) {
        self.fields
            .write()
            .expect("touch lock")
            .entry(node)
            .or_default()
            .touched = true;
    }

    pub fn is_touched(&self, node: NodeId) -> bool {
        self.fields
            .read()
            .expect("touch lock")
            .get(&node)
            .map(|f| f.touched)
            .unwrap_or(false)
    }

    /// Records the field's last validation verdict.
    pub fn set_invalid(&self, node: NodeId, invalid: bool) {
        self.fields
            .write()
            .expect("touch lock")
            .entry(node)
            .or_default()
            .invalid = invalid;
    }

    pub fn is_invalid(&self, node: NodeId) -> bool {
        self.fields
            .read()
            .expect("touch lock")
            .get(&node)
            .map(|f| f.invalid)
            .unwrap_or(false)
    }

    /// Arms a re-validation debounce. Returns `(epoch, generation)` to be
    /// checked after the delay.
    pub fn arm_debounce(&self, node: NodeId) -> (u64, u64) {
        let epoch = self.epoch.load(Ordering::Relaxed);
        let mut fields = self.fields.write().expect("touch lock");
        let entry = fields.entry(node).or_default();
        entry.debounce_gen += 1;
        (epoch, entry.debounce_gen)
    }

    /// True when the armed debounce is still the latest and no teardown
    /// happened in between.
    pub fn debounce_current(&self, node: NodeId, epoch: u64, generation: u64) -> bool {
        if self.epoch.load(Ordering::Relaxed) != epoch {
            return false;
        }
        self.fields
            .read()
            .expect("touch lock")
            .get(&node)
            .map(|f| f.debounce_gen == generation)
            .unwrap_or(false)
    }

    /// Clears all per-field state and invalidates pending timers.
    pub fn teardown(&self) {
        self.epoch.fetch_add(1, Ordering::Relaxed);
        self.fields.write().expect("touch lock").clear();
    }
}
