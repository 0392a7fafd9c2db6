//! # Duplicate-request coordination.
//!
//! One slot per owning element: while a request is in flight for a node,
//! new runs on the same node are resolved by the element's sync policy.
//! Cleanup is id-guarded so a superseded run finishing late never evicts
//! its successor's slot.

use std::collections::HashMap;
use std::sync::RwLock;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::SyncPolicy;
use crate::dom::NodeId;

/// The outcome of placing a run into an element's slot.
#[derive(Debug, PartialEq)]
pub enum Placement {
    /// The slot was free (or the policy does not hold slots); proceed.
    Proceed,
    /// The slot was busy under `ignore`; the new run must not proceed.
    Ignored,
    /// The previous run was cancelled under `abort-previous`.
    Superseded {
        /// The cancelled run's context id.
        previous: Uuid,
    },
}

struct Entry {
    context_id: Uuid,
    cancel: CancellationToken,
}

/// Per-element in-flight slots.
#[derive(Default)]
pub struct Coordinator {
    entries: RwLock<HashMap<NodeId, Entry>>,
}

impl Coordinator {
    /// Places a run into the node's slot per `policy`.
    pub fn place(
        &self,
        node: NodeId,
        policy: SyncPolicy,
        context_id: Uuid,
        cancel: CancellationToken,
    ) -> Placement {
        // `queue` is declared but intentionally unimplemented: it takes no
        // slot and never blocks, so queued runs degrade to plain concurrency.
        if policy == SyncPolicy::Queue {
            return Placement::Proceed;
        }

        let mut entries = self.entries.write().expect("coordination lock");
        match entries.get(&node) {
            None => {
                entries.insert(node, Entry { context_id, cancel });
                Placement::Proceed
            }
            Some(existing) => match policy {
                SyncPolicy::Ignore => Placement::Ignored,
                SyncPolicy::AbortPrevious => {
                    let previous = existing.context_id;
                    existing.cancel.cancel();
                    entries.insert(node, Entry { context_id, cancel });
                    Placement::Superseded { previous }
                }
                SyncPolicy::Queue => Placement::Proceed,
            },
        }
    }

    /// Releases the node's slot, but only if `context_id` still owns it.
    pub fn cleanup(&self, node: NodeId, context_id: Uuid) {
        let mut entries = self.entries.write().expect("coordination lock");
        if entries
            .get(&node)
            .map(|e| e.context_id == context_id)
            .unwrap_or(false)
        {
            entries.remove(&node);
        }
    }

    /// True while a run holds the node's slot.
    pub fn is_busy(&self, node: NodeId) -> bool {
        self.entries
            .read()
            .expect("coordination lock")
            .contains_key(&node)
    }

    /// Cancels and drops every slot.
    pub fn teardown(&self) {
        let mut entries = self.entries.write().expect("coordination lock");
        for entry in entries.values() {
            entry.cancel.cancel();
        }
        entries.clear();
    }
}
