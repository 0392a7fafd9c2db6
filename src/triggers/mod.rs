//! Trigger resolution: spec parsing, event delegation, debounce and
//! throttle bookkeeping.

mod delegation;
mod spec;

pub use delegation::{Delegate, Resolution};
pub use spec::{default_trigger_for, parse_triggers, TriggerSpec};
