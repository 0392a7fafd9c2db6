//! Telemetry events emitted by the engine.
//!
//! Observability only: nothing in the pipeline reads the bus for control
//! flow. Subscribers attach via [`Bus::subscribe`].

mod bus;
mod event;

pub use bus::Bus;
pub use event::{EngineEvent, EventKind, Level};
