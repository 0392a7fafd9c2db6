//! # markwire
//!
//! A headless runtime that turns declarative markup attributes into
//! coordinated network interactions: an element marked `mw-get="/api/x"`
//! gets a full request pipeline with data collection, client-side
//! validation, duplicate-request coordination, retry with backoff, and a
//! response swap back into the document.
//!
//! ```text
//!   host events                     programmatic API
//!   (click/submit/input/blur)       trigger() / request() / from()
//!        │                                │
//!        ▼                                ▼
//!   ┌──────────┐  resolve   ┌──────────────────────────────┐
//!   │ Delegate │───────────▶│           Engine             │
//!   └──────────┘            │  merge → pipeline → context  │
//!                           └──────┬────────────┬──────────┘
//!                                  │            │
//!                       Transport ◀┘            └▶ Document mutations
//!                       (retry + cancellation)     (swap, validation UI)
//! ```
//!
//! The engine never owns rendering or networking: the embedder feeds
//! [`DomEvent`]s in, supplies a [`Transport`], and reads mutations back out
//! of the [`Document`]. Telemetry flows out of a broadcast [`events::Bus`].
//!
//! ## Quick start
//! ```no_run
//! use std::sync::Arc;
//! use serde_json::json;
//! use markwire::{Document, DomEvent, Engine};
//! # use async_trait::async_trait;
//! # use tokio_util::sync::CancellationToken;
//! # use markwire::{EngineError, RequestDescriptor, Response, Transport};
//! # struct MyTransport;
//! # #[async_trait]
//! # impl Transport for MyTransport {
//! #     async fn send(&self, _r: &RequestDescriptor, _c: CancellationToken)
//! #         -> Result<Response, EngineError> { unimplemented!() }
//! # }
//!
//! # async fn demo() -> Result<(), EngineError> {
//! let doc = Document::new();
//! let button = doc.create_element("button");
//! button.set_attr("mw-get", "/api/items");
//! doc.root().append_child(&button);
//!
//! let engine = Engine::builder(doc, Arc::new(MyTransport)).build()?;
//! engine.init(json!({"telemetry": "info"}))?;
//! engine.dispatch(&DomEvent::new("click", button)).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dom;
pub mod events;
pub mod model;
pub mod policies;
pub mod triggers;
pub mod validation;

mod collect;
mod confirm;
mod engine;
mod error;
mod hooks;
mod registry;
mod request;
mod serialize;
mod state;
mod swap;
mod transport;

pub use collect::collect;
pub use config::{CollectSource, Config, SyncPolicy};
pub use confirm::{Confirm, ConfirmFn, DEFAULT_CONFIRM};
pub use dom::{Document, DomEvent, Element, NodeId, Selector, FORCE_TRIGGER};
pub use engine::{Engine, EngineBuilder, Invoker, Step};
pub use error::EngineError;
pub use events::{Bus, EngineEvent, EventKind, Level};
pub use hooks::{Hook, HookFn};
pub use model::{
    Body, Collected, Context, EncodedBody, FieldError, FieldValue, FilePart, Method,
    RequestDescriptor, Response, RunState, ValidationOutcome, ValidationSource,
};
pub use policies::{resolve_retry, RetryPolicy, RetrySpec};
pub use registry::Registry;
pub use serialize::{encode_query, FormSerializer, JsonSerializer, Serializer};
pub use swap::{InnerSwap, NoneSwap, OuterSwap, Swap};
pub use transport::Transport;
pub use validation::{CompositeAdapter, DefaultAdapter, FieldAdapter, FieldValidator};
