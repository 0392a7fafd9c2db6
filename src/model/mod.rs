//! Core data model: the per-interaction context and the value types that
//! flow through the pipeline.

mod context;

pub use context::{
    Body, Collected, Context, EncodedBody, FieldError, FieldValue, FilePart, Method,
    RequestDescriptor, Response, RunState, ValidationOutcome, ValidationSource,
};
