//! Retry policies and their resolution from declarative specs.

mod resolve;
mod retry;

pub use resolve::{resolve_retry, RetrySpec};
pub use retry::RetryPolicy;
