//! # Confirm handlers.
//!
//! A configured `confirm` value either names a registered handler or is a
//! free-form message routed to the handler registered as `"default"`. A
//! rejecting handler aborts the run before any request work happens.

use async_trait::async_trait;

use crate::model::Context;

/// Name the free-form-message route resolves against.
pub const DEFAULT_CONFIRM: &str = "default";

/// Asks whether an interaction may proceed.
#[async_trait]
pub trait Confirm: Send + Sync + 'static {
    /// Returns `true` to proceed, `false` to abort the run.
    async fn confirm(&self, message: &str, cx: &Context) -> bool;
}

/// Adapter for plain functions.
pub struct ConfirmFn<F>(pub F);

#[async_trait]
impl<F> Confirm for ConfirmFn<F>
where
    F: Fn(&str, &Context) -> bool + Send + Sync + 'static,
{
    async fn confirm(&self, message: &str, cx: &Context) -> bool {
        (self.0)(message, cx)
    }
}
