//! # Transport seam.
//!
//! The engine does not implement an HTTP client; it consumes one through
//! [`Transport`]: perform one request attempt, get back status/headers/body.
//! Implementations should observe the cancellation token so `abort-previous`
//! resolves the suspension point promptly; the retry executor additionally
//! races every attempt against the token.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::EngineError;
use crate::model::{RequestDescriptor, Response};

/// One network attempt, opaque to the engine.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use markwire::{EngineError, RequestDescriptor, Response, Transport};
///
/// struct AlwaysOk;
///
/// #[async_trait]
/// impl Transport for AlwaysOk {
///     async fn send(
///         &self,
///         _req: &RequestDescriptor,
///         _cancel: CancellationToken,
///     ) -> Result<Response, EngineError> {
///         Ok(Response { status: 200, headers: Default::default(), body: vec![] })
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Performs a single request attempt.
    ///
    /// Transport failures map to [`EngineError::Network`]; cancellation
    /// should resolve into [`EngineError::Aborted`].
    async fn send(
        &self,
        request: &RequestDescriptor,
        cancel: CancellationToken,
    ) -> Result<Response, EngineError>;
}
