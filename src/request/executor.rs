//! # Retrying request executor.
//!
//! Runs transport attempts under the context's retry policy. Every attempt
//! and every backoff sleep races the cancellation token, so an
//! `abort-previous` supersession resolves promptly regardless of where the
//! run is suspended. Cancellation is terminal and never retried.

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::EngineError;
use crate::events::{Bus, EngineEvent, EventKind};
use crate::model::{RequestDescriptor, Response};
use crate::policies::RetryPolicy;
use crate::transport::Transport;

/// Executes `request` with up to `policy.max_attempts` attempts.
///
/// Returns the final response (any status) or the last error, along with
/// the number of attempts performed.
pub async fn execute_with_retry(
    transport: &dyn Transport,
    request: &RequestDescriptor,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    context_id: Uuid,
    bus: &Bus,
) -> (Result<Response, EngineError>, u32) {
    let policy = policy.clone().normalized();
    let mut last: Result<Response, EngineError> =
        Err(EngineError::Network {
            message: "no attempt performed".to_string(),
        });

    for attempt in 1..=policy.max_attempts {
        let outcome = tokio::select! {
            res = transport.send(request, cancel.clone()) => res,
            _ = cancel.cancelled() => {
                return (
                    Err(EngineError::aborted("request cancelled")),
                    attempt,
                );
            }
        };

        let retryable = match &outcome {
            Ok(resp) => policy.is_retryable_status(resp.status),
            Err(EngineError::Aborted { .. }) => {
                return (outcome, attempt);
            }
            Err(e) => e.is_retryable(),
        };

        if !retryable || attempt == policy.max_attempts {
            return (outcome, attempt);
        }

        let reason = match &outcome {
            Ok(resp) => format!("status {}", resp.status),
            Err(e) => e.as_message(),
        };
        last = outcome;

        let delay = policy.delay_for(attempt);
        bus.publish(
            EngineEvent::new(EventKind::RetryScheduled)
                .with_context(context_id)
                .with_attempt(attempt)
                .with_delay(delay)
                .with_reason(reason.as_str()),
        );
        tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, %reason, "retrying request");

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = cancel.cancelled() => {
                return (
                    Err(EngineError::aborted("request cancelled during backoff")),
                    attempt,
                );
            }
        }
    }

    (last, policy.max_attempts)
}
