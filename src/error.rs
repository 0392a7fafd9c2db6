//! Error types used by the markwire engine.
//!
//! A single taxonomy enum, [`EngineError`], covers every failure kind the
//! pipeline can record on a context:
//!
//! - configuration errors (missing element/target, malformed specs),
//! - client-side validation failures,
//! - transport failures,
//! - aborts (duplicate-request coordination, confirm rejection, cancellation),
//! - server-side validation rejections (4xx problem JSON),
//! - generic HTTP errors (other non-2xx statuses).
//!
//! Helper methods (`as_label`, `as_message`) exist for logging/telemetry,
//! plus [`EngineError::is_retryable`] for the retry executor.

use thiserror::Error;

/// # Errors produced by pipeline execution.
///
/// A step failure is captured on the context rather than aborting the
/// pipeline; the outward-facing API re-throws the terminal error once the
/// pipeline has finished, so cleanup steps always run first.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Required setup is missing or malformed (no element/target, bad spec grammar).
    #[error("configuration error: {message}")]
    Config {
        /// What was missing or malformed.
        message: String,
    },

    /// Client-side validation rejected the input; no request was attempted.
    #[error("validation failed: {summary}")]
    Validation {
        /// First failure message, or a combined summary.
        summary: String,
    },

    /// The transport failed to complete a request attempt.
    #[error("network error: {message}")]
    Network {
        /// The underlying transport failure.
        message: String,
    },

    /// The interaction was aborted (duplicate coordination, confirm rejection,
    /// or in-flight cancellation).
    #[error("aborted: {reason}")]
    Aborted {
        /// Why the interaction was aborted.
        reason: String,
    },

    /// The server rejected the input with a recognized 4xx problem body.
    #[error("server validation failed: {title}")]
    ServerValidation {
        /// The problem body's title (empty when absent).
        title: String,
        /// HTTP status that carried the problem body.
        status: u16,
    },

    /// Any other non-2xx response.
    #[error("http error: status {status}")]
    Http {
        /// The response status code.
        status: u16,
    },
}

impl EngineError {
    /// Returns a short stable label (snake_case) for use in logs/telemetry.
    ///
    /// # Example
    /// ```
    /// use markwire::EngineError;
    ///
    /// let err = EngineError::Http { status: 502 };
    /// assert_eq!(err.as_label(), "http_error");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            EngineError::Config { .. } => "config_error",
            EngineError::Validation { .. } => "validation_error",
            EngineError::Network { .. } => "network_error",
            EngineError::Aborted { .. } => "aborted",
            EngineError::ServerValidation { .. } => "server_validation_error",
            EngineError::Http { .. } => "http_error",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            EngineError::Config { message } => format!("config: {message}"),
            EngineError::Validation { summary } => format!("validation: {summary}"),
            EngineError::Network { message } => format!("network: {message}"),
            EngineError::Aborted { reason } => format!("aborted: {reason}"),
            EngineError::ServerValidation { title, status } => {
                format!("server validation ({status}): {title}")
            }
            EngineError::Http { status } => format!("http status {status}"),
        }
    }

    /// Indicates whether the error kind is safe to retry.
    ///
    /// Only transport failures are retryable by kind; retryable HTTP
    /// *statuses* are governed by the retry policy's status set instead.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Network { .. })
    }

    /// Shorthand for a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        EngineError::Config {
            message: message.into(),
        }
    }

    /// Shorthand for an abort with the given reason.
    pub fn aborted(reason: impl Into<String>) -> Self {
        EngineError::Aborted {
            reason: reason.into(),
        }
    }
}
