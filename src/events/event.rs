//! # Telemetry events emitted during pipeline runs.
//!
//! [`EventKind`] classifies what happened; [`EngineEvent`] carries optional
//! metadata (context id, step name, attempt, delay, field name, reason).
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore exact order when events are consumed
//! out of band.
//!
//! Every kind maps to a severity [`Level`]; the engine's configured minimum
//! level gates publication, so subscribers never see filtered events.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Severity of a telemetry event, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for Level {
    fn default() -> Self {
        Level::Debug
    }
}

/// Classification of engine telemetry events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Pipeline lifecycle ===
    /// A pipeline run started for a context.
    ///
    /// Sets: `context_id`, `at`, `seq`.
    PipelineStarted,

    /// A step failed; the failure was recorded on the context and later
    /// steps keep running.
    ///
    /// Sets: `context_id`, `step`, `reason`, `at`, `seq`.
    StepFailed,

    /// The pipeline observed the aborted flag and skipped the remaining steps.
    ///
    /// Sets: `context_id`, `step` (first skipped), `at`, `seq`.
    PipelineAborted,

    /// The pipeline finished (success, failure, or abort) and the context is
    /// about to be returned.
    ///
    /// Sets: `context_id`, `reason` (terminal error label, if any), `at`, `seq`.
    PipelineCompleted,

    // === Trigger delegation ===
    /// An event matched an element's trigger spec.
    ///
    /// Sets: `context_id` (none yet) unset, `reason` (event type), `at`, `seq`.
    TriggerMatched,

    /// A qualifying event was coalesced into a pending debounce window.
    ///
    /// Sets: `reason` (event type), `delay_ms`, `at`, `seq`.
    TriggerDebounced,

    /// A qualifying event was dropped by the throttle interval.
    ///
    /// Sets: `reason` (event type), `at`, `seq`.
    TriggerThrottled,

    // === Request execution ===
    /// A wire request was built from the context.
    ///
    /// Sets: `context_id`, `reason` (method + url), `at`, `seq`.
    RequestBuilt,

    /// A retry was scheduled after a retryable outcome.
    ///
    /// Sets: `context_id`, `attempt`, `delay_ms`, `reason`, `at`, `seq`.
    RetryScheduled,

    // === Coordination ===
    /// A duplicate trigger on a busy element was ignored.
    ///
    /// Sets: `context_id` (the ignored context), `at`, `seq`.
    DuplicateIgnored,

    /// A prior in-flight request was cancelled by `abort-previous`.
    ///
    /// Sets: `context_id` (the superseding context), `reason` (old id), `at`, `seq`.
    PreviousAborted,

    // === Validation ===
    /// Client-side validation failed for a field.
    ///
    /// Sets: `field`, `reason` (message), `at`, `seq`.
    ValidationFailed,

    /// A 4xx problem body was mapped into per-field server errors.
    ///
    /// Sets: `context_id`, `reason` (title), `at`, `seq`.
    ServerValidationMapped,

    // === Response application ===
    /// A swap strategy applied the response body to its target.
    ///
    /// Sets: `context_id`, `reason` (strategy name), `at`, `seq`.
    SwapApplied,

    // === Registries ===
    /// A named hook was not found in the registry (treated as a no-op).
    ///
    /// Sets: `reason` (hook name), `at`, `seq`.
    HookMissing,
}

impl EventKind {
    /// Severity used for level-gated publication.
    pub fn level(&self) -> Level {
        match self {
            EventKind::PipelineStarted
            | EventKind::TriggerMatched
            | EventKind::TriggerDebounced
            | EventKind::TriggerThrottled
            | EventKind::RequestBuilt
            | EventKind::SwapApplied => Level::Debug,
            EventKind::PipelineCompleted
            | EventKind::DuplicateIgnored
            | EventKind::PreviousAborted
            | EventKind::PipelineAborted
            | EventKind::ValidationFailed
            | EventKind::ServerValidationMapped => Level::Info,
            EventKind::RetryScheduled | EventKind::HookMissing => Level::Warn,
            EventKind::StepFailed => Level::Error,
        }
    }
}

/// Engine telemetry event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct EngineEvent {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Owning context, if the event belongs to a pipeline run.
    pub context_id: Option<Uuid>,
    /// Pipeline step name, if applicable.
    pub step: Option<&'static str>,
    /// Human-readable reason (errors, event types, strategy names).
    pub reason: Option<Arc<str>>,
    /// Attempt count (starting from 1).
    pub attempt: Option<u32>,
    /// Delay in milliseconds (backoff, debounce).
    pub delay_ms: Option<u32>,
    /// Field name, for validation events.
    pub field: Option<Arc<str>>,
}

impl EngineEvent {
    /// Creates a new event of the given kind with current timestamp and next
    /// sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            context_id: None,
            step: None,
            reason: None,
            attempt: None,
            delay_ms: None,
            field: None,
        }
    }

    /// Severity of this event.
    #[inline]
    pub fn level(&self) -> Level {
        self.kind.level()
    }

    /// Attaches the owning context id.
    #[inline]
    pub fn with_context(mut self, id: Uuid) -> Self {
        self.context_id = Some(id);
        self
    }

    /// Attaches the pipeline step name.
    #[inline]
    pub fn with_step(mut self, step: &'static str) -> Self {
        self.step = Some(step);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches an attempt count.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches a field name.
    #[inline]
    pub fn with_field(mut self, field: impl Into<Arc<str>>) -> Self {
        self.field = Some(field.into());
        self
    }
}
