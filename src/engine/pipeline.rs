//! # The fixed step pipeline.
//!
//! Every interaction runs the same step sequence:
//!
//! ```text
//! validate-setup → confirm → coordinate → collect → capture-state →
//! apply-state → before-hooks → client-validation → build-request →
//! execute-request → parse-response → route-response →
//! display-validation → swap → restore-state → after-hooks → focus →
//! coordination-cleanup
//! ```
//!
//! ## Rules
//! - A step failure is recorded on the context (first failure wins) and the
//!   pipeline keeps running, so cleanup steps always execute.
//! - Steps that would produce request work guard on the recorded error and
//!   no-op; cleanup steps run unconditionally.
//! - The aborted flag (set only by duplicate-request coordination) skips
//!   everything after the coordinate step outright.

use crate::engine::Engine;
use crate::error::EngineError;
use crate::events::{EngineEvent, EventKind};
use crate::model::Context;

/// One named pipeline step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    ValidateSetup,
    Confirm,
    Coordinate,
    Collect,
    CaptureState,
    ApplyState,
    BeforeHooks,
    ClientValidation,
    BuildRequest,
    ExecuteRequest,
    ParseResponse,
    RouteResponse,
    DisplayValidation,
    Swap,
    RestoreState,
    AfterHooks,
    Focus,
    CoordinationCleanup,
}

impl Step {
    /// Stable step name for telemetry and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::ValidateSetup => "validate-setup",
            Step::Confirm => "confirm",
            Step::Coordinate => "coordinate",
            Step::Collect => "collect",
            Step::CaptureState => "capture-state",
            Step::ApplyState => "apply-state",
            Step::BeforeHooks => "before-hooks",
            Step::ClientValidation => "client-validation",
            Step::BuildRequest => "build-request",
            Step::ExecuteRequest => "execute-request",
            Step::ParseResponse => "parse-response",
            Step::RouteResponse => "route-response",
            Step::DisplayValidation => "display-validation",
            Step::Swap => "swap",
            Step::RestoreState => "restore-state",
            Step::AfterHooks => "after-hooks",
            Step::Focus => "focus",
            Step::CoordinationCleanup => "coordination-cleanup",
        }
    }
}

/// The pipeline, in execution order.
pub const STEPS: [Step; 18] = [
    Step::ValidateSetup,
    Step::Confirm,
    Step::Coordinate,
    Step::Collect,
    Step::CaptureState,
    Step::ApplyState,
    Step::BeforeHooks,
    Step::ClientValidation,
    Step::BuildRequest,
    Step::ExecuteRequest,
    Step::ParseResponse,
    Step::RouteResponse,
    Step::DisplayValidation,
    Step::Swap,
    Step::RestoreState,
    Step::AfterHooks,
    Step::Focus,
    Step::CoordinationCleanup,
];

impl Engine {
    /// Runs the full pipeline on `cx`, recording failures on the context.
    pub(crate) async fn run_pipeline(&self, cx: &mut Context) {
        let min = cx.config.telemetry;
        self.emit(min, EngineEvent::new(EventKind::PipelineStarted).with_context(cx.id()));

        for step in STEPS {
            if cx.state.aborted {
                self.emit(
                    min,
                    EngineEvent::new(EventKind::PipelineAborted)
                        .with_context(cx.id())
                        .with_step(step.as_str()),
                );
                break;
            }
            if let Err(err) = self.run_step(step, cx).await {
                tracing::warn!(
                    step = step.as_str(),
                    error = %err.as_message(),
                    context = %cx.id(),
                    "pipeline step failed"
                );
                self.emit(
                    min,
                    EngineEvent::new(EventKind::StepFailed)
                        .with_context(cx.id())
                        .with_step(step.as_str())
                        .with_reason(err.as_message().as_str()),
                );
                if cx.error.is_none() {
                    cx.error = Some(err);
                }
            }
        }

        let finished = std::time::Instant::now();
        cx.state.finished_at = Some(finished);
        cx.state.duration = Some(finished - cx.state.started_at);
        cx.success = !cx.state.aborted && cx.error.is_none();

        let mut done = EngineEvent::new(EventKind::PipelineCompleted).with_context(cx.id());
        if let Some(err) = &cx.error {
            done = done.with_reason(err.as_label());
        }
        self.emit(min, done);
    }

    async fn run_step(&self, step: Step, cx: &mut Context) -> Result<(), EngineError> {
        match step {
            Step::ValidateSetup => self.step_validate_setup(cx),
            Step::Confirm => self.step_confirm(cx).await,
            Step::Coordinate => self.step_coordinate(cx),
            Step::Collect => self.step_collect(cx),
            Step::CaptureState => self.step_capture_state(cx),
            Step::ApplyState => self.step_apply_state(cx),
            Step::BeforeHooks => self.step_hooks(cx, true).await,
            Step::ClientValidation => self.step_client_validation(cx),
            Step::BuildRequest => self.step_build_request(cx),
            Step::ExecuteRequest => self.step_execute_request(cx).await,
            Step::ParseResponse => self.step_parse_response(cx),
            Step::RouteResponse => self.step_route_response(cx),
            Step::DisplayValidation => self.step_display_validation(cx),
            Step::Swap => self.step_swap(cx),
            Step::RestoreState => self.step_restore_state(cx),
            Step::AfterHooks => self.step_hooks(cx, false).await,
            Step::Focus => self.step_focus(cx),
            Step::CoordinationCleanup => self.step_coordination_cleanup(cx),
        }
    }
}
