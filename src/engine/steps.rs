//! # Step implementations.
//!
//! Request-producing steps guard on a recorded error and no-op; cleanup
//! steps (restore-state, after-hooks, coordination-cleanup) run regardless
//! so a mid-pipeline failure never leaves the document disabled or a
//! coordination slot held.

use crate::collect::collect;
use crate::confirm::DEFAULT_CONFIRM;
use crate::dom::{Element, Selector};
use crate::engine::coordination::Placement;
use crate::engine::Engine;
use crate::error::EngineError;
use crate::events::{EngineEvent, EventKind};
use crate::model::{Context, ValidationSource};
use crate::policies::resolve_retry;
use crate::request::{build_request, execute_with_retry, parse_body, route_response};
use crate::state;

impl Engine {
    pub(crate) fn step_validate_setup(&self, cx: &mut Context) -> Result<(), EngineError> {
        if cx.config.method.is_none() {
            return Err(EngineError::config("no method configured"));
        }
        if cx.config.url.is_none() {
            return Err(EngineError::config("no url configured"));
        }
        if !self.swaps.contains(&cx.config.swap) {
            return Err(EngineError::config(format!(
                "unknown swap strategy '{}'",
                cx.config.swap
            )));
        }
        if let Some(target) = &cx.config.target {
            Selector::parse(target)?;
        }
        Ok(())
    }

    pub(crate) async fn step_confirm(&self, cx: &mut Context) -> Result<(), EngineError> {
        if cx.error.is_some() {
            return Ok(());
        }
        let Some(value) = cx.config.confirm.clone() else {
            return Ok(());
        };
        let handler = match self.confirms.get(&value) {
            Some(h) => h,
            None => match self.confirms.get(DEFAULT_CONFIRM) {
                Some(h) => h,
                None => {
                    tracing::debug!(confirm = %value, "no confirm handler registered, proceeding");
                    return Ok(());
                }
            },
        };
        if handler.confirm(&value, cx).await {
            Ok(())
        } else {
            Err(EngineError::aborted("confirm rejected"))
        }
    }

    pub(crate) fn step_coordinate(&self, cx: &mut Context) -> Result<(), EngineError> {
        if cx.error.is_some() {
            return Ok(());
        }
        let Some(el) = &cx.element else { return Ok(()) };
        let min = cx.config.telemetry;
        match self
            .coordinator
            .place(el.node_id(), cx.config.sync, cx.id(), cx.cancellation())
        {
            Placement::Proceed => Ok(()),
            Placement::Ignored => {
                cx.state.aborted = true;
                self.emit(
                    min,
                    EngineEvent::new(EventKind::DuplicateIgnored).with_context(cx.id()),
                );
                Ok(())
            }
            Placement::Superseded { previous } => {
                self.emit(
                    min,
                    EngineEvent::new(EventKind::PreviousAborted)
                        .with_context(cx.id())
                        .with_reason(previous.to_string().as_str()),
                );
                Ok(())
            }
        }
    }

    pub(crate) fn step_collect(&self, cx: &mut Context) -> Result<(), EngineError> {
        if cx.error.is_some() {
            return Ok(());
        }
        let Some(el) = cx.element.clone() else { return Ok(()) };
        cx.collect = Some(collect(&el, &cx.config.collect, &self.validator)?);
        Ok(())
    }

    pub(crate) fn step_capture_state(&self, cx: &mut Context) -> Result<(), EngineError> {
        if cx.error.is_some() {
            return Ok(());
        }
        if let Some(el) = &cx.element {
            cx.snapshot = Some(state::capture(el));
        }
        Ok(())
    }

    pub(crate) fn step_apply_state(&self, cx: &mut Context) -> Result<(), EngineError> {
        if cx.error.is_some() {
            return Ok(());
        }
        let (Some(el), Some(mut snap)) = (cx.element.clone(), cx.snapshot.take()) else {
            return Ok(());
        };
        let result = state::apply(&el, &cx.config, cx.state.debounced, &mut snap);
        // The snapshot goes back even on failure so restore still runs.
        cx.snapshot = Some(snap);
        result
    }

    pub(crate) async fn step_hooks(&self, cx: &mut Context, before: bool) -> Result<(), EngineError> {
        if before && cx.error.is_some() {
            return Ok(());
        }
        let names = if before {
            cx.config.before.clone()
        } else {
            cx.config.after.clone()
        };
        let min = cx.config.telemetry;
        for name in names {
            match self.hooks.get(&name) {
                Some(hook) => hook.call(cx).await,
                None => {
                    tracing::warn!(hook = %name, "hook not registered, skipping");
                    self.emit(
                        min,
                        EngineEvent::new(EventKind::HookMissing).with_reason(name.as_str()),
                    );
                }
            }
        }
        Ok(())
    }

    pub(crate) fn step_client_validation(&self, cx: &mut Context) -> Result<(), EngineError> {
        if cx.error.is_some() || !cx.config.validate {
            return Ok(());
        }
        let Some(scope) = self.validation_scope(cx) else {
            return Ok(());
        };
        let outcome = self.validator.validate_form(&scope, true);
        if outcome.is_valid {
            return Ok(());
        }
        let min = cx.config.telemetry;
        for field in &outcome.fields {
            let mut ev = EngineEvent::new(EventKind::ValidationFailed)
                .with_field(field.field.as_str());
            if let Some(msg) = field.messages.first() {
                ev = ev.with_reason(msg.as_str());
            }
            self.emit(min, ev);
        }
        let summary = outcome
            .messages
            .first()
            .cloned()
            .unwrap_or_else(|| "invalid input".to_string());
        cx.validation = Some(outcome);
        Err(EngineError::Validation { summary })
    }

    pub(crate) fn step_build_request(&self, cx: &mut Context) -> Result<(), EngineError> {
        if cx.error.is_some() {
            return Ok(());
        }
        let request = build_request(cx, &self.serializers)?;
        self.emit(
            cx.config.telemetry,
            EngineEvent::new(EventKind::RequestBuilt)
                .with_context(cx.id())
                .with_reason(format!("{} {}", request.method.as_str(), request.url).as_str()),
        );
        cx.request = Some(request);
        Ok(())
    }

    pub(crate) async fn step_execute_request(&self, cx: &mut Context) -> Result<(), EngineError> {
        if cx.error.is_some() {
            return Ok(());
        }
        let Some(request) = cx.request.clone() else {
            return Ok(());
        };
        let named = self
            .retry_policies
            .read()
            .expect("retry policy lock")
            .clone();
        let policy = resolve_retry(&cx.config.retry, &named)?;
        let cancel = cx.cancellation();
        let (result, attempts) =
            execute_with_retry(&*self.transport, &request, &policy, &cancel, cx.id(), &self.bus)
                .await;
        cx.state.attempts = attempts;
        cx.response = Some(result?);
        Ok(())
    }

    pub(crate) fn step_parse_response(&self, cx: &mut Context) -> Result<(), EngineError> {
        if cx.error.is_some() {
            return Ok(());
        }
        if let Some(response) = &cx.response {
            cx.body = Some(parse_body(response));
        }
        Ok(())
    }

    pub(crate) fn step_route_response(&self, cx: &mut Context) -> Result<(), EngineError> {
        if cx.error.is_some() {
            return Ok(());
        }
        route_response(cx)
    }

    /// Not guarded on the recorded error: server validation arrives as an
    /// error and still has to render.
    pub(crate) fn step_display_validation(&self, cx: &mut Context) -> Result<(), EngineError> {
        let Some(outcome) = cx.validation.clone() else {
            return Ok(());
        };
        if outcome.source != ValidationSource::Server {
            return Ok(());
        }
        let Some(scope) = self.validation_scope(cx) else {
            return Ok(());
        };
        self.validator.display_server_errors(&scope, &outcome.fields);
        let mut ev = EngineEvent::new(EventKind::ServerValidationMapped).with_context(cx.id());
        if let Some(title) = &outcome.title {
            ev = ev.with_reason(title.as_str());
        }
        self.emit(cx.config.telemetry, ev);
        Ok(())
    }

    pub(crate) fn step_swap(&self, cx: &mut Context) -> Result<(), EngineError> {
        if cx.error.is_some() {
            return Ok(());
        }
        let Some(text) = cx.body.as_ref().and_then(crate::request::body_text) else {
            return Ok(());
        };
        let target = match &cx.config.target {
            Some(raw) => {
                let sel = Selector::parse(raw)?;
                self.document
                    .root()
                    .query_first(&sel)
                    .ok_or_else(|| EngineError::config(format!("swap target '{raw}' not found")))?
            }
            None => match &cx.element {
                Some(el) => el.clone(),
                None => return Ok(()),
            },
        };
        let strategy = self
            .swaps
            .get(&cx.config.swap)
            .ok_or_else(|| EngineError::config(format!("unknown swap strategy '{}'", cx.config.swap)))?;
        strategy.apply(&target, &text)?;
        self.emit(
            cx.config.telemetry,
            EngineEvent::new(EventKind::SwapApplied)
                .with_context(cx.id())
                .with_reason(cx.config.swap.as_str()),
        );
        Ok(())
    }

    pub(crate) fn step_restore_state(&self, cx: &mut Context) -> Result<(), EngineError> {
        if let Some(snapshot) = &cx.snapshot {
            state::restore(snapshot);
        }
        Ok(())
    }

    pub(crate) fn step_focus(&self, cx: &mut Context) -> Result<(), EngineError> {
        if !cx.config.focus {
            return Ok(());
        }
        let invalid = cx.validation.as_ref().map(|v| !v.is_valid).unwrap_or(false);
        if !invalid {
            return Ok(());
        }
        if let Some(scope) = self.validation_scope(cx) {
            self.validator.focus_first_invalid(&scope);
        }
        Ok(())
    }

    pub(crate) fn step_coordination_cleanup(&self, cx: &mut Context) -> Result<(), EngineError> {
        if let Some(el) = &cx.element {
            self.coordinator.cleanup(el.node_id(), cx.id());
        }
        Ok(())
    }

    /// The element's enclosing form, the element itself, or nothing for
    /// element-less runs.
    fn validation_scope(&self, cx: &Context) -> Option<Element> {
        let el = cx.element.as_ref()?;
        Some(el.enclosing_form().unwrap_or_else(|| el.clone()))
    }
}
