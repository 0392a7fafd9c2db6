//! # The engine facade.
//!
//! [`Engine`] owns every moving part: the document handle, the transport,
//! the trigger delegate, the coordinator, the extension registries, the
//! validation engine, and the telemetry bus. Construction goes through
//! [`EngineBuilder`]; interactions enter through [`Engine::dispatch`] (host
//! events) or the programmatic API ([`Engine::trigger`], [`Engine::request`],
//! [`Engine::from`]).
//!
//! ```text
//!           DomEvent                    trigger()/request()/from()
//!              │                                   │
//!              ▼                                   ▼
//!        ┌───────────┐    build_context     ┌─────────────┐
//!        │ Delegate  ├──────────────────────▶  pipeline   │
//!        └───────────┘  (merge 4 layers)    └──────┬──────┘
//!                                                  │
//!                               Bus ◀── telemetry ─┘
//! ```

mod coordination;
mod pipeline;
mod steps;

pub use coordination::{Coordinator, Placement};
pub use pipeline::{Step, STEPS};

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use serde_json::{Map, Value};
use tokio::sync::broadcast;

use crate::config::{merge, options_from, Config};
use crate::confirm::Confirm;
use crate::dom::{Document, DomEvent, Element, FORCE_TRIGGER};
use crate::error::EngineError;
use crate::events::{Bus, EngineEvent, EventKind, Level};
use crate::hooks::Hook;
use crate::model::Context;
use crate::policies::RetryPolicy;
use crate::registry::Registry;
use crate::serialize::{FormSerializer, JsonSerializer, Serializer};
use crate::swap::{InnerSwap, NoneSwap, OuterSwap, Swap};
use crate::transport::Transport;
use crate::triggers::Delegate;
use crate::validation::{FieldAdapter, FieldValidator, Validator};

/// Event types the engine listens for at the document root.
const LISTENED_EVENTS: &[&str] = &["click", "submit", "change", "input", "blur", FORCE_TRIGGER];

/// The markup-interaction engine.
pub struct Engine {
    document: Document,
    transport: Arc<dyn Transport>,
    bus: Bus,
    pub(crate) delegate: Delegate,
    pub(crate) coordinator: Coordinator,
    pub(crate) serializers: Registry<dyn Serializer>,
    pub(crate) swaps: Registry<dyn Swap>,
    pub(crate) confirms: Registry<dyn Confirm>,
    pub(crate) hooks: Registry<dyn Hook>,
    pub(crate) retry_policies: RwLock<HashMap<String, RetryPolicy>>,
    pub(crate) validator: FieldValidator,
    global: RwLock<Value>,
    base: RwLock<Config>,
    initialized: AtomicBool,
}

impl Engine {
    /// Starts building an engine over `document`, requesting through
    /// `transport`.
    pub fn builder(document: Document, transport: Arc<dyn Transport>) -> EngineBuilder {
        EngineBuilder {
            document,
            transport,
            bus_capacity: 256,
            hooks: Vec::new(),
            confirms: Vec::new(),
            serializers: Vec::new(),
            swaps: Vec::new(),
            retry_policies: Vec::new(),
            validators: Vec::new(),
            adapters: Vec::new(),
        }
    }

    /// Initializes the engine with page-wide options: validates them,
    /// registers the delegated listeners, and returns the effective base
    /// configuration. Idempotent; later calls replace the global layer.
    pub fn init(&self, global: Value) -> Result<Config, EngineError> {
        let merged = merge(
            &Config::defaults_value(),
            &global,
            &Value::Object(Map::new()),
            &Value::Object(Map::new()),
        )?;
        let base = Config::from_value(merged)?;

        *self.global.write().expect("global lock") = global;
        *self.base.write().expect("base lock") = base.clone();

        if !self.initialized.swap(true, Ordering::SeqCst) {
            for event in LISTENED_EVENTS {
                self.delegate.register(event);
            }
        }
        Ok(base)
    }

    /// The document this engine drives.
    pub fn document(&self) -> Document {
        self.document.clone()
    }

    /// Subscribes to engine telemetry.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.bus.subscribe()
    }

    /// Drops listeners, in-flight coordination slots, and per-field state.
    pub fn teardown(&self) {
        self.delegate.teardown();
        self.coordinator.teardown();
        self.validator.touch().teardown();
        self.initialized.store(false, Ordering::SeqCst);
    }

    /// Runs a full interaction for `element` as if its trigger fired.
    pub async fn trigger(
        self: &Arc<Self>,
        element: &Element,
        overrides: Value,
    ) -> Result<Context, EngineError> {
        let cx = self.build_context(Some(element), &overrides, "api")?;
        self.run(cx).await
    }

    /// Runs an element-less interaction purely from options.
    pub async fn request(self: &Arc<Self>, options: Value) -> Result<Context, EngineError> {
        let cx = self.build_context(None, &options, "api")?;
        self.run(cx).await
    }

    /// Binds an element for repeated programmatic invocation.
    pub fn from(self: &Arc<Self>, element: &Element) -> Invoker {
        Invoker {
            engine: Arc::clone(self),
            element: element.clone(),
        }
    }

    /// Feeds one host event through delegation. Returns the finished
    /// context when the event ran a pipeline inline; debounced and
    /// non-matching events return `None`.
    pub async fn dispatch(
        self: &Arc<Self>,
        event: &DomEvent,
    ) -> Result<Option<Context>, EngineError> {
        if !self.delegate.is_listening(&event.event_type) {
            return Ok(None);
        }
        self.handle_field_event(event);

        let Some(hit) = self.delegate.resolve(event)? else {
            return Ok(None);
        };
        let min = self.base_config().telemetry;
        self.emit(
            min,
            EngineEvent::new(EventKind::TriggerMatched).with_reason(event.event_type.as_str()),
        );

        let node = hit.element.node_id();
        if let Some(interval) = hit.spec.throttle {
            if !self.delegate.throttle_ok(node, interval) {
                self.emit(
                    min,
                    EngineEvent::new(EventKind::TriggerThrottled)
                        .with_reason(event.event_type.as_str()),
                );
                return Ok(None);
            }
        }

        if let Some(delay) = hit.spec.delay {
            let generation = self.delegate.arm_debounce(node);
            self.emit(
                min,
                EngineEvent::new(EventKind::TriggerDebounced)
                    .with_reason(event.event_type.as_str())
                    .with_delay(delay),
            );

            let engine = Arc::clone(self);
            let element = hit.element.clone();
            let trigger = event.event_type.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if !engine.delegate.debounce_current(node, generation) {
                    return;
                }
                match engine.build_context(Some(&element), &Value::Object(Map::new()), &trigger) {
                    Ok(mut cx) => {
                        cx.state.debounced = true;
                        engine.run_pipeline(&mut cx).await;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e.as_message(), "debounced trigger failed to build");
                    }
                }
            });
            return Ok(None);
        }

        // Only the unmodified path suppresses the native default action.
        if hit.spec.throttle.is_none() {
            event.prevent_default();
        }
        let cx = self.build_context(Some(&hit.element), &Value::Object(Map::new()), &event.event_type)?;
        self.run(cx).await.map(Some)
    }

    /// Blur marks fields touched and validates them; input re-validates
    /// already-invalid touched fields after the configured debounce.
    fn handle_field_event(self: &Arc<Self>, event: &DomEvent) {
        let Some(field) = self.field_for_event(&event.target) else {
            return;
        };
        let field = &field;
        let touch = self.validator.touch();
        let node = field.node_id();

        match event.event_type.as_str() {
            "blur" => {
                touch.mark_touched(node);
                self.validate_and_report(field);
            }
            "input" => {
                if !touch.is_touched(node) || !touch.is_invalid(node) {
                    return;
                }
                let delay_ms = self.base_config().input_debounce_ms;
                if delay_ms == 0 {
                    self.validate_and_report(field);
                    return;
                }
                let (epoch, generation) = touch.arm_debounce(node);
                let engine = Arc::clone(self);
                let field = field.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
                    if engine.validator.touch().debounce_current(node, epoch, generation) {
                        engine.validate_and_report(&field);
                    }
                });
            }
            _ => {}
        }
    }

    /// Resolves the field a blur/input event belongs to. Plain fields are
    /// their own target; composite widgets blur on their visible focus node,
    /// which maps back to the hidden field whose adapter claims that node.
    fn field_for_event(&self, target: &Element) -> Option<Element> {
        if FieldValidator::is_enabled(target) {
            return Some(target.clone());
        }
        let mut chain = vec![target.clone()];
        chain.extend(target.ancestors());
        let wrapper = chain.into_iter().find(|el| el.has_attr("data-widget"))?;
        wrapper.descendants().into_iter().find(|field| {
            FieldValidator::is_enabled(field)
                && self.validator.adapter_for(field).blur_target(field) == *target
        })
    }

    fn validate_and_report(&self, field: &Element) {
        if let Some(err) = self.validator.validate_field(field, true) {
            let min = self.base_config().telemetry;
            let mut ev =
                EngineEvent::new(EventKind::ValidationFailed).with_field(err.field.as_str());
            if let Some(msg) = err.messages.first() {
                ev = ev.with_reason(msg.as_str());
            }
            self.emit(min, ev);
        }
    }

    /// Runs the pipeline and re-throws the terminal error, if any.
    pub(crate) async fn run(self: &Arc<Self>, mut cx: Context) -> Result<Context, EngineError> {
        self.run_pipeline(&mut cx).await;
        match cx.error.clone() {
            Some(err) => Err(err),
            None => Ok(cx),
        }
    }

    /// Merges the four configuration layers into a fresh context.
    pub(crate) fn build_context(
        &self,
        element: Option<&Element>,
        overrides: &Value,
        trigger: &str,
    ) -> Result<Context, EngineError> {
        let element_options = match element {
            Some(el) => options_from(el)?,
            None => Value::Object(Map::new()),
        };
        let global = self.global.read().expect("global lock").clone();
        let merged = merge(
            &Config::defaults_value(),
            &global,
            &element_options,
            overrides,
        )?;
        let config = Config::from_value(merged)?;
        Ok(Context::new(element.cloned(), config, trigger))
    }

    /// Publishes `ev` when its severity clears the configured floor.
    pub(crate) fn emit(&self, min: Level, ev: EngineEvent) {
        if ev.level() >= min {
            self.bus.publish(ev);
        }
    }

    fn base_config(&self) -> Config {
        self.base.read().expect("base lock").clone()
    }
}

/// An element bound to its engine for repeated programmatic runs.
pub struct Invoker {
    engine: Arc<Engine>,
    element: Element,
}

impl Invoker {
    /// Runs one interaction for the bound element.
    pub async fn execute(&self, overrides: Value) -> Result<Context, EngineError> {
        self.engine.trigger(&self.element, overrides).await
    }

    /// The bound element.
    pub fn element(&self) -> &Element {
        &self.element
    }
}

/// Builder assembling an [`Engine`] with its extensions.
pub struct EngineBuilder {
    document: Document,
    transport: Arc<dyn Transport>,
    bus_capacity: usize,
    hooks: Vec<(String, Arc<dyn Hook>)>,
    confirms: Vec<(String, Arc<dyn Confirm>)>,
    serializers: Vec<(String, Arc<dyn Serializer>)>,
    swaps: Vec<(String, Arc<dyn Swap>)>,
    retry_policies: Vec<(String, RetryPolicy)>,
    validators: Vec<(String, Validator)>,
    adapters: Vec<Arc<dyn FieldAdapter>>,
}

impl EngineBuilder {
    /// Telemetry ring-buffer capacity (clamped to 1).
    pub fn bus_capacity(mut self, capacity: usize) -> Self {
        self.bus_capacity = capacity;
        self
    }

    /// Registers a named lifecycle hook.
    pub fn with_hook(mut self, name: &str, hook: Arc<dyn Hook>) -> Self {
        self.hooks.push((name.to_string(), hook));
        self
    }

    /// Registers a named confirm handler. Register `"default"` to receive
    /// free-form confirm messages.
    pub fn with_confirm(mut self, name: &str, confirm: Arc<dyn Confirm>) -> Self {
        self.confirms.push((name.to_string(), confirm));
        self
    }

    /// Registers a named serializer alongside the built-in `json`/`form`.
    pub fn with_serializer(mut self, name: &str, serializer: Arc<dyn Serializer>) -> Self {
        self.serializers.push((name.to_string(), serializer));
        self
    }

    /// Registers a named swap strategy alongside `inner`/`outer`/`none`.
    pub fn with_swap(mut self, name: &str, swap: Arc<dyn Swap>) -> Self {
        self.swaps.push((name.to_string(), swap));
        self
    }

    /// Registers a named retry policy for `mw-retry="<name>"`.
    pub fn with_retry_policy(mut self, name: &str, policy: RetryPolicy) -> Self {
        self.retry_policies.push((name.to_string(), policy));
        self
    }

    /// Registers a custom validation rule.
    pub fn with_validator(mut self, name: &str, validator: Validator) -> Self {
        self.validators.push((name.to_string(), validator));
        self
    }

    /// Registers a field adapter ahead of the built-ins.
    pub fn with_adapter(mut self, adapter: Arc<dyn FieldAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    /// Assembles the engine. Duplicate extension names are a configuration
    /// error.
    pub fn build(self) -> Result<Arc<Engine>, EngineError> {
        let engine = Engine {
            document: self.document,
            transport: self.transport,
            bus: Bus::new(self.bus_capacity),
            delegate: Delegate::default(),
            coordinator: Coordinator::default(),
            serializers: Registry::default(),
            swaps: Registry::default(),
            confirms: Registry::default(),
            hooks: Registry::default(),
            retry_policies: RwLock::new(HashMap::new()),
            validator: FieldValidator::default(),
            global: RwLock::new(Value::Object(Map::new())),
            base: RwLock::new(Config::default()),
            initialized: AtomicBool::new(false),
        };

        engine.serializers.register("json", Arc::new(JsonSerializer))?;
        engine.serializers.register("form", Arc::new(FormSerializer))?;
        engine.swaps.register("inner", Arc::new(InnerSwap))?;
        engine.swaps.register("outer", Arc::new(OuterSwap))?;
        engine.swaps.register("none", Arc::new(NoneSwap))?;

        for (name, s) in self.serializers {
            engine.serializers.register(&name, s)?;
        }
        for (name, s) in self.swaps {
            engine.swaps.register(&name, s)?;
        }
        for (name, c) in self.confirms {
            engine.confirms.register(&name, c)?;
        }
        for (name, h) in self.hooks {
            engine.hooks.register(&name, h)?;
        }
        for (name, v) in self.validators {
            engine.validator.register_validator(&name, v)?;
        }
        for adapter in self.adapters {
            engine.validator.register_adapter(adapter);
        }
        {
            let mut policies = engine.retry_policies.write().expect("retry policy lock");
            for (name, p) in self.retry_policies {
                if policies.insert(name.clone(), p).is_some() {
                    return Err(EngineError::config(format!(
                        "retry policy '{name}' is already registered"
                    )));
                }
            }
        }

        Ok(Arc::new(engine))
    }
}
