//! # Typed engine configuration.
//!
//! [`Config`] is the typed view over the merged option map (defaults ←
//! page-wide ← element attributes ← call-site overrides). Unknown keys are
//! tolerated for forward compatibility; recognized keys are documented on
//! each field.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::EngineError;
use crate::events::Level;
use crate::model::Method;
use crate::policies::RetrySpec;

/// Duplicate-request coordination policy, keyed by owning element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncPolicy {
    /// A new request for a busy element is marked aborted and never proceeds.
    Ignore,
    /// The prior in-flight request is cancelled; the new one takes its slot.
    AbortPrevious,
    /// Declared but not implemented: behaves as a no-op placement (no entry,
    /// never blocks).
    Queue,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        SyncPolicy::Ignore
    }
}

/// Where the collector reads values from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CollectSource {
    /// Enclosing form when there is one, otherwise the element itself.
    Auto,
    /// Only the triggering element.
    SelfOnly,
    /// The enclosing form (error when there is none).
    Form,
    /// Collect nothing.
    None,
    /// All fields under the elements matching a selector.
    Selector(String),
}

impl Default for CollectSource {
    fn default() -> Self {
        CollectSource::Auto
    }
}

impl Serialize for CollectSource {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let text = match self {
            CollectSource::Auto => "auto",
            CollectSource::SelfOnly => "self",
            CollectSource::Form => "form",
            CollectSource::None => "none",
            CollectSource::Selector(sel) => sel.as_str(),
        };
        s.serialize_str(text)
    }
}

impl<'de> Deserialize<'de> for CollectSource {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let text = String::deserialize(d)?;
        Ok(match text.as_str() {
            "auto" => CollectSource::Auto,
            "self" => CollectSource::SelfOnly,
            "form" => CollectSource::Form,
            "none" => CollectSource::None,
            other => CollectSource::Selector(other.to_string()),
        })
    }
}

/// Merged per-interaction configuration.
///
/// ## Field semantics
/// - `url`/`method`: the wire request; derived from the verb attribute on
///   triggered elements, required explicitly for element-less API calls.
/// - `target`: selector for the swap target (`None` = the triggering element).
/// - `swap`: swap strategy name (`"inner"`, `"outer"`, `"none"`).
/// - `serialize`: serializer name (`None` = form-sourced data uses `"form"`,
///   everything else `"json"`).
/// - `sync`: duplicate-request coordination policy.
/// - `retry`: retry spec (`false` | `true` | name | inline partial policy).
/// - `confirm`: confirm handler name, or a free-form message for the
///   `"default"` handler.
/// - `before`/`after`: hook names resolved against the hook registry.
/// - `validate`: enables client-side validation for the interaction.
/// - `indicator`: `class, selector` or `class@selector` busy-indicator spec.
/// - `collect`: collection source (see [`CollectSource`]).
/// - `focus`: move focus to the first invalid field after a failed run.
/// - `telemetry`: minimum published event level.
/// - `input_debounce_ms`: debounce for input-driven re-validation.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub method: Option<Method>,
    pub url: Option<String>,
    pub target: Option<String>,
    pub swap: String,
    pub serialize: Option<String>,
    pub sync: SyncPolicy,
    pub retry: RetrySpec,
    pub confirm: Option<String>,
    pub trigger: Option<String>,
    pub before: Vec<String>,
    pub after: Vec<String>,
    pub validate: bool,
    pub indicator: Option<String>,
    pub collect: CollectSource,
    pub focus: bool,
    pub telemetry: Level,
    pub input_debounce_ms: u64,
    pub headers: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            method: None,
            url: None,
            target: None,
            swap: "inner".to_string(),
            serialize: None,
            sync: SyncPolicy::default(),
            retry: RetrySpec::default(),
            confirm: None,
            trigger: None,
            before: Vec::new(),
            after: Vec::new(),
            validate: false,
            indicator: None,
            collect: CollectSource::default(),
            focus: true,
            telemetry: Level::Debug,
            input_debounce_ms: 0,
            headers: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Materializes a typed config from a merged option map.
    pub fn from_value(value: Value) -> Result<Self, EngineError> {
        serde_json::from_value(value)
            .map_err(|e| EngineError::config(format!("invalid configuration: {e}")))
    }

    /// The library defaults as a merge layer.
    pub fn defaults_value() -> Value {
        serde_json::to_value(Config::default()).expect("defaults serialize")
    }
}
