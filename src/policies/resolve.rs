//! # Retry spec resolution.
//!
//! The `mw-retry` attribute (and the `retry` config key) accepts four
//! shapes:
//!
//! - `false` — retries disabled (single attempt);
//! - `true` — the engine default policy;
//! - a registered policy name;
//! - an inline partial policy object, merged field-by-field onto the
//!   resolved base.
//!
//! The merge contract is explicit: an inline object overlays the *named*
//! policy when a `policy` key names one, otherwise the default. Delay
//! computation is always derived from the resulting fields; there is no
//! inheritable delay function.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EngineError;
use crate::policies::RetryPolicy;

/// Parsed form of the `retry` configuration value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RetrySpec {
    /// `true` → default policy; `false` → disabled.
    Enabled(bool),
    /// A registered policy name.
    Named(String),
    /// An inline partial policy, merged onto the resolved base.
    Inline(serde_json::Map<String, Value>),
}

impl Default for RetrySpec {
    fn default() -> Self {
        RetrySpec::Enabled(false)
    }
}

/// Field-by-field overlay for inline partial policies.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RetryOverlay {
    /// Base policy name to overlay onto (optional).
    policy: Option<String>,
    max_attempts: Option<u32>,
    retry_on: Option<Vec<u16>>,
    base_delay_ms: Option<u64>,
    max_delay_ms: Option<u64>,
    jitter: Option<f64>,
}

/// Resolves a [`RetrySpec`] against the registered named policies.
///
/// Unknown policy names are a configuration error. The returned policy is
/// normalized (attempt cap ≥ 1, jitter clamped, max ≥ base).
pub fn resolve_retry(
    spec: &RetrySpec,
    named: &HashMap<String, RetryPolicy>,
) -> Result<RetryPolicy, EngineError> {
    let policy = match spec {
        RetrySpec::Enabled(false) => RetryPolicy::disabled(),
        RetrySpec::Enabled(true) => RetryPolicy::default(),
        RetrySpec::Named(name) => lookup(named, name)?,
        RetrySpec::Inline(map) => {
            let overlay: RetryOverlay =
                serde_json::from_value(Value::Object(map.clone())).map_err(|e| {
                    EngineError::config(format!("invalid inline retry policy: {e}"))
                })?;
            let mut base = match &overlay.policy {
                Some(name) => lookup(named, name)?,
                None => RetryPolicy::default(),
            };
            if let Some(n) = overlay.max_attempts {
                base.max_attempts = n;
            }
            if let Some(s) = overlay.retry_on {
                base.retry_on = s;
            }
            if let Some(ms) = overlay.base_delay_ms {
                base.base_delay = Duration::from_millis(ms);
            }
            if let Some(ms) = overlay.max_delay_ms {
                base.max_delay = Duration::from_millis(ms);
            }
            if let Some(j) = overlay.jitter {
                base.jitter = j;
            }
            base
        }
    };
    Ok(policy.normalized())
}

fn lookup(named: &HashMap<String, RetryPolicy>, name: &str) -> Result<RetryPolicy, EngineError> {
    named
        .get(name)
        .cloned()
        .ok_or_else(|| EngineError::config(format!("unknown retry policy '{name}'")))
}
