//! # The per-interaction context.
//!
//! One [`Context`] exists per triggered interaction. It is created at
//! trigger (or API-call) time, mutated in place by each pipeline step, and
//! discarded after the pipeline resolves. The id is immutable after
//! creation.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::Config;
use crate::dom::Element;
use crate::error::EngineError;
use crate::state::StateSnapshot;

/// HTTP method of a wire request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Wire spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    /// GET-like methods encode collected data as a query string and carry
    /// no body.
    pub fn is_query_encoded(&self) -> bool {
        matches!(self, Method::Get | Method::Delete)
    }
}

/// An encoded request body plus its content type.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodedBody {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl EncodedBody {
    /// Body bytes as UTF-8 text (lossy).
    pub fn as_text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// The built wire request.
#[derive(Clone, Debug)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<EncodedBody>,
}

/// A raw transport response.
#[derive(Clone, Debug)]
pub struct Response {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl Response {
    /// The `content-type` header, lowercased, parameters stripped.
    pub fn content_type(&self) -> Option<String> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .map(|(_, v)| {
                v.split(';')
                    .next()
                    .unwrap_or("")
                    .trim()
                    .to_ascii_lowercase()
            })
    }

    /// Body as UTF-8 text (lossy).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// True for any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Parsed response body, keyed by content type.
#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    Json(serde_json::Value),
    Text(String),
    Empty,
}

/// A file-valued field. Only representable under multipart encoding.
#[derive(Clone, Debug, PartialEq)]
pub struct FilePart {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// One collected field value.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    /// Plain text (inputs, textareas, single selects, radio groups).
    Text(String),
    /// Boolean checked state (checkboxes).
    Flag(bool),
    /// Ordered list (multi-selects).
    List(Vec<String>),
    /// File payload.
    File(FilePart),
}

impl FieldValue {
    /// The textual form used by validators and the query encoder.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Empty values pass every validator except `required`.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Flag(checked) => !checked,
            FieldValue::List(items) => items.is_empty(),
            FieldValue::File(f) => f.bytes.is_empty(),
        }
    }
}

/// The result of the collect step: source element plus extracted data.
#[derive(Clone, Debug, Default)]
pub struct Collected {
    /// The element values were read from (form, element, or subtree root).
    pub source: Option<Element>,
    /// True when the source was a form (drives default serialization).
    pub from_form: bool,
    /// Name→value pairs in discovery order. Names may repeat.
    pub pairs: Vec<(String, FieldValue)>,
}

impl Collected {
    /// First value collected under `name`.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.pairs.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// Per-field validation failure.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub messages: Vec<String>,
}

/// Where a validation outcome came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationSource {
    Client,
    Server,
}

/// Aggregated validation result (client or server).
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationOutcome {
    pub is_valid: bool,
    pub source: ValidationSource,
    /// All failure messages, in field order.
    pub messages: Vec<String>,
    /// Per-field failures.
    pub fields: Vec<FieldError>,
    /// Server problem title, when sourced from the wire.
    pub title: Option<String>,
    /// Server problem detail, when sourced from the wire.
    pub detail: Option<String>,
}

/// Mutable run bookkeeping.
#[derive(Clone, Debug)]
pub struct RunState {
    /// Request attempts performed so far (set by the retry executor).
    pub attempts: u32,
    /// Set by coordination to skip the remainder of the pipeline.
    pub aborted: bool,
    /// Pipeline start instant.
    pub started_at: Instant,
    /// Pipeline end instant, set when the pipeline finishes.
    pub finished_at: Option<Instant>,
    /// Total run duration, set when the pipeline finishes.
    pub duration: Option<Duration>,
    /// True when the run came from a debounced trigger (suppresses the
    /// disabling side effect while the user is still interacting).
    pub debounced: bool,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            attempts: 0,
            aborted: false,
            started_at: Instant::now(),
            finished_at: None,
            duration: None,
            debounced: false,
        }
    }
}

/// The unit of work: one context per triggered interaction.
#[derive(Clone, Debug)]
pub struct Context {
    id: Uuid,
    /// Owning element; `None` for element-less API calls.
    pub element: Option<Element>,
    /// Merged configuration.
    pub config: Config,
    /// Trigger name ("click", "submit", "api", ...).
    pub trigger: String,
    /// Mutable run bookkeeping.
    pub state: RunState,
    /// Built wire request, once the build step ran.
    pub request: Option<RequestDescriptor>,
    /// Raw response handle.
    pub response: Option<Response>,
    /// Parsed response body.
    pub body: Option<Body>,
    /// Validation result (client or server), when produced.
    pub validation: Option<ValidationOutcome>,
    /// Terminal error, re-thrown by the public API after the pipeline.
    pub error: Option<EngineError>,
    /// Collect step result.
    pub collect: Option<Collected>,
    /// True when the run completed without abort or error.
    pub success: bool,

    /// Affordance snapshot taken by the capture step.
    pub(crate) snapshot: Option<StateSnapshot>,
    /// Cancellation handle for the in-flight request.
    pub(crate) cancel: CancellationToken,
}

impl Context {
    /// Creates a fresh context for one interaction.
    pub fn new(element: Option<Element>, config: Config, trigger: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            element,
            config,
            trigger: trigger.to_string(),
            state: RunState::default(),
            request: None,
            response: None,
            body: None,
            validation: None,
            error: None,
            collect: None,
            success: false,
            snapshot: None,
            cancel: CancellationToken::new(),
        }
    }

    /// The immutable context id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The cancellation handle coordination stores for `abort-previous`.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_emptiness() {
        assert!(FieldValue::Text("".into()).is_empty());
        assert!(FieldValue::Text("   ".into()).is_empty());
        assert!(FieldValue::Flag(false).is_empty());
        assert!(FieldValue::List(vec![]).is_empty());
        assert!(!FieldValue::Text("x".into()).is_empty());
        assert!(!FieldValue::List(vec!["a".into()]).is_empty());
    }

    #[test]
    fn test_response_content_type_strips_parameters() {
        let mut headers = BTreeMap::new();
        headers.insert(
            "Content-Type".to_string(),
            "application/json; charset=utf-8".to_string(),
        );
        let resp = Response {
            status: 200,
            headers,
            body: vec![],
        };
        assert_eq!(resp.content_type().as_deref(), Some("application/json"));
        assert!(resp.is_success());
    }

    #[test]
    fn test_context_id_is_stable() {
        let cx = Context::new(None, Config::default(), "api");
        let id = cx.id();
        assert_eq!(cx.id(), id);
    }
}
