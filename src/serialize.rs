//! # Body serialization.
//!
//! Collected field data reaches the wire through a named [`Serializer`].
//! Two are built in: `"json"` and `"form"` (multipart). Query-encoded
//! methods bypass serializers entirely and go through [`encode_query`].

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::{Map, Value};

use crate::error::EngineError;
use crate::model::{Collected, EncodedBody, FieldValue};

/// Characters left bare in query components, matching form urlencoding.
const QUERY: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Encodes collected data into a request body.
pub trait Serializer: Send + Sync + 'static {
    fn encode(&self, data: &Collected) -> Result<EncodedBody, EngineError>;
}

/// `application/json` body. Text maps to strings, flags to booleans, lists
/// to arrays. Repeated names collapse into an array. Files are not
/// representable here and fail the encode.
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn encode(&self, data: &Collected) -> Result<EncodedBody, EngineError> {
        let mut out = Map::new();
        for (name, value) in &data.pairs {
            let v = match value {
                FieldValue::Text(s) => Value::String(s.clone()),
                FieldValue::Flag(b) => Value::Bool(*b),
                FieldValue::List(items) => {
                    Value::Array(items.iter().cloned().map(Value::String).collect())
                }
                FieldValue::File(f) => {
                    return Err(EngineError::config(format!(
                        "file field '{}' ({}) requires the form serializer",
                        name, f.filename
                    )));
                }
            };
            match out.get_mut(name) {
                None => {
                    out.insert(name.clone(), v);
                }
                Some(Value::Array(arr)) => arr.push(v),
                Some(existing) => {
                    let prior = existing.take();
                    *existing = Value::Array(vec![prior, v]);
                }
            }
        }
        let bytes = serde_json::to_vec(&Value::Object(out))
            .map_err(|e| EngineError::config(format!("json encode failed: {e}")))?;
        Ok(EncodedBody {
            content_type: "application/json".to_string(),
            bytes,
        })
    }
}

/// `multipart/form-data` body. The only encoding that carries file fields.
pub struct FormSerializer;

impl FormSerializer {
    fn boundary() -> String {
        format!("----markwire-{}", uuid::Uuid::new_v4().simple())
    }
}

impl Serializer for FormSerializer {
    fn encode(&self, data: &Collected) -> Result<EncodedBody, EngineError> {
        let boundary = Self::boundary();
        let mut body: Vec<u8> = Vec::new();

        let mut push_text = |body: &mut Vec<u8>, name: &str, value: &str| {
            body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            );
            body.extend_from_slice(value.as_bytes());
            body.extend_from_slice(b"\r\n");
        };

        for (name, value) in &data.pairs {
            match value {
                FieldValue::Text(s) => push_text(&mut body, name, s),
                FieldValue::Flag(b) => push_text(&mut body, name, if *b { "true" } else { "false" }),
                FieldValue::List(items) => {
                    for item in items {
                        push_text(&mut body, name, item);
                    }
                }
                FieldValue::File(f) => {
                    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{}\"\r\n",
                            f.filename
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(
                        format!("Content-Type: {}\r\n\r\n", f.content_type).as_bytes(),
                    );
                    body.extend_from_slice(&f.bytes);
                    body.extend_from_slice(b"\r\n");
                }
            }
        }
        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

        Ok(EncodedBody {
            content_type: format!("multipart/form-data; boundary={boundary}"),
            bytes: body,
        })
    }
}

/// Appends collected data to a URL as a query string. List values repeat
/// the key; flags encode as `true`/`false`; file fields are skipped.
pub fn encode_query(url: &str, data: &Collected) -> String {
    let mut parts: Vec<String> = Vec::new();
    for (name, value) in &data.pairs {
        let key = utf8_percent_encode(name, QUERY).to_string();
        match value {
            FieldValue::Text(s) => {
                parts.push(format!("{key}={}", utf8_percent_encode(s, QUERY)));
            }
            FieldValue::Flag(b) => {
                parts.push(format!("{key}={}", if *b { "true" } else { "false" }));
            }
            FieldValue::List(items) => {
                for item in items {
                    parts.push(format!("{key}={}", utf8_percent_encode(item, QUERY)));
                }
            }
            FieldValue::File(_) => {}
        }
    }
    if parts.is_empty() {
        return url.to_string();
    }
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{url}{sep}{}", parts.join("&"))
}
