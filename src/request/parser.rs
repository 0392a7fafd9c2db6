//! # Response parsing.
//!
//! Maps a raw response into a typed [`Body`] by content type, and
//! recognizes problem-shaped JSON bodies carrying per-field server errors.
//! A body counts as a problem only when it has an `errors` map; arbitrary
//! JSON error payloads stay plain [`Body::Json`].

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::model::{Body, FieldError, Response, ValidationOutcome, ValidationSource};

/// One-or-many message values, as servers emit both shapes.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

/// The problem-details shape the router recognizes on 4xx responses.
#[derive(Debug, Deserialize)]
struct WireProblem {
    title: Option<String>,
    detail: Option<String>,
    errors: BTreeMap<String, OneOrMany>,
}

/// Parses the response body by content type. JSON that fails to parse
/// degrades to text rather than failing the pipeline.
pub fn parse_body(response: &Response) -> Body {
    if response.body.is_empty() {
        return Body::Empty;
    }
    let is_json = matches!(
        response.content_type().as_deref(),
        Some("application/json") | Some("application/problem+json")
    );
    if is_json {
        match serde_json::from_slice(&response.body) {
            Ok(v) => return Body::Json(v),
            Err(e) => {
                tracing::debug!(error = %e, "json body failed to parse, treating as text");
            }
        }
    }
    Body::Text(response.text())
}

/// Extracts a server validation outcome from a parsed body, when the body
/// is problem-shaped.
pub fn problem_from(body: &Body) -> Option<ValidationOutcome> {
    let Body::Json(value) = body else { return None };
    let problem: WireProblem = serde_json::from_value(value.clone()).ok()?;
    if problem.errors.is_empty() {
        return None;
    }

    let fields: Vec<FieldError> = problem
        .errors
        .into_iter()
        .map(|(field, messages)| FieldError {
            field,
            messages: messages.into_vec(),
        })
        .collect();
    let messages = fields.iter().flat_map(|f| f.messages.clone()).collect();

    Some(ValidationOutcome {
        is_valid: false,
        source: ValidationSource::Server,
        messages,
        fields,
        title: problem.title,
        detail: problem.detail,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(content_type: &str, body: &str) -> Response {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), content_type.to_string());
        Response {
            status: 400,
            headers,
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_parse_by_content_type() {
        assert_eq!(
            parse_body(&response("application/json", r#"{"ok":true}"#)),
            Body::Json(json!({"ok": true}))
        );
        assert_eq!(
            parse_body(&response("text/html", "<p>hi</p>")),
            Body::Text("<p>hi</p>".to_string())
        );
        assert_eq!(parse_body(&response("application/json", "")), Body::Empty);
    }

    #[test]
    fn test_malformed_json_degrades_to_text() {
        assert_eq!(
            parse_body(&response("application/json", "{nope")),
            Body::Text("{nope".to_string())
        );
    }

    #[test]
    fn test_problem_with_field_errors() {
        let body = parse_body(&response(
            "application/problem+json",
            r#"{"title":"Validation failed","errors":{"Email":["Taken"],"Name":"Required"}}"#,
        ));
        let outcome = problem_from(&body).unwrap();
        assert!(!outcome.is_valid);
        assert_eq!(outcome.source, ValidationSource::Server);
        assert_eq!(outcome.title.as_deref(), Some("Validation failed"));
        assert_eq!(outcome.fields.len(), 2);
        assert_eq!(outcome.fields[0].field, "Email");
        assert_eq!(outcome.fields[0].messages, vec!["Taken".to_string()]);
        assert_eq!(outcome.fields[1].messages, vec!["Required".to_string()]);
    }

    #[test]
    fn test_plain_json_errors_are_not_problems() {
        let body = parse_body(&response("application/json", r#"{"error":"boom"}"#));
        assert!(problem_from(&body).is_none());
        let body = parse_body(&response("application/json", r#"{"errors":{}}"#));
        assert!(problem_from(&body).is_none());
    }
}
