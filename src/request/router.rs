//! # Response routing.
//!
//! Decides what a response means for the run: 2xx proceeds to the swap,
//! a 4xx with a problem-shaped body becomes server validation, any other
//! non-2xx is a plain HTTP failure.

use crate::error::EngineError;
use crate::model::{Body, Context};
use crate::request::parser::problem_from;

/// Routes the parsed response on `cx`. On server validation the outcome is
/// stored on the context before the error is returned, so the display step
/// can render it.
pub fn route_response(cx: &mut Context) -> Result<(), EngineError> {
    let Some(response) = &cx.response else {
        return Ok(());
    };
    if response.is_success() {
        return Ok(());
    }
    let status = response.status;

    if (400..500).contains(&status) {
        if let Some(outcome) = cx.body.as_ref().and_then(problem_from) {
            let title = outcome.title.clone().unwrap_or_else(|| {
                format!("{} field(s) failed validation", outcome.fields.len())
            });
            cx.validation = Some(outcome);
            return Err(EngineError::ServerValidation { title, status });
        }
    }

    Err(EngineError::Http { status })
}

/// Convenience for steps that need the response body as swap text.
pub fn body_text(body: &Body) -> Option<String> {
    match body {
        Body::Text(s) => Some(s.clone()),
        Body::Json(v) => Some(v.to_string()),
        Body::Empty => None,
    }
}
