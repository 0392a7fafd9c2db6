//! # Request building.
//!
//! Turns the context (merged config + collected data) into a
//! [`RequestDescriptor`]. Query-encoded methods carry data in the URL;
//! body methods go through a named serializer, picked explicitly or by
//! the data's origin (form-sourced data uses the form serializer).

use crate::error::EngineError;
use crate::model::{Collected, Context, RequestDescriptor};
use crate::registry::Registry;
use crate::serialize::{encode_query, Serializer};

const ACCEPT: &str = "application/json, text/html;q=0.9, */*;q=0.8";

/// Builds the wire request for `cx`.
pub fn build_request(
    cx: &Context,
    serializers: &Registry<dyn Serializer>,
) -> Result<RequestDescriptor, EngineError> {
    let method = cx
        .config
        .method
        .ok_or_else(|| EngineError::config("no method configured for the request"))?;
    let url = cx
        .config
        .url
        .clone()
        .ok_or_else(|| EngineError::config("no url configured for the request"))?;

    let empty = Collected::default();
    let data = cx.collect.as_ref().unwrap_or(&empty);

    let mut headers = cx.config.headers.clone();
    headers
        .entry("accept".to_string())
        .or_insert_with(|| ACCEPT.to_string());

    if method.is_query_encoded() {
        return Ok(RequestDescriptor {
            method,
            url: encode_query(&url, data),
            headers,
            body: None,
        });
    }

    let name = cx
        .config
        .serialize
        .clone()
        .unwrap_or_else(|| if data.from_form { "form" } else { "json" }.to_string());
    let serializer = serializers
        .get(&name)
        .ok_or_else(|| EngineError::config(format!("unknown serializer '{name}'")))?;
    let body = serializer.encode(data)?;
    headers.insert("content-type".to_string(), body.content_type.clone());

    Ok(RequestDescriptor {
        method,
        url,
        headers,
        body: Some(body),
    })
}
