//! Request identification and normalization.
//!
//! # Responsibilities
//! - Assign a request ID (UUID v4) unless the client sent one
//! - Flatten headers and query string into string maps
//! - Assemble the normalized request handed to the application
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Header names are lowercase; repeated headers are joined with ", "
//! - Repeated query keys keep the last value
//! - Normalization is pure reshaping and cannot fail

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use axum::http::{HeaderMap, HeaderName, Method, Request};
use serde_json::Value;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use uuid::Uuid;

use crate::handler::{NormalizedRequest, RequestContext};
use crate::routing::MatchResult;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        Uuid::new_v4().to_string().parse().ok().map(RequestId::new)
    }
}

/// Layer that sets `x-request-id` on requests that lack one.
pub fn set_request_id_layer() -> SetRequestIdLayer<UuidRequestId> {
    SetRequestIdLayer::new(HeaderName::from_static(X_REQUEST_ID), UuidRequestId)
}

/// Layer that copies `x-request-id` onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(HeaderName::from_static(X_REQUEST_ID))
}

/// Read the request ID header, if present.
pub fn request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Flatten a header map into lowercase name → value.
pub fn header_map(headers: &HeaderMap) -> HashMap<String, String> {
    let mut flat: HashMap<String, String> = HashMap::with_capacity(headers.keys_len());
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        match flat.entry(name.as_str().to_string()) {
            Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                existing.push_str(", ");
                existing.push_str(&value);
            }
            Entry::Vacant(entry) => {
                entry.insert(value.into_owned());
            }
        }
    }
    flat
}

/// Decode a raw query string into name → value.
pub fn query_map(query: Option<&str>) -> HashMap<String, String> {
    query
        .map(|q| {
            form_urlencoded::parse(q.as_bytes())
                .into_owned()
                .collect()
        })
        .unwrap_or_default()
}

/// Assemble the normalized request for one incoming HTTP request.
pub fn normalize(
    matched: MatchResult,
    method: &Method,
    headers: &HeaderMap,
    query: Option<&str>,
    body: Value,
) -> NormalizedRequest {
    NormalizedRequest {
        request_context: RequestContext {
            resource_path: matched.resource_path,
            http_method: method.as_str().to_string(),
            request_id: request_id(headers),
        },
        headers: header_map(headers),
        query_string_parameters: query_map(query),
        body,
        path_parameters: matched.path_parameters,
        matched: matched.matched,
    }
}
