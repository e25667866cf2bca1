//! Request body parsing.
//!
//! # Responsibilities
//! - Decode JSON and URL-encoded form bodies by `Content-Type`
//! - Report malformed or unreadable bodies as client errors
//!
//! # Design Decisions
//! - An empty body is always `{}`
//! - JSON is strict: the top level must be an object or an array
//! - Form fields are strings; the last occurrence of a key wins
//! - Any other content type is not interpreted (`{}`)

use axum::extract::rejection::BytesRejection;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Map, Value};
use thiserror::Error;

/// Body could not be turned into an event payload.
#[derive(Debug, Error)]
pub enum BodyError {
    #[error("Invalid JSON body: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// JSON whose top level is not an object or array.
    #[error("Invalid JSON body: top level must be an object or array")]
    NotContainer,

    /// Reading the body failed (too large, connection error).
    #[error("{message}")]
    Buffer { status: StatusCode, message: String },
}

impl BodyError {
    pub fn status(&self) -> StatusCode {
        match self {
            BodyError::InvalidJson(_) | BodyError::NotContainer => StatusCode::BAD_REQUEST,
            BodyError::Buffer { status, .. } => *status,
        }
    }
}

impl From<BytesRejection> for BodyError {
    fn from(rejection: BytesRejection) -> Self {
        BodyError::Buffer {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for BodyError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "message": self.to_string() }))).into_response()
    }
}

/// The kinds of body the parser understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    Form,
    Other,
}

fn body_kind(headers: &HeaderMap) -> BodyKind {
    let essence = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .unwrap_or_default();

    if essence == "application/json" || essence.ends_with("+json") {
        BodyKind::Json
    } else if essence == "application/x-www-form-urlencoded" {
        BodyKind::Form
    } else {
        BodyKind::Other
    }
}

/// Parse a buffered request body according to its `Content-Type`.
pub fn parse_body(headers: &HeaderMap, bytes: &[u8]) -> Result<Value, BodyError> {
    if bytes.is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    match body_kind(headers) {
        BodyKind::Json => {
            let first = bytes
                .iter()
                .find(|b| !matches!(b, b' ' | b'\t' | b'\n' | b'\r'));
            if !matches!(first, Some(b'{') | Some(b'[')) {
                return Err(BodyError::NotContainer);
            }
            serde_json::from_slice(bytes).map_err(BodyError::InvalidJson)
        }
        BodyKind::Form => {
            let mut fields = Map::new();
            for (key, value) in form_urlencoded::parse(bytes) {
                fields.insert(key.into_owned(), Value::String(value.into_owned()));
            }
            Ok(Value::Object(fields))
        }
        BodyKind::Other => Ok(Value::Object(Map::new())),
    }
}
