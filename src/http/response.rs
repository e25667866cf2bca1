//! Response translation.
//!
//! # Responsibilities
//! - Turn a handler outcome into exactly one HTTP response
//! - Apply defaults for absent status, headers and body
//! - Log handler failures without leaking their detail to the client
//!
//! # Design Decisions
//! - Errors become 500 with `{"message": ...}` only
//! - Status 0 or absent means 200; unrepresentable codes are a handler error
//! - Falsy bodies (null, false, 0, "") are sent as `{}`
//! - String bodies go out verbatim as HTML, everything else as JSON
//! - Handler-supplied headers are applied last and win

use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Map, Value};

use crate::handler::{HandlerError, HandlerResponse, Outcome};

/// Translate a handler outcome into the HTTP response for one request.
pub fn translate(outcome: Outcome, request_id: Option<&str>) -> Response {
    match outcome {
        Ok(result) => success_response(result, request_id),
        Err(error) => failure_response(&error, request_id),
    }
}

/// 500 with the error message; the full trace goes to the log.
fn failure_response(error: &HandlerError, request_id: Option<&str>) -> Response {
    tracing::error!(
        request_id = request_id.unwrap_or("-"),
        trace = %error.trace(),
        "Handler failed: {}",
        error.message()
    );
    message_response(StatusCode::INTERNAL_SERVER_ERROR, error.message())
}

/// A JSON `{"message": ...}` response.
pub fn message_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn success_response(result: HandlerResponse, request_id: Option<&str>) -> Response {
    let code = match result.status_code {
        None | Some(0) => 200,
        Some(code) => code,
    };
    let status = match StatusCode::from_u16(code) {
        Ok(status) => status,
        Err(_) => {
            let error = HandlerError::new(format!("Handler returned invalid status code {}", code));
            return failure_response(&error, request_id);
        }
    };

    let body = match result.body {
        Some(body) if !is_falsy(&body) => body,
        _ => Value::Object(Map::new()),
    };

    let mut response = match body {
        Value::String(text) => (
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            text,
        )
            .into_response(),
        other => Json(other).into_response(),
    };
    *response.status_mut() = status;

    if let Some(headers) = result.headers {
        apply_headers(&mut response, headers, request_id);
    }

    response
}

fn apply_headers(response: &mut Response, headers: Map<String, Value>, request_id: Option<&str>) {
    for (name, value) in headers {
        let text = match value {
            Value::Null => continue,
            Value::String(s) => s,
            other => other.to_string(),
        };
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&text),
        ) {
            (Ok(name), Ok(value)) => {
                response.headers_mut().insert(name, value);
            }
            _ => {
                tracing::warn!(
                    request_id = request_id.unwrap_or("-"),
                    header = %name,
                    "Skipping invalid response header from handler"
                );
            }
        }
    }
}

/// JavaScript-style falsiness, which decides when the default body applies.
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_error_is_500_with_message() {
        let response = translate(Err(HandlerError::new("boom")), None);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await, json!({"message": "boom"}));
    }

    #[tokio::test]
    async fn test_error_source_is_not_leaked() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "secret path /etc/x");
        let response = translate(Err(HandlerError::new("boom").with_source(io)), Some("r1"));
        assert_eq!(body_json(response).await, json!({"message": "boom"}));
    }

    #[tokio::test]
    async fn test_minimal_success() {
        let response = translate(Ok(HandlerResponse::default()), None);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().len(), 1);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        assert_eq!(body_json(response).await, json!({}));
    }

    #[tokio::test]
    async fn test_full_success() {
        let result = HandlerResponse::new()
            .with_status(201)
            .with_header("X-Id", "7")
            .with_body(json!({"ok": true}));
        let response = translate(Ok(result), None);
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()["x-id"], "7");
        assert_eq!(body_json(response).await, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_zero_status_and_falsy_body_use_defaults() {
        for body in [json!(null), json!(false), json!(0), json!("")] {
            let result = HandlerResponse {
                status_code: Some(0),
                headers: None,
                body: Some(body),
            };
            let response = translate(Ok(result), None);
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(body_json(response).await, json!({}));
        }
    }

    #[tokio::test]
    async fn test_string_body_is_sent_verbatim() {
        let result = HandlerResponse::new().with_body("<h1>hi</h1>");
        let response = translate(Ok(result), None);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"<h1>hi</h1>");
    }

    #[tokio::test]
    async fn test_handler_content_type_wins() {
        let result = HandlerResponse::new()
            .with_header("Content-Type", "text/plain")
            .with_body("plain");
        let response = translate(Ok(result), None);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
    }

    #[tokio::test]
    async fn test_non_string_header_values_are_stringified() {
        let mut headers = Map::new();
        headers.insert("X-Count".into(), json!(3));
        headers.insert("X-Skip".into(), Value::Null);
        headers.insert("Bad Name".into(), json!("x"));
        let result = HandlerResponse {
            status_code: None,
            headers: Some(headers),
            body: None,
        };
        let response = translate(Ok(result), None);
        assert_eq!(response.headers()["x-count"], "3");
        assert!(response.headers().get("x-skip").is_none());
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_invalid_status_code_is_500() {
        let response = translate(Ok(HandlerResponse::new().with_status(1000)), None);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({"message": "Handler returned invalid status code 1000"})
        );
    }
}
