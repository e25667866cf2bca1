//! Built-in handler that echoes the normalized request.
//!
//! Useful for checking route declarations: matched requests come back as
//! the event the application would see, unmatched ones get a 404.

use serde_json::json;

use crate::handler::{Completion, Handler, HandlerError, HandlerResponse, NormalizedRequest};

#[derive(Debug, Clone, Copy, Default)]
pub struct EchoHandler;

impl Handler for EchoHandler {
    fn handle(&self, request: NormalizedRequest, done: Completion) {
        if !request.matched {
            let message = format!(
                "No route for {} {}",
                request.request_context.http_method, request.request_context.resource_path
            );
            done.succeed(
                HandlerResponse::new()
                    .with_status(404)
                    .with_body(json!({ "message": message })),
            );
            return;
        }

        match serde_json::to_value(&request) {
            Ok(event) => done.succeed(HandlerResponse::new().with_body(event)),
            Err(e) => done.fail(HandlerError::from_error(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{dispatch, RequestContext};
    use std::collections::HashMap;

    fn request(matched: bool) -> NormalizedRequest {
        NormalizedRequest {
            request_context: RequestContext {
                resource_path: if matched { "/items/{id}" } else { "/missing" }.into(),
                http_method: "GET".into(),
                request_id: None,
            },
            headers: HashMap::new(),
            query_string_parameters: HashMap::from([("q".to_string(), "x".to_string())]),
            body: json!({}),
            path_parameters: if matched {
                HashMap::from([("id".to_string(), "42".to_string())])
            } else {
                HashMap::new()
            },
            matched,
        }
    }

    #[tokio::test]
    async fn test_echoes_matched_request() {
        let response = dispatch(&EchoHandler, request(true)).await.unwrap();
        assert_eq!(response.status_code, None);
        let body = response.body.unwrap();
        assert_eq!(body["pathParameters"]["id"], "42");
        assert_eq!(body["queryStringParameters"]["q"], "x");
        assert_eq!(body["requestContext"]["resourcePath"], "/items/{id}");
    }

    #[tokio::test]
    async fn test_unmatched_is_404() {
        let response = dispatch(&EchoHandler, request(false)).await.unwrap();
        assert_eq!(response.status_code, Some(404));
        assert_eq!(
            response.body.unwrap(),
            json!({"message": "No route for GET /missing"})
        );
    }
}
