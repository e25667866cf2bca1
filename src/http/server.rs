//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with a single universal handler
//! - Wire up middleware (request ID, tracing, body limit, panic guard)
//! - Bind server to listener
//! - Run each request through match → normalize → dispatch → translate

use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::{Body, Bytes},
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{HeaderMap, Method, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::config::GatewayConfig;
use crate::handler::{dispatch, Handler};
use crate::lifecycle::shutdown::signalled;
use crate::http::body::{parse_body, BodyError};
use crate::http::request::{
    normalize, propagate_request_id_layer, request_id, set_request_id_layer, X_REQUEST_ID,
};
use crate::http::response::{message_response, translate};
use crate::observability::metrics;
use crate::routing::{RouteError, RouteTable};

/// Metrics label used for requests no route accepted.
const UNMATCHED_RESOURCE: &str = "unmatched";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub handler: Arc<dyn Handler>,
}

/// HTTP server for the local API adapter.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    routes: Arc<RouteTable>,
}

impl HttpServer {
    /// Compile the route table and build the server.
    ///
    /// Fails if any route template is malformed.
    pub fn new(config: GatewayConfig, handler: Arc<dyn Handler>) -> Result<Self, RouteError> {
        let routes = Arc::new(RouteTable::compile(&config.routes)?);
        tracing::info!(routes = routes.len(), "Route table compiled");

        let state = AppState {
            routes: routes.clone(),
            handler,
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config,
            routes,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/", any(gateway_handler))
            .route("/{*path}", any(gateway_handler))
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.limits.max_body_size))
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }))
            .layer(set_request_id_layer())
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Server listening on {}", addr.port());

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                signalled(shutdown).await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The Axum router, for serving in-process.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The compiled route table.
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }
}

/// Universal handler: every path and method lands here.
async fn gateway_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(&headers);
    let path = uri.path();

    let body = match body
        .map_err(BodyError::from)
        .and_then(|bytes| parse_body(&headers, &bytes))
    {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(
                request_id = request_id.as_deref().unwrap_or("-"),
                path = %path,
                error = %e,
                "Rejected request body"
            );
            let response = e.into_response();
            metrics::record_request(
                method.as_str(),
                response.status().as_u16(),
                UNMATCHED_RESOURCE,
                start_time,
            );
            return response;
        }
    };

    let matched = state.routes.match_request(&method, path);
    tracing::debug!(
        request_id = request_id.as_deref().unwrap_or("-"),
        method = %method,
        path = %path,
        resource_path = %matched.resource_path,
        matched = matched.matched,
        "Dispatching request"
    );

    let resource = if matched.matched {
        matched.resource_path.clone()
    } else {
        UNMATCHED_RESOURCE.to_string()
    };

    let request = normalize(matched, &method, &headers, uri.query(), body);
    let outcome = dispatch(state.handler.as_ref(), request).await;
    let response = translate(outcome, request_id.as_deref());

    metrics::record_request(method.as_str(), response.status().as_u16(), &resource, start_time);
    response
}

/// Response for a handler that panicked while being dispatched.
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        *s
    } else {
        "unknown panic"
    };
    tracing::error!(panic = %detail, "Handler panicked");
    message_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouteDeclaration;
    use crate::handler::{handler_fn, Completion, HandlerError, HandlerResponse, NormalizedRequest};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn config(routes: &[(&str, &str)]) -> GatewayConfig {
        let mut config = GatewayConfig::default();
        for (template, method) in routes {
            config.routes.push(RouteDeclaration {
                template: template.to_string(),
                methods: vec![(method.to_string(), json!({}))],
            });
        }
        config
    }

    fn echo_event() -> Arc<dyn Handler> {
        Arc::new(handler_fn(|request: NormalizedRequest| async move {
            serde_json::to_value(&request)
                .map(|event| HandlerResponse::new().with_body(event))
                .map_err(HandlerError::from_error)
        }))
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_matched_request_is_normalized() {
        let server = HttpServer::new(config(&[("items/{id}", "POST")]), echo_event()).unwrap();
        let request = Request::builder()
            .method("POST")
            .uri("/items/42?verbose=1")
            .header("content-type", "application/json")
            .header("x-trace", "t1")
            .body(Body::from(r#"{"name":"widget"}"#))
            .unwrap();

        let (status, headers, event) = send(server.into_router(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(headers.contains_key(X_REQUEST_ID));
        assert_eq!(event["requestContext"]["resourcePath"], "/items/{id}");
        assert_eq!(event["requestContext"]["httpMethod"], "POST");
        assert_eq!(event["requestContext"]["requestId"], headers[X_REQUEST_ID].to_str().unwrap());
        assert_eq!(event["pathParameters"], json!({"id": "42"}));
        assert_eq!(event["queryStringParameters"], json!({"verbose": "1"}));
        assert_eq!(event["headers"]["x-trace"], "t1");
        assert_eq!(event["body"], json!({"name": "widget"}));
    }

    #[tokio::test]
    async fn test_unmatched_request_passes_raw_path() {
        let server = HttpServer::new(config(&[("items/{id}", "GET")]), echo_event()).unwrap();
        let request = Request::builder()
            .method("DELETE")
            .uri("/items/42")
            .body(Body::empty())
            .unwrap();

        let (status, _, event) = send(server.into_router(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(event["requestContext"]["resourcePath"], "/items/42");
        assert_eq!(event["pathParameters"], json!({}));
        assert_eq!(event["body"], json!({}));
    }

    #[tokio::test]
    async fn test_root_path_is_routed() {
        let server = HttpServer::new(config(&[("", "GET")]), echo_event()).unwrap();
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let (_, _, event) = send(server.into_router(), request).await;
        assert_eq!(event["requestContext"]["resourcePath"], "/");
    }

    #[tokio::test]
    async fn test_invalid_json_is_rejected_before_dispatch() {
        struct NeverCalled;
        impl Handler for NeverCalled {
            fn handle(&self, _request: NormalizedRequest, _done: Completion) {
                panic!("handler must not be called");
            }
        }

        let server = HttpServer::new(config(&[("items", "POST")]), Arc::new(NeverCalled)).unwrap();
        let request = Request::builder()
            .method("POST")
            .uri("/items")
            .header("content-type", "application/json")
            .body(Body::from("{broken"))
            .unwrap();

        let (status, _, body) = send(server.into_router(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().starts_with("Invalid JSON body"));
    }

    #[tokio::test]
    async fn test_unparsed_and_primitive_bodies() {
        let router = HttpServer::new(config(&[("items", "POST")]), echo_event())
            .unwrap()
            .into_router();

        let request = Request::builder()
            .method("POST")
            .uri("/items")
            .header("content-type", "text/plain")
            .body(Body::from("hello"))
            .unwrap();
        let (status, _, event) = send(router.clone(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(event["body"], json!({}));

        let request = Request::builder()
            .method("POST")
            .uri("/items")
            .header("content-type", "application/json")
            .body(Body::from("42"))
            .unwrap();
        let (status, _, body) = send(router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().starts_with("Invalid JSON body"));
    }

    #[tokio::test]
    async fn test_body_limit() {
        let mut config = config(&[("items", "POST")]);
        config.limits.max_body_size = 8;
        let server = HttpServer::new(config, echo_event()).unwrap();
        let request = Request::builder()
            .method("POST")
            .uri("/items")
            .header("content-type", "text/plain")
            .body(Body::from("this body is far too long"))
            .unwrap();

        let (status, _, body) = send(server.into_router(), request).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_panicking_handler_is_500() {
        struct Panics;
        impl Handler for Panics {
            fn handle(&self, _request: NormalizedRequest, _done: Completion) {
                panic!("kaboom");
            }
        }

        let server = HttpServer::new(config(&[("items", "GET")]), Arc::new(Panics)).unwrap();
        let request = Request::builder().uri("/items").body(Body::empty()).unwrap();
        let (status, _, body) = send(server.into_router(), request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"message": "Internal Server Error"}));
    }

    #[test]
    fn test_malformed_route_fails_construction() {
        let result = HttpServer::new(config(&[("items/{id", "GET")]), echo_event());
        assert!(matches!(result, Err(RouteError::Unclosed { .. })));
    }
}
