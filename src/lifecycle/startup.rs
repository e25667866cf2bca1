//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the application entry point from configuration
//! - Compile the route table (via `HttpServer::new`)
//! - Start the metrics exporter when enabled
//! - Bind the listener last
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Malformed route templates abort before the listener binds

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{GatewayConfig, HandlerConfig, HandlerKind};
use crate::handler::forward::ForwardError;
use crate::handler::{EchoHandler, ForwardHandler, Handler};
use crate::http::HttpServer;
use crate::observability::metrics;
use crate::routing::RouteError;

/// Errors that stop the process before it serves traffic.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to set up handler: {0}")]
    Handler(#[from] ForwardError),

    #[error("invalid route table: {0}")]
    Routes(#[from] RouteError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Construct the configured application entry point.
pub fn build_handler(config: &HandlerConfig) -> Result<Arc<dyn Handler>, StartupError> {
    let handler: Arc<dyn Handler> = match config.kind {
        HandlerKind::Echo => Arc::new(EchoHandler),
        HandlerKind::Forward => {
            let forward = ForwardHandler::from_config(config)?;
            tracing::info!(url = %forward.url(), "Forwarding events upstream");
            Arc::new(forward)
        }
    };
    Ok(handler)
}

/// Initialize subsystems in order and bind the listener.
pub async fn start(config: GatewayConfig) -> Result<(HttpServer, TcpListener), StartupError> {
    let handler = build_handler(&config.handler)?;

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = HttpServer::new(config, handler)?;
    for route in server.routes().iter() {
        tracing::debug!(
            resource_path = %route.resource_path(),
            methods = ?route.supported_methods().collect::<Vec<_>>(),
            params = ?route.matcher().param_names(),
            "Route registered"
        );
    }

    let address = server.config().listener.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;

    Ok((server, listener))
}
