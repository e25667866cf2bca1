//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;

use local_api::config::{GatewayConfig, RouteDeclaration};
use local_api::handler::Handler;
use local_api::lifecycle::{self, Shutdown};

/// Build a config from `(template, "GET,POST")` pairs bound to loopback.
#[allow(dead_code)]
pub fn config_with_routes(routes: &[(&str, &str)]) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    for (template, methods) in routes {
        config.routes.push(RouteDeclaration {
            template: template.to_string(),
            methods: methods
                .split(',')
                .map(|m| (m.to_string(), serde_json::json!({})))
                .collect(),
        });
    }
    config
}

/// Start the adapter with a custom handler; returns its address.
///
/// The server stops when the returned `Shutdown` is triggered or dropped.
#[allow(dead_code)]
pub async fn start_server(config: GatewayConfig, handler: Arc<dyn Handler>) -> (SocketAddr, Shutdown) {
    let server = local_api::HttpServer::new(config.clone(), handler).unwrap();
    let listener = tokio::net::TcpListener::bind(&config.listener.bind_address)
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// Start the adapter exactly as the binary does, with the configured handler.
#[allow(dead_code)]
pub async fn start_configured(config: GatewayConfig) -> (SocketAddr, Shutdown) {
    let (server, listener) = lifecycle::start(config).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// A client that never reuses connections across tests.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
