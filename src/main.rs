//! local-api: serve API-Gateway-style handlers behind a local HTTP listener.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────────┐
//!                       │                    LOCAL API                     │
//!                       │                                                  │
//!   Client Request      │  ┌─────────┐   ┌─────────┐   ┌──────────────┐    │
//!   ────────────────────┼─▶│  http   │──▶│  body   │──▶│   routing    │    │
//!                       │  │ server  │   │ parser  │   │  RouteTable  │    │
//!                       │  └─────────┘   └─────────┘   └──────┬───────┘    │
//!                       │                                     │            │
//!                       │                                     ▼            │
//!                       │                              ┌──────────────┐    │
//!                       │                              │  normalize   │    │
//!                       │                              └──────┬───────┘    │
//!                       │                                     │            │
//!                       │                                     ▼            │
//!   Client Response     │  ┌──────────┐                ┌──────────────┐    │
//!   ◀───────────────────┼──│ response │◀───Completion──│   handler    │    │
//!                       │  │translate │                │  (dispatch)  │    │
//!                       │  └──────────┘                └──────────────┘    │
//!                       └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use local_api::config::{load_api_description, load_config, validation::validate_config};
use local_api::config::{ConfigError, GatewayConfig, HandlerKind, LogFormat};
use local_api::lifecycle::{self, signals, Shutdown};
use local_api::observability::logging;

#[derive(Parser)]
#[command(name = "local-api")]
#[command(about = "Run API-Gateway-style handlers behind a local HTTP server", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON API description whose routes are appended to the config's.
    #[arg(short, long)]
    routes: Option<PathBuf>,

    /// Listen address, e.g. 127.0.0.1:3000.
    #[arg(short, long)]
    bind: Option<String>,

    /// Forward events to this URL instead of echoing them.
    #[arg(long)]
    forward_url: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,
}

/// Load the config file (or defaults) and apply command-line overrides.
fn resolve_config(cli: &Cli) -> Result<GatewayConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    if let Some(path) = &cli.routes {
        let description = load_api_description(path)?;
        config.routes.extend(description.routes);
    }
    if let Some(bind) = &cli.bind {
        config.listener.bind_address = bind.clone();
    }
    if let Some(url) = &cli.forward_url {
        config.handler.kind = HandlerKind::Forward;
        config.handler.forward_url = Some(url.clone());
    }
    if cli.json_logs {
        config.observability.log_format = LogFormat::Json;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    logging::init_logging(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        handler = ?config.handler.kind,
        "local-api starting"
    );

    let (server, listener) = lifecycle::start(config).await?;

    let shutdown = Arc::new(Shutdown::new());
    let server_shutdown = shutdown.subscribe();
    signals::spawn_signal_listener(shutdown.clone());

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
