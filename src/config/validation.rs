//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and URLs
//! - Compile every route template so malformed ones fail at startup
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{GatewayConfig, HandlerKind};
use crate::routing::{CompiledRoute, RouteError};

/// A single semantic problem in the configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid listener bind address `{address}`: {reason}")]
    BindAddress { address: String, reason: String },

    #[error("invalid metrics address `{address}`: {reason}")]
    MetricsAddress { address: String, reason: String },

    #[error("handler kind `forward` requires `handler.forward_url`")]
    MissingForwardUrl,

    #[error("invalid forward URL `{url}`: {reason}")]
    ForwardUrl { url: String, reason: String },

    #[error("limits.max_body_size must be greater than zero")]
    ZeroBodyLimit,

    #[error(transparent)]
    Route(#[from] RouteError),
}

/// Validate a fully merged configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = config.listener.bind_address.parse::<SocketAddr>() {
        errors.push(ValidationError::BindAddress {
            address: config.listener.bind_address.clone(),
            reason: e.to_string(),
        });
    }

    if config.observability.metrics_enabled {
        if let Err(e) = config.observability.metrics_address.parse::<SocketAddr>() {
            errors.push(ValidationError::MetricsAddress {
                address: config.observability.metrics_address.clone(),
                reason: e.to_string(),
            });
        }
    }

    if config.handler.kind == HandlerKind::Forward {
        match &config.handler.forward_url {
            None => errors.push(ValidationError::MissingForwardUrl),
            Some(url) => {
                if let Err(e) = reqwest::Url::parse(url) {
                    errors.push(ValidationError::ForwardUrl {
                        url: url.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    if config.limits.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    for declaration in &config.routes {
        if let Err(e) = CompiledRoute::compile(declaration) {
            errors.push(e.into());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
