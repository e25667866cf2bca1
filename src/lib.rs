//! Local HTTP-to-handler adapter library.
//!
//! Receives HTTP requests, matches them against declared resource routes,
//! reshapes them into an API-Gateway-style event and hands that event to a
//! single application entry point; the handler's outcome becomes the HTTP
//! response.

pub mod config;
pub mod handler;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::GatewayConfig;
pub use handler::{Completion, Handler, HandlerError, HandlerResponse, NormalizedRequest};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::RouteTable;
