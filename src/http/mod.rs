//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, universal route, middleware)
//!     → body.rs (parse JSON / form / text body)
//!     → [routing: RouteTable::match_request]
//!     → request.rs (request ID, normalize into NormalizedRequest)
//!     → [handler::dispatch]
//!     → response.rs (translate outcome into status, headers, body)
//!     → Send to client
//! ```

pub mod body;
pub mod request;
pub mod response;
pub mod server;

pub use body::BodyError;
pub use request::{normalize, UuidRequestId, X_REQUEST_ID};
pub use response::translate;
pub use server::{AppState, HttpServer};
