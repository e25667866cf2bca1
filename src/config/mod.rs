//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) [+ API description (JSON) named by routes_file]
//!     → loader.rs (parse, deserialize, merge route declarations)
//!     → validation.rs (semantic checks, template compilation)
//!     → GatewayConfig (validated, immutable)
//!     → RouteTable built once and shared via Arc
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Route declarations keep document order (it decides match precedence)
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_api_description, load_config, ConfigError};
pub use schema::ApiDescription;
pub use schema::GatewayConfig;
pub use schema::HandlerConfig;
pub use schema::HandlerKind;
pub use schema::ListenerConfig;
pub use schema::LogFormat;
pub use schema::ObservabilityConfig;
pub use schema::RouteDeclaration;
pub use schema::RouteDeclarations;
