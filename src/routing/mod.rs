//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     RouteDeclarations (config / API description, in declaration order)
//!     → matcher.rs (rewrite {name} placeholders, compile regex)
//!     → router.rs (freeze as immutable RouteTable)
//!
//! Incoming Request (method, path)
//!     → router.rs (scan table in order)
//!     → matcher.rs (test path, extract parameters)
//!     → Return: MatchResult (matched route or raw-path passthrough)
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Deterministic: same input always matches same route
//! - First match wins (declaration order, no specificity ranking)

pub mod matcher;
pub mod router;

pub use matcher::{PathMatcher, RouteError};
pub use router::{CompiledRoute, MatchResult, RouteTable, ANY_METHOD};
