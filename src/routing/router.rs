//! Route table and request matching.
//!
//! # Responsibilities
//! - Compile route declarations into an ordered table
//! - Look up the first route accepting a (method, path) pair
//! - Return the passthrough match when nothing accepts the request
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan in declaration order; first match wins
//! - A path match with an unsupported method falls through, never errors
//! - No-match is not an error; the handler decides what to do with it

use std::collections::{BTreeSet, HashMap};

use axum::http::Method;

use crate::config::schema::{RouteDeclaration, RouteDeclarations};
use crate::routing::matcher::{PathMatcher, RouteError};

/// Method key that accepts every HTTP method.
pub const ANY_METHOD: &str = "ANY";

/// A route declaration compiled for matching.
#[derive(Debug, Clone)]
pub struct CompiledRoute {
    resource_path: String,
    supported_methods: BTreeSet<String>,
    matcher: PathMatcher,
}

impl CompiledRoute {
    /// Compile a single declaration.
    pub fn compile(declaration: &RouteDeclaration) -> Result<Self, RouteError> {
        let resource_path = format!("/{}", declaration.template.trim_start_matches('/'));

        let mut supported_methods = BTreeSet::new();
        for (method, _) in &declaration.methods {
            let upper = method.to_ascii_uppercase();
            if upper != ANY_METHOD && Method::from_bytes(upper.as_bytes()).is_err() {
                return Err(RouteError::InvalidMethod {
                    template: declaration.template.clone(),
                    method: method.clone(),
                });
            }
            supported_methods.insert(upper);
        }

        let matcher = PathMatcher::compile(&resource_path)?;

        Ok(Self {
            resource_path,
            supported_methods,
            matcher,
        })
    }

    /// Canonical resource path, e.g. `/items/{id}`.
    pub fn resource_path(&self) -> &str {
        &self.resource_path
    }

    /// Uppercase method names this route accepts.
    pub fn supported_methods(&self) -> impl Iterator<Item = &str> {
        self.supported_methods.iter().map(String::as_str)
    }

    /// Returns true if the route accepts `method`.
    pub fn supports(&self, method: &Method) -> bool {
        self.supported_methods.contains(method.as_str())
            || self.supported_methods.contains(ANY_METHOD)
    }

    /// The compiled path matcher.
    pub fn matcher(&self) -> &PathMatcher {
        &self.matcher
    }
}

/// Outcome of matching one request against the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// Matched route's resource path, or the raw request path.
    pub resource_path: String,
    /// Extracted path parameters (empty when unmatched).
    pub path_parameters: HashMap<String, String>,
    /// Whether a declared route accepted the request.
    pub matched: bool,
}

impl MatchResult {
    /// The passthrough result for a request no route accepted.
    pub fn unmatched(path: &str) -> Self {
        Self {
            resource_path: path.to_string(),
            path_parameters: HashMap::new(),
            matched: false,
        }
    }
}

/// Ordered, immutable collection of compiled routes.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<CompiledRoute>,
}

impl RouteTable {
    /// Compile all declarations, preserving declaration order.
    pub fn compile(declarations: &RouteDeclarations) -> Result<Self, RouteError> {
        let routes = declarations
            .iter()
            .map(CompiledRoute::compile)
            .collect::<Result<Vec<_>, _>>()?;

        for route in &routes {
            if route.supported_methods.is_empty() {
                tracing::warn!(
                    resource_path = %route.resource_path,
                    "Route declares no methods and will never match"
                );
            }
            tracing::debug!(
                resource_path = %route.resource_path,
                methods = ?route.supported_methods,
                "Route compiled"
            );
        }

        Ok(Self { routes })
    }

    /// Find the first route supporting `method` whose matcher accepts `path`.
    pub fn match_request(&self, method: &Method, path: &str) -> MatchResult {
        for route in &self.routes {
            if !route.supports(method) {
                continue;
            }
            if let Some(path_parameters) = route.matcher.match_path(path) {
                return MatchResult {
                    resource_path: route.resource_path.clone(),
                    path_parameters,
                    matched: true,
                };
            }
        }
        MatchResult::unmatched(path)
    }

    /// Number of compiled routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Routes in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &CompiledRoute> {
        self.routes.iter()
    }
}
