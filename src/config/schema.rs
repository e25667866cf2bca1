//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the adapter.
//! All types derive Serde traits for deserialization from config files.

use std::fmt;
use std::path::PathBuf;

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Root configuration for the local API adapter.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Inline route declarations, in declaration order.
    pub routes: RouteDeclarations,

    /// Optional JSON API description whose routes are appended to `routes`.
    pub routes_file: Option<PathBuf>,

    /// Which application entry point receives normalized requests.
    pub handler: HandlerConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// One declared route: a path template and the methods it serves.
///
/// The per-method configuration is opaque to the adapter; only the set of
/// method names takes part in routing.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteDeclaration {
    /// Path template, e.g. `items/{id}`.
    pub template: String,
    /// Method name → opaque handler configuration, in declaration order.
    pub methods: Vec<(String, Value)>,
}

/// Ordered route declarations.
///
/// Deserializes from a map of template → method table and keeps the order
/// in which the entries appear in the source document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteDeclarations(Vec<RouteDeclaration>);

impl RouteDeclarations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, declaration: RouteDeclaration) {
        self.0.push(declaration);
    }

    pub fn extend(&mut self, other: RouteDeclarations) {
        self.0.extend(other.0);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RouteDeclaration> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<RouteDeclaration> for RouteDeclarations {
    fn from_iter<I: IntoIterator<Item = RouteDeclaration>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a RouteDeclarations {
    type Item = &'a RouteDeclaration;
    type IntoIter = std::slice::Iter<'a, RouteDeclaration>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Serialize for RouteDeclarations {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for declaration in &self.0 {
            map.serialize_entry(&declaration.template, &MethodTableRef(&declaration.methods))?;
        }
        map.end()
    }
}

struct MethodTableRef<'a>(&'a [(String, Value)]);

impl Serialize for MethodTableRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (method, config) in self.0 {
            map.serialize_entry(method, config)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RouteDeclarations {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DeclarationsVisitor;

        impl<'de> Visitor<'de> for DeclarationsVisitor {
            type Value = RouteDeclarations;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of route template to method table")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut declarations = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((template, MethodTable(methods))) =
                    map.next_entry::<String, MethodTable>()?
                {
                    declarations.push(RouteDeclaration { template, methods });
                }
                Ok(RouteDeclarations(declarations))
            }
        }

        deserializer.deserialize_map(DeclarationsVisitor)
    }
}

/// Method table of a single route.
///
/// Accepts a map of method → config, a list of method names, or null.
struct MethodTable(Vec<(String, Value)>);

impl<'de> Deserialize<'de> for MethodTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MethodTableVisitor;

        impl<'de> Visitor<'de> for MethodTableVisitor {
            type Value = MethodTable;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of HTTP method to handler config, or a list of methods")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut methods = Vec::new();
                while let Some(entry) = map.next_entry::<String, Value>()? {
                    methods.push(entry);
                }
                Ok(MethodTable(methods))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut methods = Vec::new();
                while let Some(method) = seq.next_element::<String>()? {
                    methods.push((method, Value::Object(Default::default())));
                }
                Ok(MethodTable(methods))
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(MethodTable(Vec::new()))
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(MethodTable(Vec::new()))
            }
        }

        deserializer.deserialize_any(MethodTableVisitor)
    }
}

/// A JSON API description, as exported by an API builder (`apiConfig()`).
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ApiDescription {
    /// Description format version, informational only.
    #[serde(default)]
    pub version: Option<u32>,

    /// Declared routes.
    #[serde(default)]
    pub routes: RouteDeclarations,
}

/// Which built-in application entry point the binary wires up.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum HandlerKind {
    /// Respond with the normalized request (404 for unmatched requests).
    #[default]
    Echo,
    /// POST the normalized request to an upstream URL.
    Forward,
}

/// Application entry point configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HandlerConfig {
    /// Handler implementation.
    pub kind: HandlerKind,

    /// Upstream URL for the forwarding handler.
    pub forward_url: Option<String>,

    /// Upstream request timeout in seconds (forwarding handler only).
    pub forward_timeout_secs: u64,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            kind: HandlerKind::Echo,
            forward_url: None,
            forward_timeout_secs: 30,
        }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output for local development.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "local_api=info,tower_http=info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
