//! Metrics collection and exposition.
//!
//! # Metrics
//! - `local_api_requests_total` (counter): requests by method, status, resource
//! - `local_api_request_duration_seconds` (histogram): latency distribution
//!
//! # Design Decisions
//! - Unmatched requests share one resource label to bound cardinality
//! - Recording is a no-op until an exporter is installed

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one finished request.
pub fn record_request(method: &str, status: u16, resource: &str, start: Instant) {
    let method = method.to_string();
    let status = status.to_string();
    let resource = resource.to_string();
    metrics::counter!(
        "local_api_requests_total",
        "method" => method.clone(),
        "status" => status.clone(),
        "resource" => resource.clone()
    )
    .increment(1);
    metrics::histogram!(
        "local_api_request_duration_seconds",
        "method" => method,
        "status" => status,
        "resource" => resource
    )
    .record(start.elapsed().as_secs_f64());
}
