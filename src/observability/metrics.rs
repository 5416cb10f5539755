//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status, route
//! - `gateway_request_duration_seconds` (histogram): latency distribution
//! - `gateway_upstream_retries_total` (counter): retry attempts against the chat backend
//! - `gateway_access_decisions_total` (counter): premium gate outcomes
//!
//! # Design Decisions
//! - Low-overhead updates (atomic operations under the hood)
//! - Exporter runs on its own address so scrapes never touch the API port

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter started"),
        Err(e) => tracing::error!(error = %e, "Failed to start metrics exporter"),
    }
}

/// Record a completed inbound request.
pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "route" => route.to_string()
    )
    .increment(1);
    histogram!(
        "gateway_request_duration_seconds",
        "route" => route.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record one retry attempt against the chat backend.
pub fn record_upstream_retry() {
    counter!("gateway_upstream_retries_total").increment(1);
}

/// Record a premium-gate decision.
pub fn record_access_decision(granted: bool) {
    counter!(
        "gateway_access_decisions_total",
        "granted" => if granted { "true" } else { "false" }
    )
    .increment(1);
}
