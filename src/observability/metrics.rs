//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_upstream_requests_total` (counter): forwarded requests by status
//! - `gateway_upstream_duration_seconds` (histogram): upstream latency
//! - `gateway_unauthorized_total` (counter): requests rejected for a missing bearer
//! - `gateway_active_connections` (gauge): open client connections
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Prometheus exporter only runs when enabled in config

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter with an HTTP scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_upstream(status: u16, start_time: Instant) {
    counter!("gateway_upstream_requests_total", "status" => status.to_string()).increment(1);
    histogram!("gateway_upstream_duration_seconds").record(start_time.elapsed().as_secs_f64());
}

pub fn record_unauthorized() {
    counter!("gateway_unauthorized_total").increment(1);
}

pub fn connection_opened() {
    gauge!("gateway_active_connections").increment(1.0);
}

pub fn connection_closed() {
    gauge!("gateway_active_connections").decrement(1.0);
}
