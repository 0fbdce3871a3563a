//! Metrics collection and exposition.
//!
//! # Metrics
//! - `catalog_upstream_requests_total` (counter): upstream calls by operation, outcome
//! - `catalog_upstream_request_duration_seconds` (histogram): latency distribution
//! - `catalog_upstream_retries_total` (counter): retries by operation
//! - `catalog_circuit_open_total` (counter): breaker trips by channel
//! - `catalog_circuit_state` (gauge): 0=closed, 1=half-open, 2=open

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::resilience::CircuitState;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record the outcome of one logical upstream call.
pub fn record_upstream_request(operation: &str, outcome: &str, start: Instant) {
    counter!(
        "catalog_upstream_requests_total",
        "operation" => operation.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
    histogram!(
        "catalog_upstream_request_duration_seconds",
        "operation" => operation.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_retry(operation: &str) {
    counter!("catalog_upstream_retries_total", "operation" => operation.to_string()).increment(1);
}

pub fn record_circuit_opened(channel: &str) {
    counter!("catalog_circuit_open_total", "channel" => channel.to_string()).increment(1);
}

pub fn record_circuit_state(channel: &str, state: CircuitState) {
    let value = match state {
        CircuitState::Closed => 0.0,
        CircuitState::HalfOpen => 1.0,
        CircuitState::Open => 2.0,
    };
    gauge!("catalog_circuit_state", "channel" => channel.to_string()).set(value);
}
