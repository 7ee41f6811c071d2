//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Count mock requests by outcome
//! - Time route resolution
//! - Expose a Prometheus-compatible scrape endpoint when enabled
//!
//! # Metrics
//! - `mock_requests_total` (counter): requests by outcome
//! - `mock_resolution_duration_seconds` (histogram): index lookup + search time
//!
//! # Design Decisions
//! - Without an installed recorder every call is a no-op
//! - Outcome labels are a closed set (see `Outcome::label`)

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// How a request left a mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Data,
    Handler,
    NotFound,
    Delegated,
    Error,
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Data => "data",
            Outcome::Handler => "handler",
            Outcome::NotFound => "not_found",
            Outcome::Delegated => "delegated",
            Outcome::Error => "error",
        }
    }
}

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_outcome(outcome: Outcome) {
    metrics::counter!("mock_requests_total", "outcome" => outcome.label()).increment(1);
}

pub fn record_resolution(start: Instant) {
    metrics::histogram!("mock_resolution_duration_seconds").record(start.elapsed().as_secs_f64());
}
