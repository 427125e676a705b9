//! Metrics collection and exposition.
//!
//! # Metrics
//! - `guard_requests_total` (counter): completed requests by method, status
//! - `guard_requests_aborted_total` (counter): requests that never produced a response
//! - `guard_request_duration_seconds` (histogram): latency distribution
//! - `guard_rejections_total` (counter): short-circuited requests by reason
//! - `guard_tracked_clients` (gauge): distinct client identities in the rate limiter
//!
//! Without an installed recorder every call is a no-op.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Duration;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, elapsed: Duration) {
    counter!(
        "guard_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("guard_request_duration_seconds", "method" => method.to_string())
        .record(elapsed.as_secs_f64());
}

pub fn record_aborted(method: &str) {
    counter!("guard_requests_aborted_total", "method" => method.to_string()).increment(1);
}

pub fn record_rejection(reason: &'static str) {
    counter!("guard_rejections_total", "reason" => reason).increment(1);
}

pub fn record_tracked_clients(count: usize) {
    gauge!("guard_tracked_clients").set(count as f64);
}
