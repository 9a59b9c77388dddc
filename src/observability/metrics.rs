//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): forwards by method and status
//! - `proxy_request_duration_seconds` (histogram): time to response head
//! - `proxy_admission_wait_seconds` (histogram): time spent queued for a permit
//! - `proxy_forwards_in_flight` (gauge): permits currently held
//! - `proxy_upstream_errors_total` (counter): transport failures by kind
//! - `proxy_relayed_bytes_total` (counter): response bytes streamed back
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("proxy_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_admission_wait(waited: Duration) {
    metrics::histogram!("proxy_admission_wait_seconds").record(waited.as_secs_f64());
}

pub fn set_in_flight(count: usize) {
    metrics::gauge!("proxy_forwards_in_flight").set(count as f64);
}

pub fn record_upstream_error(kind: &'static str) {
    metrics::counter!("proxy_upstream_errors_total", "kind" => kind).increment(1);
}

pub fn record_relayed_bytes(bytes: u64) {
    metrics::counter!("proxy_relayed_bytes_total").increment(bytes);
}
