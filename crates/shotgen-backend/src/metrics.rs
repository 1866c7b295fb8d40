//! Backend metrics collection.
//!
//! Provides standardized metrics for monitoring backend calls:
//! - Request counters by backend and status
//! - Latency histograms

use metrics::{counter, histogram};
use shotgen_models::BackendKind;

/// Metric name constants for consistency.
pub mod names {
    /// Total backend requests by backend and status.
    pub const REQUESTS_TOTAL: &str = "shotgen_backend_requests_total";

    /// Backend request latency in seconds by backend.
    pub const LATENCY_SECONDS: &str = "shotgen_backend_latency_seconds";
}

/// Record metrics for a completed backend call.
pub fn record_request(backend: BackendKind, status: &str, latency_ms: u64) {
    counter!(
        names::REQUESTS_TOTAL,
        "backend" => backend.as_str(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "backend" => backend.as_str()
    )
    .record(latency_ms as f64 / 1000.0);
}
