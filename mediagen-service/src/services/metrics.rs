//! Generation metrics.
//!
//! Recorded through the `metrics` facade; the Prometheus recorder installed
//! by `service_core::observability::init_metrics` exposes them on `/metrics`.

use metrics::{counter, histogram};

/// Record the outcome of one generation request.
///
/// `outcome` is `success`, `missing_credential`, or the provider error kind.
pub fn record_generation(kind: &str, model: &str, outcome: &str) {
    counter!(
        "mediagen_requests_total",
        "kind" => kind.to_string(),
        "model" => model.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record time spent waiting on the provider, including asset download.
pub fn record_provider_latency(provider: &str, model: &str, duration_secs: f64) {
    histogram!(
        "mediagen_provider_latency_seconds",
        "provider" => provider.to_string(),
        "model" => model.to_string()
    )
    .record(duration_secs);
}

/// Record the size of media returned to the caller.
pub fn record_output_bytes(kind: &str, len: usize) {
    histogram!("mediagen_output_bytes", "kind" => kind.to_string()).record(len as f64);
}
