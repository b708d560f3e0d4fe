/// Metrics and telemetry for Pupmatch
///
/// Prometheus-compatible metrics for monitoring:
/// - HTTP request counts and latencies
/// - Decisions recorded per status
/// - Next-dog lookups per bucket (found or exhausted)
/// - Registrations and background jobs

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder, HistogramVec,
    IntCounter, IntCounterVec, TextEncoder,
};
use std::time::Instant;

lazy_static! {
    // ========== HTTP Metrics ==========

    /// Total HTTP requests by method, route, and status
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    /// HTTP request duration in seconds
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request latencies in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
    )
    .unwrap();

    // ========== Matching Metrics ==========

    /// Decisions recorded by status code (l, d, u)
    pub static ref DECISIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "decisions_total",
        "Total number of decisions recorded",
        &["status"]
    )
    .unwrap();

    /// Next-dog lookups by bucket and outcome
    pub static ref NEXT_DOG_LOOKUPS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "next_dog_lookups_total",
        "Total number of next-dog lookups",
        &["bucket", "outcome"]
    )
    .unwrap();

    // ========== Account Metrics ==========

    /// Accounts registered
    pub static ref ACCOUNT_REGISTRATIONS_TOTAL: IntCounter = register_int_counter!(
        "account_registrations_total",
        "Total number of registered accounts"
    )
    .unwrap();

    // ========== Background Job Metrics ==========

    /// Background job executions by job type and status
    pub static ref BACKGROUND_JOBS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "background_jobs_total",
        "Total number of background job executions",
        &["job_type", "status"]
    )
    .unwrap();
}

/// Render all registered metrics in the Prometheus text format
pub fn render_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8(buffer).unwrap_or_default()
}

pub fn record_http_request(method: &str, path: &str, status: u16, duration: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration);
}

pub fn record_decision(status_code: &str) {
    DECISIONS_TOTAL.with_label_values(&[status_code]).inc();
}

pub fn record_next_lookup(bucket: &str, found: bool) {
    let outcome = if found { "found" } else { "exhausted" };
    NEXT_DOG_LOOKUPS_TOTAL
        .with_label_values(&[bucket, outcome])
        .inc();
}

pub fn record_account_registration() {
    ACCOUNT_REGISTRATIONS_TOTAL.inc();
}

pub fn record_background_job(job_type: &str, status: &str) {
    BACKGROUND_JOBS_TOTAL
        .with_label_values(&[job_type, status])
        .inc();
}

/// Middleware recording request counts and latencies.
///
/// Labels use the matched route template so ids do not explode cardinality.
pub async fn track_http_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;

    record_http_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );
    response
}
