//! Observability utilities for the pipeline API.
//!
//! This crate provides:
//! - Prometheus recorder installation and export
//! - Axum middleware for automatic HTTP request metrics
//! - Business counters for user operations and pipeline events
//! - A standalone router for the metrics listener
//!
//! # Example
//!
//! ```rust,ignore
//! use observability::{init_metrics, metrics_router, UserMetrics};
//!
//! let handle = init_metrics("pipeline-arch")?;
//! let metrics = UserMetrics::new();
//! metrics.record_operation("create", "success");
//!
//! // Serve /metrics on its own port
//! let app = metrics_router(handle.clone());
//! ```

pub mod business;
pub mod middleware;

pub use business::{PipelineMetrics, UserMetrics};
pub use middleware::metrics_middleware;

// Re-export metrics macros for convenience
pub use metrics::{counter, gauge, histogram};
pub use metrics_exporter_prometheus::{BuildError, PrometheusHandle};

use axum::{Router, extract::State, routing::get};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use once_cell::sync::OnceCell;
use std::time::Duration;
use tracing::info;

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Request latency buckets in seconds.
pub const HTTP_DURATION_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Initialize the Prometheus metrics recorder.
///
/// Call once at startup; later calls return the handle installed first.
/// Every series carries a `service` label set to `service`.
pub fn init_metrics(service: &str) -> Result<&'static PrometheusHandle, BuildError> {
    METRICS_HANDLE.get_or_try_init(|| {
        let handle = PrometheusBuilder::new()
            .add_global_label("service", service)
            .set_buckets_for_metric(
                Matcher::Full("http_request_duration_seconds".to_string()),
                HTTP_DURATION_BUCKETS,
            )?
            .install_recorder()?;

        register_metric_descriptions();
        info!(service, "Prometheus metrics recorder initialized");

        Ok(handle)
    })
}

/// Get the metrics handle (must call init_metrics first)
pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Periodically drains histogram buffers so memory stays bounded.
pub fn spawn_upkeep(handle: PrometheusHandle, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            handle.run_upkeep();
        }
    })
}

/// Router served on the dedicated metrics port.
///
/// - `/metrics`: Prometheus text exposition
/// - `/health`, `/ready`: plain `OK` probes for the metrics listener itself
pub fn metrics_router(handle: PrometheusHandle) -> Router {
    Router::new()
        .route("/metrics", get(render_metrics))
        .route("/health", get(|| async { "OK" }))
        .route("/ready", get(|| async { "OK" }))
        .with_state(handle)
}

async fn render_metrics(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}

/// Register metric descriptions for documentation
fn register_metric_descriptions() {
    use metrics::describe_counter;
    use metrics::describe_gauge;
    use metrics::describe_histogram;

    // HTTP metrics
    describe_counter!("http_requests_total", "Total number of HTTP requests");
    describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_gauge!(
        "http_requests_in_flight",
        "Number of HTTP requests currently being processed"
    );
    describe_counter!(
        "http_requests_errors_total",
        "Total number of HTTP request errors"
    );

    // Business metrics
    describe_counter!("app_users_total", "Total number of users created");
    describe_counter!(
        "app_operations_total",
        "Total number of operations by type"
    );
    describe_counter!("app_builds_total", "Total number of builds");
    describe_counter!(
        "app_deployments_total",
        "Total number of deployments by environment"
    );
}
