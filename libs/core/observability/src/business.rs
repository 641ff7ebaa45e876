//! Business counters.
//!
//! Recorders are plain handles so they can be injected into services; the
//! underlying series are resolved through the installed `metrics` recorder.

use metrics::counter;

/// Counters for the user management domain.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserMetrics;

impl UserMetrics {
    pub fn new() -> Self {
        Self
    }

    /// Increments `app_users_total`.
    pub fn record_user_created(&self) {
        counter!("app_users_total").increment(1);
    }

    /// Increments `app_operations_total{operation, status}`.
    pub fn record_operation(&self, operation: &'static str, status: &'static str) {
        counter!(
            "app_operations_total",
            "operation" => operation,
            "status" => status
        )
        .increment(1);

        tracing::trace!(operation, status, "Recorded user operation");
    }
}

/// Counters meant for external build/deploy pipeline instrumentation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineMetrics;

impl PipelineMetrics {
    pub fn new() -> Self {
        Self
    }

    pub fn record_build(&self) {
        counter!("app_builds_total").increment(1);
    }

    pub fn record_deployment(&self, environment: &str, status: &str) {
        counter!(
            "app_deployments_total",
            "environment" => environment.to_string(),
            "status" => status.to_string()
        )
        .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;

    #[test]
    fn test_user_metrics_render() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            let metrics = UserMetrics::new();
            metrics.record_user_created();
            metrics.record_operation("create", "success");
            metrics.record_operation("create", "success");
            metrics.record_operation("get", "error");
        });

        let rendered = handle.render();
        assert!(rendered.contains("app_users_total 1"));
        assert!(rendered.contains(r#"app_operations_total{operation="create",status="success"} 2"#));
        assert!(rendered.contains(r#"app_operations_total{operation="get",status="error"} 1"#));
    }

    #[test]
    fn test_pipeline_metrics_render() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            let metrics = PipelineMetrics::new();
            metrics.record_build();
            metrics.record_deployment("staging", "success");
        });

        let rendered = handle.render();
        assert!(rendered.contains("app_builds_total 1"));
        assert!(rendered.contains(
            r#"app_deployments_total{environment="staging",status="success"} 1"#
        ));
    }
}
