//! Prometheus metrics for client queries

use crate::error::Result;
use futures::future::BoxFuture;
use futures::FutureExt;
use kubetrace_core::{Interceptor, Operation};
use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Prometheus collectors for Kubernetes client queries
pub struct ClientQueryMetrics {
    /// Queries issued, by client type, kind, namespace and operation
    pub queries_total: CounterVec,
    /// Query latency in seconds
    pub query_duration_seconds: HistogramVec,
    /// Prometheus registry for metrics
    pub registry: Arc<Registry>,
}

impl ClientQueryMetrics {
    /// Create collectors in a fresh registry
    pub fn new() -> Result<Self> {
        Self::with_registry(Arc::new(Registry::new()))
    }

    /// Register the collectors in an existing registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let queries_total = CounterVec::new(
            Opts::new("kube_client_queries_total", "Total Kubernetes client queries"),
            &["client_type", "resource_kind", "resource_namespace", "operation"],
        )?;

        let query_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "kube_client_query_duration_seconds",
                "Kubernetes client query latency in seconds",
            ),
            &["client_type", "resource_kind", "operation"],
        )?;

        registry.register(Box::new(queries_total.clone()))?;
        registry.register(Box::new(query_duration_seconds.clone()))?;

        Ok(Self {
            queries_total,
            query_duration_seconds,
            registry,
        })
    }

    /// Count one query and observe its duration
    pub fn record(
        &self,
        client_type: &str,
        kind: &str,
        namespace: &str,
        operation: Operation,
        seconds: f64,
    ) {
        self.queries_total
            .with_label_values(&[client_type, kind, namespace, operation.metric_label()])
            .inc();
        self.query_duration_seconds
            .with_label_values(&[client_type, kind, operation.metric_label()])
            .observe(seconds);
    }

    /// Gather all metrics in Prometheus text format
    pub fn gather(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = vec![];
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Records every call on one resource client, errors included
#[derive(Clone)]
pub struct MetricsInterceptor {
    metrics: Arc<ClientQueryMetrics>,
    client_type: String,
    kind: String,
    namespace: String,
}

impl MetricsInterceptor {
    /// `namespace` is `None` for cluster-scoped clients
    pub fn new(
        metrics: Arc<ClientQueryMetrics>,
        client_type: impl Into<String>,
        kind: impl Into<String>,
        namespace: Option<&str>,
    ) -> Self {
        Self {
            metrics,
            client_type: client_type.into(),
            kind: kind.into(),
            namespace: namespace.unwrap_or_default().to_string(),
        }
    }
}

impl std::fmt::Debug for MetricsInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsInterceptor")
            .field("client_type", &self.client_type)
            .field("kind", &self.kind)
            .field("namespace", &self.namespace)
            .finish()
    }
}

impl Interceptor for MetricsInterceptor {
    fn intercept<'a, T>(
        &'a self,
        operation: Operation,
        call: BoxFuture<'a, kube::Result<T>>,
    ) -> BoxFuture<'a, kube::Result<T>>
    where
        T: Send + 'a,
    {
        async move {
            let start = Instant::now();
            let result = call.await;
            let seconds = start.elapsed().as_secs_f64();
            debug!(
                "Recording query metrics for {} {} ({}s)",
                operation, self.kind, seconds
            );
            self.metrics.record(
                &self.client_type,
                &self.kind,
                &self.namespace,
                operation,
                seconds,
            );
            result
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::Pod;
    use kube::api::LogParams;
    use kubetrace_core::testing::{not_found, RecordingClient};
    use kubetrace_core::{Intercepted, PodInterface, ResourceInterface};

    fn pod(name: &str) -> Pod {
        let mut pod = Pod::default();
        pod.metadata.name = Some(name.to_string());
        pod
    }

    fn count(metrics: &ClientQueryMetrics, namespace: &str, operation: &str) -> f64 {
        metrics
            .queries_total
            .with_label_values(&["kube", "Pod", namespace, operation])
            .get()
    }

    #[test]
    fn test_metrics_creation() {
        let metrics = ClientQueryMetrics::new().expect("Failed to create metrics");
        assert!(metrics.gather().is_ok());
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let registry = Arc::new(Registry::new());
        assert!(ClientQueryMetrics::with_registry(registry.clone()).is_ok());
        let err = ClientQueryMetrics::with_registry(registry).err();
        assert!(matches!(err, Some(crate::LayerError::Metrics(_))));
    }

    #[tokio::test]
    async fn test_calls_are_counted_with_labels() {
        let metrics = Arc::new(ClientQueryMetrics::new().expect("Failed to create metrics"));
        let pods = Intercepted::new(
            RecordingClient::new(pod("nginx")),
            MetricsInterceptor::new(metrics.clone(), "kube", "Pod", Some("default")),
        );

        pods.get("nginx").await.unwrap();
        pods.get("nginx").await.unwrap();
        pods.get_status("nginx").await.unwrap();

        assert_eq!(count(&metrics, "default", "get"), 2.0);
        assert_eq!(count(&metrics, "default", "get_status"), 1.0);

        let histogram = metrics
            .query_duration_seconds
            .with_label_values(&["kube", "Pod", "get"]);
        assert_eq!(histogram.get_sample_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_calls_are_counted() {
        let metrics = Arc::new(ClientQueryMetrics::new().expect("Failed to create metrics"));
        let pods = Intercepted::new(
            RecordingClient::failing(pod("nginx"), not_found("nginx")),
            MetricsInterceptor::new(metrics.clone(), "kube", "Pod", None),
        );

        assert!(pods.get("nginx").await.is_err());
        assert_eq!(count(&metrics, "", "get"), 1.0);
    }

    #[tokio::test]
    async fn test_log_reads_are_counted() {
        let metrics = Arc::new(ClientQueryMetrics::new().expect("Failed to create metrics"));
        let pods = Intercepted::new(
            RecordingClient::new(pod("nginx")),
            MetricsInterceptor::new(metrics.clone(), "kube", "Pod", Some("default")),
        );

        pods.get_logs("nginx", &LogParams::default()).await.unwrap();
        assert_eq!(count(&metrics, "default", "get_logs"), 1.0);
    }

    #[test]
    fn test_metrics_text_format_structure() {
        let metrics = ClientQueryMetrics::new().expect("Failed to create metrics");
        metrics.record("kube", "Node", "", Operation::List, 0.25);

        let output = metrics.gather().expect("Failed to gather metrics");

        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
        assert!(output.contains("kube_client_queries_total"));
        assert!(output.contains("kube_client_query_duration_seconds"));
        assert!(output.contains("operation=\"list\""));
    }
}
