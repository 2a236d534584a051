//! Per-resource interceptor stacks

use k8s_openapi::NamespaceResourceScope;
use kube::core::{ApiResource, DynamicObject};
use kube::{Api, Client, Resource};
use kubetrace_core::{Intercepted, KubeObject, ResourceDescriptor, Result};
use kubetrace_layers::{ClientQueryMetrics, LoggingInterceptor, MetricsInterceptor, TracingInterceptor};
use std::sync::Arc;

/// Interceptors applied to every resource client, outermost first
pub type ResourceInterceptor = (
    TracingInterceptor,
    (Option<MetricsInterceptor>, Option<LoggingInterceptor>),
);

/// A `kube::Api` whose calls are traced, and optionally metered and logged
pub type InstrumentedApi<K> = Intercepted<Api<K>, ResourceInterceptor>;

/// Which optional layers wrap each resource client
#[derive(Clone, Default)]
pub struct Instrumentation {
    metrics: Option<(Arc<ClientQueryMetrics>, String)>,
    logging: bool,
    parent_only: bool,
}

impl Instrumentation {
    pub fn with_metrics(mut self, metrics: Arc<ClientQueryMetrics>, client_type: String) -> Self {
        self.metrics = Some((metrics, client_type));
        self
    }

    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.logging = enabled;
        self
    }

    /// Skip tracing for calls made outside any span
    pub fn with_parent_only(mut self, enabled: bool) -> Self {
        self.parent_only = enabled;
        self
    }

    pub fn has_metrics(&self) -> bool {
        self.metrics.is_some()
    }

    pub fn has_logging(&self) -> bool {
        self.logging
    }

    /// Interceptor stack for `K`; `namespace` is `None` for cluster-wide clients
    pub fn interceptor<K>(&self, namespace: Option<&str>) -> ResourceInterceptor
    where
        K: Resource<DynamicType = ()>,
    {
        self.interceptor_for(ResourceDescriptor::for_resource::<K>(), namespace)
    }

    /// Interceptor stack for an explicit descriptor
    pub fn interceptor_for(
        &self,
        descriptor: ResourceDescriptor,
        namespace: Option<&str>,
    ) -> ResourceInterceptor {
        let metrics = self.metrics.as_ref().map(|(metrics, client_type)| {
            MetricsInterceptor::new(
                metrics.clone(),
                client_type.clone(),
                descriptor.kind.clone(),
                namespace,
            )
        });
        let logging = self
            .logging
            .then(|| LoggingInterceptor::new(descriptor.kind.clone(), namespace));
        let tracing = TracingInterceptor::new(descriptor).parent_only(self.parent_only);
        (tracing, (metrics, logging))
    }

    pub fn namespaced<K>(&self, client: &Client, namespace: &str) -> InstrumentedApi<K>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()> + KubeObject,
    {
        Intercepted::new(
            Api::namespaced(client.clone(), namespace),
            self.interceptor::<K>(Some(namespace)),
        )
    }

    /// Cluster-scoped kinds, or a namespaced kind across all namespaces
    pub fn cluster<K>(&self, client: &Client) -> InstrumentedApi<K>
    where
        K: Resource<DynamicType = ()> + KubeObject,
    {
        Intercepted::new(Api::all(client.clone()), self.interceptor::<K>(None))
    }

    /// Untyped client for a kind known only at runtime
    pub fn dynamic(
        &self,
        client: &Client,
        ar: &ApiResource,
        namespace: Option<&str>,
    ) -> Result<InstrumentedApi<DynamicObject>> {
        let interceptor = self.interceptor_for(ResourceDescriptor::for_api_resource(ar)?, namespace);
        let api = match namespace {
            Some(namespace) => Api::namespaced_with(client.clone(), namespace, ar),
            None => Api::all_with(client.clone(), ar),
        };
        Ok(Intercepted::new(api, interceptor))
    }
}

impl std::fmt::Debug for Instrumentation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instrumentation")
            .field("metrics", &self.metrics.as_ref().map(|(_, client_type)| client_type))
            .field("logging", &self.logging)
            .field("parent_only", &self.parent_only)
            .finish()
    }
}
