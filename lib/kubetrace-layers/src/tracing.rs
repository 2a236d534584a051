//! Client spans for every intercepted call

use futures::future::BoxFuture;
use futures::FutureExt;
use kube::Resource;
use kubetrace_core::{Interceptor, Operation, ResourceDescriptor};
use std::sync::Arc;
use tracing::field::Empty;
use tracing::{info_span, Instrument, Span};

/// Name shared by every client span
pub const SPAN_NAME: &str = "kube_client";

/// Opens one `kube_client` span per call and records its outcome.
///
/// The span is current while the inner call runs, so request-level spans
/// emitted by `kube` nest under it. Verbs where `Operation::is_traced` is
/// false are forwarded untouched. With `parent_only` set, calls made outside
/// any span are forwarded untouched as well.
#[derive(Clone, Debug)]
pub struct TracingInterceptor {
    descriptor: Arc<ResourceDescriptor>,
    parent_only: bool,
}

impl TracingInterceptor {
    pub fn new(descriptor: ResourceDescriptor) -> Self {
        Self {
            descriptor: Arc::new(descriptor),
            parent_only: false,
        }
    }

    /// Only open a span when the caller is already inside one
    pub fn parent_only(mut self, enabled: bool) -> Self {
        self.parent_only = enabled;
        self
    }

    pub fn is_parent_only(&self) -> bool {
        self.parent_only
    }

    /// Tracing for a statically typed resource
    pub fn for_resource<K>() -> Self
    where
        K: Resource<DynamicType = ()>,
    {
        Self::new(ResourceDescriptor::for_resource::<K>())
    }

    pub fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    /// Build the span for one call; outcome fields start empty
    pub fn span(&self, operation: Operation) -> Span {
        info_span!(
            SPAN_NAME,
            otel.name = %self.descriptor.span_name(),
            otel.kind = "client",
            client = %self.descriptor.client,
            resource = %self.descriptor.resource,
            kind = %self.descriptor.kind,
            operation = operation.as_str(),
            otel.status_code = Empty,
            otel.status_message = Empty,
            error = Empty,
        )
    }
}

/// Record success or failure of a finished call on its span
pub fn record_outcome<T>(span: &Span, result: &kube::Result<T>) {
    match result {
        Ok(_) => {
            span.record("otel.status_code", "OK");
        }
        Err(err) => {
            let message = err.to_string();
            span.record("otel.status_code", "ERROR");
            span.record("otel.status_message", message.as_str());
            span.record("error", message.as_str());
        }
    }
}

impl Interceptor for TracingInterceptor {
    fn intercept<'a, T>(
        &'a self,
        operation: Operation,
        call: BoxFuture<'a, kube::Result<T>>,
    ) -> BoxFuture<'a, kube::Result<T>>
    where
        T: Send + 'a,
    {
        if !operation.is_traced() || (self.parent_only && Span::current().is_none()) {
            return call;
        }
        let span = self.span(operation);
        async move {
            let result = call.instrument(span.clone()).await;
            record_outcome(&span, &result);
            result
        }
        .boxed()
    }
}
