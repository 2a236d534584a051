//! Per-call log events

use futures::future::BoxFuture;
use futures::FutureExt;
use kubetrace_core::{Interceptor, Operation};
use std::time::Instant;
use tracing::{error, info};

/// Logs the outcome and duration of each call
#[derive(Clone, Debug)]
pub struct LoggingInterceptor {
    kind: String,
    namespace: String,
}

impl LoggingInterceptor {
    /// `namespace` is `None` for cluster-scoped clients
    pub fn new(kind: impl Into<String>, namespace: Option<&str>) -> Self {
        Self {
            kind: kind.into(),
            namespace: namespace.unwrap_or_default().to_string(),
        }
    }
}

impl Interceptor for LoggingInterceptor {
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
            let duration = start.elapsed();
            match &result {
                Ok(_) => info!(
                    kind = %self.kind,
                    namespace = %self.namespace,
                    operation = operation.as_str(),
                    duration = ?duration,
                    "{} done",
                    operation
                ),
                Err(err) => error!(
                    kind = %self.kind,
                    namespace = %self.namespace,
                    operation = operation.as_str(),
                    duration = ?duration,
                    error = %err,
                    "{} failed",
                    operation
                ),
            }
            result
        }
        .boxed()
    }
}
