//! Instrumentation layers for typed Kubernetes clients
//!
//! Each layer is an `Interceptor`:
//! - `TracingInterceptor` opens a client span per call
//! - `MetricsInterceptor` counts and times calls in Prometheus
//! - `LoggingInterceptor` logs call outcomes
//!
//! `telemetry` installs the global `tracing` subscriber those layers report to.

pub mod error;
pub mod logging;
pub mod metrics;
pub mod telemetry;
pub mod tracing;

pub use error::{LayerError, Result};
pub use logging::LoggingInterceptor;
pub use metrics::{ClientQueryMetrics, MetricsInterceptor};
pub use telemetry::{LogFormat, Telemetry, TelemetryConfig};
pub use self::tracing::{record_outcome, TracingInterceptor, SPAN_NAME};
