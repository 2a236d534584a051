//! Global subscriber installation

use crate::error::Result;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{global, KeyValue};
use opentelemetry_sdk::trace::{Config, TracerProvider};
use opentelemetry_sdk::Resource;
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Log output format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Subscriber settings
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TelemetryConfig {
    /// `service.name` reported on exported spans
    pub service_name: String,
    pub log_format: LogFormat,
    /// Filter directives used when `RUST_LOG` is unset
    pub log_filter: String,
    /// Bridge spans into an OpenTelemetry tracer provider
    pub opentelemetry: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "kubetrace".to_string(),
            log_format: LogFormat::Text,
            log_filter: "info".to_string(),
            opentelemetry: false,
        }
    }
}

impl TelemetryConfig {
    /// `RUST_LOG` wins over the configured directives
    pub fn env_filter(&self) -> Result<EnvFilter> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => Ok(EnvFilter::try_new(&self.log_filter)?),
        }
    }
}

/// Handle to the installed pipeline
pub struct Telemetry {
    provider: Option<TracerProvider>,
}

impl Telemetry {
    /// Install the global subscriber. Fails if one is already set.
    pub fn init(config: &TelemetryConfig) -> Result<Self> {
        let filter = config.env_filter()?;

        let fmt_layer = match config.log_format {
            LogFormat::Text => fmt::layer().boxed(),
            LogFormat::Json => fmt::layer().json().boxed(),
        };

        let provider = config
            .opentelemetry
            .then(|| tracer_provider(&config.service_name));
        let otel_layer = provider.as_ref().map(|provider| {
            tracing_opentelemetry::layer().with_tracer(provider.tracer("kubetrace"))
        });

        tracing_subscriber::registry()
            .with(fmt_layer)
            .with(otel_layer)
            .with(filter)
            .try_init()?;

        if let Some(provider) = &provider {
            global::set_tracer_provider(provider.clone());
        }

        info!(
            service = %config.service_name,
            format = ?config.log_format,
            opentelemetry = config.opentelemetry,
            "Telemetry initialized"
        );

        Ok(Self { provider })
    }

    pub fn is_exporting(&self) -> bool {
        self.provider.is_some()
    }

    /// Flush and shut down the tracer provider
    pub fn shutdown(self) {
        if self.provider.is_some() {
            global::shutdown_tracer_provider();
        }
    }
}

fn tracer_provider(service_name: &str) -> TracerProvider {
    TracerProvider::builder()
        .with_config(Config::default().with_resource(Resource::new(vec![KeyValue::new(
            "service.name",
            service_name.to_string(),
        )])))
        .build()
}
