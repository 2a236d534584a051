//! Probe configuration

use anyhow::{Context, Result};
use kubetrace_layers::{LogFormat, TelemetryConfig};
use serde::Deserialize;
use std::path::Path;

/// Path of the YAML config file
pub const CONFIG_ENV: &str = "KUBETRACE_CONFIG";
/// Overrides the namespace from the config file
pub const NAMESPACE_ENV: &str = "KUBETRACE_NAMESPACE";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProbeConfig {
    /// Namespace whose pods are listed
    pub namespace: String,
    pub service_name: String,
    pub log_format: LogFormat,
    pub log_filter: String,
    pub opentelemetry: bool,
    /// Record client query metrics and print them on exit
    pub metrics: bool,
    /// Log every client call
    pub log_client_calls: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        let telemetry = TelemetryConfig::default();
        Self {
            namespace: "default".to_string(),
            service_name: "kubetrace-probe".to_string(),
            log_format: telemetry.log_format,
            log_filter: telemetry.log_filter,
            opentelemetry: telemetry.opentelemetry,
            metrics: true,
            log_client_calls: false,
        }
    }
}

impl ProbeConfig {
    /// Load from `KUBETRACE_CONFIG` if set, then apply env overrides
    pub fn load() -> Result<Self> {
        let config = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        Ok(config.with_namespace_override(std::env::var(NAMESPACE_ENV).ok()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    pub fn with_namespace_override(mut self, namespace: Option<String>) -> Self {
        if let Some(namespace) = namespace.filter(|ns| !ns.is_empty()) {
            self.namespace = namespace;
        }
        self
    }

    pub fn telemetry(&self) -> TelemetryConfig {
        TelemetryConfig {
            service_name: self.service_name.clone(),
            log_format: self.log_format,
            log_filter: self.log_filter.clone(),
            opentelemetry: self.opentelemetry,
        }
    }
}
