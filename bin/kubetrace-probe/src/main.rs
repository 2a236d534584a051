use anyhow::Result;
use kube::api::ListParams;
use kube::Client;
use kubetrace_clientset::ClientsetBuilder;
use kubetrace_core::ResourceInterface;
use kubetrace_layers::{ClientQueryMetrics, Telemetry};
use std::sync::Arc;
use tracing::{error, info};

mod config;

use config::ProbeConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let config = ProbeConfig::load()?;
    let telemetry = Telemetry::init(&config.telemetry())?;

    info!(
        opentelemetry = telemetry.is_exporting(),
        "Starting kubetrace-probe in namespace {}...", config.namespace
    );

    let result = probe(&config).await;
    if let Err(e) = &result {
        error!("Probe failed: {:#}", e);
    }

    telemetry.shutdown();
    result
}

async fn probe(config: &ProbeConfig) -> Result<()> {
    let client = Client::try_default().await?;

    let mut builder = ClientsetBuilder::new(client).logging(config.log_client_calls);
    let metrics = if config.metrics {
        let metrics = Arc::new(ClientQueryMetrics::new()?);
        builder = builder.metrics(metrics.clone(), "kube");
        Some(metrics)
    } else {
        None
    };
    let clientset = builder.build();

    let pods = clientset
        .core_v1()
        .pods(&config.namespace)
        .list(&ListParams::default())
        .await?;
    info!("Found {} pods in {}", pods.items.len(), config.namespace);

    let nodes = clientset.core_v1().nodes().list(&ListParams::default()).await?;
    info!("Found {} nodes", nodes.items.len());

    if let Some(metrics) = metrics {
        println!("{}", metrics.gather()?);
    }

    Ok(())
}
