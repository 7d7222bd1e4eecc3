// src/main.rs
//
// Exporter binary:
//
// - parse flags into an ExporterConfig
// - bind the metrics listener (fatal on failure)
// - serve scrapes in the background
// - poll the upstream API forever on the main task

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use oasis_height_exporter::{
    Cli, DefaultPoller, ExporterConfig, HeightMetrics, HttpHeightFetcher, MetricsServer,
    StartupError,
};

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout carries one height line per cycle.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("oasis_height_exporter=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("fatal error: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), StartupError> {
    let cfg = ExporterConfig::from_cli(Cli::parse())?;

    // ---------------------------
    // Metrics registry + exporter
    // ---------------------------

    let metrics = Arc::new(HeightMetrics::new()?);
    let server = MetricsServer::bind(cfg.listen_addr).await?;
    tracing::info!("metrics exporter listening on http://{}/metrics", cfg.listen_addr);
    tokio::spawn(server.serve(metrics.clone()));

    // ---------------------------
    // Upstream client + poll loop
    // ---------------------------

    let fetcher = HttpHeightFetcher::new(&cfg.fetcher)?;
    let poller = DefaultPoller::new(fetcher, metrics, &cfg);
    poller.run().await;

    Ok(())
}
