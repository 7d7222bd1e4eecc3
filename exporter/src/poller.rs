//! Fixed-interval poll loop.
//!
//! Each cycle fetches the upstream height, prints it on stdout, publishes it
//! if it is above the placeholder range and then sleeps for the configured
//! frequency. Failures never end the loop.

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;

use crate::config::ExporterConfig;
use crate::error::FetchError;
use crate::fetcher::{Height, HeightSource};
use crate::metrics::HeightMetrics;

pub struct Poller<S> {
    source: S,
    metrics: Arc<HeightMetrics>,
    url: Url,
    hostname: String,
    freq: Duration,
}

impl<S: HeightSource> Poller<S> {
    pub fn new(source: S, metrics: Arc<HeightMetrics>, cfg: &ExporterConfig) -> Self {
        Self {
            source,
            metrics,
            url: cfg.url.clone(),
            hostname: cfg.hostname.clone(),
            freq: cfg.freq,
        }
    }

    /// Runs one fetch / print / publish step without sleeping.
    ///
    /// The stdout line is written for every cycle; a failed fetch prints
    /// `0.0`.
    pub async fn poll_once(&self) -> Result<Height, FetchError> {
        let result = self.source.fetch_height(&self.url).await;

        let height = result.as_ref().copied().unwrap_or(Height::ZERO);
        if let Err(e) = write_height(&mut std::io::stdout().lock(), height) {
            tracing::warn!("failed to write height to stdout: {e}");
        }

        match &result {
            Ok(h) if h.is_publishable() => {
                self.metrics.set_value(&self.hostname, *h);
                tracing::debug!(height = %h, endpoint = %self.hostname, "published block height");
            }
            Ok(h) => {
                tracing::info!(height = %h, endpoint = %self.hostname, "placeholder height, not published");
            }
            Err(e) => {
                tracing::warn!(url = %self.url, "failed to fetch block height: {e}");
            }
        }

        result
    }

    /// Runs exactly `cycles` cycles, each followed by its sleep.
    pub async fn run_cycles(&self, cycles: usize) {
        for _ in 0..cycles {
            let _ = self.poll_once().await;
            tokio::time::sleep(self.freq).await;
        }
    }

    /// Polls forever.
    pub async fn run(&self) {
        tracing::info!(
            url = %self.url,
            freq_secs = self.freq.as_secs(),
            "starting poll loop"
        );

        loop {
            let _ = self.poll_once().await;
            tokio::time::sleep(self.freq).await;
        }
    }
}

/// Writes the per-cycle stdout line.
fn write_height(out: &mut impl Write, height: Height) -> io::Result<()> {
    writeln!(out, "{height}")?;
    out.flush()
}
