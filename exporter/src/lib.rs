//! Oasis block height exporter.
//!
//! This crate polls an Oasis explorer API for its latest block height and
//! republishes it as the Prometheus gauge `oasis_latest_block_height`:
//!
//! - startup configuration (`config`),
//! - the upstream HTTP client with retry handling (`fetcher`),
//! - the gauge and its HTTP exporter (`metrics`),
//! - the fixed-interval poll loop (`poller`),
//! - and the error types shared by all of them (`error`).
//!
//! The `oasis-height-exporter` binary wires these together; the pieces are
//! public so they can be embedded elsewhere.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod metrics;
pub mod poller;

#[cfg(test)]
mod testing;

pub use config::{Cli, ExporterConfig, FetcherConfig};
pub use error::{FetchError, StartupError};
pub use fetcher::{Height, HeightSource, HttpHeightFetcher, RetryPolicy};
pub use metrics::{HeightMetrics, MetricsServer};
pub use poller::Poller;

/// Poller wired to the HTTP fetcher, as run by the binary.
pub type DefaultPoller = Poller<HttpHeightFetcher>;
