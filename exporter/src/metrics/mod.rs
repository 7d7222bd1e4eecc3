//! Metrics for the exporter.
//!
//! This module defines the `oasis_latest_block_height` gauge and a small
//! HTTP exporter that serves it in Prometheus text format.
//!
//! Typical usage:
//!
//! ```ignore
//! use std::sync::Arc;
//! use oasis_height_exporter::metrics::{HeightMetrics, MetricsServer};
//!
//! let metrics = Arc::new(HeightMetrics::new()?);
//! let server = MetricsServer::bind("0.0.0.0:9099".parse()?).await?;
//!
//! // Serve scrapes in the background:
//! tokio::spawn(server.serve(metrics.clone()));
//!
//! // Elsewhere in the code:
//! metrics.set_value("api.oasisscan.com", height);
//! ```

pub mod prometheus;

pub use self::prometheus::{ENDPOINT_LABEL, HeightMetrics, MetricsServer};
