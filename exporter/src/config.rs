//! Startup configuration for the exporter.
//!
//! Command-line flags (each with an environment-variable fallback) are parsed
//! into [`Cli`] and then validated into an immutable [`ExporterConfig`]:
//!
//! - metrics listener address (`--listen-host`, `--port`),
//! - upstream API endpoint (`--url`),
//! - poll frequency (`--freq`),
//! - fetcher tuning (`--timeout`, `--max-attempts`).

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use clap::Parser;
use reqwest::Url;

use crate::error::StartupError;
use crate::fetcher::RetryPolicy;

pub const DEFAULT_PORT: u16 = 9099;
pub const DEFAULT_FREQ_SECS: u64 = 300;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Exporter of external Oasis block height.
#[derive(Parser, Debug, Clone)]
#[command(name = "oasis-height-exporter")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// The port used to export the metrics.
    #[arg(long, value_name = "PORT", env = "OASIS_EXPORTER_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// URL of Oasis API endpoint.
    #[arg(long, value_name = "URL", env = "OASIS_EXPORTER_URL")]
    pub url: Option<String>,

    /// Update frequency in seconds.
    #[arg(long, value_name = "SEC", env = "OASIS_EXPORTER_FREQ", default_value_t = DEFAULT_FREQ_SECS)]
    pub freq: u64,

    /// Address the metrics listener binds to.
    #[arg(
        long,
        value_name = "IP",
        env = "OASIS_EXPORTER_LISTEN_HOST",
        default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED)
    )]
    pub listen_host: IpAddr,

    /// Per-attempt request timeout in seconds.
    #[arg(long, value_name = "SEC", env = "OASIS_EXPORTER_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Total number of attempts per fetch, including the first one.
    #[arg(
        long,
        value_name = "N",
        env = "OASIS_EXPORTER_MAX_ATTEMPTS",
        default_value_t = RetryPolicy::DEFAULT_MAX_ATTEMPTS
    )]
    pub max_attempts: u32,
}

/// Configuration for the upstream HTTP client.
#[derive(Clone, Debug)]
pub struct FetcherConfig {
    /// Timeout applied to each individual attempt.
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
        }
    }
}

/// Validated, immutable configuration for one exporter process.
#[derive(Clone, Debug)]
pub struct ExporterConfig {
    /// Address to bind the metrics HTTP server to.
    pub listen_addr: SocketAddr,
    /// Upstream endpoint polled every cycle.
    pub url: Url,
    /// Host part of `url`, used as the `external_endpoint` label.
    pub hostname: String,
    /// Sleep between two poll cycles.
    pub freq: Duration,
    pub fetcher: FetcherConfig,
}

impl ExporterConfig {
    /// Validates parsed command-line flags.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::Config`] if `--url` is missing, is not an
    /// absolute URL with a host, or if `--freq`, `--timeout` or
    /// `--max-attempts` is zero.
    pub fn from_cli(cli: Cli) -> Result<Self, StartupError> {
        let raw_url = cli
            .url
            .ok_or_else(|| StartupError::Config("--url is required".to_string()))?;
        let url = Url::parse(&raw_url)
            .map_err(|e| StartupError::Config(format!("invalid --url {raw_url:?}: {e}")))?;
        let hostname = endpoint_label(&url)
            .ok_or_else(|| StartupError::Config(format!("--url {raw_url:?} has no host")))?;

        if cli.freq == 0 {
            return Err(StartupError::Config("--freq must be at least 1".to_string()));
        }
        if cli.timeout == 0 {
            return Err(StartupError::Config(
                "--timeout must be at least 1".to_string(),
            ));
        }
        if cli.max_attempts == 0 {
            return Err(StartupError::Config(
                "--max-attempts must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            listen_addr: SocketAddr::new(cli.listen_host, cli.port),
            url,
            hostname,
            freq: Duration::from_secs(cli.freq),
            fetcher: FetcherConfig {
                timeout: Duration::from_secs(cli.timeout),
                retry: RetryPolicy {
                    max_attempts: cli.max_attempts,
                    ..RetryPolicy::default()
                },
            },
        })
    }
}

/// Host of `url` as used for the `external_endpoint` label.
///
/// IPv6 literals are reported without their URL brackets (`::1`).
fn endpoint_label(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    Some(host.to_string())
}
