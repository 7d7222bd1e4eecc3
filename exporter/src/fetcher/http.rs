//! HTTP client for the Oasis explorer block list API.
//!
//! The endpoint is expected to answer `GET <url>` with a JSON document of
//! the form:
//!
//! ```json
//! {
//!   "data": {
//!     "list": [
//!       { "height": 21577349, "hash": "…", "timestamp": 1760000000 },
//!       …
//!     ]
//!   }
//! }
//! ```
//!
//! Only `data.list[0].height` is read; every other field is ignored.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use backon::Retryable;
use bytes::Bytes;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

use crate::config::FetcherConfig;
use crate::error::{FetchError, StartupError};
use crate::fetcher::{Height, HeightSource, RetryPolicy};

/// HTTP-based height fetcher.
///
/// Cheap to clone; the underlying `reqwest::Client` keeps a shared
/// connection pool.
#[derive(Clone, Debug)]
pub struct HttpHeightFetcher {
    client: Client,
    retry: RetryPolicy,
}

impl HttpHeightFetcher {
    pub fn new(cfg: &FetcherConfig) -> Result<Self, StartupError> {
        let client = Client::builder()
            .timeout(cfg.timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            retry: cfg.retry.clone(),
        })
    }

    /// One GET; returns the body of a 200 response.
    async fn attempt(&self, url: &Url, attempt: u32) -> Result<Bytes, FetchError> {
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| transport_error(&e, attempt))?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status {
                status: status.as_u16(),
                attempts: attempt,
            });
        }

        resp.bytes().await.map_err(|e| transport_error(&e, attempt))
    }
}

impl HeightSource for HttpHeightFetcher {
    async fn fetch_height(&self, url: &Url) -> Result<Height, FetchError> {
        let attempts = AtomicU32::new(0);

        let body = (|| self.attempt(url, attempts.fetch_add(1, Ordering::Relaxed) + 1))
            .retry(self.retry.backoff())
            .when(|err: &FetchError| self.retry.should_retry(err))
            .notify(|err: &FetchError, delay: Duration| {
                tracing::debug!(%url, ?delay, "fetch attempt failed, retrying: {err}");
            })
            .await?;

        parse_height(&body)
    }
}

fn transport_error(e: &reqwest::Error, attempts: u32) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout { attempts }
    } else {
        FetchError::Transport {
            attempts,
            message: e.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BlocksResponse {
    data: BlocksPage,
}

#[derive(Debug, Deserialize)]
struct BlocksPage {
    list: Vec<BlockSummary>,
}

#[derive(Debug, Deserialize)]
struct BlockSummary {
    height: RawHeight,
}

/// Some explorer deployments quote numbers, so accept both forms.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawHeight {
    Number(f64),
    Text(String),
}

/// Extracts `data.list[0].height` from a response body.
pub fn parse_height(body: &[u8]) -> Result<Height, FetchError> {
    let resp: BlocksResponse = serde_json::from_slice(body)
        .map_err(|e| FetchError::MalformedBody(format!("unexpected JSON shape: {e}")))?;

    let first = resp
        .data
        .list
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::MalformedBody("data.list is empty".to_string()))?;

    let value = match first.height {
        RawHeight::Number(n) => n,
        RawHeight::Text(s) => s.trim().parse::<f64>().map_err(|e| {
            FetchError::MalformedBody(format!("height {s:?} is not a number: {e}"))
        })?,
    };

    if !value.is_finite() || value < 0.0 {
        return Err(FetchError::MalformedBody(format!(
            "height {value} is not a valid block height"
        )));
    }

    Ok(Height(value))
}
