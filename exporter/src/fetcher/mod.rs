//! Clients for the upstream Oasis API.
//!
//! The poll loop only depends on the [`HeightSource`] trait; the concrete
//! [`HttpHeightFetcher`] talks to the explorer API over HTTP and applies the
//! [`RetryPolicy`] to transient failures.

pub mod http;
pub mod retry;

use std::fmt;
use std::future::Future;

use reqwest::Url;

use crate::error::FetchError;

pub use http::HttpHeightFetcher;
pub use retry::{RETRYABLE_STATUSES, RetryPolicy};

/// Block height observed from the upstream endpoint.
///
/// Held as `f64` because that is the gauge's value type. Always finite and
/// non-negative.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Height(pub f64);

impl Height {
    /// Value reported for a failed fetch.
    pub const ZERO: Height = Height(0.0);

    pub fn value(self) -> f64 {
        self.0
    }

    /// Whether this height is worth publishing.
    ///
    /// 0 and 1 are placeholder values some explorers return while syncing,
    /// so only heights strictly greater than 1 reach the gauge.
    pub fn is_publishable(self) -> bool {
        self.0 > 1.0
    }
}

impl fmt::Display for Height {
    // Always keep the fractional part so the stdout log reads `12345.0`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// Anything that can report the latest block height of an endpoint.
pub trait HeightSource {
    fn fetch_height(&self, url: &Url) -> impl Future<Output = Result<Height, FetchError>> + Send;
}
