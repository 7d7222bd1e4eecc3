//! Retry policy for upstream requests.

use std::time::Duration;

use backon::ExponentialBuilder;

use crate::error::FetchError;

/// HTTP statuses treated as transient.
///
/// 104 is not a registered HTTP status; it mirrors `ECONNRESET`, which some
/// proxies in front of explorer APIs surface as a status code.
pub const RETRYABLE_STATUSES: [u16; 8] = [104, 408, 425, 429, 500, 502, 503, 504];

/// Bounded retry with exponential backoff.
///
/// Attempt `n` (1-based) that fails with a retryable error is followed by a
/// sleep of `initial_backoff * multiplier^(n-1)`, capped at `max_backoff`.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub multiplier: f32,
    pub max_backoff: Duration,
    pub retryable_statuses: Vec<u16>,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;

    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }

    /// Whether a failed attempt should be followed by another one.
    pub fn should_retry(&self, err: &FetchError) -> bool {
        match err {
            FetchError::Transport { .. } | FetchError::Timeout { .. } => true,
            FetchError::Status { status, .. } => self.is_retryable_status(*status),
            FetchError::MalformedBody(_) => false,
        }
    }

    /// Backoff schedule for `backon`; yields one delay per retry.
    pub fn backoff(&self) -> ExponentialBuilder {
        let retries = self.max_attempts.saturating_sub(1) as usize;
        ExponentialBuilder::default()
            .with_min_delay(self.initial_backoff)
            .with_factor(self.multiplier)
            .with_max_delay(self.max_backoff)
            .with_max_times(retries)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            initial_backoff: Duration::from_millis(500),
            multiplier: 2.0,
            max_backoff: Duration::from_secs(8),
            retryable_statuses: RETRYABLE_STATUSES.to_vec(),
        }
    }
}
