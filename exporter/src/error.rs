use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Reason a single height fetch failed.
///
/// Every variant is recoverable: the poll loop reports it and moves on to
/// the next cycle.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, DNS or protocol failure after all attempts were used.
    #[error("transport error after {attempts} attempt(s): {message}")]
    Transport { attempts: u32, message: String },
    /// The last attempt timed out.
    #[error("request timed out after {attempts} attempt(s)")]
    Timeout { attempts: u32 },
    /// The endpoint answered with something other than 200.
    #[error("endpoint returned HTTP status {status} after {attempts} attempt(s)")]
    Status { status: u16, attempts: u32 },
    /// 200 OK, but the body did not carry `data.list[0].height`.
    #[error("malformed response body: {0}")]
    MalformedBody(String),
}

/// Errors that abort the process before polling starts.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to initialise metrics registry: {0}")]
    Registry(#[from] prometheus::Error),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("error starting metrics HTTP server on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}
