//! Prometheus-backed height gauge and HTTP exporter.
//!
//! [`HeightMetrics`] owns its own Prometheus registry (no process or runtime
//! collectors are ever registered into it) and the block height gauge.
//! [`MetricsServer`] serves that registry in the text exposition format
//! using `hyper`.

use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};

use bytes::Bytes;
use http_body_util::Full;
use hyper::{
    Method, Request, Response, StatusCode, body::Incoming, header, server::conn::http1,
    service::service_fn,
};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use prometheus::{self, Encoder, GaugeVec, Opts, Registry, TextEncoder};

use crate::error::StartupError;
use crate::fetcher::Height;

pub const NAMESPACE: &str = "oasis";
pub const HEIGHT_GAUGE_NAME: &str = "latest_block_height";
pub const ENDPOINT_LABEL: &str = "external_endpoint";

/// Registry plus the block height gauge.
///
/// Share it behind an [`Arc`]: the poll loop writes the gauge while the
/// exporter task reads it. Prometheus gauges are atomic, so no extra locking
/// is needed.
#[derive(Clone)]
pub struct HeightMetrics {
    registry: Registry,
    latest_block_height: GaugeVec,
}

impl HeightMetrics {
    /// Creates a fresh registry and registers `oasis_latest_block_height`.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some(NAMESPACE.to_string()), None)?;

        let latest_block_height = GaugeVec::new(
            Opts::new(HEIGHT_GAUGE_NAME, "Oasis Latest Block Height"),
            &[ENDPOINT_LABEL],
        )?;
        registry.register(Box::new(latest_block_height.clone()))?;

        Ok(Self {
            registry,
            latest_block_height,
        })
    }

    /// Sets the gauge for `endpoint` to `height`.
    pub fn set_value(&self, endpoint: &str, height: Height) {
        self.latest_block_height
            .with_label_values(&[endpoint])
            .set(height.value());
    }

    /// Current gauge value for `endpoint`, if it was ever set.
    ///
    /// Reads through the registry so that asking for an unknown endpoint
    /// does not create an empty series.
    pub fn value(&self, endpoint: &str) -> Option<f64> {
        self.registry
            .gather()
            .iter()
            .flat_map(|mf| mf.get_metric())
            .find(|m| {
                m.get_label()
                    .iter()
                    .any(|l| l.get_name() == ENDPOINT_LABEL && l.get_value() == endpoint)
            })
            .map(|m| m.get_gauge().get_value())
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in this registry into the Prometheus text format.
    pub fn gather_text(&self) -> String {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!("failed to encode Prometheus metrics: {e}");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

/// Bound metrics listener.
///
/// Binding and serving are split so that a port conflict surfaces at
/// startup instead of inside a background task.
pub struct MetricsServer {
    listener: TcpListener,
}

impl MetricsServer {
    /// Binds the listener.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::Bind`] if the address is unavailable.
    pub async fn bind(addr: SocketAddr) -> Result<Self, StartupError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| StartupError::Bind { addr, source })?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves `GET /` and `GET /metrics` forever.
    ///
    /// Intended to be spawned onto the Tokio runtime:
    ///
    /// ```ignore
    /// let server = MetricsServer::bind(addr).await?;
    /// tokio::spawn(server.serve(metrics.clone()));
    /// ```
    pub async fn serve(self, metrics: Arc<HeightMetrics>) {
        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::warn!("failed to accept metrics connection: {e}");
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    continue;
                }
            };
            let io = TokioIo::new(stream);
            let metrics = metrics.clone();

            tokio::spawn(async move {
                let svc = service_fn(move |req| {
                    let metrics = metrics.clone();
                    handle_request(req, metrics)
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, svc).await {
                    tracing::debug!(%peer, "metrics connection error: {err}");
                }
            });
        }
    }
}

async fn handle_request(
    req: Request<Incoming>,
    metrics: Arc<HeightMetrics>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    Ok(route(req.method(), req.uri().path(), &metrics))
}

fn route(method: &Method, path: &str, metrics: &HeightMetrics) -> Response<Full<Bytes>> {
    let (status, content_type, body) = match (method, path) {
        (&Method::GET, "/" | "/metrics") => (
            StatusCode::OK,
            "text/plain; version=0.0.4",
            Bytes::from(metrics.gather_text()),
        ),
        (_, "/" | "/metrics") => (
            StatusCode::METHOD_NOT_ALLOWED,
            "text/plain",
            Bytes::from_static(b"method not allowed"),
        ),
        _ => (
            StatusCode::NOT_FOUND,
            "text/plain",
            Bytes::from_static(b"not found"),
        ),
    };

    let mut resp = Response::new(Full::new(body));
    *resp.status_mut() = status;
    resp.headers_mut()
        .insert(header::CONTENT_TYPE, header::HeaderValue::from_static(content_type));
    resp
}
