//! In-process upstream server for fetcher and poller tests.

use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Request, Response, body::Incoming, server::conn::http1, service::service_fn};
use hyper_util::rt::TokioIo;
use reqwest::Url;
use tokio::net::TcpListener;

/// Serves a scripted sequence of `(status, body)` responses.
///
/// Request `n` gets entry `n`; once the script runs out the last entry is
/// repeated.
pub struct MockUpstream {
    addr: std::net::SocketAddr,
    hits: Arc<AtomicUsize>,
    arrivals: Arc<Mutex<Vec<Instant>>>,
}

impl MockUpstream {
    pub async fn start(script: Vec<(u16, &'static str)>) -> Self {
        Self::start_delayed(script, Duration::ZERO).await
    }

    /// Like [`MockUpstream::start`], but every response is held back for
    /// `delay`.
    pub async fn start_delayed(script: Vec<(u16, &'static str)>, delay: Duration) -> Self {
        assert!(!script.is_empty(), "script needs at least one response");

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let arrivals = Arc::new(Mutex::new(Vec::new()));
        let script = Arc::new(script);

        let server_hits = hits.clone();
        let server_arrivals = arrivals.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let hits = server_hits.clone();
                let arrivals = server_arrivals.clone();
                let script = script.clone();

                tokio::spawn(async move {
                    let svc = service_fn(move |_req: Request<Incoming>| {
                        arrivals.lock().unwrap().push(Instant::now());
                        let n = hits.fetch_add(1, Ordering::SeqCst);
                        let (status, body) = script[n.min(script.len() - 1)];
                        async move {
                            if !delay.is_zero() {
                                tokio::time::sleep(delay).await;
                            }
                            Ok::<_, Infallible>(
                                Response::builder()
                                    .status(status)
                                    .header("content-type", "application/json")
                                    .body(Full::new(Bytes::from_static(body.as_bytes())))
                                    .unwrap(),
                            )
                        }
                    });
                    let _ = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), svc)
                        .await;
                });
            }
        });

        Self {
            addr,
            hits,
            arrivals,
        }
    }

    pub fn url(&self) -> Url {
        Url::parse(&format!("http://{}/mainnet/chain/blocks", self.addr)).unwrap()
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Time between consecutive requests, in arrival order.
    pub fn gaps(&self) -> Vec<Duration> {
        let arrivals = self.arrivals.lock().unwrap();
        arrivals.windows(2).map(|w| w[1] - w[0]).collect()
    }
}
