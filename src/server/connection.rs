// Connection handling module
// Serves one accepted TCP connection with hyper's HTTP/1 implementation

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request};
use hyper_util::rt::{TokioIo, TokioTimer};

use super::signal::ShutdownSignal;
use super::wire::{IsolatedStream, ResponseLedger};
use crate::config::{self, AppState};
use crate::handler;
use crate::http::CrossOriginIsolation;
use crate::logger;

/// Per-connection HTTP settings
#[derive(Debug, Clone, Copy)]
pub struct ConnectionOptions {
    pub keep_alive: bool,
    pub header_read_timeout: Option<Duration>,
}

impl ConnectionOptions {
    pub const fn from_config(performance: &config::PerformanceConfig) -> Self {
        Self {
            keep_alive: performance.keep_alive,
            header_read_timeout: performance.header_read_timeout(),
        }
    }
}

/// Serve a single connection until the client goes away or shutdown is
/// requested.
///
/// On shutdown the in-flight request is allowed to complete, then the
/// connection is closed instead of being kept alive.
pub async fn serve_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    options: ConnectionOptions,
    mut shutdown: ShutdownSignal,
) {
    // Service responses get the headers from `CrossOriginIsolation`; the
    // stream adapter covers the error heads hyper writes by itself.
    let ledger = Arc::new(ResponseLedger::default());
    let io = TokioIo::new(IsolatedStream::new(stream, Arc::clone(&ledger)));

    let service = CrossOriginIsolation::new(service_fn(move |req: Request<Incoming>| {
        let state = Arc::clone(&state);
        let ledger = Arc::clone(&ledger);
        let is_head = req.method() == Method::HEAD;
        async move {
            let response = handler::handle_request(req, state, peer_addr).await?;
            ledger.record(&response, is_head);
            Ok::<_, Infallible>(response)
        }
    }));

    let mut builder = http1::Builder::new();
    builder
        .keep_alive(options.keep_alive)
        .title_case_headers(true)
        .timer(TokioTimer::new());
    if let Some(timeout) = options.header_read_timeout {
        builder.header_read_timeout(timeout);
    }

    let conn = builder.serve_connection(io, service);
    tokio::pin!(conn);

    tokio::select! {
        result = conn.as_mut() => {
            if let Err(err) = result {
                logger::log_connection_error(&err);
            }
        }
        () = shutdown.recv() => {
            conn.as_mut().graceful_shutdown();
            if let Err(err) = conn.await {
                logger::log_connection_error(&err);
            }
        }
    }
}
