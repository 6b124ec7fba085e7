// Server loop module
// Accepts connections until shutdown, then drains the open ones

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinSet;

use super::connection::{serve_connection, ConnectionOptions};
use super::signal::ShutdownSignal;
use crate::config::AppState;
use crate::logger;

/// Configuration for server loop behavior
#[derive(Debug, Clone, Copy)]
pub struct ServerLoopConfig {
    pub connection: ConnectionOptions,
    /// Upper bound on how long open connections may take to finish
    pub shutdown_timeout: Duration,
}

/// Accept loop: one task per connection.
///
/// Returns after shutdown has been signalled, the listening socket has
/// been closed and open connections have finished (or the shutdown
/// timeout expired and they were aborted).
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    config: ServerLoopConfig,
    mut shutdown: ShutdownSignal,
) {
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        connections.spawn(serve_connection(
                            stream,
                            peer_addr,
                            Arc::clone(&state),
                            config.connection,
                            shutdown.clone(),
                        ));
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            // Reap finished connection tasks
            Some(joined) = connections.join_next() => {
                if let Err(e) = joined {
                    logger::log_error(&format!("Connection task failed: {e}"));
                }
            }

            () = shutdown.recv() => {
                logger::log_shutdown();
                break;
            }
        }
    }

    // Release the port before waiting on stragglers
    drop(listener);

    let drained = tokio::time::timeout(config.shutdown_timeout, async {
        while connections.join_next().await.is_some() {}
    })
    .await;

    if drained.is_err() {
        logger::log_warning(&format!(
            "{} connection(s) still open after {}s, closing them",
            connections.len(),
            config.shutdown_timeout.as_secs()
        ));
        connections.shutdown().await;
    }
}
