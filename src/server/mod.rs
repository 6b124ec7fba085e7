// Server module entry point
// Binds the listener and runs the accept loop until shutdown

pub mod connection;
pub mod listener;
pub mod signal;
pub mod wire;

// `loop` is a keyword, so the file is mounted under another name
#[path = "loop.rs"]
pub mod server_loop;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::{AppState, Config, ServeRoot};
use crate::error::StartupError;

// Re-export commonly used types
pub use connection::ConnectionOptions;
pub use listener::create_listener;
pub use server_loop::{start_server_loop, ServerLoopConfig};
pub use signal::{shutdown_channel, start_signal_handler, ShutdownSignal, ShutdownTrigger};
pub use wire::{IsolatedStream, ResponseLedger};

/// A bound, not yet running, static file server
pub struct Server {
    listener: TcpListener,
    state: Arc<AppState>,
    loop_config: ServerLoopConfig,
}

impl Server {
    /// Bind the configured address. Must be called from within a Tokio
    /// runtime; the root has already been validated.
    pub fn bind(config: &Config, root: ServeRoot) -> Result<Self, StartupError> {
        let addr = config.socket_addr()?;
        let listener =
            create_listener(addr).map_err(|source| StartupError::Bind { addr, source })?;

        Ok(Self {
            listener,
            state: Arc::new(AppState::new(config, root)),
            loop_config: ServerLoopConfig {
                connection: ConnectionOptions::from_config(&config.performance),
                shutdown_timeout: config.performance.shutdown_timeout(),
            },
        })
    }

    /// Actual bound address (resolves port 0)
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Canonical directory being served
    pub fn root(&self) -> &Path {
        self.state.root.path()
    }

    /// Serve until `shutdown` fires; the port is released on return.
    pub async fn run(self, shutdown: ShutdownSignal) {
        start_server_loop(self.listener, self.state, self.loop_config, shutdown).await;
    }
}
