// Configuration module entry point
// Layers built-in defaults, an optional TOML file and command line flags

mod root;
mod state;
mod types;

use std::net::{SocketAddr, ToSocketAddrs};

use crate::cli::Cli;
use crate::error::StartupError;

// Re-export public types
pub use root::ServeRoot;
pub use state::AppState;
pub use types::{Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig};

impl Config {
    /// Load configuration for the given command line.
    ///
    /// Precedence, lowest first: defaults, `--config` file, CLI flags.
    /// No environment variables are consulted.
    pub fn load(cli: &Cli) -> Result<Self, ::config::ConfigError> {
        let mut builder = ::config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("server.root", ".")?
            .set_default("http.index_files", vec!["index.html", "index.htm"])?
            .set_default("logging.access_log", true)?
            .set_default("logging.format", "common")?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.header_read_timeout", 30)?
            .set_default("performance.shutdown_timeout", 5)?;

        if let Some(path) = &cli.config {
            builder = builder.add_source(
                ::config::File::new(&path.to_string_lossy(), ::config::FileFormat::Toml)
                    .required(true),
            );
        }

        let settings = builder
            .set_override_option(
                "server.root",
                cli.path.as_ref().map(|p| p.to_string_lossy().into_owned()),
            )?
            .set_override_option("server.port", cli.port.map(i64::from))?
            .set_override_option("server.host", cli.bind.clone())?
            .set_override_option(
                "server.workers",
                cli.workers.map(|w| i64::try_from(w).unwrap_or(i64::MAX)),
            )?
            .set_override_option("logging.access_log", cli.quiet.then_some(false))?
            .build()?;

        settings.try_deserialize()
    }

    /// Resolve `server.host:server.port` to a bindable address.
    pub fn socket_addr(&self) -> Result<SocketAddr, StartupError> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        let invalid = |source| StartupError::InvalidAddress {
            addr: addr.clone(),
            source,
        };

        (self.server.host.as_str(), self.server.port)
            .to_socket_addrs()
            .map_err(invalid)?
            .next()
            .ok_or_else(|| {
                invalid(std::io::Error::new(
                    std::io::ErrorKind::AddrNotAvailable,
                    "host resolved to no addresses",
                ))
            })
    }
}
