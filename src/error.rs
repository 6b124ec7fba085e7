//! Startup error types
//!
//! Everything that can stop the server before the accept loop starts.
//! Per-request failures never surface here; they become HTTP status codes.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Directory '{}' does not exist", .0.display())]
    PathNotFound(PathBuf),

    #[error("'{}' is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("Invalid configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid listen address '{addr}': {source}")]
    InvalidAddress {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_messages_name_the_path() {
        let missing = StartupError::PathNotFound(PathBuf::from("./nowhere"));
        assert_eq!(missing.to_string(), "Directory './nowhere' does not exist");

        let file = StartupError::NotADirectory(PathBuf::from("index.html"));
        assert_eq!(file.to_string(), "'index.html' is not a directory");
    }
}
