//! Logger module
//!
//! Console output for the server:
//! - Startup and shutdown notices on stdout
//! - Access log lines on stderr, one per request
//! - Warnings and errors on stderr

mod format;

pub use format::AccessLogEntry;

use std::path::Path;

use crate::error::StartupError;

fn write_info(message: &str) {
    println!("{message}");
}

fn write_error(message: &str) {
    eprintln!("{message}");
}

pub fn log_server_start(root: &Path, port: u16) {
    write_info(&format!("Serving directory: {}", root.display()));
    write_info(&format!("Server running at http://localhost:{port}/"));
}

pub fn log_shutdown() {
    write_info("\nShutting down server...");
}

pub fn log_startup_error(err: &StartupError) {
    write_error(&format!("Error: {err}"));
}

/// Who a connection-level failure should be blamed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionErrorKind {
    /// Client went away mid-message
    Ignored,
    /// Malformed or too slow request; the client already got a status
    Client,
    Server,
}

pub fn classify_connection_error(err: &hyper::Error) -> ConnectionErrorKind {
    if err.is_incomplete_message() {
        ConnectionErrorKind::Ignored
    } else if err.is_parse() || err.is_timeout() {
        ConnectionErrorKind::Client
    } else {
        ConnectionErrorKind::Server
    }
}

pub fn log_connection_error(err: &hyper::Error) {
    match classify_connection_error(err) {
        ConnectionErrorKind::Ignored => {}
        ConnectionErrorKind::Client => log_warning(&format!("Rejected client request: {err}")),
        ConnectionErrorKind::Server => {
            write_error(&format!("[ERROR] Failed to serve connection: {err}"));
        }
    }
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_error(&entry.format(format));
}
