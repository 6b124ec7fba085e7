#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;

use coi_serve::cli::Cli;
use coi_serve::config::{Config, ServeRoot};
use coi_serve::server::{shutdown_channel, Server, ShutdownTrigger};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

/// A server running on an ephemeral localhost port
pub struct TestServer {
    pub addr: SocketAddr,
    pub trigger: ShutdownTrigger,
    pub handle: JoinHandle<()>,
}

pub fn test_config(root: &Path, port: u16) -> Config {
    let cli = Cli {
        path: Some(root.to_path_buf()),
        port: Some(port),
        bind: Some("127.0.0.1".to_string()),
        quiet: true,
        ..Cli::default()
    };
    Config::load(&cli).unwrap()
}

pub fn start(root: &Path) -> TestServer {
    start_with(test_config(root, 0))
}

pub fn start_with(config: Config) -> TestServer {
    let root = ServeRoot::validate(&config.server.root).unwrap();
    let server = Server::bind(&config, root).unwrap();
    let addr = server.local_addr().unwrap();
    let (trigger, shutdown) = shutdown_channel();
    let handle = tokio::spawn(server.run(shutdown));
    TestServer {
        addr,
        trigger,
        handle,
    }
}

/// Parsed HTTP/1.1 response
#[derive(Debug)]
pub struct RawResponse {
    pub status: u16,
    /// Header names lowercased, in wire order
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn header_count(&self, name: &str) -> usize {
        self.headers.iter().filter(|(n, _)| n == name).count()
    }

    pub fn assert_isolated(&self) {
        assert_eq!(self.header_count("cross-origin-opener-policy"), 1, "{self:?}");
        assert_eq!(self.header_count("cross-origin-embedder-policy"), 1, "{self:?}");
        assert_eq!(self.header("cross-origin-opener-policy"), Some("same-origin"));
        assert_eq!(self.header("cross-origin-embedder-policy"), Some("require-corp"));
    }
}

/// Send one request with `Connection: close` and read the full response.
pub async fn request(
    addr: SocketAddr,
    method: &str,
    path: &str,
    extra_headers: &[(&str, &str)],
) -> RawResponse {
    let mut raw = format!("{method} {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n");
    for (name, value) in extra_headers {
        raw.push_str(&format!("{name}: {value}\r\n"));
    }
    raw.push_str("\r\n");
    send_raw(addr, raw.as_bytes()).await
}

/// Write `raw` verbatim and read until the server closes the connection.
pub async fn send_raw(addr: SocketAddr, raw: &[u8]) -> RawResponse {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw).await.unwrap();

    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    parse_response(&buf)
}

pub fn parse_response(buf: &[u8]) -> RawResponse {
    let split = buf
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("response has no header terminator");
    let head = String::from_utf8_lossy(&buf[..split]).into_owned();
    let body = buf[split + 4..].to_vec();

    let mut lines = head.split("\r\n");
    let status_line = lines.next().unwrap();
    let status = status_line
        .split_whitespace()
        .nth(1)
        .unwrap()
        .parse()
        .unwrap();

    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(n, v)| (n.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    RawResponse {
        status,
        headers,
        body,
    }
}
