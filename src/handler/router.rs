//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, header
//! extraction, dispatch to static file serving and access logging.

use crate::config::AppState;
use crate::handler::static_files;
use crate::http::{self, ResponseBody};
use crate::logger::{self, AccessLogEntry};
use hyper::body::Body;
use hyper::header::{
    HeaderName, CONTENT_LENGTH, IF_MODIFIED_SINCE, IF_NONE_MATCH, REFERER, USER_AGENT,
};
use hyper::http::request::Parts;
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Request context encapsulating information needed for request processing
#[derive(Debug, Clone, Copy)]
pub struct RequestContext<'a> {
    /// Raw (percent-encoded) URI path
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub is_head: bool,
    pub if_modified_since: Option<&'a str>,
    pub has_if_none_match: bool,
}

impl<'a> RequestContext<'a> {
    fn from_parts(parts: &'a Parts) -> Self {
        Self {
            path: parts.uri.path(),
            query: parts.uri.query(),
            is_head: parts.method == Method::HEAD,
            if_modified_since: parts
                .headers
                .get(IF_MODIFIED_SINCE)
                .and_then(|v| v.to_str().ok()),
            has_if_none_match: parts.headers.contains_key(IF_NONE_MATCH),
        }
    }
}

/// Main entry point for HTTP request handling
///
/// The request body is never read; only `GET` and `HEAD` are served.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<ResponseBody>, Infallible> {
    let started = Instant::now();
    let (parts, body) = req.into_parts();
    drop(body);

    let response = match check_http_method(&parts.method) {
        Some(resp) => resp,
        None => static_files::serve(&RequestContext::from_parts(&parts), &state).await,
    };

    if state.access_log {
        log_access(&parts, &response, peer_addr, started, &state.log_format);
    }

    Ok(response)
}

/// Reject everything except GET/HEAD
fn check_http_method(method: &Method) -> Option<Response<ResponseBody>> {
    match *method {
        Method::GET | Method::HEAD => None,
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

fn log_access(
    parts: &Parts,
    response: &Response<ResponseBody>,
    peer_addr: SocketAddr,
    started: Instant,
    format: &str,
) {
    let header = |name: HeaderName| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        parts.method.to_string(),
        parts.uri.path().to_string(),
    );
    entry.query = parts.uri.query().map(ToString::to_string);
    entry.http_version = version_label(parts.version).to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = body_bytes(response);
    entry.referer = header(REFERER);
    entry.user_agent = header(USER_AGENT);
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);

    logger::log_access(&entry, format);
}

/// Bytes the body will carry: exact for in-memory bodies, otherwise the
/// advertised `Content-Length` of a streamed file.
fn body_bytes(response: &Response<ResponseBody>) -> u64 {
    response
        .body()
        .size_hint()
        .exact()
        .or_else(|| {
            response
                .headers()
                .get(CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
        })
        .unwrap_or(0)
}

fn version_label(version: Version) -> &'static str {
    if version == Version::HTTP_10 {
        "1.0"
    } else if version == Version::HTTP_09 {
        "0.9"
    } else if version == Version::HTTP_2 {
        "2"
    } else {
        "1.1"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServeRoot;
    use hyper::StatusCode;
    use tempdir::TempDir;

    fn state_for(dir: &TempDir) -> Arc<AppState> {
        Arc::new(AppState {
            root: ServeRoot::validate(dir.path()).unwrap(),
            index_files: vec!["index.html".to_string()],
            access_log: true,
            log_format: "combined".to_string(),
        })
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:50000".parse().unwrap()
    }

    #[tokio::test]
    async fn test_other_methods_rejected() {
        let dir = TempDir::new("router").unwrap();
        std::fs::write(dir.path().join("index.html"), "hi").unwrap();
        let state = state_for(&dir);

        for method in [Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS] {
            let req = Request::builder().method(method.clone()).uri("/").body(()).unwrap();
            let resp = handle_request(req, Arc::clone(&state), peer()).await.unwrap();
            assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED, "{method}");
            assert_eq!(resp.headers()["allow"], "GET, HEAD");
        }
    }

    #[tokio::test]
    async fn test_get_and_head_served() {
        let dir = TempDir::new("router").unwrap();
        std::fs::write(dir.path().join("index.html"), "hi").unwrap();
        let state = state_for(&dir);

        for method in [Method::GET, Method::HEAD] {
            let req = Request::builder()
                .method(method)
                .uri("/index.html?cache=0")
                .header("User-Agent", "test")
                .body(())
                .unwrap();
            let resp = handle_request(req, Arc::clone(&state), peer()).await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
            assert_eq!(resp.headers()["content-length"], "2");
        }
    }

    #[tokio::test]
    async fn test_logged_body_bytes() {
        let dir = TempDir::new("router").unwrap();
        std::fs::write(dir.path().join("data.bin"), vec![1u8; 300_000]).unwrap();
        let state = state_for(&dir);

        let get = Request::builder().uri("/data.bin").body(()).unwrap();
        let resp = handle_request(get, Arc::clone(&state), peer()).await.unwrap();
        assert_eq!(body_bytes(&resp), 300_000);

        let head = Request::builder().method(Method::HEAD).uri("/data.bin").body(()).unwrap();
        let resp = handle_request(head, Arc::clone(&state), peer()).await.unwrap();
        assert_eq!(body_bytes(&resp), 0);
    }

    #[test]
    fn test_context_from_parts() {
        let req = Request::builder()
            .method(Method::HEAD)
            .uri("/a%20b/?x=1")
            .header("If-Modified-Since", "Sun, 06 Nov 1994 08:49:37 GMT")
            .header("If-None-Match", "\"abc\"")
            .body(())
            .unwrap();
        let (parts, ()) = req.into_parts();
        let ctx = RequestContext::from_parts(&parts);
        assert_eq!(ctx.path, "/a%20b/");
        assert_eq!(ctx.query, Some("x=1"));
        assert!(ctx.is_head);
        assert_eq!(ctx.if_modified_since, Some("Sun, 06 Nov 1994 08:49:37 GMT"));
        assert!(ctx.has_if_none_match);
    }
}
