//! Cross-origin isolation middleware
//!
//! Browsers only expose `SharedArrayBuffer` (and with it WASM threads) to
//! pages served with both of these headers:
//!
//! - `Cross-Origin-Opener-Policy: same-origin`
//! - `Cross-Origin-Embedder-Policy: require-corp`
//!
//! [`CrossOriginIsolation`] wraps any hyper service and stamps them onto
//! every response it produces, whatever the status.

use std::future::Future;
use std::pin::Pin;

use hyper::header::{HeaderName, HeaderValue};
use hyper::service::Service;
use hyper::{Request, Response};

pub const CROSS_ORIGIN_OPENER_POLICY: HeaderName =
    HeaderName::from_static("cross-origin-opener-policy");
pub const CROSS_ORIGIN_EMBEDDER_POLICY: HeaderName =
    HeaderName::from_static("cross-origin-embedder-policy");

/// Add both isolation headers, replacing any value already present so
/// each appears exactly once.
pub fn apply_isolation_headers<B>(mut response: Response<B>) -> Response<B> {
    let headers = response.headers_mut();
    headers.insert(
        CROSS_ORIGIN_OPENER_POLICY,
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        CROSS_ORIGIN_EMBEDDER_POLICY,
        HeaderValue::from_static("require-corp"),
    );
    response
}

/// Service wrapper that finalizes responses with the isolation headers.
#[derive(Debug, Clone)]
pub struct CrossOriginIsolation<S> {
    inner: S,
}

impl<S> CrossOriginIsolation<S> {
    pub const fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for CrossOriginIsolation<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Future: Send + 'static,
    S::Error: 'static,
    ResBody: 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: Request<ReqBody>) -> Self::Future {
        let future = self.inner.call(req);
        Box::pin(async move { future.await.map(apply_isolation_headers) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::service::service_fn;
    use hyper::StatusCode;
    use std::convert::Infallible;

    fn assert_isolated<B>(response: &Response<B>) {
        let coop: Vec<_> = response.headers().get_all(CROSS_ORIGIN_OPENER_POLICY).iter().collect();
        let coep: Vec<_> = response.headers().get_all(CROSS_ORIGIN_EMBEDDER_POLICY).iter().collect();
        assert_eq!(coop, vec!["same-origin"]);
        assert_eq!(coep, vec!["require-corp"]);
    }

    #[test]
    fn test_apply_keeps_existing_headers() {
        let response = Response::builder()
            .status(StatusCode::NOT_FOUND)
            .header("Content-Type", "text/plain")
            .body(())
            .unwrap();
        let response = apply_isolation_headers(response);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()["content-type"], "text/plain");
        assert_isolated(&response);
    }

    #[test]
    fn test_apply_replaces_duplicates() {
        let response = Response::builder()
            .header("Cross-Origin-Opener-Policy", "unsafe-none")
            .header("Cross-Origin-Opener-Policy", "same-origin-allow-popups")
            .body(())
            .unwrap();
        assert_isolated(&apply_isolation_headers(response));
    }

    #[tokio::test]
    async fn test_service_wrapper() {
        let inner = service_fn(|req: Request<String>| async move {
            let status = if req.uri().path() == "/" {
                StatusCode::OK
            } else {
                StatusCode::NOT_FOUND
            };
            let mut response = Response::new(String::new());
            *response.status_mut() = status;
            Ok::<_, Infallible>(response)
        });
        let service = CrossOriginIsolation::new(inner);

        for (path, status) in [("/", StatusCode::OK), ("/missing", StatusCode::NOT_FOUND)] {
            let req = Request::builder().uri(path).body(String::new()).unwrap();
            let response = service.call(req).await.unwrap();
            assert_eq!(response.status(), status);
            assert_isolated(&response);
        }
    }
}
