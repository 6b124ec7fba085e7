//! HTTP protocol layer module
//!
//! Protocol helpers shared by the request handler: MIME detection,
//! escaping, HTTP dates, response builders and the cross-origin
//! isolation middleware.

pub mod date;
pub mod escape;
pub mod isolation;
pub mod mime;
pub mod response;

// Re-export commonly used types
pub use isolation::{apply_isolation_headers, CrossOriginIsolation};
pub use response::{
    build_304_response, build_403_response, build_404_response, build_405_response,
    build_error_response, build_file_response, build_html_response, build_redirect_response,
    file_body, full_body, ResponseBody,
};
