//! Static file server that adds the cross-origin isolation headers
//! (`Cross-Origin-Opener-Policy: same-origin`,
//! `Cross-Origin-Embedder-Policy: require-corp`) to every response, so that
//! browser features such as `SharedArrayBuffer` and WASM threads work on
//! locally served builds.

pub mod cli;
pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
