//! Request path resolution
//!
//! Maps a URI path onto the served root without ever leaving it.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::config::ServeRoot;
use crate::http::escape::percent_decode;
use crate::logger;

/// Turn a raw URI path into a path relative to the root.
///
/// The path is percent-decoded and normalized: empty and `.` segments are
/// dropped, `..` removes the previous segment but never climbs above the
/// root, and segments that cannot name a file are skipped.
pub fn translate_path(uri_path: &str) -> PathBuf {
    let decoded = percent_decode(uri_path);
    let mut segments: Vec<&str> = Vec::new();

    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s if s.contains('\0') => {}
            s if cfg!(windows) && s.contains(['\\', ':']) => {}
            s => segments.push(s),
        }
    }

    segments.iter().collect()
}

/// Resolve a URI path to a canonical filesystem path inside `root`.
///
/// Symlinks pointing outside the root are reported as `NotFound`.
pub async fn resolve(root: &ServeRoot, uri_path: &str) -> io::Result<PathBuf> {
    contained(root, &root.path().join(translate_path(uri_path))).await
}

/// Canonicalize `path` and check it is still under `root`.
pub async fn contained(root: &ServeRoot, path: &Path) -> io::Result<PathBuf> {
    let canonical = fs::canonicalize(path).await?;
    if root.contains(&canonical) {
        Ok(canonical)
    } else {
        logger::log_warning(&format!(
            "Path outside served root blocked: {} -> {}",
            path.display(),
            canonical.display()
        ));
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            "path resolves outside the served root",
        ))
    }
}
