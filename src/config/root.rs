// Served root directory
// Validation happens once at startup; handlers only ever see a checked root.

use std::io;
use std::path::{Path, PathBuf};

use crate::error::StartupError;

/// Canonical path of an existing directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeRoot {
    path: PathBuf,
}

impl ServeRoot {
    /// Check that `path` exists and is a directory, in that order.
    ///
    /// Errors carry the path exactly as the user gave it.
    pub fn validate(path: &Path) -> Result<Self, StartupError> {
        let metadata = match std::fs::metadata(path) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StartupError::PathNotFound(path.to_path_buf()));
            }
            Err(e) => return Err(StartupError::Io(e)),
        };

        if !metadata.is_dir() {
            return Err(StartupError::NotADirectory(path.to_path_buf()));
        }

        Ok(Self {
            path: path.canonicalize()?,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a canonicalized path lies inside the root.
    pub fn contains(&self, canonical: &Path) -> bool {
        canonical.starts_with(&self.path)
    }
}
