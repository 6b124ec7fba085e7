// Application state module
// Read-only state shared by every connection

use super::root::ServeRoot;
use super::types::Config;

/// Application state
#[derive(Debug, Clone)]
pub struct AppState {
    pub root: ServeRoot,
    pub index_files: Vec<String>,
    pub access_log: bool,
    pub log_format: String,
}

impl AppState {
    pub fn new(config: &Config, root: ServeRoot) -> Self {
        Self {
            root,
            index_files: config.http.index_files.clone(),
            access_log: config.logging.access_log,
            log_format: config.logging.format.clone(),
        }
    }
}
