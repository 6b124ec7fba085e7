//! Command line interface

use std::path::PathBuf;

use clap::Parser;

/// Serve a directory over HTTP with cross-origin isolation headers
/// (COOP `same-origin`, COEP `require-corp`) on every response.
#[derive(Parser, Debug, Default, Clone)]
#[command(name = "coi-serve", version, about, long_about = None)]
pub struct Cli {
    /// Directory to serve (default: current directory)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Port to listen on (default: 8000)
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Interface to bind (default: 0.0.0.0)
    #[arg(short, long, value_name = "HOST")]
    pub bind: Option<String>,

    /// Optional TOML configuration file; command line flags take precedence
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Number of runtime worker threads (default: CPU cores)
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Disable per-request access log lines
    #[arg(short, long)]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments() {
        let cli = Cli::try_parse_from(["coi-serve"]).unwrap();
        assert_eq!(cli.path, None);
        assert_eq!(cli.port, None);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_path_and_short_port() {
        let cli = Cli::try_parse_from(["coi-serve", "build/web", "-p", "9000"]).unwrap();
        assert_eq!(cli.path, Some(PathBuf::from("build/web")));
        assert_eq!(cli.port, Some(9000));
    }

    #[test]
    fn test_long_port_before_path() {
        let cli = Cli::try_parse_from(["coi-serve", "--port", "8080", "dist"]).unwrap();
        assert_eq!(cli.path, Some(PathBuf::from("dist")));
        assert_eq!(cli.port, Some(8080));
    }

    #[test]
    fn test_invalid_port_rejected() {
        assert!(Cli::try_parse_from(["coi-serve", "-p", "70000"]).is_err());
        assert!(Cli::try_parse_from(["coi-serve", "-p", "http"]).is_err());
    }
}
