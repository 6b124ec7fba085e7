use std::process::ExitCode;

use clap::Parser;
use coi_serve::cli::Cli;
use coi_serve::config::{Config, ServeRoot};
use coi_serve::error::StartupError;
use coi_serve::logger;
use coi_serve::server::{self, Server};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logger::log_startup_error(&e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), StartupError> {
    let cfg = Config::load(cli)?;

    // Validate before any runtime or socket exists
    let root = ServeRoot::validate(&cfg.server.root)?;

    // Build the Tokio runtime, sized by the workers setting
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers.max(1));
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg, root))
}

async fn async_main(cfg: Config, root: ServeRoot) -> Result<(), StartupError> {
    let server = Server::bind(&cfg, root)?;
    let port = server.local_addr()?.port();

    let (trigger, shutdown) = server::shutdown_channel();
    server::start_signal_handler(trigger)?;

    logger::log_server_start(server.root(), port);
    server.run(shutdown).await;
    Ok(())
}
