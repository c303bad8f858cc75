//! response-facade demo server.
//!
//! Serves a handful of routes whose responses are built entirely through
//! `ResponseFacade`: caching headers, downloads, redirects and cookies.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use response_facade::config::{load_config, FacadeConfig};
use response_facade::observability::logging::init_logging;
use response_facade::HttpServer;

#[derive(Parser)]
#[command(name = "response-facade")]
#[command(about = "Demo server for the HTTP response façade", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `server.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => FacadeConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }

    init_logging(&config.observability.log_level);

    tracing::info!(
        bind_address = %config.server.bind_address,
        cookie_path = %config.cookies.path,
        cookie_domain = %config.cookies.domain,
        warn_on_buffered_output = config.diagnostics.warn_on_buffered_output,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    let server = HttpServer::new(config);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
