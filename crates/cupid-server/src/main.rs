//! Cupid server binary
//!
//! Starts the explore gRPC service.

use clap::Parser;
use cupid_server::config::AppConfig;
use cupid_server::logging::init_logging;
use cupid_server::{run_server, CupidError};
use std::path::PathBuf;
use std::process;

/// Explore service: who liked you, and mutual matches
#[derive(Debug, Parser)]
#[command(name = "cupid-server", version, about)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "CUPID_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), CupidError> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };

    init_logging(&config.logging)?;

    if cli.config.is_none() {
        tracing::warn!("no config file given (--config or CUPID_CONFIG), using defaults");
    }

    run_server(config).await
}
