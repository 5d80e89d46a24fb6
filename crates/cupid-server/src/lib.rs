//! Cupid Server
//!
//! Process boundary for the explore service: loads configuration, installs
//! logging, owns the SQLite store for the lifetime of the process and serves
//! gRPC until a shutdown signal arrives.

#![warn(missing_docs)]

pub mod config;
pub mod logging;

use config::AppConfig;
use cupid_explore::{ExploreError, Explorer};
use cupid_grpc::{shutdown_signal, start_server, ExploreServiceImpl, ServerError};
use cupid_store::{SqliteEdgeStore, StoreError};
use std::future::Future;
use std::sync::Arc;
use tracing::info;

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum CupidError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Logging could not be installed
    #[error("Logging setup failed: {0}")]
    Logging(String),

    /// Store could not be opened
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Services rejected the configuration
    #[error("Explore setup failed: {0}")]
    Explore(#[from] ExploreError),

    /// gRPC server failure
    #[error("Server error: {0}")]
    Server(#[from] ServerError),
}

/// Run the service until Ctrl-C or SIGTERM
pub async fn run_server(config: AppConfig) -> Result<(), CupidError> {
    serve_until(config, shutdown_signal()).await
}

/// Run the service until `shutdown` resolves
///
/// The store is dropped, closing its connections, once in-flight requests
/// have drained.
pub async fn serve_until<F>(config: AppConfig, shutdown: F) -> Result<(), CupidError>
where
    F: Future<Output = ()> + Send,
{
    info!(version = env!("CARGO_PKG_VERSION"), "starting cupid server");

    let store = Arc::new(SqliteEdgeStore::open(&config.database)?);
    info!(
        path = %config.database.path.display(),
        pool_size = store.pool_size(),
        "edge store opened"
    );

    let explorer = Explorer::new(store, &config.explore)?;
    let service = ExploreServiceImpl::new(explorer);

    start_server(config.server.to_server_config(), service, shutdown).await?;

    info!("cupid server stopped");
    Ok(())
}
