//! gRPC server configuration and lifecycle management
//!
//! Handles binding, serving and graceful shutdown.

use std::future::Future;
use std::net::{AddrParseError, SocketAddr};
use tonic::transport::Server;
use tracing::info;

use cupid_domain::traits::EdgeStore;

use crate::proto::explore_service_server::ExploreServiceServer;
use crate::service::ExploreServiceImpl;

/// Errors from starting or running the server
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Listen address does not parse
    #[error("Invalid listen address '{addr}': {source}")]
    InvalidAddress {
        /// Address as configured
        addr: String,
        /// Parse failure
        source: AddrParseError,
    },

    /// Bind or serve failure
    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Server listen address
    pub addr: String,

    /// Server port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1".to_string(),
            port: 50051,
        }
    }
}

impl ServerConfig {
    /// Create a new server configuration
    pub fn new(addr: impl Into<String>, port: u16) -> Self {
        Self {
            addr: addr.into(),
            port,
        }
    }

    /// Get the full server address
    pub fn full_address(&self) -> String {
        format!("{}:{}", self.addr, self.port)
    }

    /// Parse the listen address
    pub fn socket_addr(&self) -> Result<SocketAddr, ServerError> {
        let addr = self.full_address();
        addr.parse()
            .map_err(|source| ServerError::InvalidAddress { addr, source })
    }
}

/// Serve `service` until `shutdown` resolves
///
/// In-flight requests complete before this returns.
///
/// # Errors
/// Returns error if the address is invalid or the server fails to bind
pub async fn start_server<S, F>(
    config: ServerConfig,
    service: ExploreServiceImpl<S>,
    shutdown: F,
) -> Result<(), ServerError>
where
    S: EdgeStore + 'static,
    F: Future<Output = ()> + Send,
{
    let addr = config.socket_addr()?;

    info!(%addr, "explore gRPC server starting");

    Server::builder()
        .add_service(ExploreServiceServer::new(service))
        .serve_with_shutdown(addr, shutdown)
        .await?;

    info!(%addr, "explore gRPC server stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl-C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
