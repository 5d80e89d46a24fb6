//! Cupid Storage Layer
//!
//! Implements the `EdgeStore` capability from `cupid-domain`.
//!
//! # Stores
//!
//! - [`SqliteEdgeStore`]: SQLite in WAL mode behind a small connection pool.
//!   Transactions are `BEGIN IMMEDIATE`, so two decisions on the same pair
//!   serialize on the write lock; contention surfaces as a `Conflict` fault.
//! - [`MemoryEdgeStore`]: an in-memory store with optimistic concurrency
//!   control and fault injection, used to exercise the pagination and
//!   decision logic in isolation.
//!
//! # Examples
//!
//! ```no_run
//! use cupid_store::{SqliteEdgeStore, StoreConfig};
//!
//! let store = SqliteEdgeStore::open(&StoreConfig::new("cupid.db")).unwrap();
//! // Store is now ready for edge operations
//! ```

#![warn(missing_docs)]

mod config;
mod memory;
mod pool;
mod sqlite;

pub use config::StoreConfig;
pub use memory::MemoryEdgeStore;
pub use sqlite::SqliteEdgeStore;

use cupid_domain::{EdgeKey, FaultKind, StoreFault};
use rusqlite::ErrorCode;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Edge not found
    #[error("Edge not found: {0}")]
    NotFound(EdgeKey),

    /// Stored data could not be decoded
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Malformed query parameters
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// A concurrent transaction touched the same edges
    #[error("Transaction conflict: {0}")]
    Conflict(String),

    /// The store cannot serve requests right now
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The transaction was cancelled before commit and rolled back
    #[error("Transaction cancelled before commit")]
    Cancelled,

    /// Invalid store configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreFault for StoreError {
    fn kind(&self) -> FaultKind {
        match self {
            StoreError::Database(e) => classify_sqlite(e),
            StoreError::NotFound(_) => FaultKind::NotFound,
            StoreError::InvalidData(_) => FaultKind::Internal,
            StoreError::InvalidQuery(_) => FaultKind::Invalid,
            StoreError::Conflict(_) => FaultKind::Conflict,
            StoreError::Unavailable(_) => FaultKind::Unavailable,
            StoreError::Cancelled => FaultKind::Cancelled,
            StoreError::Config(_) => FaultKind::Invalid,
        }
    }
}

/// Map SQLite result codes onto fault kinds
fn classify_sqlite(error: &rusqlite::Error) -> FaultKind {
    match error.sqlite_error_code() {
        Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => FaultKind::Conflict,
        Some(ErrorCode::CannotOpen)
        | Some(ErrorCode::SystemIoFailure)
        | Some(ErrorCode::DiskFull)
        | Some(ErrorCode::OutOfMemory)
        | Some(ErrorCode::FileLockingProtocolFailed) => FaultKind::Unavailable,
        _ => match error {
            rusqlite::Error::QueryReturnedNoRows => FaultKind::NotFound,
            _ => FaultKind::Internal,
        },
    }
}
