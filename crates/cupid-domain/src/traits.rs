//! Trait definitions for external interactions
//!
//! These traits define the boundary between the explore logic and whatever
//! persists the edges. Implementations live in `cupid-store`; components
//! receive a store at construction instead of reaching for global state.

use crate::{Cancellation, Edge, EdgeFilter, EdgeKey, EdgeScan};

/// Classification of a store failure
///
/// Callers decide on retries and caller-facing errors from this alone,
/// never from store-specific error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// The requested edge does not exist
    NotFound,

    /// A concurrent transaction touched the same records
    Conflict,

    /// Connectivity, timeout or resource exhaustion in the store
    Unavailable,

    /// The request itself was malformed
    Invalid,

    /// The transaction was abandoned before commit and rolled back
    Cancelled,

    /// Anything else, including corrupt stored data
    Internal,
}

impl FaultKind {
    /// Whether repeating the operation may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, FaultKind::Conflict | FaultKind::Unavailable)
    }
}

/// Error type of an edge store
pub trait StoreFault: std::error::Error + Send + Sync + 'static {
    /// Classify this failure
    fn kind(&self) -> FaultKind;
}

/// Reads and writes available inside a store transaction
///
/// Both reads of a transaction observe one consistent snapshot.
pub trait EdgeTxn {
    /// Error type for transactional operations
    type Error;

    /// Read one edge, failing with a `NotFound` fault when absent
    fn read_edge(&mut self, key: &EdgeKey) -> Result<Edge, Self::Error>;

    /// Overwrite `liked` and `matched` of an existing edge
    ///
    /// Writing a key that does not exist is a `NotFound` fault; edges are
    /// never created through a transaction.
    fn write_edge(&mut self, edge: &Edge) -> Result<(), Self::Error>;
}

/// Persistence boundary for interest edges
///
/// Implemented by the infrastructure layer (cupid-store). Implementations
/// are shared across concurrent requests.
pub trait EdgeStore: Send + Sync {
    /// Error type for store operations
    type Error: StoreFault;

    /// Range query: edges admitted by `scan`, actor ascending, at most
    /// `scan.limit` of them
    fn scan(&self, scan: &EdgeScan) -> Result<Vec<Edge>, Self::Error>;

    /// Number of edges matching `filter`
    fn count(&self, filter: &EdgeFilter) -> Result<u64, Self::Error>;

    /// Read one edge, failing with a `NotFound` fault when absent
    fn read_one(&self, key: &EdgeKey) -> Result<Edge, Self::Error>;

    /// Run `f` inside one serializable transaction
    ///
    /// All writes made by `f` commit together. If `f` returns an error, or
    /// the commit fails, nothing is written and the error is returned.
    fn run_transaction<T, F>(&self, f: F) -> Result<T, Self::Error>
    where
        F: FnOnce(&mut dyn EdgeTxn<Error = Self::Error>) -> Result<T, Self::Error>,
    {
        self.run_transaction_with(&Cancellation::new(), f)
    }

    /// Like [`EdgeStore::run_transaction`], gated on `cancel`
    ///
    /// Implementations must call [`Cancellation::begin_commit`] right before
    /// committing. When it returns false the transaction rolls back and a
    /// [`FaultKind::Cancelled`] fault is returned.
    fn run_transaction_with<T, F>(&self, cancel: &Cancellation, f: F) -> Result<T, Self::Error>
    where
        F: FnOnce(&mut dyn EdgeTxn<Error = Self::Error>) -> Result<T, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        assert!(FaultKind::Conflict.is_retryable());
        assert!(FaultKind::Unavailable.is_retryable());
        assert!(!FaultKind::NotFound.is_retryable());
        assert!(!FaultKind::Invalid.is_retryable());
        assert!(!FaultKind::Cancelled.is_retryable());
        assert!(!FaultKind::Internal.is_retryable());
    }
}
