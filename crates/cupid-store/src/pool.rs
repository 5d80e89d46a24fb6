//! Process-wide SQLite connection pool
//!
//! SQLite connections are not shareable across threads, so concurrency comes
//! from holding several connections to the same database, each behind its
//! own mutex.

use rusqlite::Connection;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub(crate) struct ConnectionPool {
    connections: Vec<Mutex<Connection>>,
    next: AtomicUsize,
}

impl ConnectionPool {
    /// `connections` must not be empty
    pub(crate) fn new(connections: Vec<Connection>) -> Self {
        debug_assert!(!connections.is_empty());
        Self {
            connections: connections.into_iter().map(Mutex::new).collect(),
            next: AtomicUsize::new(0),
        }
    }

    pub(crate) fn size(&self) -> usize {
        self.connections.len()
    }

    /// Take the first idle connection, starting round-robin; block on the
    /// starting slot when every connection is busy.
    pub(crate) fn acquire(&self) -> MutexGuard<'_, Connection> {
        let size = self.connections.len();
        let start = self.next.fetch_add(1, Ordering::Relaxed) % size;

        for offset in 0..size {
            if let Ok(conn) = self.connections[(start + offset) % size].try_lock() {
                return conn;
            }
        }

        // A panic while holding a connection leaves no open transaction
        // behind (rusqlite rolls back on drop), so the connection is reusable.
        self.connections[start]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
