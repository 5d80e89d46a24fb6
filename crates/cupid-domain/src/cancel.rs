//! Commit gate shared between a request and its in-flight transaction
//!
//! A transaction may commit only after winning the gate; a request that
//! gives up (deadline, dropped caller) closes it. Exactly one side wins, so
//! a caller told "cancelled" can rely on nothing having been written, and a
//! transaction that started committing is never reported as cancelled.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

const OPEN: u8 = 0;
const COMMITTING: u8 = 1;
const CANCELLED: u8 = 2;

/// Cancellation token for one transaction attempt
///
/// # Examples
///
/// ```
/// use cupid_domain::Cancellation;
///
/// let token = Cancellation::new();
/// assert!(token.cancel());
/// assert!(!token.begin_commit());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    state: Arc<AtomicU8>,
}

impl Cancellation {
    /// An open gate
    pub fn new() -> Self {
        Self::default()
    }

    /// Close the gate; false when a commit already started
    pub fn cancel(&self) -> bool {
        self.transition(CANCELLED)
    }

    /// Claim the gate for committing; false when already cancelled
    ///
    /// Stores call this immediately before committing and roll back when it
    /// returns false.
    pub fn begin_commit(&self) -> bool {
        self.transition(COMMITTING)
    }

    /// Whether the gate was closed before any commit
    pub fn is_cancelled(&self) -> bool {
        self.state.load(Ordering::SeqCst) == CANCELLED
    }

    fn transition(&self, to: u8) -> bool {
        self.state
            .compare_exchange(OPEN, to, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}
