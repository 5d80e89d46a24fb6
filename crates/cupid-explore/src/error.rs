//! Error types for explore operations

use cupid_domain::{FaultKind, Listing, UserId};
use std::fmt;
use thiserror::Error;

/// Stable, caller-facing error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed identifiers, tokens or decisions
    InvalidInput,

    /// A directional edge of the pair does not exist
    NotFound,

    /// Concurrent decisions kept colliding until the retry budget ran out
    Conflict,

    /// The store could not be reached
    Unavailable,

    /// The request deadline passed
    Timeout,

    /// Unexpected failure
    Internal,
}

/// The operation an error happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// One page of a listing
    List {
        /// Listing variant
        listing: Listing,
        /// Recipient whose likers are listed
        recipient: UserId,
    },

    /// Counting a recipient's likers
    Count {
        /// Recipient whose likers are counted
        recipient: UserId,
    },

    /// Recording a decision on a pair
    Decide {
        /// User making the decision
        actor: UserId,
        /// User the decision is about
        recipient: UserId,
    },
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::List { listing, recipient } => {
                write!(f, "listing {} for {}", listing.as_str(), recipient)
            }
            Operation::Count { recipient } => write!(f, "counting likers of {}", recipient),
            Operation::Decide { actor, recipient } => {
                write!(f, "decision {} -> {}", actor, recipient)
            }
        }
    }
}

/// Errors that can occur during explore operations
///
/// Messages carry the operation context but never store error text; the
/// underlying store error is logged where it is classified.
#[derive(Error, Debug)]
pub enum ExploreError {
    /// Rejected before touching the store
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Missing edge
    #[error("{operation}: edge not found")]
    NotFound {
        /// Failing operation
        operation: Operation,
    },

    /// Retry budget exhausted on transaction conflicts
    #[error("{operation}: conflicting concurrent update after {attempts} attempts")]
    Conflict {
        /// Failing operation
        operation: Operation,
        /// Attempts made
        attempts: u32,
    },

    /// Retry budget exhausted on an unavailable store
    #[error("{operation}: store unavailable after {attempts} attempts")]
    Unavailable {
        /// Failing operation
        operation: Operation,
        /// Attempts made
        attempts: u32,
    },

    /// Deadline exceeded
    #[error("{operation}: deadline of {timeout_ms} ms exceeded")]
    Timeout {
        /// Failing operation
        operation: Operation,
        /// Configured deadline
        timeout_ms: u64,
    },

    /// Unexpected store or runtime failure
    #[error("{operation}: internal error")]
    Internal {
        /// Failing operation
        operation: Operation,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExploreError {
    /// Build the caller-facing error for a store fault that will not be retried
    pub(crate) fn from_fault(kind: FaultKind, operation: Operation, attempts: u32) -> Self {
        match kind {
            FaultKind::NotFound => ExploreError::NotFound { operation },
            FaultKind::Conflict => ExploreError::Conflict {
                operation,
                attempts,
            },
            FaultKind::Unavailable => ExploreError::Unavailable {
                operation,
                attempts,
            },
            FaultKind::Invalid => {
                ExploreError::InvalidInput(format!("{}: rejected by the store", operation))
            }
            FaultKind::Cancelled | FaultKind::Internal => ExploreError::Internal { operation },
        }
    }

    /// Stable classification for transports
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExploreError::InvalidInput(_) => ErrorKind::InvalidInput,
            ExploreError::NotFound { .. } => ErrorKind::NotFound,
            ExploreError::Conflict { .. } => ErrorKind::Conflict,
            ExploreError::Unavailable { .. } => ErrorKind::Unavailable,
            ExploreError::Timeout { .. } => ErrorKind::Timeout,
            ExploreError::Internal { .. } | ExploreError::Config(_) => ErrorKind::Internal,
        }
    }
}

impl From<cupid_domain::InvalidUserId> for ExploreError {
    fn from(e: cupid_domain::InvalidUserId) -> Self {
        ExploreError::InvalidInput(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_mapping() {
        let op = Operation::Count {
            recipient: UserId::random(),
        };

        assert_eq!(
            ExploreError::from_fault(FaultKind::NotFound, op, 1).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            ExploreError::from_fault(FaultKind::Conflict, op, 3).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            ExploreError::from_fault(FaultKind::Unavailable, op, 3).kind(),
            ErrorKind::Unavailable
        );
        assert_eq!(
            ExploreError::from_fault(FaultKind::Invalid, op, 1).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            ExploreError::from_fault(FaultKind::Internal, op, 1).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_message_carries_context() {
        let actor = UserId::parse("00000000-0000-0000-0000-00000000000a").unwrap();
        let recipient = UserId::parse("00000000-0000-0000-0000-00000000000b").unwrap();
        let err = ExploreError::Conflict {
            operation: Operation::Decide { actor, recipient },
            attempts: 3,
        };

        let message = err.to_string();
        assert!(message.contains("decision 00000000-0000-0000-0000-00000000000a"));
        assert!(message.contains("3 attempts"));
    }
}
