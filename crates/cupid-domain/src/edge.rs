//! Edge module - directional interest records between two users

use crate::UserId;
use std::fmt;

/// Identity of a directional edge: `actor` → `recipient`
///
/// At most one edge exists per key. Keys never change once an edge exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeKey {
    /// User who expressed the stance
    pub actor: UserId,

    /// User the stance is about
    pub recipient: UserId,
}

impl EdgeKey {
    /// Create a key for `actor` → `recipient`
    pub fn new(actor: UserId, recipient: UserId) -> Self {
        Self { actor, recipient }
    }

    /// The key of the opposite direction
    ///
    /// # Examples
    ///
    /// ```
    /// use cupid_domain::{EdgeKey, UserId};
    ///
    /// let (a, b) = (UserId::random(), UserId::random());
    /// let key = EdgeKey::new(a, b);
    /// assert_eq!(key.reversed(), EdgeKey::new(b, a));
    /// assert_eq!(key.reversed().reversed(), key);
    /// ```
    pub fn reversed(&self) -> Self {
        Self {
            actor: self.recipient,
            recipient: self.actor,
        }
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.actor, self.recipient)
    }
}

/// One user's current stance toward another
///
/// `matched` is the last computed mutual-match status of the pair. For any
/// pair the two directional edges always carry the same `matched` value, and
/// that value equals `a_to_b.liked && b_to_a.liked`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    /// User who expressed the stance
    pub actor: UserId,

    /// User the stance is about
    pub recipient: UserId,

    /// Whether the actor currently likes the recipient
    pub liked: bool,

    /// Whether the pair is currently a mutual match
    pub matched: bool,
}

impl Edge {
    /// Create a new edge
    pub fn new(actor: UserId, recipient: UserId, liked: bool, matched: bool) -> Self {
        Self {
            actor,
            recipient,
            liked,
            matched,
        }
    }

    /// Key identifying this edge
    pub fn key(&self) -> EdgeKey {
        EdgeKey::new(self.actor, self.recipient)
    }
}

/// Mutual-match rule for a pair
///
/// Recomputed from scratch on every decision: a retraction clears the match
/// and a later like recomputes it from current state.
pub fn mutual_match(decision_liked: bool, reverse_liked: bool) -> bool {
    decision_liked && reverse_liked
}
