//! Edge filters and the listing variants built from them

use crate::{Edge, UserId};

/// Predicate over the edges pointing at one recipient
///
/// `None` fields are unconstrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeFilter {
    /// Recipient every matching edge points at
    pub recipient: UserId,

    /// Required `liked` value
    pub liked: Option<bool>,

    /// Required `matched` value
    pub matched: Option<bool>,
}

impl EdgeFilter {
    /// Every edge pointing at `recipient`
    pub fn to_recipient(recipient: UserId) -> Self {
        Self {
            recipient,
            liked: None,
            matched: None,
        }
    }

    /// Users who like `recipient`
    pub fn liked_you(recipient: UserId) -> Self {
        Self {
            liked: Some(true),
            ..Self::to_recipient(recipient)
        }
    }

    /// Users who like `recipient` and are not yet matched with them
    pub fn new_liked_you(recipient: UserId) -> Self {
        Self {
            liked: Some(true),
            matched: Some(false),
            ..Self::to_recipient(recipient)
        }
    }

    /// Whether `edge` satisfies this filter
    pub fn matches(&self, edge: &Edge) -> bool {
        edge.recipient == self.recipient
            && self.liked.map_or(true, |liked| edge.liked == liked)
            && self.matched.map_or(true, |matched| edge.matched == matched)
    }
}

/// Listing variants exposed to callers
///
/// Both variants share one paginated query and differ only in the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Listing {
    /// Everyone who likes the recipient
    LikedYou,

    /// Likers the recipient has not matched with yet
    NewLikedYou,
}

impl Listing {
    /// Filter for this listing over `recipient`
    pub fn filter(&self, recipient: UserId) -> EdgeFilter {
        match self {
            Listing::LikedYou => EdgeFilter::liked_you(recipient),
            Listing::NewLikedYou => EdgeFilter::new_liked_you(recipient),
        }
    }

    /// Stable name used in logs and error context
    pub fn as_str(&self) -> &'static str {
        match self {
            Listing::LikedYou => "liked_you",
            Listing::NewLikedYou => "new_liked_you",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_liked_you_filter() {
        let me = UserId::random();
        let other = UserId::random();
        let filter = EdgeFilter::liked_you(me);

        assert!(filter.matches(&Edge::new(other, me, true, false)));
        assert!(filter.matches(&Edge::new(other, me, true, true)));
        assert!(!filter.matches(&Edge::new(other, me, false, false)));
        assert!(!filter.matches(&Edge::new(me, other, true, false)));
    }

    #[test]
    fn test_new_liked_you_filter() {
        let me = UserId::random();
        let other = UserId::random();
        let filter = Listing::NewLikedYou.filter(me);

        assert!(filter.matches(&Edge::new(other, me, true, false)));
        assert!(!filter.matches(&Edge::new(other, me, true, true)));
        assert!(!filter.matches(&Edge::new(other, me, false, false)));
    }

    #[test]
    fn test_unconstrained_filter() {
        let me = UserId::random();
        let other = UserId::random();
        let filter = EdgeFilter::to_recipient(me);

        assert!(filter.matches(&Edge::new(other, me, false, false)));
        assert!(filter.matches(&Edge::new(other, me, true, true)));
    }
}
