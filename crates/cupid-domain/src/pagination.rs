//! Keyset pagination over actor-ordered edge scans
//!
//! A listing walk is driven entirely by the caller: the first request starts
//! at [`Cursor::Start`], every later request passes back the actor id of the
//! last edge it received. No server-side cursor state exists, so any instance
//! can serve any page.
//!
//! Consistency is deliberately weak. Edges that appear behind a cursor after
//! the walk has passed them are never seen by that walk, and edges mutated
//! between pages are not detected. Without concurrent mutation the
//! concatenated pages equal the unbounded filtered result, strictly ordered by
//! actor, with no duplicates and no gaps.

use crate::{Edge, EdgeFilter, InvalidUserId, UserId};

/// Position of a listing walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cursor {
    /// No edge consumed yet; admits every actor
    #[default]
    Start,

    /// Resume strictly after this actor
    After(UserId),
}

impl Cursor {
    /// Resolve an optional caller-supplied pagination token
    ///
    /// An absent token starts a walk. A present token must be a user id.
    ///
    /// # Examples
    ///
    /// ```
    /// use cupid_domain::Cursor;
    ///
    /// assert_eq!(Cursor::from_token(None).unwrap(), Cursor::Start);
    /// assert!(Cursor::from_token(Some("ab30308e-de0f-47df-9b51-55b9af86213d")).is_ok());
    /// assert!(Cursor::from_token(Some("page-2")).is_err());
    /// ```
    pub fn from_token(token: Option<&str>) -> Result<Self, InvalidUserId> {
        match token {
            None => Ok(Cursor::Start),
            Some(token) => UserId::parse(token).map(Cursor::After),
        }
    }

    /// Whether `actor` lies strictly past this cursor
    pub fn admits(&self, actor: &UserId) -> bool {
        match self {
            Cursor::Start => true,
            Cursor::After(last) => actor > last,
        }
    }

    /// Exclusive lower bound, if any
    pub fn lower_bound(&self) -> Option<UserId> {
        match self {
            Cursor::Start => None,
            Cursor::After(last) => Some(*last),
        }
    }
}

/// Store-level range query: `filter`, `actor > after`, actor ascending,
/// at most `limit` edges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeScan {
    /// Base predicate
    pub filter: EdgeFilter,

    /// Exclusive lower bound on the actor
    pub after: Cursor,

    /// Maximum number of edges to return
    pub limit: usize,
}

impl EdgeScan {
    /// Scan for one page of a listing walk
    pub fn page(filter: EdgeFilter, after: Cursor, page_size: usize) -> Self {
        Self {
            filter,
            after,
            limit: page_size,
        }
    }

    /// Whether `edge` belongs to the unbounded result of this scan
    pub fn admits(&self, edge: &Edge) -> bool {
        self.filter.matches(edge) && self.after.admits(&edge.actor)
    }
}

/// One page of a listing
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Page {
    /// Actors in ascending order
    pub actors: Vec<UserId>,

    /// Token for the following page; absent on an empty page
    pub next: Option<UserId>,
}

impl Page {
    /// Shape a page from the edges a scan returned
    ///
    /// The next token is the last actor of a non-empty page. A walk ends when
    /// a page comes back empty.
    pub fn from_edges(edges: Vec<Edge>) -> Self {
        let actors: Vec<UserId> = edges.into_iter().map(|edge| edge.actor).collect();
        let next = actors.last().copied();
        Self { actors, next }
    }

    /// Cursor that continues after this page
    pub fn next_cursor(&self) -> Option<Cursor> {
        self.next.map(Cursor::After)
    }

    /// Whether this page ends the walk
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    proptest! {
        /// Walking every page yields exactly the filtered set, strictly increasing
        #[test]
        fn test_walk_is_complete(
            actors in proptest::collection::btree_map(1u128..10_000, (any::<bool>(), any::<bool>()), 0..60),
            page_size in 1usize..9,
        ) {
            let me = UserId::from_u128(u128::MAX).unwrap();
            let edges: Vec<Edge> = actors
                .iter()
                .map(|(n, (liked, matched))| {
                    Edge::new(UserId::from_u128(*n).unwrap(), me, *liked, *liked && *matched)
                })
                .collect();
            let filter = EdgeFilter::liked_you(me);

            let mut seen = Vec::new();
            let mut cursor = Cursor::Start;
            loop {
                let mut hits: Vec<Edge> = edges
                    .iter()
                    .copied()
                    .filter(|e| EdgeScan::page(filter, cursor, page_size).admits(e))
                    .collect();
                hits.sort_by_key(|e| e.actor);
                hits.truncate(page_size);

                let page = Page::from_edges(hits);
                prop_assert!(page.actors.len() <= page_size);
                match page.next_cursor() {
                    Some(next) => cursor = next,
                    None => break,
                }
                seen.extend(page.actors);
            }

            prop_assert!(seen.windows(2).all(|w| w[0] < w[1]));
            let expected: BTreeSet<UserId> = edges
                .iter()
                .filter(|e| filter.matches(e))
                .map(|e| e.actor)
                .collect();
            prop_assert_eq!(seen.into_iter().collect::<BTreeSet<_>>(), expected);
        }
    }
}
