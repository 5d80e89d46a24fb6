//! Cupid Domain Layer
//!
//! Core model for the explore service: directional interest edges between
//! users and the rules that derive mutual matches from them.
//! Apart from `uuid` for identifiers this crate has no external dependencies;
//! storage and transport live in other crates and plug in through the
//! traits defined in [`traits`].
//!
//! ## Key Concepts
//!
//! - **Edge**: one user's stance (liked or not) toward another user
//! - **Mutual match**: both directional edges of a pair are liked
//! - **Listing**: a filtered, actor-ordered view of the edges pointing at a user
//! - **Cursor**: keyset pagination position, the last actor seen
//!
//! ## Architecture
//!
//! - Pure business logic only
//! - The edge store is a capability consumed through [`traits::EdgeStore`]
//! - Pagination is stateless; the cursor is plain data owned by the caller

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cancel;
pub mod edge;
pub mod filter;
pub mod pagination;
pub mod traits;
pub mod user;

// Re-exports for convenience
pub use cancel::Cancellation;
pub use edge::{mutual_match, Edge, EdgeKey};
pub use filter::{EdgeFilter, Listing};
pub use pagination::{Cursor, EdgeScan, Page};
pub use traits::{EdgeStore, EdgeTxn, FaultKind, StoreFault};
pub use user::{InvalidUserId, UserId};
