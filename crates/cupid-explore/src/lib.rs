//! Cupid Explore
//!
//! Application layer of the explore service: the "liked you" listings, the
//! liker count and the decision transaction that keeps mutual matches
//! symmetric.
//!
//! ## Operations
//!
//! - **List liked you**: likers of a user, keyset-paginated by actor id
//! - **List new liked you**: likers not yet matched with the user
//! - **Count liked you**: total likers, unpaginated
//! - **Put decision**: like or dislike, atomically updating both edges
//!
//! Every store call runs on the blocking pool, under the request deadline,
//! with bounded retries on conflicts and unavailability.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod decision;
pub mod error;
mod executor;
pub mod query;

pub use config::{ExploreConfig, RetryPolicy, MAX_ATTEMPTS, MAX_PAGE_SIZE};
pub use decision::{apply_decision, Decision, DecisionTransactor};
pub use error::{ErrorKind, ExploreError, Operation};
pub use query::QueryService;

use cupid_domain::traits::EdgeStore;
use std::sync::Arc;
use tracing::info;

/// Query service and decision transactor sharing one store
pub struct Explorer<S> {
    queries: QueryService<S>,
    decisions: DecisionTransactor<S>,
}

impl<S> Clone for Explorer<S> {
    fn clone(&self) -> Self {
        Self {
            queries: self.queries.clone(),
            decisions: self.decisions.clone(),
        }
    }
}

impl<S> Explorer<S>
where
    S: EdgeStore + 'static,
{
    /// Validate `config` and wire both services to `store`
    pub fn new(store: Arc<S>, config: &ExploreConfig) -> Result<Self, ExploreError> {
        config.validate()?;

        info!(
            page_size = config.page_size,
            request_timeout_ms = config.request_timeout_ms,
            max_attempts = config.retry.max_attempts,
            "explore services ready"
        );

        Ok(Self {
            queries: QueryService::new(Arc::clone(&store), config),
            decisions: DecisionTransactor::new(store, config),
        })
    }

    /// Read operations
    pub fn queries(&self) -> &QueryService<S> {
        &self.queries
    }

    /// Decision operation
    pub fn decisions(&self) -> &DecisionTransactor<S> {
        &self.decisions
    }
}
