//! Query service: the three read operations

use crate::executor::StoreExecutor;
use crate::{ExploreConfig, ExploreError, Operation};
use cupid_domain::traits::EdgeStore;
use cupid_domain::{Cursor, EdgeFilter, EdgeScan, Listing, Page, UserId};
use std::sync::Arc;
use tracing::debug;

/// Answers listing and count queries over a recipient's incoming edges
///
/// Holds no per-caller state; the pagination cursor travels with the
/// request.
pub struct QueryService<S> {
    executor: StoreExecutor<S>,
    page_size: usize,
}

impl<S> Clone for QueryService<S> {
    fn clone(&self) -> Self {
        Self {
            executor: self.executor.clone(),
            page_size: self.page_size,
        }
    }
}

impl<S> QueryService<S>
where
    S: EdgeStore + 'static,
{
    /// Create a query service over `store`
    pub fn new(store: Arc<S>, config: &ExploreConfig) -> Self {
        Self {
            executor: StoreExecutor::new(store, config),
            page_size: config.page_size,
        }
    }

    /// Configured page size
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// One page of `listing` for `recipient`, starting after `cursor`
    ///
    /// The returned page carries the token for the next request. An empty
    /// page ends the walk.
    pub async fn list(
        &self,
        listing: Listing,
        recipient: UserId,
        cursor: Cursor,
    ) -> Result<Page, ExploreError> {
        let scan = EdgeScan::page(listing.filter(recipient), cursor, self.page_size);
        let operation = Operation::List { listing, recipient };

        let edges = self
            .executor
            .run(operation, move |store, _| store.scan(&scan))
            .await?;

        let page = Page::from_edges(edges);
        debug!(%operation, returned = page.actors.len(), "listing page served");
        Ok(page)
    }

    /// Users who like `recipient`
    pub async fn list_liked_you(
        &self,
        recipient: UserId,
        cursor: Cursor,
    ) -> Result<Page, ExploreError> {
        self.list(Listing::LikedYou, recipient, cursor).await
    }

    /// Users who like `recipient` and are not matched with them yet
    pub async fn list_new_liked_you(
        &self,
        recipient: UserId,
        cursor: Cursor,
    ) -> Result<Page, ExploreError> {
        self.list(Listing::NewLikedYou, recipient, cursor).await
    }

    /// Number of users who like `recipient`; no pagination involved
    pub async fn count_liked_you(&self, recipient: UserId) -> Result<u64, ExploreError> {
        let filter = EdgeFilter::liked_you(recipient);
        self.executor
            .run(Operation::Count { recipient }, move |store, _| store.count(&filter))
            .await
    }
}
