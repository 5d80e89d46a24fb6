//! Recording decisions and deriving mutual matches

use crate::executor::StoreExecutor;
use crate::{ExploreConfig, ExploreError, Operation};
use cupid_domain::traits::{EdgeStore, EdgeTxn};
use cupid_domain::{mutual_match, Edge, EdgeKey, UserId};
use std::sync::Arc;
use tracing::info;

/// One user's like or dislike of another
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// User making the decision
    pub actor: UserId,

    /// User the decision is about
    pub recipient: UserId,

    /// true for like, false for dislike
    pub liked: bool,
}

impl Decision {
    /// Build a decision; a user cannot decide on themselves
    pub fn new(actor: UserId, recipient: UserId, liked: bool) -> Result<Self, ExploreError> {
        if actor == recipient {
            return Err(ExploreError::InvalidInput(format!(
                "actor and recipient are the same user ({})",
                actor
            )));
        }

        Ok(Self {
            actor,
            recipient,
            liked,
        })
    }

    /// Key of the edge this decision overwrites
    pub fn forward(&self) -> EdgeKey {
        EdgeKey::new(self.actor, self.recipient)
    }
}

/// Apply `decision` inside an open transaction and return the mutual flag
///
/// Reads both directional edges, then writes `liked` and `matched` on the
/// forward edge and `matched` on the reverse edge. The reverse edge's
/// `liked` is left as it was. Either edge missing aborts the transaction
/// with the store's `NotFound` fault.
pub fn apply_decision<E>(
    txn: &mut dyn EdgeTxn<Error = E>,
    decision: &Decision,
) -> Result<bool, E> {
    let forward = txn.read_edge(&decision.forward())?;
    let reverse = txn.read_edge(&decision.forward().reversed())?;

    let mutual = mutual_match(decision.liked, reverse.liked);

    txn.write_edge(&Edge {
        liked: decision.liked,
        matched: mutual,
        ..forward
    })?;
    txn.write_edge(&Edge {
        matched: mutual,
        ..reverse
    })?;

    Ok(mutual)
}

/// Runs decisions as store transactions under the retry policy
pub struct DecisionTransactor<S> {
    executor: StoreExecutor<S>,
}

impl<S> Clone for DecisionTransactor<S> {
    fn clone(&self) -> Self {
        Self {
            executor: self.executor.clone(),
        }
    }
}

impl<S> DecisionTransactor<S>
where
    S: EdgeStore + 'static,
{
    /// Create a transactor over `store`
    pub fn new(store: Arc<S>, config: &ExploreConfig) -> Self {
        Self {
            executor: StoreExecutor::new(store, config),
        }
    }

    /// Record `decision` and return whether the pair now mutually match
    ///
    /// Either both edges reflect the decision or neither does. A conflicting
    /// concurrent decision on the same pair re-runs the whole transaction
    /// against fresh reads. When this returns `Timeout`, or the future is
    /// dropped, the transaction was rolled back and nothing was written.
    pub async fn decide(&self, decision: Decision) -> Result<bool, ExploreError> {
        let operation = Operation::Decide {
            actor: decision.actor,
            recipient: decision.recipient,
        };

        let mutual = self
            .executor
            .run(operation, move |store, cancel| {
                store.run_transaction_with(cancel, |txn| apply_decision(txn, &decision))
            })
            .await?;

        info!(
            actor_id = %decision.actor,
            recipient_id = %decision.recipient,
            liked = decision.liked,
            mutual,
            "decision recorded"
        );
        Ok(mutual)
    }
}
