//! Runs blocking store calls from async request handlers
//!
//! Every store call moves to the blocking pool, is retried with backoff on
//! retryable faults, and is bounded by the request deadline.
//!
//! Each attempt carries a [`Cancellation`] gate. When the deadline passes or
//! the caller goes away, the gate is closed and a transaction still in
//! flight rolls back instead of committing. If the transaction already won
//! the gate, its commit is awaited and its real outcome returned, so a
//! caller never sees `Timeout` for a write that was stored.

use crate::{ExploreConfig, ExploreError, Operation, RetryPolicy};
use cupid_domain::traits::{EdgeStore, StoreFault};
use cupid_domain::{Cancellation, FaultKind};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, warn};

pub(crate) struct StoreExecutor<S> {
    store: Arc<S>,
    retry: RetryPolicy,
    timeout: Duration,
}

impl<S> Clone for StoreExecutor<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            retry: self.retry,
            timeout: self.timeout,
        }
    }
}

/// Closes the gate of the current attempt if the request future is dropped
struct CancelOnDrop(Cancellation);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

impl<S> StoreExecutor<S>
where
    S: EdgeStore + 'static,
{
    pub(crate) fn new(store: Arc<S>, config: &ExploreConfig) -> Self {
        Self {
            store,
            retry: config.retry,
            timeout: config.request_timeout(),
        }
    }

    fn timed_out(&self, operation: Operation) -> ExploreError {
        let timeout_ms = self.timeout.as_millis() as u64;
        warn!(%operation, timeout_ms, "deadline exceeded");
        ExploreError::Timeout {
            operation,
            timeout_ms,
        }
    }

    /// Run `call` against the store under the retry policy and deadline
    ///
    /// `call` receives the gate of its attempt; transactional calls pass it
    /// on to [`EdgeStore::run_transaction_with`].
    pub(crate) async fn run<T, F>(&self, operation: Operation, call: F) -> Result<T, ExploreError>
    where
        T: Send + 'static,
        F: Fn(&S, &Cancellation) -> Result<T, S::Error> + Send + Sync + 'static,
    {
        let deadline = Instant::now() + self.timeout;
        let call = Arc::new(call);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let cancel = Cancellation::new();
            let guard = CancelOnDrop(cancel.clone());

            let store = Arc::clone(&self.store);
            let task_call = Arc::clone(&call);
            let task_cancel = cancel.clone();
            let mut handle =
                tokio::task::spawn_blocking(move || (*task_call)(&*store, &task_cancel));

            let joined = match tokio::time::timeout_at(deadline, &mut handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    if cancel.cancel() {
                        return Err(self.timed_out(operation));
                    }
                    debug!(%operation, "deadline passed during commit, awaiting outcome");
                    handle.await
                }
            };
            drop(guard);

            let outcome = joined.map_err(|e| {
                error!(%operation, error = %e, "store task failed");
                ExploreError::Internal { operation }
            })?;

            let fault = match outcome {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(%operation, attempt, "store operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(fault) => fault,
            };

            let kind = fault.kind();
            if kind.is_retryable() && attempt < self.retry.max_attempts {
                let delay = self.retry.delay_after(attempt);
                warn!(
                    %operation,
                    attempt,
                    max_attempts = self.retry.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %fault,
                    "retrying store operation"
                );
                if tokio::time::timeout_at(deadline, tokio::time::sleep(delay))
                    .await
                    .is_err()
                {
                    return Err(self.timed_out(operation));
                }
                continue;
            }

            match kind {
                FaultKind::NotFound => debug!(%operation, error = %fault, "edge not found"),
                _ => error!(%operation, attempt, ?kind, error = %fault, "store operation failed"),
            }
            return Err(ExploreError::from_fault(kind, operation, attempt));
        }
    }
}
