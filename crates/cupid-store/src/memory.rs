//! In-memory edge store
//!
//! Transactions run optimistically: reads record the version of every edge
//! they touch, writes are buffered, and the commit re-validates those
//! versions under the write lock. A transaction whose inputs changed fails
//! with a conflict instead of committing, which makes the read-then-write
//! decision protocol serializable.

use crate::StoreError;
use cupid_domain::traits::{EdgeStore, EdgeTxn};
use cupid_domain::{Cancellation, Edge, EdgeFilter, EdgeKey, EdgeScan, UserId};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Storage slot: ordered by recipient, then actor, so one recipient's edges
/// are contiguous and already sorted for listing scans.
type Slot = (UserId, UserId);

fn slot(key: &EdgeKey) -> Slot {
    (key.recipient, key.actor)
}

#[derive(Debug, Clone, Copy)]
struct Versioned {
    edge: Edge,
    version: u64,
}

/// In-memory implementation of [`EdgeStore`]
///
/// Intended for tests and local development. Faults can be injected to
/// exercise retry paths.
///
/// # Examples
///
/// ```
/// use cupid_domain::{Edge, EdgeFilter, UserId};
/// use cupid_domain::traits::EdgeStore;
/// use cupid_store::MemoryEdgeStore;
///
/// let store = MemoryEdgeStore::new();
/// let (a, b) = (UserId::random(), UserId::random());
/// store.insert_edges(&[Edge::new(a, b, true, false)]);
///
/// assert_eq!(store.count(&EdgeFilter::liked_you(b)).unwrap(), 1);
/// ```
#[derive(Default)]
pub struct MemoryEdgeStore {
    edges: RwLock<BTreeMap<Slot, Versioned>>,
    commit_conflicts: AtomicUsize,
    unavailable: AtomicUsize,
}

impl MemoryEdgeStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite edges
    pub fn insert_edges(&self, edges: &[Edge]) {
        let mut map = self.write_map();
        for edge in edges {
            let version = map.get(&slot(&edge.key())).map_or(0, |v| v.version + 1);
            map.insert(slot(&edge.key()), Versioned { edge: *edge, version });
        }
    }

    /// Current state of one edge, bypassing fault injection
    pub fn edge(&self, key: &EdgeKey) -> Option<Edge> {
        self.read_map().get(&slot(key)).map(|v| v.edge)
    }

    /// Total number of stored edges
    pub fn len(&self) -> usize {
        self.read_map().len()
    }

    /// Whether the store holds no edges
    pub fn is_empty(&self) -> bool {
        self.read_map().is_empty()
    }

    /// Fail the next `n` transaction commits with a conflict
    pub fn inject_commit_conflicts(&self, n: usize) {
        self.commit_conflicts.store(n, Ordering::SeqCst);
    }

    /// Fail the next `n` operations (scans, counts, reads, transactions)
    /// as unavailable
    pub fn inject_unavailable(&self, n: usize) {
        self.unavailable.store(n, Ordering::SeqCst);
    }

    fn read_map(&self) -> RwLockReadGuard<'_, BTreeMap<Slot, Versioned>> {
        self.edges.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_map(&self) -> RwLockWriteGuard<'_, BTreeMap<Slot, Versioned>> {
        self.edges.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if take_one(&self.unavailable) {
            return Err(StoreError::Unavailable("injected outage".to_string()));
        }
        Ok(())
    }

    fn commit(&self, txn: MemoryTxn<'_>) -> Result<(), StoreError> {
        if take_one(&self.commit_conflicts) {
            return Err(StoreError::Conflict("injected commit conflict".to_string()));
        }

        let mut map = self.write_map();
        for (key, seen) in &txn.reads {
            match map.get(&slot(key)) {
                Some(current) if current.version == *seen => {}
                _ => {
                    return Err(StoreError::Conflict(format!(
                        "edge {} changed during transaction",
                        key
                    )))
                }
            }
        }

        for (key, edge) in txn.writes {
            if let Some(current) = map.get_mut(&slot(&key)) {
                current.edge.liked = edge.liked;
                current.edge.matched = edge.matched;
                current.version += 1;
            }
        }
        Ok(())
    }
}

/// Decrement `counter` if positive; report whether it was
fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

impl EdgeStore for MemoryEdgeStore {
    type Error = StoreError;

    fn scan(&self, scan: &EdgeScan) -> Result<Vec<Edge>, Self::Error> {
        if scan.limit == 0 {
            return Err(StoreError::InvalidQuery("scan limit must be positive".to_string()));
        }
        self.check_available()?;

        Ok(self
            .read_map()
            .values()
            .map(|v| v.edge)
            .filter(|edge| scan.admits(edge))
            .take(scan.limit)
            .collect())
    }

    fn count(&self, filter: &EdgeFilter) -> Result<u64, Self::Error> {
        self.check_available()?;
        Ok(self
            .read_map()
            .values()
            .filter(|v| filter.matches(&v.edge))
            .count() as u64)
    }

    fn read_one(&self, key: &EdgeKey) -> Result<Edge, Self::Error> {
        self.check_available()?;
        self.edge(key).ok_or(StoreError::NotFound(*key))
    }

    fn run_transaction_with<T, F>(&self, cancel: &Cancellation, f: F) -> Result<T, Self::Error>
    where
        F: FnOnce(&mut dyn EdgeTxn<Error = Self::Error>) -> Result<T, Self::Error>,
    {
        self.check_available()?;

        let mut txn = MemoryTxn {
            store: self,
            reads: HashMap::new(),
            writes: BTreeMap::new(),
        };
        let out = f(&mut txn)?;
        if !cancel.begin_commit() {
            return Err(StoreError::Cancelled);
        }
        self.commit(txn)?;
        Ok(out)
    }
}

struct MemoryTxn<'a> {
    store: &'a MemoryEdgeStore,
    reads: HashMap<EdgeKey, u64>,
    writes: BTreeMap<EdgeKey, Edge>,
}

impl EdgeTxn for MemoryTxn<'_> {
    type Error = StoreError;

    fn read_edge(&mut self, key: &EdgeKey) -> Result<Edge, Self::Error> {
        if let Some(edge) = self.writes.get(key) {
            return Ok(*edge);
        }

        let current = self
            .store
            .read_map()
            .get(&slot(key))
            .copied()
            .ok_or(StoreError::NotFound(*key))?;
        self.reads.entry(*key).or_insert(current.version);
        Ok(current.edge)
    }

    fn write_edge(&mut self, edge: &Edge) -> Result<(), Self::Error> {
        let key = edge.key();
        if !self.writes.contains_key(&key) {
            self.read_edge(&key)?;
        }
        self.writes.insert(key, *edge);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cupid_domain::Cursor;

    fn id(n: u128) -> UserId {
        UserId::from_u128(n).unwrap()
    }

    #[test]
    fn test_scan_is_actor_ordered_per_recipient() {
        let store = MemoryEdgeStore::new();
        let me = id(500);
        store.insert_edges(&[
            Edge::new(id(30), me, true, false),
            Edge::new(id(10), me, true, false),
            Edge::new(id(20), id(501), true, false),
            Edge::new(id(40), me, false, false),
        ]);

        let scan = EdgeScan::page(EdgeFilter::liked_you(me), Cursor::Start, 10);
        let actors: Vec<UserId> = store.scan(&scan).unwrap().iter().map(|e| e.actor).collect();
        assert_eq!(actors, vec![id(10), id(30)]);
    }

    #[test]
    fn test_transaction_commits_all_writes() {
        let store = MemoryEdgeStore::new();
        let (a, b) = (id(1), id(2));
        store.insert_edges(&[Edge::new(a, b, false, false), Edge::new(b, a, true, false)]);

        store
            .run_transaction(|txn| {
                txn.write_edge(&Edge::new(a, b, true, true))?;
                txn.write_edge(&Edge::new(b, a, true, true))
            })
            .unwrap();

        assert!(store.edge(&EdgeKey::new(a, b)).unwrap().matched);
        assert!(store.edge(&EdgeKey::new(b, a)).unwrap().matched);
    }

    #[test]
    fn test_failed_transaction_writes_nothing() {
        let store = MemoryEdgeStore::new();
        let (a, b) = (id(1), id(2));
        store.insert_edges(&[Edge::new(a, b, false, false)]);

        let result: Result<(), StoreError> = store.run_transaction(|txn| {
            txn.write_edge(&Edge::new(a, b, true, true))?;
            // reverse edge is missing
            txn.write_edge(&Edge::new(b, a, true, true))
        });

        assert!(matches!(result, Err(StoreError::NotFound(_))));
        assert!(!store.edge(&EdgeKey::new(a, b)).unwrap().liked);
    }

    #[test]
    fn test_transaction_sees_own_writes() {
        let store = MemoryEdgeStore::new();
        let (a, b) = (id(1), id(2));
        store.insert_edges(&[Edge::new(a, b, false, false)]);

        let seen = store
            .run_transaction(|txn| {
                txn.write_edge(&Edge::new(a, b, true, false))?;
                txn.read_edge(&EdgeKey::new(a, b))
            })
            .unwrap();
        assert!(seen.liked);
    }

    #[test]
    fn test_concurrent_change_conflicts() {
        let store = MemoryEdgeStore::new();
        let (a, b) = (id(1), id(2));
        store.insert_edges(&[Edge::new(a, b, false, false)]);

        let result = store.run_transaction(|txn| {
            let edge = txn.read_edge(&EdgeKey::new(a, b))?;
            // Another writer lands between our read and our commit
            store.insert_edges(&[Edge::new(a, b, true, false)]);
            txn.write_edge(&Edge { matched: false, ..edge })
        });

        assert!(matches!(result, Err(StoreError::Conflict(_))));
        assert!(store.edge(&EdgeKey::new(a, b)).unwrap().liked);
    }

    #[test]
    fn test_injected_faults_are_consumed() {
        let store = MemoryEdgeStore::new();
        let key = EdgeKey::new(id(1), id(2));
        store.insert_edges(&[Edge::new(key.actor, key.recipient, true, false)]);

        store.inject_unavailable(1);
        assert!(matches!(store.read_one(&key), Err(StoreError::Unavailable(_))));
        assert!(store.read_one(&key).is_ok());

        store.inject_commit_conflicts(1);
        assert!(matches!(
            store.run_transaction(|txn| txn.read_edge(&key)),
            Err(StoreError::Conflict(_))
        ));
        assert!(store.run_transaction(|txn| txn.read_edge(&key)).is_ok());
    }

    #[test]
    fn test_cancelled_transaction_writes_nothing() {
        let store = MemoryEdgeStore::new();
        let (a, b) = (id(1), id(2));
        store.insert_edges(&[Edge::new(a, b, false, false)]);

        let cancel = Cancellation::new();
        let result = store.run_transaction_with(&cancel, |txn| {
            txn.write_edge(&Edge::new(a, b, true, false))?;
            // the request gives up while the transaction is still open
            cancel.cancel();
            Ok(())
        });

        assert!(matches!(result, Err(StoreError::Cancelled)));
        assert!(!store.edge(&EdgeKey::new(a, b)).unwrap().liked);
    }

    #[test]
    fn test_read_missing_edge() {
        let store = MemoryEdgeStore::new();
        assert!(store.is_empty());
        let key = EdgeKey::new(id(1), id(2));
        assert!(matches!(store.read_one(&key), Err(StoreError::NotFound(k)) if k == key));
    }
}
