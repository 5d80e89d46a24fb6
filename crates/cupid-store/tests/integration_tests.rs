//! Integration tests for cupid-store
//!
//! These tests exercise the SQLite store through the `EdgeStore` capability.

use cupid_domain::traits::EdgeStore;
use cupid_domain::{Cancellation, Cursor, Edge, EdgeFilter, EdgeKey, EdgeScan, FaultKind, StoreFault, UserId};
use cupid_store::{SqliteEdgeStore, StoreConfig, StoreError};
use std::sync::Arc;

fn id(n: u128) -> UserId {
    UserId::from_u128(n).unwrap()
}

/// Recipient 1000 liked by 1..=5 (3 and 4 matched), disliked by 6..=7,
/// plus unrelated edges toward 2000.
fn seeded_store() -> SqliteEdgeStore {
    let store = SqliteEdgeStore::in_memory().unwrap();
    let me = id(1000);
    let mut edges = Vec::new();
    for n in 1..=5 {
        edges.push(Edge::new(id(n), me, true, n == 3 || n == 4));
    }
    for n in 6..=7 {
        edges.push(Edge::new(id(n), me, false, false));
    }
    edges.push(Edge::new(id(1), id(2000), true, false));
    edges.push(Edge::new(me, id(3), true, true));
    edges.push(Edge::new(me, id(4), true, true));
    store.insert_edges(&edges).unwrap();
    store
}

fn actors(edges: &[Edge]) -> Vec<UserId> {
    edges.iter().map(|e| e.actor).collect()
}

#[test]
fn test_store_initialization() {
    let store = SqliteEdgeStore::in_memory();
    assert!(store.is_ok(), "Store should initialize successfully");
}

#[test]
fn test_scan_filters_and_orders() {
    let store = seeded_store();
    let me = id(1000);

    let liked = store
        .scan(&EdgeScan::page(EdgeFilter::liked_you(me), Cursor::Start, 100))
        .unwrap();
    assert_eq!(actors(&liked), vec![id(1), id(2), id(3), id(4), id(5)]);
    assert!(liked.iter().all(|e| e.recipient == me && e.liked));

    let fresh = store
        .scan(&EdgeScan::page(EdgeFilter::new_liked_you(me), Cursor::Start, 100))
        .unwrap();
    assert_eq!(actors(&fresh), vec![id(1), id(2), id(5)]);
}

#[test]
fn test_scan_respects_cursor_and_limit() {
    let store = seeded_store();
    let filter = EdgeFilter::liked_you(id(1000));

    let first = store.scan(&EdgeScan::page(filter, Cursor::Start, 2)).unwrap();
    assert_eq!(actors(&first), vec![id(1), id(2)]);

    let second = store
        .scan(&EdgeScan::page(filter, Cursor::After(id(2)), 2))
        .unwrap();
    assert_eq!(actors(&second), vec![id(3), id(4)]);

    let last = store
        .scan(&EdgeScan::page(filter, Cursor::After(id(5)), 2))
        .unwrap();
    assert!(last.is_empty());
}

#[test]
fn test_count() {
    let store = seeded_store();
    let me = id(1000);

    assert_eq!(store.count(&EdgeFilter::liked_you(me)).unwrap(), 5);
    assert_eq!(store.count(&EdgeFilter::new_liked_you(me)).unwrap(), 3);
    assert_eq!(store.count(&EdgeFilter::to_recipient(me)).unwrap(), 7);
    assert_eq!(store.count(&EdgeFilter::liked_you(id(9999))).unwrap(), 0);
}

#[test]
fn test_read_one() {
    let store = seeded_store();

    let edge = store.read_one(&EdgeKey::new(id(3), id(1000))).unwrap();
    assert!(edge.liked);
    assert!(edge.matched);

    let missing = store.read_one(&EdgeKey::new(id(1000), id(1))).unwrap_err();
    assert_eq!(missing.kind(), FaultKind::NotFound);
}

#[test]
fn test_transaction_commit() {
    let store = seeded_store();
    let me = id(1000);

    store
        .run_transaction(|txn| {
            let edge = txn.read_edge(&EdgeKey::new(id(3), me))?;
            txn.write_edge(&Edge { liked: false, matched: false, ..edge })?;
            txn.write_edge(&Edge::new(me, id(3), true, false))
        })
        .unwrap();

    assert!(!store.read_one(&EdgeKey::new(id(3), me)).unwrap().liked);
    assert!(!store.read_one(&EdgeKey::new(me, id(3))).unwrap().matched);
}

#[test]
fn test_transaction_rollback_on_error() {
    let store = seeded_store();
    let me = id(1000);

    let result: Result<(), StoreError> = store.run_transaction(|txn| {
        txn.write_edge(&Edge::new(id(1), me, true, true))?;
        // No edge 1000 -> 1 exists
        txn.write_edge(&Edge::new(me, id(1), true, true))
    });

    assert!(matches!(result, Err(StoreError::NotFound(_))));
    assert!(!store.read_one(&EdgeKey::new(id(1), me)).unwrap().matched);
}

#[test]
fn test_transaction_cancelled_mid_flight_persists_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::new(dir.path().join("cancel.db"));
    let (a, b) = (id(1), id(2));

    {
        let store = SqliteEdgeStore::open(&config).unwrap();
        store
            .insert_edges(&[Edge::new(a, b, false, false), Edge::new(b, a, true, false)])
            .unwrap();

        let cancel = Cancellation::new();
        let canceller = cancel.clone();
        let result = store.run_transaction_with(&cancel, |txn| {
            txn.write_edge(&Edge::new(a, b, true, true))?;
            std::thread::spawn(move || canceller.cancel()).join().unwrap();
            txn.write_edge(&Edge::new(b, a, true, true))
        });
        assert_eq!(result.unwrap_err().kind(), FaultKind::Cancelled);
    }

    let store = SqliteEdgeStore::open(&config).unwrap();
    assert_eq!(store.read_one(&EdgeKey::new(a, b)).unwrap(), Edge::new(a, b, false, false));
    assert_eq!(store.read_one(&EdgeKey::new(b, a)).unwrap(), Edge::new(b, a, true, false));
}

#[test]
fn test_insert_edges_upserts() {
    let store = seeded_store();
    let key = EdgeKey::new(id(6), id(1000));

    store
        .insert_edges(&[Edge::new(key.actor, key.recipient, true, false)])
        .unwrap();

    assert!(store.read_one(&key).unwrap().liked);
    assert_eq!(store.count(&EdgeFilter::to_recipient(id(1000))).unwrap(), 7);
}

#[test]
fn test_file_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::new(dir.path().join("nested").join("edges.db")).with_pool_size(3);
    let key = EdgeKey::new(id(1), id(2));

    {
        let store = SqliteEdgeStore::open(&config).unwrap();
        assert_eq!(store.pool_size(), 3);
        store
            .insert_edges(&[Edge::new(key.actor, key.recipient, true, false)])
            .unwrap();
    }

    let store = SqliteEdgeStore::open(&config).unwrap();
    assert!(store.read_one(&key).unwrap().liked);
}

#[test]
fn test_file_store_concurrent_readers_and_writers() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::new(dir.path().join("edges.db"))
        .with_pool_size(4)
        .with_busy_timeout_ms(2_000);
    let store = Arc::new(SqliteEdgeStore::open(&config).unwrap());

    let me = id(1000);
    let edges: Vec<Edge> = (1..=20).map(|n| Edge::new(id(n), me, false, false)).collect();
    store.insert_edges(&edges).unwrap();

    let handles: Vec<_> = (1..=20u128)
        .map(|n| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                store.run_transaction(|txn| {
                    let edge = txn.read_edge(&EdgeKey::new(id(n), me))?;
                    txn.write_edge(&Edge { liked: true, ..edge })
                })?;
                store.count(&EdgeFilter::liked_you(me))
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    assert_eq!(store.count(&EdgeFilter::liked_you(me)).unwrap(), 20);
}
