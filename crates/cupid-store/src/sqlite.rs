//! SQLite-backed edge store

use crate::config::StoreConfig;
use crate::pool::ConnectionPool;
use crate::StoreError;
use cupid_domain::traits::{EdgeStore, EdgeTxn};
use cupid_domain::{Cancellation, Edge, EdgeFilter, EdgeKey, EdgeScan, UserId};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tracing::debug;

const SELECT_EDGE: &str = "SELECT actor_id, recipient_id, liked, matched FROM edges";

/// SQL text with its positional parameters
type Query = (String, Vec<Box<dyn rusqlite::ToSql>>);

/// SQLite-based implementation of [`EdgeStore`]
///
/// Holds a pool of connections to one database and is safe to share across
/// threads behind an `Arc`. File databases run in WAL mode so readers never
/// wait on the writer.
///
/// # Examples
///
/// ```
/// use cupid_domain::{Edge, EdgeKey, UserId};
/// use cupid_domain::traits::EdgeStore;
/// use cupid_store::SqliteEdgeStore;
///
/// let store = SqliteEdgeStore::in_memory().unwrap();
/// let (a, b) = (UserId::random(), UserId::random());
/// store.insert_edges(&[Edge::new(a, b, true, false)]).unwrap();
///
/// assert!(store.read_one(&EdgeKey::new(a, b)).unwrap().liked);
/// ```
pub struct SqliteEdgeStore {
    pool: ConnectionPool,
}

impl SqliteEdgeStore {
    /// Open (and if needed create) the database described by `config`
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        if config.pool_size == 0 {
            return Err(StoreError::Config("pool_size must be at least 1".to_string()));
        }

        let in_memory = config.is_in_memory();
        if !in_memory {
            if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Unavailable(format!(
                        "cannot create database directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        // Each connection to ":memory:" is its own database
        let size = if in_memory { 1 } else { config.pool_size };
        let connections = (0..size)
            .map(|_| Self::open_connection(config, in_memory))
            .collect::<Result<Vec<_>, _>>()?;

        let store = Self {
            pool: ConnectionPool::new(connections),
        };
        store.initialize_schema()?;

        debug!(
            path = %config.path.display(),
            connections = store.pool.size(),
            "edge store opened"
        );

        Ok(store)
    }

    /// Open a private in-memory store (useful for testing)
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::open(&StoreConfig::in_memory())
    }

    fn open_connection(config: &StoreConfig, in_memory: bool) -> Result<Connection, StoreError> {
        let conn = Connection::open(&config.path)?;
        conn.busy_timeout(config.busy_timeout())?;

        if !in_memory {
            let mode: String = conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                row.get(0)
            })?;
            if !mode.eq_ignore_ascii_case("wal") {
                return Err(StoreError::Config(format!(
                    "database refused WAL journal mode (got {})",
                    mode
                )));
            }
            conn.pragma_update(None, "synchronous", "NORMAL")?;
        }

        Ok(conn)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.pool.acquire().execute_batch(schema)?;
        Ok(())
    }

    /// Insert or overwrite edges
    ///
    /// Edge creation is not part of the decision protocol; this is the
    /// seeding path used by fixtures and tooling. All edges are written in
    /// one transaction.
    pub fn insert_edges(&self, edges: &[Edge]) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO edges (actor_id, recipient_id, liked, matched)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(actor_id, recipient_id) DO UPDATE SET
                 liked = excluded.liked, matched = excluded.matched",
            )?;
            for edge in edges {
                stmt.execute(params![
                    edge.actor.to_string(),
                    edge.recipient.to_string(),
                    edge.liked,
                    edge.matched,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Number of connections held by the pool
    pub fn pool_size(&self) -> usize {
        self.pool.size()
    }

    /// Append the WHERE clause for `filter`
    fn push_filter(sql: &mut String, params: &mut Vec<Box<dyn rusqlite::ToSql>>, filter: &EdgeFilter) {
        sql.push_str(" WHERE recipient_id = ?");
        params.push(Box::new(filter.recipient.to_string()));

        if let Some(liked) = filter.liked {
            sql.push_str(" AND liked = ?");
            params.push(Box::new(liked));
        }

        if let Some(matched) = filter.matched {
            sql.push_str(" AND matched = ?");
            params.push(Box::new(matched));
        }
    }

    /// SQL and parameters for one page of `scan`
    fn scan_query(scan: &EdgeScan) -> Result<Query, StoreError> {
        if scan.limit == 0 {
            return Err(StoreError::InvalidQuery("scan limit must be positive".to_string()));
        }
        let limit = i64::try_from(scan.limit)
            .map_err(|_| StoreError::InvalidQuery(format!("scan limit {} too large", scan.limit)))?;

        let mut sql = String::from(SELECT_EDGE);
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        Self::push_filter(&mut sql, &mut params, &scan.filter);

        if let Some(after) = scan.after.lower_bound() {
            sql.push_str(" AND actor_id > ?");
            params.push(Box::new(after.to_string()));
        }

        sql.push_str(" ORDER BY actor_id ASC LIMIT ?");
        params.push(Box::new(limit));

        Ok((sql, params))
    }

    fn parse_user(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<UserId> {
        let text: String = row.get(idx)?;
        UserId::parse(&text).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
    }

    fn row_to_edge(row: &rusqlite::Row<'_>) -> rusqlite::Result<Edge> {
        Ok(Edge {
            actor: Self::parse_user(row, 0)?,
            recipient: Self::parse_user(row, 1)?,
            liked: row.get(2)?,
            matched: row.get(3)?,
        })
    }

    fn read_edge_on(conn: &Connection, key: &EdgeKey) -> Result<Edge, StoreError> {
        let sql = format!("{} WHERE actor_id = ?1 AND recipient_id = ?2", SELECT_EDGE);
        conn.query_row(
            &sql,
            params![key.actor.to_string(), key.recipient.to_string()],
            Self::row_to_edge,
        )
        .optional()?
        .ok_or(StoreError::NotFound(*key))
    }

    fn write_edge_on(conn: &Connection, edge: &Edge) -> Result<(), StoreError> {
        let updated = conn.execute(
            "UPDATE edges SET liked = ?3, matched = ?4 WHERE actor_id = ?1 AND recipient_id = ?2",
            params![
                edge.actor.to_string(),
                edge.recipient.to_string(),
                edge.liked,
                edge.matched,
            ],
        )?;

        if updated == 0 {
            return Err(StoreError::NotFound(edge.key()));
        }
        Ok(())
    }
}

impl EdgeStore for SqliteEdgeStore {
    type Error = StoreError;

    fn scan(&self, scan: &EdgeScan) -> Result<Vec<Edge>, Self::Error> {
        let (sql, params) = Self::scan_query(scan)?;

        let conn = self.pool.acquire();
        let mut stmt = conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let edges = stmt
            .query_map(&param_refs[..], Self::row_to_edge)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(edges)
    }

    fn count(&self, filter: &EdgeFilter) -> Result<u64, Self::Error> {
        let mut sql = String::from("SELECT COUNT(*) FROM edges");
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        Self::push_filter(&mut sql, &mut params, filter);

        let conn = self.pool.acquire();
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let count: i64 = conn.query_row(&sql, &param_refs[..], |row| row.get(0))?;

        u64::try_from(count).map_err(|_| StoreError::InvalidData(format!("negative count {}", count)))
    }

    fn read_one(&self, key: &EdgeKey) -> Result<Edge, Self::Error> {
        let conn = self.pool.acquire();
        Self::read_edge_on(&conn, key)
    }

    fn run_transaction_with<T, F>(&self, cancel: &Cancellation, f: F) -> Result<T, Self::Error>
    where
        F: FnOnce(&mut dyn EdgeTxn<Error = Self::Error>) -> Result<T, Self::Error>,
    {
        let mut conn = self.pool.acquire();
        // IMMEDIATE takes the write lock up front, so the reads inside `f`
        // and the writes that follow cannot interleave with another writer.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        // Dropping `tx` on the error path rolls back
        let out = {
            let mut txn = SqliteTxn { conn: &tx };
            f(&mut txn)?
        };

        if !cancel.begin_commit() {
            debug!("transaction cancelled before commit, rolling back");
            return Err(StoreError::Cancelled);
        }
        tx.commit()?;
        Ok(out)
    }
}

/// Transaction handle over an open SQLite transaction
struct SqliteTxn<'a> {
    conn: &'a Connection,
}

impl EdgeTxn for SqliteTxn<'_> {
    type Error = StoreError;

    fn read_edge(&mut self, key: &EdgeKey) -> Result<Edge, Self::Error> {
        SqliteEdgeStore::read_edge_on(self.conn, key)
    }

    fn write_edge(&mut self, edge: &Edge) -> Result<(), Self::Error> {
        SqliteEdgeStore::write_edge_on(self.conn, edge)
    }
}
