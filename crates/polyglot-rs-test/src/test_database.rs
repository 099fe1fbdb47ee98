//! Test database utilities for polyglot-rs.
//!
//! Provides [`TestDatabase`], an in-memory SQLite database wrapper for use in
//! tests. It implements [`DbExecutor`] so an engine can be wired over it,
//! and counts the statements it runs so tests can assert that memoized
//! lookups stay off the database.
//!
//! ## Example
//!
//! ```
//! use polyglot_rs_db::DbExecutor;
//! use polyglot_rs_test::test_database::TestDatabase;
//!
//! let db = TestDatabase::new();
//! db.execute_raw("CREATE TABLE t (id INTEGER PRIMARY KEY)").unwrap();
//! assert_eq!(db.query_count(), 1);
//! assert!(db.query("SELECT id FROM t", &[]).unwrap().is_empty());
//! assert_eq!(db.query_count(), 2);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use polyglot_rs_core::PolyglotResult;
use polyglot_rs_db::{DbExecutor, Row, SqliteBackend, Value};

/// An in-memory SQLite database for testing.
///
/// Clones share the same database and the same counter.
#[derive(Clone)]
pub struct TestDatabase {
    backend: Arc<SqliteBackend>,
    query_count: Arc<AtomicUsize>,
}

impl std::fmt::Debug for TestDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestDatabase")
            .field("query_count", &self.query_count())
            .finish_non_exhaustive()
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl TestDatabase {
    /// Creates a new in-memory SQLite test database.
    ///
    /// # Panics
    ///
    /// Panics if the in-memory database cannot be created.
    pub fn new() -> Self {
        let backend = SqliteBackend::memory().expect("Failed to create in-memory SQLite database");
        Self {
            backend: Arc::new(backend),
            query_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Executes a raw SQL string with no parameters.
    pub fn execute_raw(&self, sql: &str) -> PolyglotResult<u64> {
        self.execute_sql(sql, &[])
    }

    /// Returns the names of the tables created so far.
    pub fn table_names(&self) -> PolyglotResult<Vec<String>> {
        self.backend
            .query(
                "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
                &[],
            )?
            .iter()
            .map(|row| row.get::<String>("name"))
            .collect()
    }

    /// Returns the number of statements run since creation or the last reset.
    pub fn query_count(&self) -> usize {
        self.query_count.load(Ordering::Relaxed)
    }

    pub fn reset_query_count(&self) {
        self.query_count.store(0, Ordering::Relaxed);
    }

    pub fn backend(&self) -> &SqliteBackend {
        &self.backend
    }

    fn count(&self) {
        self.query_count.fetch_add(1, Ordering::Relaxed);
    }
}

impl DbExecutor for TestDatabase {
    fn vendor(&self) -> &str {
        self.backend.vendor()
    }

    fn execute_sql(&self, sql: &str, params: &[Value]) -> PolyglotResult<u64> {
        self.count();
        self.backend.execute_sql(sql, params)
    }

    fn query(&self, sql: &str, params: &[Value]) -> PolyglotResult<Vec<Row>> {
        self.count();
        self.backend.query(sql, params)
    }

    fn insert_returning_id(&self, sql: &str, params: &[Value]) -> PolyglotResult<i64> {
        self.count();
        self.backend.insert_returning_id(sql, params)
    }
}
