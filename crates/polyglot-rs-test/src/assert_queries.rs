//! Query counting assertions.
//!
//! [`assert_num_queries`] counts the statements run against a
//! [`TestDatabase`] during a closure. Memoized lookups are expected to run
//! none once warm.
//!
//! ## Example
//!
//! ```
//! use polyglot_rs_db::DbExecutor;
//! use polyglot_rs_test::assert_queries::assert_num_queries;
//! use polyglot_rs_test::test_database::TestDatabase;
//!
//! let db = TestDatabase::new();
//! db.execute_raw("CREATE TABLE t (id INTEGER PRIMARY KEY)").unwrap();
//! assert_num_queries(&db, 1, || {
//!     db.query("SELECT id FROM t", &[]).unwrap();
//! });
//! ```

use crate::test_database::TestDatabase;

/// Asserts that exactly `expected_count` statements run during `f`.
///
/// # Panics
///
/// Panics if the number of statements does not match `expected_count`.
pub fn assert_num_queries<T>(db: &TestDatabase, expected_count: usize, f: impl FnOnce() -> T) -> T {
    db.reset_query_count();
    let value = f();
    let actual = db.query_count();
    assert_eq!(
        actual, expected_count,
        "Expected {expected_count} SQL queries, but {actual} were executed"
    );
    value
}

/// Asserts that at most `max_count` statements run during `f`.
///
/// # Panics
///
/// Panics if more than `max_count` statements run.
pub fn assert_max_queries<T>(db: &TestDatabase, max_count: usize, f: impl FnOnce() -> T) -> T {
    db.reset_query_count();
    let value = f();
    let actual = db.query_count();
    assert!(
        actual <= max_count,
        "Expected at most {max_count} SQL queries, but {actual} were executed"
    );
    value
}
