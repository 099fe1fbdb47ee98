//! The database executor trait and transaction blocks.
//!
//! [`DbExecutor`] is the bridge between the engine and a concrete storage
//! backend. Every call is blocking: the engine runs request-scoped and never
//! suspends, so there is no async runtime underneath.
//!
//! [`atomic`] runs a closure inside a savepoint. Nested calls create nested
//! savepoints, so an inner failure rolls back only the inner block.

use std::sync::atomic::{AtomicU64, Ordering};

use polyglot_rs_core::{PolyglotError, PolyglotResult};

use crate::row::Row;
use crate::value::Value;

/// Counter for generating unique savepoint names.
static SAVEPOINT_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Minimal synchronous database executor.
pub trait DbExecutor: Send + Sync {
    /// Returns the vendor name (e.g. `"sqlite"`).
    fn vendor(&self) -> &str;

    /// Runs a SQL statement that does not return rows.
    /// Returns the number of rows affected.
    fn execute_sql(&self, sql: &str, params: &[Value]) -> PolyglotResult<u64>;

    /// Runs a SQL query and returns all result rows.
    fn query(&self, sql: &str, params: &[Value]) -> PolyglotResult<Vec<Row>>;

    /// Runs a SQL query and returns exactly one row.
    ///
    /// Returns `DoesNotExist` if no rows, `MultipleObjectsReturned` if more than one.
    fn query_one(&self, sql: &str, params: &[Value]) -> PolyglotResult<Row> {
        let mut rows = self.query(sql, params)?;
        match rows.len() {
            0 => Err(PolyglotError::DoesNotExist("No rows returned".to_string())),
            1 => Ok(rows.remove(0)),
            n => Err(PolyglotError::MultipleObjectsReturned(format!(
                "Expected 1 row, got {n}"
            ))),
        }
    }

    /// Runs a SQL query and returns the first row, if any.
    fn query_opt(&self, sql: &str, params: &[Value]) -> PolyglotResult<Option<Row>> {
        Ok(self.query(sql, params)?.into_iter().next())
    }

    /// Executes an INSERT and returns the id of the inserted row.
    fn insert_returning_id(&self, sql: &str, params: &[Value]) -> PolyglotResult<i64>;
}

/// Runs `f` inside a savepoint on `db`.
///
/// The savepoint is released when `f` returns `Ok` and rolled back when it
/// returns `Err`; the error is passed through unchanged.
///
/// # Examples
///
/// ```
/// use polyglot_rs_db::executor::{atomic, DbExecutor};
/// use polyglot_rs_db::sqlite::SqliteBackend;
///
/// let db = SqliteBackend::memory().unwrap();
/// db.execute_sql("CREATE TABLE t (v TEXT)", &[]).unwrap();
/// let outcome: Result<(), _> = atomic(&db, || {
///     db.execute_sql("INSERT INTO t (v) VALUES ('a')", &[])?;
///     Err(polyglot_rs_core::PolyglotError::Conflict("abort".into()))
/// });
/// assert!(outcome.is_err());
/// assert!(db.query("SELECT v FROM t", &[]).unwrap().is_empty());
/// ```
pub fn atomic<T, F>(db: &(impl DbExecutor + ?Sized), f: F) -> PolyglotResult<T>
where
    F: FnOnce() -> PolyglotResult<T>,
{
    let id = SAVEPOINT_COUNTER.fetch_add(1, Ordering::Relaxed);
    let name = format!("pll_sp_{id}");
    db.execute_sql(&format!("SAVEPOINT {name}"), &[])?;

    match f() {
        Ok(value) => {
            db.execute_sql(&format!("RELEASE SAVEPOINT {name}"), &[])?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = db
                .execute_sql(&format!("ROLLBACK TO SAVEPOINT {name}"), &[])
                .and_then(|_| db.execute_sql(&format!("RELEASE SAVEPOINT {name}"), &[]))
            {
                tracing::error!(savepoint = %name, error = %rollback_err, "savepoint rollback failed");
            }
            Err(err)
        }
    }
}
