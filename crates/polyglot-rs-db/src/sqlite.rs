//! SQLite database backend using `rusqlite`.
//!
//! Features:
//! - WAL mode enabled for file-based databases
//! - In-memory database support via `:memory:` path (great for testing)
//! - Simple `Mutex`-based concurrency control: one connection, one statement at a time

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use polyglot_rs_core::{PolyglotError, PolyglotResult};
use rusqlite::types::ValueRef;

use crate::executor::DbExecutor;
use crate::row::Row;
use crate::value::Value;

/// A SQLite database backend.
pub struct SqliteBackend {
    /// The path to the database file (or ":memory:").
    path: PathBuf,
    /// The connection, guarded by a mutex.
    conn: Mutex<rusqlite::Connection>,
}

impl std::fmt::Debug for SqliteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBackend")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteBackend {
    /// Opens a new SQLite database at the given path.
    ///
    /// If the path is `:memory:`, an in-memory database is created.
    pub fn open(path: impl Into<PathBuf>) -> PolyglotResult<Self> {
        let path = path.into();
        let in_memory = path.to_str() == Some(":memory:");
        let conn = if in_memory {
            rusqlite::Connection::open_in_memory()
        } else {
            rusqlite::Connection::open(&path)
        }
        .map_err(|e| PolyglotError::OperationalError(format!("SQLite open failed: {e}")))?;

        let pragmas = if in_memory {
            "PRAGMA foreign_keys=ON;"
        } else {
            "PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;"
        };
        conn.execute_batch(pragmas).map_err(|e| {
            PolyglotError::OperationalError(format!("Failed to set pragmas: {e}"))
        })?;

        tracing::debug!(path = %path.display(), "opened sqlite database");
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Opens an in-memory database (convenience constructor).
    pub fn memory() -> PolyglotResult<Self> {
        Self::open(":memory:")
    }

    /// Returns the database file path.
    pub const fn path(&self) -> &PathBuf {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, rusqlite::Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Binds engine `Value` types to a `rusqlite` statement.
    fn bind_params(stmt: &mut rusqlite::Statement<'_>, params: &[Value]) -> PolyglotResult<()> {
        for (i, param) in params.iter().enumerate() {
            let idx = i + 1;
            match param {
                Value::Null => stmt.raw_bind_parameter(idx, rusqlite::types::Null),
                Value::Bool(b) => stmt.raw_bind_parameter(idx, b),
                Value::Int(v) => stmt.raw_bind_parameter(idx, v),
                Value::Float(v) => stmt.raw_bind_parameter(idx, v),
                Value::String(s) => stmt.raw_bind_parameter(idx, s.as_str()),
                Value::Bytes(b) => stmt.raw_bind_parameter(idx, b.as_slice()),
                Value::Json(j) => stmt.raw_bind_parameter(idx, j.to_string().as_str()),
            }
            .map_err(|e| PolyglotError::DatabaseError(format!("Bind error: {e}")))?;
        }
        Ok(())
    }

    /// Converts a `rusqlite::Row` to our generic `Row`.
    fn convert_row(sqlite_row: &rusqlite::Row<'_>, column_names: &[String]) -> Row {
        let values: Vec<Value> = (0..column_names.len())
            .map(|i| match sqlite_row.get_ref(i).unwrap_or(ValueRef::Null) {
                ValueRef::Null => Value::Null,
                ValueRef::Integer(v) => Value::Int(v),
                ValueRef::Real(v) => Value::Float(v),
                ValueRef::Text(b) => Value::String(String::from_utf8_lossy(b).to_string()),
                ValueRef::Blob(b) => Value::Bytes(b.to_vec()),
            })
            .collect();
        Row::new(column_names.to_vec(), values)
    }

    fn map_error(err: &rusqlite::Error) -> PolyglotError {
        match err {
            rusqlite::Error::SqliteFailure(code, _)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                PolyglotError::IntegrityError(err.to_string())
            }
            _ => PolyglotError::DatabaseError(err.to_string()),
        }
    }
}

impl DbExecutor for SqliteBackend {
    fn vendor(&self) -> &str {
        "sqlite"
    }

    fn execute_sql(&self, sql: &str, params: &[Value]) -> PolyglotResult<u64> {
        let conn = self.lock();
        let mut stmt = conn.prepare(sql).map_err(|e| Self::map_error(&e))?;
        Self::bind_params(&mut stmt, params)?;
        let count = stmt.raw_execute().map_err(|e| Self::map_error(&e))?;
        Ok(count as u64)
    }

    fn query(&self, sql: &str, params: &[Value]) -> PolyglotResult<Vec<Row>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(sql).map_err(|e| Self::map_error(&e))?;

        let column_names: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();

        Self::bind_params(&mut stmt, params)?;

        let mut raw_rows = stmt.raw_query();
        let mut rows = Vec::new();
        while let Some(row) = raw_rows.next().map_err(|e| Self::map_error(&e))? {
            rows.push(Self::convert_row(row, &column_names));
        }
        Ok(rows)
    }

    fn insert_returning_id(&self, sql: &str, params: &[Value]) -> PolyglotResult<i64> {
        let conn = self.lock();
        let mut stmt = conn.prepare(sql).map_err(|e| Self::map_error(&e))?;
        Self::bind_params(&mut stmt, params)?;
        stmt.raw_execute().map_err(|e| Self::map_error(&e))?;
        Ok(conn.last_insert_rowid())
    }
}
