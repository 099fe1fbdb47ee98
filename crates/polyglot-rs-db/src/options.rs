//! Site options: small named values persisted per site.

use std::sync::Arc;

use polyglot_rs_core::PolyglotResult;

use crate::executor::DbExecutor;
use crate::schema::Tables;
use crate::value::Value;

/// Read and write access to one site's options table.
#[derive(Clone)]
pub struct OptionsStore {
    db: Arc<dyn DbExecutor>,
    tables: Tables,
}

impl std::fmt::Debug for OptionsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionsStore")
            .field("site_id", &self.tables.site_id)
            .finish_non_exhaustive()
    }
}

impl OptionsStore {
    pub fn new(db: Arc<dyn DbExecutor>, tables: Tables) -> Self {
        Self { db, tables }
    }

    pub fn get_option(&self, name: &str) -> PolyglotResult<Option<String>> {
        self.db
            .query_opt(
                &format!(
                    "SELECT option_value FROM {} WHERE option_name = ?",
                    self.tables.options
                ),
                &[Value::from(name)],
            )?
            .map(|row| row.get("option_value"))
            .transpose()
    }

    pub fn update_option(&self, name: &str, value: &str) -> PolyglotResult<()> {
        self.db.execute_sql(
            &format!(
                "INSERT INTO {} (option_name, option_value) VALUES (?, ?) \
                 ON CONFLICT (option_name) DO UPDATE SET option_value = excluded.option_value",
                self.tables.options
            ),
            &[Value::from(name), Value::from(value)],
        )?;
        Ok(())
    }

    pub fn delete_option(&self, name: &str) -> PolyglotResult<bool> {
        Ok(self.db.execute_sql(
            &format!("DELETE FROM {} WHERE option_name = ?", self.tables.options),
            &[Value::from(name)],
        )? > 0)
    }
}
