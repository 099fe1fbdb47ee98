//! Per-site table names and schema installation.
//!
//! Every site of a multi-site installation owns its own copy of the tables,
//! distinguished by prefix: the main site uses the bare prefix (`wp_terms`)
//! and site *n* appends its id (`wp_2_terms`).

use polyglot_rs_core::settings::DatabaseSettings;
use polyglot_rs_core::{PolyglotResult, SiteId};

use crate::executor::{atomic, DbExecutor};

/// The fully qualified table names of one site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tables {
    /// The site these tables belong to.
    pub site_id: SiteId,
    /// The prefix every name starts with.
    pub prefix: String,
    /// Classification entries: name, slug, display order.
    pub terms: String,
    /// Entry-to-dimension binding: taxonomy, description payload, parent, usage count.
    pub term_taxonomy: String,
    /// Object-to-entry links.
    pub term_relationships: String,
    /// Content objects.
    pub posts: String,
    /// Content object metadata.
    pub postmeta: String,
    /// Classification entry metadata.
    pub termmeta: String,
    /// Site options (default language, ...).
    pub options: String,
}

impl Tables {
    /// Builds the table names of `site_id` under `prefix` (`wp_` → `wp_2_`).
    ///
    /// # Examples
    ///
    /// ```
    /// use polyglot_rs_db::schema::Tables;
    ///
    /// assert_eq!(Tables::for_site("wp_", 1).terms, "wp_terms");
    /// assert_eq!(Tables::for_site("wp_", 3).posts, "wp_3_posts");
    /// ```
    pub fn for_site(prefix: &str, site_id: SiteId) -> Self {
        let settings = DatabaseSettings {
            table_prefix: prefix.to_string(),
            ..DatabaseSettings::default()
        };
        Self::from_settings(&settings, site_id)
    }

    /// Builds the table names of `site_id` from database settings.
    pub fn from_settings(settings: &DatabaseSettings, site_id: SiteId) -> Self {
        let prefix = settings.prefix_for_site(site_id);
        Self {
            site_id,
            terms: format!("{prefix}terms"),
            term_taxonomy: format!("{prefix}term_taxonomy"),
            term_relationships: format!("{prefix}term_relationships"),
            posts: format!("{prefix}posts"),
            postmeta: format!("{prefix}postmeta"),
            termmeta: format!("{prefix}termmeta"),
            options: format!("{prefix}options"),
            prefix,
        }
    }

    /// Returns the `CREATE TABLE` / `CREATE INDEX` statements for this site.
    pub fn create_statements(&self) -> Vec<String> {
        vec![
            format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    term_id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL DEFAULT '',
                    slug TEXT NOT NULL DEFAULT '',
                    term_group INTEGER NOT NULL DEFAULT 0
                )",
                self.terms
            ),
            format!(
                "CREATE INDEX IF NOT EXISTS {0}_slug ON {0} (slug)",
                self.terms
            ),
            format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    term_taxonomy_id INTEGER PRIMARY KEY AUTOINCREMENT,
                    term_id INTEGER NOT NULL,
                    taxonomy TEXT NOT NULL,
                    description TEXT NOT NULL DEFAULT '',
                    parent INTEGER NOT NULL DEFAULT 0,
                    count INTEGER NOT NULL DEFAULT 0,
                    UNIQUE (term_id, taxonomy)
                )",
                self.term_taxonomy
            ),
            format!(
                "CREATE INDEX IF NOT EXISTS {0}_taxonomy ON {0} (taxonomy)",
                self.term_taxonomy
            ),
            format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    object_id INTEGER NOT NULL,
                    term_taxonomy_id INTEGER NOT NULL,
                    term_order INTEGER NOT NULL DEFAULT 0,
                    PRIMARY KEY (object_id, term_taxonomy_id)
                )",
                self.term_relationships
            ),
            format!(
                "CREATE INDEX IF NOT EXISTS {0}_tt ON {0} (term_taxonomy_id)",
                self.term_relationships
            ),
            format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    ID INTEGER PRIMARY KEY AUTOINCREMENT,
                    post_title TEXT NOT NULL DEFAULT '',
                    post_name TEXT NOT NULL DEFAULT '',
                    post_type TEXT NOT NULL DEFAULT 'post',
                    post_status TEXT NOT NULL DEFAULT 'publish',
                    post_parent INTEGER NOT NULL DEFAULT 0,
                    post_mime_type TEXT NOT NULL DEFAULT '',
                    guid TEXT NOT NULL DEFAULT '',
                    menu_order INTEGER NOT NULL DEFAULT 0
                )",
                self.posts
            ),
            format!(
                "CREATE INDEX IF NOT EXISTS {0}_type ON {0} (post_type)",
                self.posts
            ),
            format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    meta_id INTEGER PRIMARY KEY AUTOINCREMENT,
                    post_id INTEGER NOT NULL,
                    meta_key TEXT NOT NULL,
                    meta_value TEXT NOT NULL DEFAULT ''
                )",
                self.postmeta
            ),
            format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    meta_id INTEGER PRIMARY KEY AUTOINCREMENT,
                    term_id INTEGER NOT NULL,
                    meta_key TEXT NOT NULL,
                    meta_value TEXT NOT NULL DEFAULT ''
                )",
                self.termmeta
            ),
            format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    option_name TEXT PRIMARY KEY,
                    option_value TEXT NOT NULL DEFAULT ''
                )",
                self.options
            ),
        ]
    }
}

/// Creates the tables of one site if they do not exist yet.
pub fn install(db: &dyn DbExecutor, tables: &Tables) -> PolyglotResult<()> {
    atomic(db, || {
        for sql in tables.create_statements() {
            db.execute_sql(&sql, &[])?;
        }
        Ok(())
    })?;
    tracing::debug!(site_id = tables.site_id, prefix = %tables.prefix, "schema installed");
    Ok(())
}
