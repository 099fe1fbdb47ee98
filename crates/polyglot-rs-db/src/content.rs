//! The content-object store: posts and their metadata.

use std::sync::Arc;

use polyglot_rs_core::{LastChanged, PolyglotError, PolyglotResult};

use crate::executor::{atomic, DbExecutor};
use crate::row::Row;
use crate::schema::Tables;
use crate::value::Value;

/// The last-changed group bumped by every post write.
pub const POSTS_GROUP: &str = "posts";

/// A content object.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct Post {
    pub id: i64,
    pub post_type: String,
    pub post_title: String,
    pub post_name: String,
    pub post_status: String,
    pub post_parent: i64,
    pub post_mime_type: String,
    /// Location of the underlying file for attachments.
    pub guid: String,
    pub menu_order: i64,
}

impl Post {
    /// Starts a post of `post_type` titled `title`, published, top-level.
    pub fn new(post_type: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            post_type: post_type.into(),
            post_title: title.into(),
            post_status: "publish".to_string(),
            ..Self::default()
        }
    }

    fn from_row(row: &Row) -> PolyglotResult<Self> {
        Ok(Self {
            id: row.get("ID")?,
            post_type: row.get("post_type")?,
            post_title: row.get("post_title")?,
            post_name: row.get("post_name")?,
            post_status: row.get("post_status")?,
            post_parent: row.get("post_parent")?,
            post_mime_type: row.get("post_mime_type")?,
            guid: row.get("guid")?,
            menu_order: row.get("menu_order")?,
        })
    }

    fn params(&self) -> Vec<Value> {
        vec![
            Value::from(self.post_type.as_str()),
            Value::from(self.post_title.as_str()),
            Value::from(self.post_name.as_str()),
            Value::from(self.post_status.as_str()),
            Value::Int(self.post_parent),
            Value::from(self.post_mime_type.as_str()),
            Value::from(self.guid.as_str()),
            Value::Int(self.menu_order),
        ]
    }
}

/// Read and write access to one site's content objects.
#[derive(Clone)]
pub struct ContentStore {
    db: Arc<dyn DbExecutor>,
    tables: Tables,
    last_changed: LastChanged,
}

impl std::fmt::Debug for ContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentStore")
            .field("site_id", &self.tables.site_id)
            .finish_non_exhaustive()
    }
}

const COLUMNS: &str =
    "post_type, post_title, post_name, post_status, post_parent, post_mime_type, guid, menu_order";

impl ContentStore {
    pub fn new(db: Arc<dyn DbExecutor>, tables: Tables, last_changed: LastChanged) -> Self {
        Self {
            db,
            tables,
            last_changed,
        }
    }

    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    fn touch(&self) {
        self.last_changed.bump(self.tables.site_id, POSTS_GROUP);
    }

    /// Inserts a post (its `id` is ignored) and returns the new id.
    pub fn insert_post(&self, post: &Post) -> PolyglotResult<i64> {
        let id = self.db.insert_returning_id(
            &format!(
                "INSERT INTO {} ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                self.tables.posts
            ),
            &post.params(),
        )?;
        self.touch();
        tracing::debug!(post_id = id, post_type = %post.post_type, "post inserted");
        Ok(id)
    }

    pub fn get_post(&self, id: i64) -> PolyglotResult<Option<Post>> {
        if id <= 0 {
            return Ok(None);
        }
        self.db
            .query_opt(
                &format!("SELECT ID, {COLUMNS} FROM {} WHERE ID = ?", self.tables.posts),
                &[Value::Int(id)],
            )?
            .as_ref()
            .map(Post::from_row)
            .transpose()
    }

    /// Writes every field of `post` back under `post.id`.
    pub fn update_post(&self, post: &Post) -> PolyglotResult<()> {
        let mut params = post.params();
        params.push(Value::Int(post.id));
        let updated = self.db.execute_sql(
            &format!(
                "UPDATE {} SET post_type = ?, post_title = ?, post_name = ?, post_status = ?, \
                 post_parent = ?, post_mime_type = ?, guid = ?, menu_order = ? WHERE ID = ?",
                self.tables.posts
            ),
            &params,
        )?;
        if updated == 0 {
            return Err(PolyglotError::DoesNotExist(format!("post {}", post.id)));
        }
        self.touch();
        Ok(())
    }

    /// Deletes a post and its metadata. Returns `false` if it did not exist.
    ///
    /// Classification links are left to the caller, which knows which
    /// taxonomies (and translation groups) need cleaning up.
    pub fn delete_post(&self, id: i64) -> PolyglotResult<bool> {
        let deleted = atomic(self.db.as_ref(), || {
            self.db.execute_sql(
                &format!("DELETE FROM {} WHERE post_id = ?", self.tables.postmeta),
                &[Value::Int(id)],
            )?;
            self.db.execute_sql(
                &format!("DELETE FROM {} WHERE ID = ?", self.tables.posts),
                &[Value::Int(id)],
            )
        })?;
        if deleted > 0 {
            self.touch();
        }
        Ok(deleted > 0)
    }

    /// Returns the posts whose type is one of `post_types`, by id.
    pub fn get_posts_of_types(&self, post_types: &[String]) -> PolyglotResult<Vec<Post>> {
        if post_types.is_empty() {
            return Ok(Vec::new());
        }
        let params: Vec<Value> = post_types.iter().map(Value::from).collect();
        self.db
            .query(
                &format!(
                    "SELECT ID, {COLUMNS} FROM {} WHERE post_type IN ({}) ORDER BY ID",
                    self.tables.posts,
                    crate::value::placeholders(post_types.len())
                ),
                &params,
            )?
            .iter()
            .map(Post::from_row)
            .collect()
    }

    // ── Metadata ───────────────────────────────────────────────────────

    /// Returns every `(key, value)` pair of a post in insertion order.
    pub fn get_all_post_meta(&self, post_id: i64) -> PolyglotResult<Vec<(String, String)>> {
        self.db
            .query(
                &format!(
                    "SELECT meta_key, meta_value FROM {} WHERE post_id = ? ORDER BY meta_id",
                    self.tables.postmeta
                ),
                &[Value::Int(post_id)],
            )?
            .iter()
            .map(|row| Ok((row.get("meta_key")?, row.get("meta_value")?)))
            .collect()
    }

    /// Returns the first value stored under `key`.
    pub fn get_post_meta(&self, post_id: i64, key: &str) -> PolyglotResult<Option<String>> {
        Ok(self
            .get_all_post_meta(post_id)?
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v))
    }

    /// Adds a value under `key`, keeping existing values.
    pub fn add_post_meta(&self, post_id: i64, key: &str, value: &str) -> PolyglotResult<()> {
        self.db.execute_sql(
            &format!(
                "INSERT INTO {} (post_id, meta_key, meta_value) VALUES (?, ?, ?)",
                self.tables.postmeta
            ),
            &[Value::Int(post_id), Value::from(key), Value::from(value)],
        )?;
        Ok(())
    }

    /// Replaces all values under `key` with `value`.
    pub fn update_post_meta(&self, post_id: i64, key: &str, value: &str) -> PolyglotResult<()> {
        atomic(self.db.as_ref(), || {
            self.delete_post_meta(post_id, key)?;
            self.add_post_meta(post_id, key, value)
        })
    }

    /// Removes all values under `key`.
    pub fn delete_post_meta(&self, post_id: i64, key: &str) -> PolyglotResult<()> {
        self.db.execute_sql(
            &format!(
                "DELETE FROM {} WHERE post_id = ? AND meta_key = ?",
                self.tables.postmeta
            ),
            &[Value::Int(post_id), Value::from(key)],
        )?;
        Ok(())
    }
}
