//! The classification-entity store.
//!
//! A *taxonomy* is a named classification dimension (`language`,
//! `post_translations`, `category`, ...). A *term* is one entry of a
//! taxonomy; it carries a free-form `description` payload, a parent, and a
//! usage `count`. Objects are linked to terms through `term_relationships`,
//! keyed by the term's `term_taxonomy_id`.
//!
//! Every write bumps the site's `terms` last-changed token so that caches
//! keyed on it go stale.

use std::sync::Arc;

use polyglot_rs_core::utils::text::slugify;
use polyglot_rs_core::{LastChanged, PolyglotError, PolyglotResult};

use crate::executor::{atomic, DbExecutor};
use crate::row::Row;
use crate::schema::Tables;
use crate::value::{placeholders, Value};

/// The last-changed group bumped by every taxonomy write.
pub const TERMS_GROUP: &str = "terms";

/// A term joined with its taxonomy binding.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Term {
    pub term_id: i64,
    pub term_taxonomy_id: i64,
    pub taxonomy: String,
    pub name: String,
    pub slug: String,
    /// Display order.
    pub term_group: i64,
    /// Free-form payload.
    pub description: String,
    /// Parent `term_id`, `0` for top-level terms.
    pub parent: i64,
    /// Number of objects linked to the term.
    pub count: i64,
}

impl Term {
    fn from_row(row: &Row) -> PolyglotResult<Self> {
        Ok(Self {
            term_id: row.get("term_id")?,
            term_taxonomy_id: row.get("term_taxonomy_id")?,
            taxonomy: row.get("taxonomy")?,
            name: row.get("name")?,
            slug: row.get("slug")?,
            term_group: row.get("term_group")?,
            description: row.get("description")?,
            parent: row.get("parent")?,
            count: row.get("count")?,
        })
    }
}

/// Data for a term about to be inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTerm {
    pub name: String,
    /// Derived from the name when empty.
    pub slug: String,
    pub description: String,
    pub parent: i64,
    pub term_group: i64,
}

impl NewTerm {
    /// Starts a term with the given name and everything else defaulted.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub const fn parent(mut self, parent: i64) -> Self {
        self.parent = parent;
        self
    }

    #[must_use]
    pub const fn term_group(mut self, term_group: i64) -> Self {
        self.term_group = term_group;
        self
    }
}

/// A partial update of a term; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub parent: Option<i64>,
    pub term_group: Option<i64>,
}

/// The column a term lookup matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermField {
    Slug,
    Name,
}

impl TermField {
    const fn column(self) -> &'static str {
        match self {
            Self::Slug => "t.slug",
            Self::Name => "t.name",
        }
    }
}

/// How [`TaxonomyStore::set_object_terms`] treats existing links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMode {
    /// Drop links to other terms of the same taxonomy.
    Replace,
    /// Keep existing links.
    Append,
}

/// A term linked to an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectTerm {
    pub object_id: i64,
    pub term: Term,
}

fn in_list(ids: &[i64]) -> (String, Vec<Value>) {
    (placeholders(ids.len()), ids.iter().map(|id| Value::Int(*id)).collect())
}

/// Read and write access to one site's classification entities.
#[derive(Clone)]
pub struct TaxonomyStore {
    db: Arc<dyn DbExecutor>,
    tables: Tables,
    last_changed: LastChanged,
}

impl std::fmt::Debug for TaxonomyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaxonomyStore")
            .field("site_id", &self.tables.site_id)
            .finish_non_exhaustive()
    }
}

impl TaxonomyStore {
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

    pub fn db(&self) -> &Arc<dyn DbExecutor> {
        &self.db
    }

    fn select_terms(&self) -> String {
        format!(
            "SELECT t.term_id, t.name, t.slug, t.term_group, tt.term_taxonomy_id, tt.taxonomy, \
             tt.description, tt.parent, tt.count \
             FROM {} AS t INNER JOIN {} AS tt ON tt.term_id = t.term_id",
            self.tables.terms, self.tables.term_taxonomy
        )
    }

    fn touch(&self) {
        self.last_changed.bump(self.tables.site_id, TERMS_GROUP);
    }

    fn query_terms(&self, sql: &str, params: &[Value]) -> PolyglotResult<Vec<Term>> {
        self.db
            .query(sql, params)?
            .iter()
            .map(Term::from_row)
            .collect()
    }

    fn query_term(&self, sql: &str, params: &[Value]) -> PolyglotResult<Option<Term>> {
        self.db
            .query_opt(sql, params)?
            .as_ref()
            .map(Term::from_row)
            .transpose()
    }

    // ── Terms ──────────────────────────────────────────────────────────

    /// Inserts a term into `taxonomy`.
    ///
    /// Fails with [`PolyglotError::Conflict`] when the slug is already used
    /// in the taxonomy; use [`unique_slug`](Self::unique_slug) first to
    /// avoid that.
    pub fn insert_term(&self, taxonomy: &str, new: &NewTerm) -> PolyglotResult<Term> {
        let slug = if new.slug.trim().is_empty() {
            slugify(&new.name)
        } else {
            new.slug.trim().to_string()
        };
        if slug.is_empty() {
            return Err(PolyglotError::DatabaseError(
                "A term needs a name or a slug".to_string(),
            ));
        }
        if self.slug_owner(taxonomy, &slug)?.is_some() {
            return Err(PolyglotError::Conflict(format!(
                "A term with the slug '{slug}' already exists in '{taxonomy}'"
            )));
        }

        let tt_id = atomic(self.db.as_ref(), || {
            let term_id = self.db.insert_returning_id(
                &format!(
                    "INSERT INTO {} (name, slug, term_group) VALUES (?, ?, ?)",
                    self.tables.terms
                ),
                &[
                    Value::from(new.name.trim()),
                    Value::from(slug.as_str()),
                    Value::Int(new.term_group),
                ],
            )?;
            self.db.insert_returning_id(
                &format!(
                    "INSERT INTO {} (term_id, taxonomy, description, parent) VALUES (?, ?, ?, ?)",
                    self.tables.term_taxonomy
                ),
                &[
                    Value::Int(term_id),
                    Value::from(taxonomy),
                    Value::from(new.description.as_str()),
                    Value::Int(new.parent.max(0)),
                ],
            )
        })?;
        self.touch();
        tracing::debug!(taxonomy, slug = %slug, term_taxonomy_id = tt_id, "term inserted");

        self.get_term_by_tt_id(tt_id)?
            .ok_or_else(|| PolyglotError::DoesNotExist(format!("term_taxonomy_id {tt_id}")))
    }

    /// Applies a partial update to a term and returns the updated term.
    pub fn update_term(&self, term_id: i64, update: &TermUpdate) -> PolyglotResult<Term> {
        let current = self
            .get_term(term_id)?
            .ok_or_else(|| PolyglotError::DoesNotExist(format!("term {term_id}")))?;

        if let Some(slug) = &update.slug {
            if let Some(owner) = self.slug_owner(&current.taxonomy, slug)? {
                if owner != term_id {
                    return Err(PolyglotError::Conflict(format!(
                        "A term with the slug '{slug}' already exists in '{}'",
                        current.taxonomy
                    )));
                }
            }
        }

        atomic(self.db.as_ref(), || {
            self.db.execute_sql(
                &format!(
                    "UPDATE {} SET name = ?, slug = ?, term_group = ? WHERE term_id = ?",
                    self.tables.terms
                ),
                &[
                    Value::from(update.name.as_deref().unwrap_or(&current.name)),
                    Value::from(update.slug.as_deref().unwrap_or(&current.slug)),
                    Value::Int(update.term_group.unwrap_or(current.term_group)),
                    Value::Int(term_id),
                ],
            )?;
            self.db.execute_sql(
                &format!(
                    "UPDATE {} SET description = ?, parent = ? WHERE term_taxonomy_id = ?",
                    self.tables.term_taxonomy
                ),
                &[
                    Value::from(update.description.as_deref().unwrap_or(&current.description)),
                    Value::Int(update.parent.unwrap_or(current.parent)),
                    Value::Int(current.term_taxonomy_id),
                ],
            )?;
            Ok(())
        })?;
        self.touch();

        self.get_term(term_id)?
            .ok_or_else(|| PolyglotError::DoesNotExist(format!("term {term_id}")))
    }

    /// Deletes a term, its links, and its metadata. Returns `false` if the
    /// term did not exist.
    pub fn delete_term(&self, term_id: i64) -> PolyglotResult<bool> {
        let Some(term) = self.get_term(term_id)? else {
            return Ok(false);
        };
        atomic(self.db.as_ref(), || {
            self.db.execute_sql(
                &format!(
                    "DELETE FROM {} WHERE term_taxonomy_id = ?",
                    self.tables.term_relationships
                ),
                &[Value::Int(term.term_taxonomy_id)],
            )?;
            self.db.execute_sql(
                &format!("DELETE FROM {} WHERE term_id = ?", self.tables.term_taxonomy),
                &[Value::Int(term_id)],
            )?;
            self.db.execute_sql(
                &format!("DELETE FROM {} WHERE term_id = ?", self.tables.termmeta),
                &[Value::Int(term_id)],
            )?;
            self.db.execute_sql(
                &format!("DELETE FROM {} WHERE term_id = ?", self.tables.terms),
                &[Value::Int(term_id)],
            )?;
            Ok(())
        })?;
        self.touch();
        tracing::debug!(term_id, taxonomy = %term.taxonomy, "term deleted");
        Ok(true)
    }

    pub fn get_term(&self, term_id: i64) -> PolyglotResult<Option<Term>> {
        if term_id <= 0 {
            return Ok(None);
        }
        self.query_term(
            &format!("{} WHERE t.term_id = ?", self.select_terms()),
            &[Value::Int(term_id)],
        )
    }

    pub fn get_term_by_tt_id(&self, term_taxonomy_id: i64) -> PolyglotResult<Option<Term>> {
        if term_taxonomy_id <= 0 {
            return Ok(None);
        }
        self.query_term(
            &format!("{} WHERE tt.term_taxonomy_id = ?", self.select_terms()),
            &[Value::Int(term_taxonomy_id)],
        )
    }

    /// Looks a term up by slug or name within a taxonomy.
    pub fn get_term_by(
        &self,
        taxonomy: &str,
        field: TermField,
        value: &str,
    ) -> PolyglotResult<Option<Term>> {
        self.query_term(
            &format!(
                "{} WHERE tt.taxonomy = ? AND {} = ? ORDER BY t.term_id LIMIT 1",
                self.select_terms(),
                field.column()
            ),
            &[Value::from(taxonomy), Value::from(value)],
        )
    }

    /// Lists the terms of a taxonomy by display order, then id.
    pub fn get_terms(&self, taxonomy: &str) -> PolyglotResult<Vec<Term>> {
        self.query_terms(
            &format!(
                "{} WHERE tt.taxonomy = ? ORDER BY t.term_group, t.term_id",
                self.select_terms()
            ),
            &[Value::from(taxonomy)],
        )
    }

    /// Returns the id of the term using `slug` in `taxonomy`, if any.
    fn slug_owner(&self, taxonomy: &str, slug: &str) -> PolyglotResult<Option<i64>> {
        Ok(self
            .get_term_by(taxonomy, TermField::Slug, slug)?
            .map(|t| t.term_id))
    }

    /// Returns `slug` if it is free in `taxonomy`, otherwise the first free
    /// `slug-2`, `slug-3`, ...
    ///
    /// The term `exclude` (the one being edited) does not count as a
    /// collision.
    pub fn unique_slug(
        &self,
        taxonomy: &str,
        slug: &str,
        exclude: Option<i64>,
    ) -> PolyglotResult<String> {
        let is_free = |candidate: &str| -> PolyglotResult<bool> {
            Ok(match self.slug_owner(taxonomy, candidate)? {
                None => true,
                Some(owner) => Some(owner) == exclude,
            })
        };
        if is_free(slug)? {
            return Ok(slug.to_string());
        }
        let mut n = 2;
        loop {
            let candidate = format!("{slug}-{n}");
            if is_free(&candidate)? {
                return Ok(candidate);
            }
            n += 1;
        }
    }

    // ── Relationships ──────────────────────────────────────────────────

    /// Returns the terms of `taxonomies` linked to each of `object_ids`.
    pub fn get_object_terms(
        &self,
        object_ids: &[i64],
        taxonomies: &[&str],
    ) -> PolyglotResult<Vec<ObjectTerm>> {
        if object_ids.is_empty() || taxonomies.is_empty() {
            return Ok(Vec::new());
        }
        let (ids_sql, mut params) = in_list(object_ids);
        params.extend(taxonomies.iter().map(|t| Value::from(*t)));
        let sql = format!(
            "SELECT tr.object_id, t.term_id, t.name, t.slug, t.term_group, tt.term_taxonomy_id, \
             tt.taxonomy, tt.description, tt.parent, tt.count \
             FROM {} AS t \
             INNER JOIN {} AS tt ON tt.term_id = t.term_id \
             INNER JOIN {} AS tr ON tr.term_taxonomy_id = tt.term_taxonomy_id \
             WHERE tr.object_id IN ({ids_sql}) AND tt.taxonomy IN ({}) \
             ORDER BY tr.object_id, tt.term_taxonomy_id",
            self.tables.terms,
            self.tables.term_taxonomy,
            self.tables.term_relationships,
            placeholders(taxonomies.len()),
        );
        self.db
            .query(&sql, &params)?
            .iter()
            .map(|row| {
                Ok(ObjectTerm {
                    object_id: row.get("object_id")?,
                    term: Term::from_row(row)?,
                })
            })
            .collect()
    }

    /// Returns the first term of `taxonomy` linked to `object_id`.
    pub fn get_object_term(&self, object_id: i64, taxonomy: &str) -> PolyglotResult<Option<Term>> {
        Ok(self
            .get_object_terms(&[object_id], &[taxonomy])?
            .into_iter()
            .next()
            .map(|ot| ot.term))
    }

    /// Links `object_id` to the given terms of `taxonomy`.
    ///
    /// Ids that do not belong to `taxonomy` are ignored. With
    /// [`LinkMode::Replace`], links to any other term of the taxonomy are
    /// removed, so an empty `term_taxonomy_ids` unlinks the object entirely.
    pub fn set_object_terms(
        &self,
        object_id: i64,
        taxonomy: &str,
        term_taxonomy_ids: &[i64],
        mode: LinkMode,
    ) -> PolyglotResult<()> {
        let wanted = self.filter_taxonomy(taxonomy, term_taxonomy_ids)?;
        let existing: Vec<i64> = self
            .get_object_terms(&[object_id], &[taxonomy])?
            .into_iter()
            .map(|ot| ot.term.term_taxonomy_id)
            .collect();

        let removed: Vec<i64> = match mode {
            LinkMode::Replace => existing
                .iter()
                .copied()
                .filter(|id| !wanted.contains(id))
                .collect(),
            LinkMode::Append => Vec::new(),
        };
        let added: Vec<i64> = wanted
            .iter()
            .copied()
            .filter(|id| !existing.contains(id))
            .collect();
        if removed.is_empty() && added.is_empty() {
            return Ok(());
        }

        atomic(self.db.as_ref(), || {
            self.unlink(object_id, &removed)?;
            for tt_id in &added {
                self.db.execute_sql(
                    &format!(
                        "INSERT OR IGNORE INTO {} (object_id, term_taxonomy_id) VALUES (?, ?)",
                        self.tables.term_relationships
                    ),
                    &[Value::Int(object_id), Value::Int(*tt_id)],
                )?;
            }
            let touched: Vec<i64> = removed.iter().chain(added.iter()).copied().collect();
            self.update_term_count(&touched)
        })?;
        self.touch();
        Ok(())
    }

    /// Unlinks `object_id` from the given terms of `taxonomy`.
    pub fn remove_object_terms(
        &self,
        object_id: i64,
        taxonomy: &str,
        term_taxonomy_ids: &[i64],
    ) -> PolyglotResult<()> {
        let ids = self.filter_taxonomy(taxonomy, term_taxonomy_ids)?;
        if ids.is_empty() {
            return Ok(());
        }
        atomic(self.db.as_ref(), || {
            self.unlink(object_id, &ids)?;
            self.update_term_count(&ids)
        })?;
        self.touch();
        Ok(())
    }

    /// Unlinks `object_id` from every term of the given taxonomies.
    pub fn delete_object_term_relationships(
        &self,
        object_id: i64,
        taxonomies: &[&str],
    ) -> PolyglotResult<()> {
        let ids: Vec<i64> = self
            .get_object_terms(&[object_id], taxonomies)?
            .into_iter()
            .map(|ot| ot.term.term_taxonomy_id)
            .collect();
        if ids.is_empty() {
            return Ok(());
        }
        atomic(self.db.as_ref(), || {
            self.unlink(object_id, &ids)?;
            self.update_term_count(&ids)
        })?;
        self.touch();
        Ok(())
    }

    /// Links many objects to one term in a single pass and recounts it.
    ///
    /// Returns the number of links created.
    pub fn add_objects_to_term(&self, object_ids: &[i64], term_taxonomy_id: i64) -> PolyglotResult<u64> {
        if object_ids.is_empty() {
            return Ok(0);
        }
        let added = atomic(self.db.as_ref(), || {
            let mut added = 0;
            for chunk in object_ids.chunks(500) {
                let values = vec!["(?, ?)"; chunk.len()].join(", ");
                let params: Vec<Value> = chunk
                    .iter()
                    .flat_map(|id| [Value::Int(*id), Value::Int(term_taxonomy_id)])
                    .collect();
                added += self.db.execute_sql(
                    &format!(
                        "INSERT OR IGNORE INTO {} (object_id, term_taxonomy_id) VALUES {values}",
                        self.tables.term_relationships
                    ),
                    &params,
                )?;
            }
            self.update_term_count(&[term_taxonomy_id])?;
            Ok(added)
        })?;
        self.touch();
        Ok(added)
    }

    /// Removes every link to a term. Returns the number of links removed.
    pub fn remove_term_relationships(&self, term_taxonomy_id: i64) -> PolyglotResult<u64> {
        let removed = atomic(self.db.as_ref(), || {
            let removed = self.db.execute_sql(
                &format!(
                    "DELETE FROM {} WHERE term_taxonomy_id = ?",
                    self.tables.term_relationships
                ),
                &[Value::Int(term_taxonomy_id)],
            )?;
            self.update_term_count(&[term_taxonomy_id])?;
            Ok(removed)
        })?;
        self.touch();
        Ok(removed)
    }

    /// Recomputes the usage count of the given terms from their links.
    pub fn update_term_count(&self, term_taxonomy_ids: &[i64]) -> PolyglotResult<()> {
        if term_taxonomy_ids.is_empty() {
            return Ok(());
        }
        let (ids_sql, params) = in_list(term_taxonomy_ids);
        self.db.execute_sql(
            &format!(
                "UPDATE {tt} SET count = (SELECT COUNT(*) FROM {tr} AS tr \
                 WHERE tr.term_taxonomy_id = {tt}.term_taxonomy_id) \
                 WHERE term_taxonomy_id IN ({ids_sql})",
                tt = self.tables.term_taxonomy,
                tr = self.tables.term_relationships,
            ),
            &params,
        )?;
        Ok(())
    }

    /// Returns the ids of the objects linked to any of the given terms.
    pub fn get_objects_in_term(&self, term_taxonomy_ids: &[i64]) -> PolyglotResult<Vec<i64>> {
        if term_taxonomy_ids.is_empty() {
            return Ok(Vec::new());
        }
        let (ids_sql, params) = in_list(term_taxonomy_ids);
        self.db
            .query(
                &format!(
                    "SELECT DISTINCT object_id FROM {} WHERE term_taxonomy_id IN ({ids_sql}) \
                     ORDER BY object_id",
                    self.tables.term_relationships
                ),
                &params,
            )?
            .iter()
            .map(|row| row.get("object_id"))
            .collect()
    }

    fn unlink(&self, object_id: i64, term_taxonomy_ids: &[i64]) -> PolyglotResult<()> {
        if term_taxonomy_ids.is_empty() {
            return Ok(());
        }
        let (ids_sql, mut params) = in_list(term_taxonomy_ids);
        params.insert(0, Value::Int(object_id));
        self.db.execute_sql(
            &format!(
                "DELETE FROM {} WHERE object_id = ? AND term_taxonomy_id IN ({ids_sql})",
                self.tables.term_relationships
            ),
            &params,
        )?;
        Ok(())
    }

    /// Keeps only the ids that are terms of `taxonomy`, in input order.
    fn filter_taxonomy(&self, taxonomy: &str, term_taxonomy_ids: &[i64]) -> PolyglotResult<Vec<i64>> {
        if term_taxonomy_ids.is_empty() {
            return Ok(Vec::new());
        }
        let (ids_sql, mut params) = in_list(term_taxonomy_ids);
        params.push(Value::from(taxonomy));
        let known: Vec<i64> = self
            .db
            .query(
                &format!(
                    "SELECT term_taxonomy_id FROM {} WHERE term_taxonomy_id IN ({ids_sql}) AND taxonomy = ?",
                    self.tables.term_taxonomy
                ),
                &params,
            )?
            .iter()
            .map(|row| row.get("term_taxonomy_id"))
            .collect::<PolyglotResult<_>>()?;
        let mut out = Vec::new();
        for id in term_taxonomy_ids {
            if known.contains(id) && !out.contains(id) {
                out.push(*id);
            }
        }
        Ok(out)
    }

    // ── Metadata ───────────────────────────────────────────────────────

    pub fn get_term_meta(&self, term_id: i64, key: &str) -> PolyglotResult<Option<String>> {
        Ok(self
            .db
            .query_opt(
                &format!(
                    "SELECT meta_value FROM {} WHERE term_id = ? AND meta_key = ? ORDER BY meta_id LIMIT 1",
                    self.tables.termmeta
                ),
                &[Value::Int(term_id), Value::from(key)],
            )?
            .map(|row| row.get("meta_value"))
            .transpose()?)
    }

    /// Sets a metadata value, replacing any previous value under `key`.
    pub fn update_term_meta(&self, term_id: i64, key: &str, value: &str) -> PolyglotResult<()> {
        atomic(self.db.as_ref(), || {
            self.db.execute_sql(
                &format!(
                    "DELETE FROM {} WHERE term_id = ? AND meta_key = ?",
                    self.tables.termmeta
                ),
                &[Value::Int(term_id), Value::from(key)],
            )?;
            self.db.execute_sql(
                &format!(
                    "INSERT INTO {} (term_id, meta_key, meta_value) VALUES (?, ?, ?)",
                    self.tables.termmeta
                ),
                &[Value::Int(term_id), Value::from(key), Value::from(value)],
            )?;
            Ok(())
        })
    }
}
