//! The term kind: categories, tags, and other translated taxonomies.
//!
//! Terms are created through [`TranslatedTerm::insert_term`] rather than the
//! raw store so the language, the parent, and the slug can be settled in one
//! place. Callers override the first two through [`TranslatedTerm::language_filter`]
//! and [`TranslatedTerm::parent_filter`].

use std::collections::HashSet;
use std::sync::Arc;

use polyglot_rs_core::hooks::Filter;
use polyglot_rs_core::utils::text::slugify;
use polyglot_rs_core::{PolyglotError, PolyglotResult};
use polyglot_rs_db::value::placeholders;
use polyglot_rs_db::{atomic, NewTerm, Term, TermField, Value};
use polyglot_rs_languages::{Language, LanguageKey};

use crate::context::ObjectContext;
use crate::kind::KindDescriptor;
use crate::translatable::Translatable;
use crate::translated::Translated;

/// What the insert filters are told about the term being created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermInsertContext {
    pub taxonomy: String,
    pub name: String,
    /// The term the new one translates, if any.
    pub translation_of: Option<i64>,
}

/// Terms of the translated taxonomies.
pub struct TranslatedTerm {
    ctx: Arc<ObjectContext>,
    descriptor: KindDescriptor,
    taxonomies: Vec<String>,
    /// Overrides the language of a term being inserted.
    pub language_filter: Filter<Option<LanguageKey>, TermInsertContext>,
    /// Overrides the parent of a term being inserted.
    pub parent_filter: Filter<i64, TermInsertContext>,
}

impl std::fmt::Debug for TranslatedTerm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslatedTerm")
            .field("taxonomies", &self.taxonomies)
            .finish_non_exhaustive()
    }
}

impl TranslatedTerm {
    pub fn new(ctx: Arc<ObjectContext>, taxonomies: Vec<String>) -> Self {
        Self {
            ctx,
            descriptor: KindDescriptor::term(),
            taxonomies,
            language_filter: Filter::new(),
            parent_filter: Filter::new(),
        }
    }

    /// Returns a slug for a term of `taxonomy` in `lang`.
    ///
    /// `slug` is kept when it is free or already belongs to `term_id` (an
    /// edit or a language change of the same term). A new term colliding
    /// with a term in another language gets the language slug appended
    /// (`news` → `news-fr`). Any remaining collision is resolved with a
    /// numeric suffix.
    pub fn unique_slug(
        &self,
        slug: &str,
        lang: Option<&Language>,
        taxonomy: &str,
        term_id: Option<i64>,
    ) -> PolyglotResult<String> {
        let store = &self.ctx.taxonomy;
        let Some(owner) = store.get_term_by(taxonomy, TermField::Slug, slug)? else {
            return Ok(slug.to_string());
        };
        if Some(owner.term_id) == term_id {
            return Ok(slug.to_string());
        }

        if let (Some(lang), None) = (lang, term_id) {
            let owner_lang = self.get_language(owner.term_id)?;
            if owner_lang.is_some_and(|l| l.slug != lang.slug) {
                let suffixed = format!("{slug}-{}", lang.slug);
                return store.unique_slug(taxonomy, &suffixed, term_id);
            }
        }
        store.unique_slug(taxonomy, slug, term_id)
    }

    /// Inserts a term in `lang`, optionally as the translation of
    /// `translation_of`.
    ///
    /// The language and parent go through the insert filters first. A
    /// parent in another language is replaced by its translation in the
    /// term's language, or dropped if it has none. Terms of taxonomies that
    /// are not translated are inserted as is.
    pub fn insert_term(
        &self,
        taxonomy: &str,
        new: &NewTerm,
        lang: Option<LanguageKey>,
        translation_of: Option<i64>,
    ) -> PolyglotResult<Term> {
        let store = &self.ctx.taxonomy;
        if !self.taxonomies.iter().any(|t| t == taxonomy) {
            return store.insert_term(taxonomy, new);
        }

        let insert = TermInsertContext {
            taxonomy: taxonomy.to_string(),
            name: new.name.clone(),
            translation_of,
        };
        let lang = match self.language_filter.apply(lang, &insert) {
            Some(key) => self.ctx.languages.get(key)?,
            None => None,
        };
        let mut parent = self.parent_filter.apply(new.parent, &insert);
        if let (Some(lang), true) = (&lang, parent > 0) {
            parent = self.get(parent, &LanguageKey::from(lang))?;
            if parent == 0 {
                tracing::debug!(taxonomy, name = %new.name, lang = %lang.slug, "parent has no translation, dropped");
            }
        }

        let base = if new.slug.is_empty() {
            slugify(&new.name)
        } else {
            new.slug.clone()
        };
        let slug = self.unique_slug(&base, lang.as_deref(), taxonomy, None)?;
        let term = atomic(self.ctx.db().as_ref(), || {
            let term = store.insert_term(
                taxonomy,
                &NewTerm {
                    slug: slug.clone(),
                    parent,
                    ..new.clone()
                },
            )?;
            if let Some(lang) = &lang {
                self.set_language(term.term_id, Some(LanguageKey::from(lang)))?;
                if let Some(source) = translation_of {
                    let mut translations = self.get_translations(source)?;
                    translations.insert(lang.slug.clone(), term.term_id);
                    self.save_translations(source, &translations)?;
                }
            }
            Ok(term)
        })?;
        tracing::debug!(taxonomy, term_id = term.term_id, slug = %term.slug, "term inserted");
        Ok(term)
    }

    /// Returns the translation of a term in `lang`, creating it (and the
    /// missing translations of its ancestors) if needed.
    ///
    /// Returns `0` when the term does not exist, has no language, or `lang`
    /// does not resolve.
    pub fn create_translation_term(&self, id: i64, lang: &LanguageKey) -> PolyglotResult<i64> {
        let Some(lang) = self.ctx.languages.get(lang.clone())? else {
            return Ok(0);
        };
        self.translate_term(id, &lang, &mut HashSet::new())
    }

    fn translate_term(&self, id: i64, lang: &Arc<Language>, visited: &mut HashSet<i64>) -> PolyglotResult<i64> {
        let existing = self.get(id, &LanguageKey::from(lang))?;
        if existing > 0 {
            return Ok(existing);
        }
        if self.get_language(id)?.is_none() {
            return Ok(0);
        }
        let Some(source) = self.ctx.taxonomy.get_term(id)? else {
            return Ok(0);
        };
        if !visited.insert(id) {
            return Err(PolyglotError::IntegrityError(format!(
                "term {id} is its own ancestor"
            )));
        }

        let parent = if source.parent > 0 {
            self.translate_term(source.parent, lang, visited)?
        } else {
            0
        };
        let term = self.insert_term(
            &source.taxonomy,
            &NewTerm::new(source.name.as_str())
                .slug(source.slug.as_str())
                .description(source.description.as_str())
                .parent(parent)
                .term_group(source.term_group),
            Some(LanguageKey::from(lang)),
            Some(id),
        )?;
        tracing::info!(source = id, term_id = term.term_id, lang = %lang.slug, "term translation created");
        Ok(term.term_id)
    }

    /// Deletes a term together with its language link and group membership.
    pub fn delete_term(&self, id: i64) -> PolyglotResult<bool> {
        self.on_object_deleted(id)?;
        self.ctx.taxonomy.delete_term(id)
    }
}

impl Translatable for TranslatedTerm {
    fn descriptor(&self) -> &KindDescriptor {
        &self.descriptor
    }

    fn context(&self) -> &ObjectContext {
        &self.ctx
    }

    fn subtypes(&self) -> &[String] {
        &self.taxonomies
    }

    fn object_subtype(&self, id: i64) -> PolyglotResult<Option<String>> {
        Ok(self.ctx.taxonomy.get_term(id)?.map(|term| term.taxonomy))
    }

    fn objects_with_no_lang_sql(
        &self,
        subtypes: &[String],
        language_tt_ids: &[i64],
        limit: i64,
    ) -> (String, Vec<Value>) {
        let tables = self.ctx.taxonomy.tables();
        let mut params: Vec<Value> = subtypes.iter().map(Value::from).collect();
        let mut sql = format!(
            "SELECT t.term_id AS id FROM {} AS t INNER JOIN {} AS tt ON tt.term_id = t.term_id \
             WHERE tt.taxonomy IN ({})",
            tables.terms,
            tables.term_taxonomy,
            placeholders(subtypes.len()),
        );
        if !language_tt_ids.is_empty() {
            sql.push_str(&format!(
                " AND t.term_id NOT IN (SELECT tr.object_id FROM {} AS tr WHERE tr.term_taxonomy_id IN ({}))",
                tables.term_relationships,
                placeholders(language_tt_ids.len()),
            ));
            params.extend(language_tt_ids.iter().map(|id| Value::Int(*id)));
        }
        sql.push_str(" ORDER BY t.term_id");
        if limit > 0 {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        (sql, params)
    }

    fn as_translated(&self) -> Option<&dyn Translated> {
        Some(self)
    }
}

impl Translated for TranslatedTerm {}
