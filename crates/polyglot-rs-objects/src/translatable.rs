//! Objects that carry a language.
//!
//! An object of a translatable kind has no language or exactly one. The
//! language is a link from the object to the language's facet for that kind
//! (`language` for posts, `term_language` for terms). Only
//! [`Translatable::set_language`] moves an object between languages;
//! objects without a language are invisible to language-filtered listings.

use std::sync::Arc;

use polyglot_rs_core::cache::unique_key;
use polyglot_rs_core::utils::sanitize::object_id;
use polyglot_rs_core::{PolyglotError, PolyglotResult};
use polyglot_rs_db::{LinkMode, Value, TERMS_GROUP};
use polyglot_rs_languages::{FacetField, Language, LanguageKey};

use crate::context::ObjectContext;
use crate::filter::LanguageFilter;
use crate::kind::KindDescriptor;
use crate::translated::Translated;

/// Alias of the relationships table in [`Translatable::join_clause`].
pub const JOIN_ALIAS: &str = "pll_tr";

/// A kind of object that carries a language.
///
/// Implementors provide the kind-specific storage facts; everything else is
/// provided in terms of them.
pub trait Translatable: Send + Sync {
    fn descriptor(&self) -> &KindDescriptor;

    fn context(&self) -> &ObjectContext;

    /// The subtypes (post types, taxonomies) whose objects carry a language.
    fn subtypes(&self) -> &[String];

    /// The subtype of an object, `None` if it does not exist.
    fn object_subtype(&self, id: i64) -> PolyglotResult<Option<String>>;

    /// SQL selecting, as `id`, the objects of `subtypes` linked to none of
    /// `language_tt_ids`. A `limit` below 1 means no limit.
    fn objects_with_no_lang_sql(
        &self,
        subtypes: &[String],
        language_tt_ids: &[i64],
        limit: i64,
    ) -> (String, Vec<Value>);

    /// The same object, if the kind also maintains translation groups.
    fn as_translated(&self) -> Option<&dyn Translated> {
        None
    }

    // ── Provided ───────────────────────────────────────────────────────

    fn name(&self) -> &'static str {
        self.descriptor().name
    }

    /// The taxonomy linking objects of this kind to their language.
    fn language_taxonomy(&self) -> &'static str {
        self.descriptor().facet.taxonomy()
    }

    /// The id objects of this kind are linked to for `lang`.
    fn language_tt_id(&self, lang: &Language) -> i64 {
        lang.prop(self.descriptor().facet, FacetField::TermTaxonomyId)
    }

    /// Returns the language of an object.
    ///
    /// Invalid ids and objects without a language give `None`.
    fn get_language(&self, id: i64) -> PolyglotResult<Option<Arc<Language>>> {
        let Some(id) = object_id(id) else {
            return Ok(None);
        };
        let ctx = self.context();
        // Every language write goes through `clean_cache`.
        let key = format!("{}:{id}", self.name());
        let term_id = ctx.caches.languages.get_or_insert_with(&key, || {
            Ok::<_, PolyglotError>(
                ctx.taxonomy
                    .get_object_term(id, self.language_taxonomy())?
                    .map(|term| term.term_id),
            )
        })?;
        match term_id {
            Some(term_id) => ctx.languages.get(term_id),
            None => Ok(None),
        }
    }

    /// Sets the language of an object. `None`, or a key that does not
    /// resolve, removes it.
    ///
    /// Returns `false` when nothing changed. Changing the language first
    /// takes the object out of its translation group.
    fn set_language(&self, id: i64, lang: Option<LanguageKey>) -> PolyglotResult<bool> {
        let Some(id) = object_id(id) else {
            return Ok(false);
        };
        let ctx = self.context();
        let new = match lang {
            Some(key) => ctx.languages.get(key)?,
            None => None,
        };
        let old = self.get_language(id)?;

        let facet = self.descriptor().facet;
        let old_id = old.as_ref().map(|l| l.prop(facet, FacetField::TermId));
        let new_id = new.as_ref().map(|l| l.prop(facet, FacetField::TermId));
        if old_id == new_id {
            tracing::debug!(kind = self.name(), id, "language unchanged");
            return Ok(false);
        }

        if old.is_some() {
            if let Some(translated) = self.as_translated() {
                translated.leave_group(id, false)?;
            }
        }
        match &new {
            Some(lang) => ctx.taxonomy.set_object_terms(
                id,
                self.language_taxonomy(),
                &[self.language_tt_id(lang)],
                LinkMode::Replace,
            )?,
            None => ctx
                .taxonomy
                .delete_object_term_relationships(id, &[self.language_taxonomy()])?,
        }
        // Usage counts moved; the cached language list carries them.
        ctx.languages.clean_cache();
        ctx.bump(self.descriptor().cache_group);
        self.clean_cache();
        Ok(true)
    }

    /// Unlinks an object from its language.
    fn delete_language(&self, id: i64) -> PolyglotResult<()> {
        let Some(id) = object_id(id) else {
            return Ok(());
        };
        let ctx = self.context();
        ctx.taxonomy
            .delete_object_term_relationships(id, &[self.language_taxonomy()])?;
        ctx.languages.clean_cache();
        ctx.bump(self.descriptor().cache_group);
        self.clean_cache();
        Ok(())
    }

    /// The join and the predicate restricting a listing to the languages of
    /// `filter`, as `(join, where)`. Both are empty when no language of the
    /// filter resolves, leaving the listing unfiltered.
    ///
    /// `alias` is the alias of the kind's table.
    fn language_clauses(&self, alias: &str, filter: &LanguageFilter) -> PolyglotResult<(String, String)> {
        let predicate = self.where_clause(filter)?;
        if predicate.is_empty() {
            return Ok((String::new(), String::new()));
        }
        Ok((self.join_clause(alias), predicate))
    }

    /// The join a listing query needs before [`where_clause`](Self::where_clause)
    /// can be applied. `alias` is the alias of the kind's table.
    ///
    /// The join alone drops objects without any term link; prefer
    /// [`language_clauses`](Self::language_clauses), which leaves it out
    /// when there is nothing to filter on.
    fn join_clause(&self, alias: &str) -> String {
        format!(
            " INNER JOIN {} AS {JOIN_ALIAS} ON {JOIN_ALIAS}.object_id = {alias}.{}",
            self.context().taxonomy.tables().term_relationships,
            self.descriptor().id_column
        )
    }

    /// The predicate restricting a listing to the languages of `filter`.
    ///
    /// Languages that do not resolve are ignored; if none resolves the
    /// predicate is empty and the listing is not filtered.
    fn where_clause(&self, filter: &LanguageFilter) -> PolyglotResult<String> {
        let tt_ids: Vec<String> = filter
            .resolve(&self.context().languages)?
            .iter()
            .map(|lang| self.language_tt_id(lang))
            .filter(|tt_id| *tt_id > 0)
            .map(|tt_id| tt_id.to_string())
            .collect();
        if tt_ids.is_empty() {
            return Ok(String::new());
        }
        Ok(format!(
            " AND {JOIN_ALIAS}.term_taxonomy_id IN ({})",
            tt_ids.join(",")
        ))
    }

    /// Ids of the objects of `subtypes` (default: every translated subtype)
    /// that have no language, in id order. A `limit` below 1 means no limit.
    fn get_objects_with_no_lang(&self, limit: i64, subtypes: Option<&[String]>) -> PolyglotResult<Vec<i64>> {
        let known = self.subtypes();
        let subtypes: Vec<String> = match subtypes {
            Some(wanted) => wanted.iter().filter(|s| known.contains(s)).cloned().collect(),
            None => known.to_vec(),
        };
        if subtypes.is_empty() {
            return Ok(Vec::new());
        }

        let ctx = self.context();
        let tt_ids: Vec<i64> = ctx
            .languages
            .all()?
            .iter()
            .map(|lang| self.language_tt_id(lang))
            .collect();
        let key = unique_key(
            "no_lang:",
            &(
                self.name(),
                &tt_ids,
                &subtypes,
                limit,
                ctx.token(self.descriptor().cache_group),
                ctx.token(TERMS_GROUP),
            ),
        );
        let ids = ctx.caches.queries.get_or_insert_with(&key, || {
            let (sql, params) = self.objects_with_no_lang_sql(&subtypes, &tt_ids, limit);
            let ids = ctx
                .db()
                .query(&sql, &params)?
                .iter()
                .map(|row| row.get::<i64>("id"))
                .collect::<PolyglotResult<Vec<_>>>()?;
            Ok::<_, PolyglotError>(Arc::new(ids))
        })?;
        Ok(ids.as_ref().clone())
    }

    /// Links many objects to `lang` at once.
    ///
    /// Meant for objects without a language: translation groups are not
    /// looked at.
    fn set_language_in_mass(&self, ids: &[i64], lang: &Language) -> PolyglotResult<()> {
        let ids: Vec<i64> = ids.iter().copied().filter_map(object_id).collect();
        if ids.is_empty() {
            return Ok(());
        }
        let ctx = self.context();
        let added = ctx
            .taxonomy
            .add_objects_to_term(&ids, self.language_tt_id(lang))?;
        lang.update_usage_counts(&ctx.taxonomy)?;
        ctx.languages.clean_cache();
        ctx.bump(self.descriptor().cache_group);
        self.clean_cache();
        tracing::debug!(kind = self.name(), lang = %lang.slug, added, "language assigned in mass");
        Ok(())
    }

    /// Drops the memoized lookups of the site.
    fn clean_cache(&self) {
        let caches = &self.context().caches;
        caches.languages.clean("");
        caches.queries.clean("");
    }
}
