//! The registry of translatable kinds of a site.
//!
//! Kinds are registered once at bootstrap and looked up by name. The
//! registry also hosts the operations that span every kind: assigning a
//! language in mass and deleting a language with everything pointing at it.

use std::collections::HashMap;
use std::sync::Arc;

use polyglot_rs_core::{PolyglotError, PolyglotResult};
use polyglot_rs_db::atomic;
use polyglot_rs_languages::{DeletePolicy, LanguageKey, LanguageRegistry};

use crate::translatable::Translatable;

/// The translatable kinds of one site, by name.
///
/// # Examples
///
/// ```no_run
/// # fn demo(registry: &polyglot_rs_objects::ObjectRegistry) {
/// let posts = registry.get("post");
/// assert_eq!(posts.name(), "post");
/// assert!(registry.try_get("comment").is_none());
/// # }
/// ```
pub struct ObjectRegistry {
    languages: Arc<LanguageRegistry>,
    kinds: Vec<Arc<dyn Translatable>>,
    names: HashMap<&'static str, usize>,
}

impl std::fmt::Debug for ObjectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectRegistry")
            .field("kinds", &self.kinds.iter().map(|k| k.name()).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl ObjectRegistry {
    pub fn new(languages: Arc<LanguageRegistry>) -> Self {
        Self {
            languages,
            kinds: Vec::new(),
            names: HashMap::new(),
        }
    }

    /// Registers a kind.
    ///
    /// # Panics
    ///
    /// Panics if a kind with the same name is already registered.
    pub fn register(&mut self, kind: Arc<dyn Translatable>) {
        let name = kind.name();
        assert!(
            !self.names.contains_key(name),
            "object kind `{name}` is already registered"
        );
        self.names.insert(name, self.kinds.len());
        self.kinds.push(kind);
    }

    /// Returns a registered kind.
    ///
    /// # Panics
    ///
    /// Panics if no kind is registered under `name`. Asking for a kind that
    /// was never registered is a wiring bug, not a data condition.
    pub fn get(&self, name: &str) -> &Arc<dyn Translatable> {
        self.try_get(name)
            .unwrap_or_else(|| panic!("object kind `{name}` is not registered"))
    }

    pub fn try_get(&self, name: &str) -> Option<&Arc<dyn Translatable>> {
        self.names.get(name).map(|&idx| &self.kinds[idx])
    }

    /// The registered kinds, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Translatable>> {
        self.kinds.iter()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.kinds.iter().map(|kind| kind.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Links every object without a language, of every kind, to `lang`
    /// (the default language when `None`). `limit` caps the objects taken
    /// per kind; below 1 means no cap.
    ///
    /// Returns the number of objects assigned; `0` when the language does
    /// not resolve.
    pub fn set_language_in_mass(&self, lang: Option<LanguageKey>, limit: i64) -> PolyglotResult<usize> {
        let lang = match lang {
            Some(key) => self.languages.get(key)?,
            None => self.languages.get_default()?,
        };
        let Some(lang) = lang else {
            tracing::debug!("no language to assign in mass");
            return Ok(0);
        };

        let mut assigned = 0;
        for kind in &self.kinds {
            let ids = kind.get_objects_with_no_lang(limit, None)?;
            if ids.is_empty() {
                continue;
            }
            kind.set_language_in_mass(&ids, &lang)?;
            assigned += ids.len();
        }
        tracing::info!(lang = %lang.slug, assigned, "language assigned to objects without one");
        Ok(assigned)
    }

    /// Links every object without a language to the default language.
    pub fn assign_default_language(&self, limit: i64) -> PolyglotResult<usize> {
        self.set_language_in_mass(None, limit)
    }

    /// Deletes a language and everything pointing at it.
    ///
    /// The language is stripped from the translation groups of every kind
    /// (collapsing groups per kind policy), then both facets are deleted
    /// with their links. With [`DeletePolicy::Refuse`] a language still in
    /// use is left alone and [`PolyglotError::Conflict`] returned.
    ///
    /// Returns `false` when the key does not resolve.
    pub fn delete_language(&self, key: impl Into<LanguageKey>, policy: DeletePolicy) -> PolyglotResult<bool> {
        let Some(lang) = self.languages.get(key)? else {
            return Ok(false);
        };
        if policy == DeletePolicy::Refuse && lang.is_used() {
            return Err(PolyglotError::Conflict(format!(
                "The language '{}' is used by {} posts and {} terms",
                lang.slug,
                lang.count(),
                lang.tl_count()
            )));
        }

        atomic(self.languages.store().db().as_ref(), || {
            for kind in &self.kinds {
                if let Some(translated) = kind.as_translated() {
                    translated.remove_language_from_groups(&lang)?;
                }
            }
            self.languages
                .delete(LanguageKey::Code(lang.slug.clone()), DeletePolicy::Cascade)
        })?;
        for kind in &self.kinds {
            kind.clean_cache();
        }
        Ok(true)
    }
}
