//! The per-site language registry.
//!
//! [`LanguageRegistry`] is the only way other modules resolve a language. It
//! loads both facets of every language from the taxonomy store, builds the
//! [`Language`] values through the factory, and memoizes the list in the
//! site cache until a mutation (or a change of links model) cleans it.
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//! use polyglot_rs_core::cache::{LastChanged, TenantCache};
//! use polyglot_rs_core::settings::LanguageSettings;
//! use polyglot_rs_db::{install, DbExecutor, OptionsStore, SqliteBackend, Tables, TaxonomyStore};
//! use polyglot_rs_languages::factory::LanguageFactory;
//! use polyglot_rs_languages::registry::{LanguageRegistry, NewLanguage};
//!
//! let db: Arc<dyn DbExecutor> = Arc::new(SqliteBackend::memory().unwrap());
//! let tables = Tables::for_site("wp_", 1);
//! install(db.as_ref(), &tables).unwrap();
//! let registry = LanguageRegistry::new(
//!     TaxonomyStore::new(Arc::clone(&db), tables.clone(), LastChanged::new()),
//!     OptionsStore::new(db, tables),
//!     LanguageFactory::detached(),
//!     TenantCache::new().for_site(1),
//!     LanguageSettings::default(),
//! );
//!
//! registry.add(&NewLanguage::new("English", "en", "en_US")).unwrap();
//! let en = registry.get("en_US").unwrap().unwrap();
//! assert!(en.is_default);
//! assert_eq!(registry.get(en.term_id()).unwrap().unwrap().slug, "en");
//! ```

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;
use polyglot_rs_core::cache::SiteCache;
use polyglot_rs_core::hooks::Signal;
use polyglot_rs_core::settings::LanguageSettings;
use polyglot_rs_core::{PolyglotError, PolyglotResult, ValidationError};
use polyglot_rs_db::{atomic, NewTerm, OptionsStore, TaxonomyStore, TermUpdate};
use regex::Regex;
use serde_json::Value;

use crate::factory::{LanguageDescription, LanguageFactory};
use crate::flags::has_bundled_flag;
use crate::language::{Language, LANGUAGE_TAXONOMY, TERM_LANGUAGE_TAXONOMY};
use crate::links::LinksModel;
use crate::locales;

/// Option holding the slug of the default language.
pub const DEFAULT_LANG_OPTION: &str = "default_lang";

/// Prefix of the slug of a language's term-scoped facet.
pub const TERM_LANGUAGE_SLUG_PREFIX: &str = "pll_";

const LIST_CACHE_KEY: &str = "languages";

static SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z_-]+$").expect("valid regex"));
static LOCALE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z]{2,3}(?:_[A-Z]{2})?(?:_[a-z0-9]+)?$").expect("valid regex")
});

/// The shared, cached list of a site's languages.
pub type LanguageList = Arc<Vec<Arc<Language>>>;

/// Anything a language can be looked up by.
///
/// Numeric strings are treated as ids so that values coming from forms or
/// query strings resolve the same way as integers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageKey {
    /// The term id of either facet.
    Id(i64),
    /// A slug or a locale.
    Code(String),
}

impl From<i64> for LanguageKey {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for LanguageKey {
    fn from(value: &str) -> Self {
        let trimmed = value.trim();
        trimmed
            .parse::<i64>()
            .map_or_else(|_| Self::Code(trimmed.to_string()), Self::Id)
    }
}

impl From<String> for LanguageKey {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<&String> for LanguageKey {
    fn from(value: &String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<&Language> for LanguageKey {
    fn from(lang: &Language) -> Self {
        if lang.term_id() > 0 {
            Self::Id(lang.term_id())
        } else {
            Self::Code(lang.slug.clone())
        }
    }
}

impl From<&Arc<Language>> for LanguageKey {
    fn from(lang: &Arc<Language>) -> Self {
        Self::from(lang.as_ref())
    }
}

impl fmt::Display for LanguageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Code(code) => f.write_str(code),
        }
    }
}

impl LanguageKey {
    fn matches(&self, lang: &Language) -> bool {
        match self {
            Self::Id(id) => *id > 0 && (lang.term_id() == *id || lang.tl_term_id() == *id),
            Self::Code(code) => !code.is_empty() && (lang.slug == *code || lang.locale == *code),
        }
    }
}

/// Filters for [`LanguageRegistry::get_list`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListArgs {
    /// Skip languages no post uses.
    pub hide_empty: bool,
    /// Skip the default language.
    pub hide_default: bool,
}

/// A single field projected by [`LanguageRegistry::get_list_field`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListField {
    Slug,
    Name,
    Locale,
    TermId,
}

/// What to do with content still using a language being deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Fail with [`PolyglotError::Conflict`] if anything uses the language.
    Refuse,
    /// Unlink everything from the language, then delete it.
    Cascade,
}

/// Notifications about language mutations. Each carries the slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageEvent {
    Added(String),
    Updated(String),
    Deleted(String),
    DefaultChanged(String),
}

/// Data for a language about to be added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLanguage {
    pub name: String,
    pub slug: String,
    pub locale: String,
    pub rtl: bool,
    pub term_group: i64,
    pub flag_code: String,
    pub active: bool,
    pub fallbacks: Vec<String>,
}

impl NewLanguage {
    /// A language with the locale table's defaults for direction and flag.
    pub fn new(name: impl Into<String>, slug: impl Into<String>, locale: impl Into<String>) -> Self {
        let locale = locale.into();
        let info = locales::lookup(&locale);
        Self {
            name: name.into(),
            slug: slug.into(),
            rtl: info.is_some_and(|i| i.rtl),
            flag_code: info.map(|i| i.flag.to_string()).unwrap_or_default(),
            locale,
            term_group: 0,
            active: true,
            fallbacks: Vec::new(),
        }
    }

    #[must_use]
    pub const fn term_group(mut self, term_group: i64) -> Self {
        self.term_group = term_group;
        self
    }

    #[must_use]
    pub fn flag_code(mut self, flag_code: impl Into<String>) -> Self {
        self.flag_code = flag_code.into();
        self
    }

    fn description(&self) -> LanguageDescription {
        LanguageDescription {
            locale: self.locale.clone(),
            rtl: self.rtl,
            flag_code: self.flag_code.clone(),
            active: self.active,
            fallbacks: self.fallbacks.clone(),
        }
    }
}

/// A partial update of a language; `None` fields are left untouched.
///
/// The slug cannot change: it is the key of every translation group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageUpdate {
    pub name: Option<String>,
    pub locale: Option<String>,
    pub rtl: Option<bool>,
    pub term_group: Option<i64>,
    pub flag_code: Option<String>,
    pub active: Option<bool>,
    pub fallbacks: Option<Vec<String>>,
}

/// The languages of one site.
pub struct LanguageRegistry {
    store: TaxonomyStore,
    options: OptionsStore,
    factory: RwLock<LanguageFactory>,
    cache: SiteCache<LanguageList>,
    settings: LanguageSettings,
    events: Signal<LanguageEvent>,
}

impl fmt::Debug for LanguageRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageRegistry")
            .field("site_id", &self.cache.site_id())
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

impl LanguageRegistry {
    pub fn new(
        store: TaxonomyStore,
        options: OptionsStore,
        factory: LanguageFactory,
        cache: SiteCache<LanguageList>,
        settings: LanguageSettings,
    ) -> Self {
        Self {
            store,
            options,
            factory: RwLock::new(factory),
            cache,
            settings,
            events: Signal::new(),
        }
    }

    /// The taxonomy store the languages are persisted in.
    pub const fn store(&self) -> &TaxonomyStore {
        &self.store
    }

    /// Language mutation notifications.
    pub const fn events(&self) -> &Signal<LanguageEvent> {
        &self.events
    }

    fn factory(&self) -> LanguageFactory {
        self.factory
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // ── Reads ──────────────────────────────────────────────────────────

    /// Resolves a language by facet term id, slug, or locale.
    ///
    /// An unknown key is not an error: it resolves to `None`.
    pub fn get(&self, key: impl Into<LanguageKey>) -> PolyglotResult<Option<Arc<Language>>> {
        let key = key.into();
        Ok(self.all()?.iter().find(|lang| key.matches(lang)).cloned())
    }

    /// Returns every language, ordered by display order then name.
    pub fn all(&self) -> PolyglotResult<LanguageList> {
        if !self.settings.cache_languages {
            return self.load();
        }
        if let Some(list) = self.cache.get(LIST_CACHE_KEY) {
            return Ok(list);
        }
        tracing::debug!(site_id = self.cache.site_id(), "language list cache miss");
        let list = self.load()?;
        Ok(self.cache.set(LIST_CACHE_KEY, list))
    }

    /// Returns the languages matching `args`.
    pub fn get_list(&self, args: &ListArgs) -> PolyglotResult<Vec<Arc<Language>>> {
        Ok(self
            .all()?
            .iter()
            .filter(|lang| !args.hide_empty || lang.count() > 0)
            .filter(|lang| !args.hide_default || !lang.is_default)
            .cloned()
            .collect())
    }

    /// Returns one field of each language matching `args`.
    pub fn get_list_field(&self, args: &ListArgs, field: ListField) -> PolyglotResult<Vec<Value>> {
        Ok(self
            .get_list(args)?
            .iter()
            .map(|lang| match field {
                ListField::Slug => Value::from(lang.slug.as_str()),
                ListField::Name => Value::from(lang.name.as_str()),
                ListField::Locale => Value::from(lang.locale.as_str()),
                ListField::TermId => Value::from(lang.term_id()),
            })
            .collect())
    }

    pub fn get_default(&self) -> PolyglotResult<Option<Arc<Language>>> {
        Ok(self.all()?.iter().find(|lang| lang.is_default).cloned())
    }

    fn default_slug(&self) -> PolyglotResult<Option<String>> {
        Ok(self
            .options
            .get_option(DEFAULT_LANG_OPTION)?
            .filter(|slug| !slug.is_empty())
            .or_else(|| self.settings.default_language.clone()))
    }

    fn load(&self) -> PolyglotResult<LanguageList> {
        let default_slug = self.default_slug()?;
        let term_facets = self.store.get_terms(TERM_LANGUAGE_TAXONOMY)?;
        let factory = self.factory();

        let mut list = Vec::new();
        for post_facet in self.store.get_terms(LANGUAGE_TAXONOMY)? {
            let tl_slug = format!("{TERM_LANGUAGE_SLUG_PREFIX}{}", post_facet.slug);
            let Some(term_facet) = term_facets.iter().find(|t| t.slug == tl_slug) else {
                tracing::warn!(slug = %post_facet.slug, "language has no term facet, skipped");
                continue;
            };
            let is_default = default_slug.as_deref() == Some(post_facet.slug.as_str());
            match factory.create_from_facets(&post_facet, term_facet, is_default) {
                Some(lang) => list.push(Arc::new(lang)),
                None => tracing::warn!(slug = %post_facet.slug, "inert language skipped"),
            }
        }
        list.sort_by(|a, b| a.term_group.cmp(&b.term_group).then_with(|| a.name.cmp(&b.name)));
        Ok(Arc::new(list))
    }

    // ── Mutations ──────────────────────────────────────────────────────

    fn validate_new(&self, new: &NewLanguage) -> PolyglotResult<()> {
        let mut errors = ValidationError::with_field_errors(Default::default());
        if !SLUG_RE.is_match(&new.slug) {
            errors.add_field_error(
                "slug",
                ValidationError::new("The language code contains invalid characters.", "invalid_slug"),
            );
        } else if self.get(LanguageKey::Code(new.slug.clone()))?.is_some_and(|l| l.slug == new.slug) {
            errors.add_field_error(
                "slug",
                ValidationError::new("The language code must be unique.", "slug_exists"),
            );
        }
        self.validate_fields(&mut errors, &new.name, &new.locale, &new.flag_code);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.into())
        }
    }

    fn validate_fields(&self, errors: &mut ValidationError, name: &str, locale: &str, flag_code: &str) {
        if !LOCALE_RE.is_match(locale) {
            errors.add_field_error(
                "locale",
                ValidationError::new("Enter a valid locale.", "invalid_locale").with_param("locale", locale),
            );
        }
        if name.trim().is_empty() {
            errors.add_field_error(
                "name",
                ValidationError::new("The language must have a name.", "required"),
            );
        }
        if !flag_code.is_empty()
            && !locales::is_known_flag(flag_code)
            && !has_bundled_flag(self.factory().locator().as_ref(), flag_code)
        {
            errors.add_field_error(
                "flag",
                ValidationError::new("The flag does not exist.", "invalid_flag").with_param("flag", flag_code),
            );
        }
    }

    /// Adds a language, creating both of its facets in one transaction.
    ///
    /// The first language of a site becomes its default.
    pub fn add(&self, new: &NewLanguage) -> PolyglotResult<Arc<Language>> {
        self.validate_new(new)?;
        let had_default = self.default_slug()?.is_some();

        atomic(self.store.db().as_ref(), || {
            self.store.insert_term(
                LANGUAGE_TAXONOMY,
                &NewTerm::new(new.name.trim())
                    .slug(new.slug.as_str())
                    .description(new.description().to_json())
                    .term_group(new.term_group),
            )?;
            self.store.insert_term(
                TERM_LANGUAGE_TAXONOMY,
                &NewTerm::new(new.name.trim())
                    .slug(format!("{TERM_LANGUAGE_SLUG_PREFIX}{}", new.slug))
                    .term_group(new.term_group),
            )?;
            if !had_default {
                self.options.update_option(DEFAULT_LANG_OPTION, &new.slug)?;
            }
            Ok(())
        })?;
        self.clean_cache();

        tracing::info!(slug = %new.slug, locale = %new.locale, "language added");
        self.events.send(&LanguageEvent::Added(new.slug.clone()));
        if !had_default {
            self.events.send(&LanguageEvent::DefaultChanged(new.slug.clone()));
        }
        self.get(LanguageKey::Code(new.slug.clone()))?
            .ok_or_else(|| PolyglotError::DoesNotExist(format!("language '{}'", new.slug)))
    }

    /// Updates a language. Both facets are written in one transaction.
    pub fn update(&self, key: impl Into<LanguageKey>, update: &LanguageUpdate) -> PolyglotResult<Arc<Language>> {
        let key = key.into();
        let lang = self
            .get(key.clone())?
            .ok_or_else(|| PolyglotError::DoesNotExist(format!("language '{key}'")))?;

        let name = update.name.clone().unwrap_or_else(|| lang.name.clone());
        let description = LanguageDescription {
            locale: update.locale.clone().unwrap_or_else(|| lang.locale.clone()),
            rtl: update.rtl.unwrap_or(lang.is_rtl),
            flag_code: update.flag_code.clone().unwrap_or_else(|| lang.flag_code.clone()),
            active: update.active.unwrap_or(lang.active),
            fallbacks: update.fallbacks.clone().unwrap_or_else(|| lang.fallbacks.clone()),
        };
        let mut errors = ValidationError::with_field_errors(Default::default());
        self.validate_fields(&mut errors, &name, &description.locale, &description.flag_code);
        if !errors.is_empty() {
            return Err(errors.into());
        }

        let term_group = update.term_group.unwrap_or(lang.term_group);
        atomic(self.store.db().as_ref(), || {
            self.store.update_term(
                lang.term_id(),
                &TermUpdate {
                    name: Some(name.trim().to_string()),
                    description: Some(description.to_json()),
                    term_group: Some(term_group),
                    ..TermUpdate::default()
                },
            )?;
            self.store.update_term(
                lang.tl_term_id(),
                &TermUpdate {
                    name: Some(name.trim().to_string()),
                    term_group: Some(term_group),
                    ..TermUpdate::default()
                },
            )?;
            Ok(())
        })?;
        self.clean_cache();

        tracing::info!(slug = %lang.slug, "language updated");
        self.events.send(&LanguageEvent::Updated(lang.slug.clone()));
        self.get(LanguageKey::Code(lang.slug.clone()))?
            .ok_or_else(|| PolyglotError::DoesNotExist(format!("language '{}'", lang.slug)))
    }

    /// Deletes a language and both of its facets.
    ///
    /// Returns `false` when the key does not resolve. Deleting the default
    /// language promotes the first remaining language.
    ///
    /// This only unlinks objects from the language; stripping the language
    /// from translation groups is done by the object kind registry, which
    /// calls this afterwards.
    pub fn delete(&self, key: impl Into<LanguageKey>, policy: DeletePolicy) -> PolyglotResult<bool> {
        let Some(lang) = self.get(key)? else {
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

        let was_default = self.default_slug()?.as_deref() == Some(lang.slug.as_str());
        atomic(self.store.db().as_ref(), || {
            // delete_term drops the remaining links of each facet.
            self.store.delete_term(lang.term_id())?;
            self.store.delete_term(lang.tl_term_id())?;
            if was_default {
                self.options.delete_option(DEFAULT_LANG_OPTION)?;
            }
            Ok(())
        })?;
        self.clean_cache();
        tracing::info!(slug = %lang.slug, "language deleted");
        self.events.send(&LanguageEvent::Deleted(lang.slug.clone()));

        if was_default {
            if let Some(next) = self.all()?.first() {
                self.update_default(next.slug.as_str())?;
            }
        }
        Ok(true)
    }

    /// Makes another language the default.
    pub fn update_default(&self, key: impl Into<LanguageKey>) -> PolyglotResult<()> {
        let key = key.into();
        let lang = self
            .get(key.clone())?
            .ok_or_else(|| PolyglotError::DoesNotExist(format!("language '{key}'")))?;
        if lang.is_default {
            return Ok(());
        }
        self.options.update_option(DEFAULT_LANG_OPTION, &lang.slug)?;
        self.clean_cache();
        tracing::info!(slug = %lang.slug, "default language changed");
        self.events.send(&LanguageEvent::DefaultChanged(lang.slug.clone()));
        Ok(())
    }

    /// Recounts both facets of every language and cleans the list cache.
    pub fn update_counts(&self) -> PolyglotResult<()> {
        for lang in self.all()?.iter() {
            lang.update_usage_counts(&self.store)?;
        }
        self.clean_cache();
        Ok(())
    }

    /// Switches the links model (permalink structure or home URL changed).
    pub fn set_links(&self, links: Arc<dyn LinksModel>) {
        {
            let mut factory = self.factory.write().unwrap_or_else(PoisonError::into_inner);
            *factory = factory.with_links(links);
        }
        self.clean_cache();
    }

    /// Drops the cached language list.
    pub fn clean_cache(&self) {
        self.cache.clean(LIST_CACHE_KEY);
    }
}
