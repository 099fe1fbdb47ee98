//! Site fixtures.
//!
//! [`TestSite`] wires a full engine over a fresh [`TestDatabase`] with a
//! few languages already defined, and offers one-line helpers to create
//! content in a language.
//!
//! ## Example
//!
//! ```
//! use polyglot_rs_objects::{Translatable, Translated};
//! use polyglot_rs_test::fixtures::{key, translations, TestSite};
//!
//! let site = TestSite::new();
//! let hello = site.page("Hello", Some("en"));
//! let bonjour = site.page("Bonjour", Some("fr"));
//! site.posts()
//!     .save_translations(hello, &translations(&[("en", hello), ("fr", bonjour)]))
//!     .unwrap();
//! assert_eq!(site.posts().get_translation(hello, &key("fr")).unwrap(), bonjour);
//! ```

use std::ops::Deref;
use std::sync::Arc;

use polyglot_rs::{Polyglot, Site};
use polyglot_rs_core::{Settings, SiteId};
use polyglot_rs_db::{NewTerm, Post};
use polyglot_rs_languages::{Language, LanguageKey, NewLanguage};
use polyglot_rs_objects::{PermissionChecker, Translatable, Translations};

use crate::test_database::TestDatabase;

/// The languages of [`TestSite::new`]: English (default) then French.
pub const DEFAULT_LANGUAGES: [(&str, &str, &str); 2] =
    [("English", "en", "en_US"), ("Français", "fr", "fr_FR")];

/// An engine over an in-memory database, wired for the main site.
///
/// Dereferences to the main [`Site`].
pub struct TestSite {
    pub db: TestDatabase,
    pub engine: Polyglot,
    site: Site,
}

impl std::fmt::Debug for TestSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestSite").field("site", &self.site).finish_non_exhaustive()
    }
}

impl Default for TestSite {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for TestSite {
    type Target = Site;

    fn deref(&self) -> &Site {
        &self.site
    }
}

impl TestSite {
    /// English (default) and French, media translated.
    pub fn new() -> Self {
        Self::with_languages(&DEFAULT_LANGUAGES)
    }

    /// A site without any language.
    pub fn empty() -> Self {
        Self::with_languages(&[])
    }

    /// A site with `languages` (`name`, `slug`, `locale`) in display order;
    /// the first one is the default.
    pub fn with_languages(languages: &[(&str, &str, &str)]) -> Self {
        let mut settings = Settings::default();
        settings.content.media_support = true;
        Self::build(settings, None, languages)
    }

    /// A site whose capability checks go through `permissions`.
    pub fn with_permissions(permissions: Arc<dyn PermissionChecker>) -> Self {
        let mut settings = Settings::default();
        settings.content.media_support = true;
        Self::build(settings, Some(permissions), &DEFAULT_LANGUAGES)
    }

    /// A site built from `settings`, with the default languages.
    pub fn with_settings(settings: Settings) -> Self {
        Self::build(settings, None, &DEFAULT_LANGUAGES)
    }

    fn build(
        settings: Settings,
        permissions: Option<Arc<dyn PermissionChecker>>,
        languages: &[(&str, &str, &str)],
    ) -> Self {
        let db = TestDatabase::new();
        let mut engine = Polyglot::with_executor(settings, Arc::new(db.clone()));
        if let Some(permissions) = permissions {
            engine = engine.with_permissions(permissions);
        }
        let site = engine.main_site().expect("main site wiring failed");
        let fixture = Self { db, engine, site };
        for &(name, slug, locale) in languages {
            fixture.add_language(name, slug, locale);
        }
        fixture
    }

    /// Wires another site of the same installation.
    ///
    /// # Panics
    ///
    /// Panics if the site cannot be wired.
    pub fn other_site(&self, site_id: SiteId) -> Site {
        self.engine.site(site_id).expect("site wiring failed")
    }

    /// Adds a language after the existing ones.
    ///
    /// # Panics
    ///
    /// Panics if the language is rejected.
    pub fn add_language(&self, name: &str, slug: &str, locale: &str) -> Arc<Language> {
        let position = self.languages().all().expect("language list").len();
        let term_group = i64::try_from(position).unwrap_or(i64::MAX);
        self.languages()
            .add(&NewLanguage::new(name, slug, locale).term_group(term_group))
            .expect("language rejected")
    }

    /// Returns a language that must exist.
    ///
    /// # Panics
    ///
    /// Panics if `code` does not resolve.
    pub fn language(&self, code: &str) -> Arc<Language> {
        self.languages()
            .get(code)
            .expect("language lookup")
            .unwrap_or_else(|| panic!("no language `{code}`"))
    }

    /// Creates a published post of `post_type`, in `lang` if given.
    ///
    /// # Panics
    ///
    /// Panics on storage errors.
    pub fn post(&self, post_type: &str, title: &str, lang: Option<&str>) -> i64 {
        let id = self
            .context()
            .content
            .insert_post(&Post::new(post_type, title))
            .expect("post insert");
        if let Some(lang) = lang {
            self.posts()
                .set_language(id, Some(key(lang)))
                .expect("set post language");
        }
        id
    }

    pub fn page(&self, title: &str, lang: Option<&str>) -> i64 {
        self.post("page", title, lang)
    }

    /// Creates a term of `taxonomy`, in `lang` if given.
    ///
    /// # Panics
    ///
    /// Panics on storage errors.
    pub fn term(&self, taxonomy: &str, name: &str, lang: Option<&str>) -> i64 {
        self.terms()
            .insert_term(taxonomy, &NewTerm::new(name), lang.map(key), None)
            .expect("term insert")
            .term_id
    }

    pub fn category(&self, name: &str, lang: Option<&str>) -> i64 {
        self.term("category", name, lang)
    }
}

/// Shorthand for a language key.
pub fn key(code: &str) -> LanguageKey {
    LanguageKey::from(code)
}

/// Builds a translations map from `(slug, id)` pairs.
pub fn translations(pairs: &[(&str, i64)]) -> Translations {
    pairs
        .iter()
        .map(|&(slug, id)| (slug.to_string(), id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_site_languages() {
        let site = TestSite::new();
        let all = site.languages().all().unwrap();
        assert_eq!(all.iter().map(|l| l.slug.as_str()).collect::<Vec<_>>(), vec!["en", "fr"]);
        assert!(site.language("en").is_default);
        assert!(site.posts().subtypes().iter().any(|t| t == "attachment"));
    }

    #[test]
    fn test_empty_site() {
        let site = TestSite::empty();
        assert!(site.languages().all().unwrap().is_empty());
        assert!(site.db.table_names().unwrap().contains(&"wp_term_taxonomy".to_string()));
    }

    #[test]
    fn test_helpers_assign_language() {
        let site = TestSite::new();
        let page = site.page("About", Some("fr"));
        let cat = site.category("Actualités", Some("fr"));
        assert_eq!(site.posts().get_language(page).unwrap().unwrap().slug, "fr");
        assert_eq!(site.terms().get_language(cat).unwrap().unwrap().slug, "fr");
    }
}
