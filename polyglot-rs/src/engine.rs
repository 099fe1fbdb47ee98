//! Bootstrap: settings → database → per-site engines.
//!
//! A [`Polyglot`] owns what every site of an installation shares: the
//! database, the last-changed tokens, and the site-partitioned caches. Each
//! call to [`Polyglot::site`] wires a [`Site`] whose services only ever
//! touch that site's tables and cache partitions; there is no global
//! "current site".

use std::fmt;
use std::sync::Arc;

use polyglot_rs_core::cache::{LastChanged, TenantCache};
use polyglot_rs_core::logging::{setup_logging, site_span};
use polyglot_rs_core::{PolyglotError, PolyglotResult, Settings, SiteId, MAIN_SITE};
use polyglot_rs_db::{install, ContentStore, DbExecutor, OptionsStore, SqliteBackend, Tables, TaxonomyStore};
use polyglot_rs_languages::{DirectoryLinks, FsAssetLocator, LanguageFactory, LanguageList, LanguageRegistry};
use polyglot_rs_objects::{
    AllowAll, ObjectCaches, ObjectContext, ObjectRegistry, PermissionChecker, TranslatedPost, TranslatedTerm,
};

/// The engine of one installation.
///
/// # Examples
///
/// ```
/// use polyglot_rs::core::Settings;
/// use polyglot_rs::languages::NewLanguage;
/// use polyglot_rs::Polyglot;
///
/// let engine = Polyglot::new(Settings::default()).unwrap();
/// let site = engine.main_site().unwrap();
/// site.languages().add(&NewLanguage::new("English", "en", "en_US")).unwrap();
/// assert_eq!(site.languages().get_default().unwrap().unwrap().slug, "en");
/// ```
pub struct Polyglot {
    settings: Settings,
    db: Arc<dyn DbExecutor>,
    last_changed: LastChanged,
    language_cache: TenantCache<LanguageList>,
    object_languages: TenantCache<Option<i64>>,
    object_queries: TenantCache<Arc<Vec<i64>>>,
    permissions: Arc<dyn PermissionChecker>,
}

impl fmt::Debug for Polyglot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Polyglot")
            .field("database", &self.settings.database.path)
            .field("vendor", &self.db.vendor())
            .finish_non_exhaustive()
    }
}

impl Polyglot {
    /// Installs logging and opens the SQLite database named in the settings.
    pub fn new(settings: Settings) -> PolyglotResult<Self> {
        setup_logging(&settings);
        let db = SqliteBackend::open(settings.database.path.as_str())?;
        Ok(Self::with_executor(settings, Arc::new(db)))
    }

    /// Builds an engine over an already opened executor.
    pub fn with_executor(settings: Settings, db: Arc<dyn DbExecutor>) -> Self {
        Self {
            settings,
            db,
            last_changed: LastChanged::new(),
            language_cache: TenantCache::new(),
            object_languages: TenantCache::new(),
            object_queries: TenantCache::new(),
            permissions: Arc::new(AllowAll),
        }
    }

    /// Replaces the permission checker used by sites wired afterwards.
    #[must_use]
    pub fn with_permissions(mut self, permissions: Arc<dyn PermissionChecker>) -> Self {
        self.permissions = permissions;
        self
    }

    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    pub const fn db(&self) -> &Arc<dyn DbExecutor> {
        &self.db
    }

    pub const fn last_changed(&self) -> &LastChanged {
        &self.last_changed
    }

    /// The language list cache shared by every site.
    pub const fn language_cache(&self) -> &TenantCache<LanguageList> {
        &self.language_cache
    }

    pub fn main_site(&self) -> PolyglotResult<Site> {
        self.site(MAIN_SITE)
    }

    /// Wires the engine of one site, creating its tables if needed.
    ///
    /// Sites are cheap to build; callers may build one per request. Cached
    /// data survives between builds because the caches are owned here.
    pub fn site(&self, site_id: SiteId) -> PolyglotResult<Site> {
        if site_id < MAIN_SITE {
            return Err(PolyglotError::ImproperlyConfigured(format!(
                "invalid site id {site_id}"
            )));
        }
        let span = site_span(site_id);
        let _guard = span.enter();

        let tables = Tables::from_settings(&self.settings.database, site_id);
        install(self.db.as_ref(), &tables)?;

        let taxonomy = TaxonomyStore::new(Arc::clone(&self.db), tables.clone(), self.last_changed.clone());
        let options = OptionsStore::new(Arc::clone(&self.db), tables.clone());
        let factory = LanguageFactory::new(
            Arc::new(FsAssetLocator::from_settings(&self.settings.flags)),
            Arc::new(DirectoryLinks::from_settings(&self.settings.languages)),
            self.settings.flags.inline,
        );
        let languages = Arc::new(LanguageRegistry::new(
            taxonomy.clone(),
            options.clone(),
            factory,
            self.language_cache.for_site(site_id),
            self.settings.languages.clone(),
        ));

        let context = Arc::new(ObjectContext::new(
            Arc::clone(&languages),
            taxonomy,
            ContentStore::new(Arc::clone(&self.db), tables.clone(), self.last_changed.clone()),
            self.last_changed.clone(),
            ObjectCaches {
                languages: self.object_languages.for_site(site_id),
                queries: self.object_queries.for_site(site_id),
            },
            Arc::clone(&self.permissions),
        ));
        let posts = Arc::new(TranslatedPost::new(
            Arc::clone(&context),
            self.settings.translated_post_types(),
        ));
        let terms = Arc::new(TranslatedTerm::new(
            Arc::clone(&context),
            self.settings.content.taxonomies.clone(),
        ));
        let mut objects = ObjectRegistry::new(Arc::clone(&languages));
        objects.register(posts.clone());
        objects.register(terms.clone());

        tracing::debug!(prefix = %tables.prefix, "site wired");
        Ok(Site {
            id: site_id,
            tables,
            options,
            languages,
            context,
            posts,
            terms,
            objects,
        })
    }
}

/// The engine of one site.
pub struct Site {
    id: SiteId,
    tables: Tables,
    options: OptionsStore,
    languages: Arc<LanguageRegistry>,
    context: Arc<ObjectContext>,
    posts: Arc<TranslatedPost>,
    terms: Arc<TranslatedTerm>,
    objects: ObjectRegistry,
}

impl fmt::Debug for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Site")
            .field("id", &self.id)
            .field("prefix", &self.tables.prefix)
            .field("objects", &self.objects)
            .finish_non_exhaustive()
    }
}

impl Site {
    pub const fn id(&self) -> SiteId {
        self.id
    }

    pub const fn tables(&self) -> &Tables {
        &self.tables
    }

    pub const fn options(&self) -> &OptionsStore {
        &self.options
    }

    pub const fn languages(&self) -> &Arc<LanguageRegistry> {
        &self.languages
    }

    /// The stores, caches, and hooks shared by the site's kinds.
    pub const fn context(&self) -> &Arc<ObjectContext> {
        &self.context
    }

    pub const fn posts(&self) -> &Arc<TranslatedPost> {
        &self.posts
    }

    pub const fn terms(&self) -> &Arc<TranslatedTerm> {
        &self.terms
    }

    /// Every translatable kind of the site, by name.
    pub const fn objects(&self) -> &ObjectRegistry {
        &self.objects
    }

    /// A span to enter while working on behalf of this site.
    pub fn span(&self) -> tracing::Span {
        site_span(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyglot_rs_core::settings_loader;
    use polyglot_rs_db::Post;
    use polyglot_rs_languages::NewLanguage;
    use polyglot_rs_objects::{Translatable, Translated};

    fn engine() -> Polyglot {
        Polyglot::new(Settings::default()).unwrap()
    }

    #[test]
    fn test_site_tables_follow_prefix() {
        let engine = engine();
        assert_eq!(engine.main_site().unwrap().tables().terms, "wp_terms");
        assert_eq!(engine.site(3).unwrap().tables().posts, "wp_3_posts");
        assert!(engine.site(0).is_err());
    }

    #[test]
    fn test_sites_are_isolated() {
        let engine = engine();
        let main = engine.main_site().unwrap();
        let second = engine.site(2).unwrap();
        main.languages().add(&NewLanguage::new("English", "en", "en_US")).unwrap();
        second.languages().add(&NewLanguage::new("Deutsch", "de", "de_DE")).unwrap();

        assert!(main.languages().get("de").unwrap().is_none());
        assert!(second.languages().get("en").unwrap().is_none());
        assert_eq!(engine.language_cache().len(1), 1);
        assert_eq!(engine.language_cache().len(2), 1);
    }

    #[test]
    fn test_rewired_site_sees_same_data() {
        let engine = engine();
        let site = engine.main_site().unwrap();
        site.languages().add(&NewLanguage::new("English", "en", "en_US")).unwrap();
        let page = site.context().content.insert_post(&Post::new("page", "About")).unwrap();
        site.posts().set_language(page, Some("en".into())).unwrap();

        let again = engine.main_site().unwrap();
        assert_eq!(again.posts().get_language(page).unwrap().unwrap().slug, "en");
        assert_eq!(again.posts().get_translations(page).unwrap().len(), 1);
    }

    #[test]
    fn test_media_kind_follows_settings() {
        let settings = settings_loader::from_toml_str(
            r#"
            [content]
            post_types = ["post", "page"]
            taxonomies = ["category"]
            media_support = true
            "#,
        )
        .unwrap();
        let site = Polyglot::new(settings).unwrap().main_site().unwrap();
        assert!(site.posts().subtypes().iter().any(|t| t == "attachment"));
        assert_eq!(site.terms().subtypes().to_vec(), vec!["category".to_string()]);
        assert_eq!(site.objects().names(), vec!["post", "term"]);
    }

    #[test]
    fn test_file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.database.path = dir.path().join("site.db").display().to_string();

        {
            let site = Polyglot::new(settings.clone()).unwrap().main_site().unwrap();
            site.languages().add(&NewLanguage::new("Français", "fr", "fr_FR")).unwrap();
        }
        let site = Polyglot::new(settings).unwrap().main_site().unwrap();
        let fr = site.languages().get("fr_FR").unwrap().unwrap();
        assert!(fr.is_default);
        assert_eq!(fr.w3c, "fr-FR");
    }
}
