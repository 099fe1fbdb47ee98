//! Everything a kind needs from its site.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use polyglot_rs_core::cache::{LastChanged, SiteCache};
use polyglot_rs_core::hooks::Signal;
use polyglot_rs_core::SiteId;
use polyglot_rs_db::{ContentStore, DbExecutor, TaxonomyStore};
use polyglot_rs_languages::LanguageRegistry;

use crate::permissions::PermissionChecker;

/// Sent after a translation group was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationsSaved {
    /// The kind name (`post`, `term`).
    pub kind: &'static str,
    /// The object `save_translations` was called for.
    pub object_id: i64,
    /// The validated translations, keyed by language slug.
    pub translations: BTreeMap<String, i64>,
}

/// The memo caches shared by the kinds of a site.
#[derive(Debug, Clone)]
pub struct ObjectCaches {
    /// Object → language term id, keyed by kind and id.
    pub languages: SiteCache<Option<i64>>,
    /// Results of queries for objects without a language.
    pub queries: SiteCache<Arc<Vec<i64>>>,
}

/// The site services the kinds work against.
pub struct ObjectContext {
    pub languages: Arc<LanguageRegistry>,
    pub taxonomy: TaxonomyStore,
    pub content: ContentStore,
    pub last_changed: LastChanged,
    pub caches: ObjectCaches,
    pub permissions: Arc<dyn PermissionChecker>,
    pub translations_saved: Signal<TranslationsSaved>,
}

impl fmt::Debug for ObjectContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectContext")
            .field("site_id", &self.site_id())
            .finish_non_exhaustive()
    }
}

impl ObjectContext {
    pub fn new(
        languages: Arc<LanguageRegistry>,
        taxonomy: TaxonomyStore,
        content: ContentStore,
        last_changed: LastChanged,
        caches: ObjectCaches,
        permissions: Arc<dyn PermissionChecker>,
    ) -> Self {
        Self {
            languages,
            taxonomy,
            content,
            last_changed,
            caches,
            permissions,
            translations_saved: Signal::new(),
        }
    }

    pub fn site_id(&self) -> SiteId {
        self.taxonomy.tables().site_id
    }

    pub fn db(&self) -> &Arc<dyn DbExecutor> {
        self.taxonomy.db()
    }

    /// Current last-changed token of a group on this site.
    pub fn token(&self, group: &str) -> u64 {
        self.last_changed.get(self.site_id(), group)
    }

    pub fn bump(&self, group: &str) {
        self.last_changed.bump(self.site_id(), group);
    }
}
