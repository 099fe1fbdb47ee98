//! Per-site, process-local caching.
//!
//! [`TenantCache`] is a thread-safe key/value store partitioned by site. It
//! has no expiry and no eviction: entries live until [`SiteCache::clean`]
//! removes them. Each engine component holds a [`SiteCache`] handle bound to
//! its own site, so working on another site never sees (or clears) this
//! site's entries, and coming back to a site finds its entries intact.
//!
//! [`LastChanged`] holds the cache-busting tokens that the storage layer bumps
//! whenever a group of objects (`posts`, `terms`) changes.
//!
//! ## Usage
//!
//! ```
//! use polyglot_rs_core::cache::TenantCache;
//!
//! let cache: TenantCache<Option<i64>> = TenantCache::new();
//! let site = cache.for_site(1);
//!
//! assert_eq!(site.get("missing"), None);          // absent
//! site.set("no-default", None);
//! assert_eq!(site.get("no-default"), Some(None)); // cached "nothing"
//! assert_eq!(cache.for_site(2).get("no-default"), None);
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::SiteId;

/// A process-local cache partitioned by site.
///
/// Cloning a `TenantCache` yields a handle to the same underlying store.
#[derive(Debug)]
pub struct TenantCache<V> {
    store: Arc<RwLock<HashMap<SiteId, HashMap<String, V>>>>,
}

impl<V> Clone for TenantCache<V> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<V: Clone> Default for TenantCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> TenantCache<V> {
    /// Creates a new empty cache.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Returns a handle scoped to one site.
    pub fn for_site(&self, site_id: SiteId) -> SiteCache<V> {
        SiteCache {
            cache: self.clone(),
            site_id,
        }
    }

    /// Returns the value stored under `key` for `site_id`.
    ///
    /// `None` means the key is absent; a cached `Option` value comes back
    /// wrapped as `Some(None)`.
    pub fn get(&self, site_id: SiteId, key: &str) -> Option<V> {
        let store = self.store.read().unwrap_or_else(PoisonError::into_inner);
        store.get(&site_id).and_then(|entries| entries.get(key).cloned())
    }

    /// Stores `value` under `key` for `site_id` and returns it.
    pub fn set(&self, site_id: SiteId, key: impl Into<String>, value: V) -> V {
        let mut store = self.store.write().unwrap_or_else(PoisonError::into_inner);
        store
            .entry(site_id)
            .or_default()
            .insert(key.into(), value.clone());
        value
    }

    /// Removes one entry, or every entry of the site when `key` is empty.
    pub fn clean(&self, site_id: SiteId, key: &str) {
        let mut store = self.store.write().unwrap_or_else(PoisonError::into_inner);
        if key.is_empty() {
            store.remove(&site_id);
        } else if let Some(entries) = store.get_mut(&site_id) {
            entries.remove(key);
        }
    }

    /// Returns the number of entries cached for a site.
    pub fn len(&self, site_id: SiteId) -> usize {
        let store = self.store.read().unwrap_or_else(PoisonError::into_inner);
        store.get(&site_id).map_or(0, HashMap::len)
    }

    /// Returns `true` if nothing is cached for the site.
    pub fn is_empty(&self, site_id: SiteId) -> bool {
        self.len(site_id) == 0
    }
}

/// A [`TenantCache`] handle bound to one site.
#[derive(Debug)]
pub struct SiteCache<V> {
    cache: TenantCache<V>,
    site_id: SiteId,
}

impl<V> Clone for SiteCache<V> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            site_id: self.site_id,
        }
    }
}

impl<V: Clone> SiteCache<V> {
    /// Returns the site this handle is bound to.
    pub const fn site_id(&self) -> SiteId {
        self.site_id
    }

    /// Returns the cached value, `None` when absent.
    pub fn get(&self, key: &str) -> Option<V> {
        self.cache.get(self.site_id, key)
    }

    /// Stores a value and returns it.
    pub fn set(&self, key: impl Into<String>, value: V) -> V {
        self.cache.set(self.site_id, key, value)
    }

    /// Removes one entry, or the whole site namespace when `key` is empty.
    pub fn clean(&self, key: &str) {
        self.cache.clean(self.site_id, key);
    }

    /// Returns the cached value or computes, stores, and returns it.
    pub fn get_or_insert_with<E>(
        &self,
        key: &str,
        f: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        let value = f()?;
        Ok(self.set(key, value))
    }

    /// Returns the number of entries cached for this site.
    pub fn len(&self) -> usize {
        self.cache.len(self.site_id)
    }

    /// Returns `true` if nothing is cached for this site.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty(self.site_id)
    }
}

/// Builds a deterministic cache key from structured data.
///
/// The data is serialized to JSON and hashed with SHA-256; the hex digest is
/// appended to `prefix`. Use ordered collections (`BTreeMap`, `Vec`) in
/// `data` so that equal inputs serialize identically.
///
/// # Examples
///
/// ```
/// use polyglot_rs_core::cache::unique_key;
///
/// let a = unique_key("no_lang:", &(vec![3, 4], "post", 10));
/// let b = unique_key("no_lang:", &(vec![3, 4], "post", 10));
/// assert_eq!(a, b);
/// assert!(a.starts_with("no_lang:"));
/// ```
pub fn unique_key<T: Serialize + ?Sized>(prefix: &str, data: &T) -> String {
    // Serializing plain data into a Vec cannot fail; an unserializable value
    // degrades to hashing its absence.
    let bytes = serde_json::to_vec(data).unwrap_or_default();
    format!("{prefix}{:x}", Sha256::digest(&bytes))
}

/// Per-site "last changed" tokens for groups of cached objects.
///
/// Tokens are strictly increasing across the whole process, so a token read
/// before a change never equals one read after it.
#[derive(Debug, Clone, Default)]
pub struct LastChanged {
    tokens: Arc<RwLock<HashMap<(SiteId, String), u64>>>,
    clock: Arc<AtomicU64>,
}

impl LastChanged {
    /// Creates an empty token registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current token of a group, initializing it on first use.
    pub fn get(&self, site_id: SiteId, group: &str) -> u64 {
        {
            let tokens = self.tokens.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(token) = tokens.get(&(site_id, group.to_string())) {
                return *token;
            }
        }
        self.bump(site_id, group)
    }

    /// Moves a group's token forward and returns the new value.
    pub fn bump(&self, site_id: SiteId, group: &str) -> u64 {
        let token = self.clock.fetch_add(1, Ordering::SeqCst) + 1;
        let mut tokens = self.tokens.write().unwrap_or_else(PoisonError::into_inner);
        tokens.insert((site_id, group.to_string()), token);
        token
    }
}
