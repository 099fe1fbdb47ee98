//! Settings for the polyglot-rs engine.
//!
//! This module provides the [`Settings`] struct, which holds all engine
//! configuration with sensible defaults. Settings are plain data: they are
//! loaded once (see [`settings_loader`](crate::settings_loader)) and handed
//! to the engine at bootstrap, never read from a global.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::SiteId;

/// Database connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// The database file path (or `:memory:`).
    pub path: String,
    /// Prefix prepended to every table name (e.g. `wp_`).
    pub table_prefix: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: ":memory:".to_string(),
            table_prefix: "wp_".to_string(),
        }
    }
}

impl DatabaseSettings {
    /// Returns the table prefix for a given site.
    ///
    /// The main site uses the bare prefix; every other site gets its id
    /// appended (`wp_` → `wp_2_`).
    pub fn prefix_for_site(&self, site_id: SiteId) -> String {
        if site_id <= crate::MAIN_SITE {
            self.table_prefix.clone()
        } else {
            format!("{}{site_id}_", self.table_prefix)
        }
    }
}

/// Language registry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageSettings {
    /// Slug of the default language, if already chosen.
    pub default_language: Option<String>,
    /// Whether the language list is memoized per site.
    pub cache_languages: bool,
    /// Home URL of the site; language home and search URLs derive from it.
    pub home_url: String,
    /// Whether the default language is served without its slug in URLs.
    pub hide_default: bool,
}

impl Default for LanguageSettings {
    fn default() -> Self {
        Self {
            default_language: None,
            cache_languages: true,
            home_url: "http://localhost".to_string(),
            hide_default: true,
        }
    }
}

/// Configuration of the translatable content kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentSettings {
    /// Post types whose objects carry a language.
    pub post_types: Vec<String>,
    /// Taxonomies whose terms carry a language.
    pub taxonomies: Vec<String>,
    /// Whether media attachments are translatable.
    pub media_support: bool,
}

impl Default for ContentSettings {
    fn default() -> Self {
        Self {
            post_types: vec!["post".to_string(), "page".to_string()],
            taxonomies: vec!["category".to_string(), "post_tag".to_string()],
            media_support: false,
        }
    }
}

/// Flag asset configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagSettings {
    /// Directory holding the bundled flags (`{code}.png`).
    pub bundled_dir: Option<PathBuf>,
    /// Base URL under which bundled flags are served.
    pub bundled_url: String,
    /// Installation-local directory for custom flags (`{locale}.{ext}`).
    pub local_dir: Option<PathBuf>,
    /// Base URL of the local directory.
    pub local_url: String,
    /// Active theme directory for custom flags.
    pub theme_dir: Option<PathBuf>,
    /// Base URL of the active theme directory.
    pub theme_url: String,
    /// Parent theme directory for custom flags.
    pub parent_theme_dir: Option<PathBuf>,
    /// Base URL of the parent theme directory.
    pub parent_theme_url: String,
    /// Whether flags are inlined as `data:` URIs.
    pub inline: bool,
}

impl Default for FlagSettings {
    fn default() -> Self {
        Self {
            bundled_dir: None,
            bundled_url: "/flags/".to_string(),
            local_dir: None,
            local_url: "/polylang/".to_string(),
            theme_dir: None,
            theme_url: "/theme/polylang/".to_string(),
            parent_theme_dir: None,
            parent_theme_url: "/parent-theme/polylang/".to_string(),
            inline: true,
        }
    }
}

/// The complete set of engine settings.
///
/// # Examples
///
/// ```
/// use polyglot_rs_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.database.table_prefix, "wp_");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // ── Core ─────────────────────────────────────────────────────────

    /// Whether debug mode is enabled.
    pub debug: bool,

    // ── Logging ──────────────────────────────────────────────────────

    /// The log level (e.g. "info", "debug", "warn").
    pub log_level: String,

    // ── Storage ──────────────────────────────────────────────────────

    /// Database configuration.
    pub database: DatabaseSettings,

    // ── Languages ────────────────────────────────────────────────────

    /// Language registry configuration.
    pub languages: LanguageSettings,

    /// Translatable content configuration.
    pub content: ContentSettings,

    /// Flag asset configuration.
    pub flags: FlagSettings,

    // ── Escape hatch ─────────────────────────────────────────────────

    /// Custom settings that don't fit into the above categories.
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            log_level: "info".to_string(),
            database: DatabaseSettings::default(),
            languages: LanguageSettings::default(),
            content: ContentSettings::default(),
            flags: FlagSettings::default(),
            extra: HashMap::new(),
        }
    }
}

impl Settings {
    /// Returns the post types that carry a language, including attachments
    /// when media support is enabled.
    pub fn translated_post_types(&self) -> Vec<String> {
        let mut types = self.content.post_types.clone();
        if self.content.media_support && !types.iter().any(|t| t == "attachment") {
            types.push("attachment".to_string());
        }
        types
    }
}
