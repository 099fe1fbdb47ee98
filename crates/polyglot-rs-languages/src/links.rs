//! URL computation for languages.
//!
//! How a language shows up in URLs (directory, subdomain, domain) is the
//! business of a [`LinksModel`]. The registry only asks it for a language's
//! home and search URLs when building the language; changing the model
//! means cleaning the registry cache.

use polyglot_rs_core::settings::LanguageSettings;

/// Computes the URLs of a language.
pub trait LinksModel: Send + Sync {
    /// The home page URL of the language.
    fn home_url(&self, slug: &str, is_default: bool) -> String;

    /// The URL search forms in the language submit to.
    fn search_url(&self, slug: &str, is_default: bool) -> String {
        self.home_url(slug, is_default)
    }
}

/// Languages as the first path segment: `https://example.com/fr/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryLinks {
    home: String,
    hide_default: bool,
}

impl DirectoryLinks {
    pub fn new(home: impl Into<String>, hide_default: bool) -> Self {
        let home = home.into();
        Self {
            home: home.trim_end_matches('/').to_string(),
            hide_default,
        }
    }

    pub fn from_settings(settings: &LanguageSettings) -> Self {
        Self::new(settings.home_url.clone(), settings.hide_default)
    }
}

impl LinksModel for DirectoryLinks {
    fn home_url(&self, slug: &str, is_default: bool) -> String {
        if slug.is_empty() || (is_default && self.hide_default) {
            format!("{}/", self.home)
        } else {
            format!("{}/{slug}/", self.home)
        }
    }
}
