//! The language entity.
//!
//! A [`Language`] is backed by two classification entries: one in the
//! `language` taxonomy that scopes posts, and one in the `term_language`
//! taxonomy that scopes terms. Both share the same identity (slug, locale,
//! flags) but have their own ids and usage counts. The pair is hidden
//! behind [`Language::prop`] / [`Language::get_prop`].
//!
//! Languages are built by the [`factory`](crate::factory) and handed out
//! by the [`registry`](crate::registry) as shared, read-only values.

use std::fmt;
use std::str::FromStr;

use polyglot_rs_core::{PolyglotError, PolyglotResult};
use polyglot_rs_db::TaxonomyStore;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::flags::Flag;

/// The taxonomy holding the post-scoped facet.
pub const LANGUAGE_TAXONOMY: &str = "language";
/// The taxonomy holding the term-scoped facet.
pub const TERM_LANGUAGE_TAXONOMY: &str = "term_language";

/// One of the two classification facets of a language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LanguageFacet {
    /// Scopes posts.
    Language,
    /// Scopes terms.
    TermLanguage,
}

impl LanguageFacet {
    /// The taxonomy name of the facet.
    pub const fn taxonomy(self) -> &'static str {
        match self {
            Self::Language => LANGUAGE_TAXONOMY,
            Self::TermLanguage => TERM_LANGUAGE_TAXONOMY,
        }
    }
}

impl FromStr for LanguageFacet {
    type Err = PolyglotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            LANGUAGE_TAXONOMY => Ok(Self::Language),
            TERM_LANGUAGE_TAXONOMY => Ok(Self::TermLanguage),
            other => Err(PolyglotError::DomainError(format!(
                "'{other}' is not a language facet"
            ))),
        }
    }
}

/// A per-facet numeric field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FacetField {
    /// Id of the facet's term.
    TermId,
    /// Id used by object links and filter clauses.
    TermTaxonomyId,
    /// Number of objects using the language.
    Count,
}

impl FromStr for FacetField {
    type Err = PolyglotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "term_id" => Ok(Self::TermId),
            "term_taxonomy_id" => Ok(Self::TermTaxonomyId),
            "count" => Ok(Self::Count),
            other => Err(PolyglotError::DomainError(format!(
                "'{other}' is not a language facet field"
            ))),
        }
    }
}

/// The raw numbers of one facet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetIds {
    pub term_id: i64,
    pub term_taxonomy_id: i64,
    pub count: i64,
}

impl FacetIds {
    const fn field(&self, field: FacetField) -> i64 {
        match field {
            FacetField::TermId => self.term_id,
            FacetField::TermTaxonomyId => self.term_taxonomy_id,
            FacetField::Count => self.count,
        }
    }
}

/// Which form of the locale to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocaleFormat {
    /// As stored: `fr_FR`.
    Raw,
    /// W3C tag: `fr-FR`.
    Display,
}

/// One language of a site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub name: String,
    pub slug: String,
    pub locale: String,
    pub w3c: String,
    pub facebook: String,
    pub is_rtl: bool,
    /// Display order.
    pub term_group: i64,
    pub flag_code: String,
    /// Whether the language is offered to visitors.
    pub active: bool,
    /// Locales to fall back to for string translations.
    pub fallbacks: Vec<String>,
    pub is_default: bool,
    pub home_url: String,
    pub search_url: String,
    /// The bundled flag.
    pub flag: Flag,
    /// A flag provided by the installation or a theme.
    pub custom_flag: Option<Flag>,
    pub(crate) language: FacetIds,
    pub(crate) term_language: FacetIds,
}

impl Language {
    /// Returns a per-facet numeric property.
    pub const fn prop(&self, facet: LanguageFacet, field: FacetField) -> i64 {
        match facet {
            LanguageFacet::Language => self.language.field(field),
            LanguageFacet::TermLanguage => self.term_language.field(field),
        }
    }

    /// Returns a per-facet numeric property by name.
    ///
    /// # Examples
    ///
    /// ```
    /// # use polyglot_rs_languages::factory::{LanguageData, LanguageFactory};
    /// # let factory = LanguageFactory::detached();
    /// # let data = LanguageData { name: "Français".into(), slug: "fr".into(),
    /// #     locale: "fr_FR".into(), term_id: 3, term_taxonomy_id: 4,
    /// #     ..LanguageData::default() };
    /// # let fr = factory.create_from_data(data).unwrap();
    /// assert_eq!(fr.get_prop("language", "term_taxonomy_id").unwrap(), 4);
    /// assert!(fr.get_prop("post_tag", "term_id").is_err());
    /// ```
    pub fn get_prop(&self, facet: &str, field: &str) -> PolyglotResult<i64> {
        Ok(self.prop(facet.parse()?, field.parse()?))
    }

    /// Id of the post-scoped facet's term; the language's primary id.
    pub const fn term_id(&self) -> i64 {
        self.language.term_id
    }

    /// Id of the term-scoped facet's term.
    pub const fn tl_term_id(&self) -> i64 {
        self.term_language.term_id
    }

    /// Number of posts in the language.
    pub const fn count(&self) -> i64 {
        self.language.count
    }

    /// Number of terms in the language.
    pub const fn tl_count(&self) -> i64 {
        self.term_language.count
    }

    /// Returns `true` if any post or term uses the language.
    pub const fn is_used(&self) -> bool {
        self.language.count > 0 || self.term_language.count > 0
    }

    pub fn locale(&self, format: LocaleFormat) -> &str {
        match format {
            LocaleFormat::Raw => &self.locale,
            LocaleFormat::Display => &self.w3c,
        }
    }

    /// The flag to display: the custom one when present.
    pub fn display_flag(&self) -> &Flag {
        self.custom_flag.as_ref().unwrap_or(&self.flag)
    }

    /// Recounts both facets from their links.
    ///
    /// The language itself is not modified; the registry's cached list has
    /// to be cleaned for new counts to show up.
    pub fn update_usage_counts(&self, store: &TaxonomyStore) -> PolyglotResult<()> {
        store.update_term_count(&[
            self.language.term_taxonomy_id,
            self.term_language.term_taxonomy_id,
        ])
    }

    /// Returns a copy whose absolute URLs use `scheme`.
    ///
    /// The cached language is shared across requests that may differ in
    /// scheme, so this is applied per request and never stored back.
    #[must_use]
    pub fn with_request_scheme(&self, scheme: &str) -> Self {
        let mut lang = self.clone();
        lang.home_url = with_scheme(&self.home_url, scheme);
        lang.search_url = with_scheme(&self.search_url, scheme);
        rescheme_flag(&mut lang.flag, scheme);
        if let Some(flag) = lang.custom_flag.as_mut() {
            rescheme_flag(flag, scheme);
        }
        lang
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.slug)
    }
}

fn rescheme_flag(flag: &mut Flag, scheme: &str) {
    flag.url = with_scheme(&flag.url, scheme);
    if !flag.src.starts_with("data:") {
        flag.src = with_scheme(&flag.src, scheme);
    }
}

/// Rewrites an absolute http(s) URL to `scheme`; anything else is returned as-is.
fn with_scheme(raw: &str, scheme: &str) -> String {
    if !matches!(scheme, "http" | "https") {
        return raw.to_string();
    }
    match Url::parse(raw) {
        Ok(mut url) if matches!(url.scheme(), "http" | "https") && url.scheme() != scheme => {
            if url.set_scheme(scheme).is_ok() {
                url.to_string()
            } else {
                raw.to_string()
            }
        }
        _ => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn french() -> Language {
        Language {
            name: "Français".into(),
            slug: "fr".into(),
            locale: "fr_FR".into(),
            w3c: "fr-FR".into(),
            facebook: "fr_FR".into(),
            is_rtl: false,
            term_group: 1,
            flag_code: "fr".into(),
            active: true,
            fallbacks: Vec::new(),
            is_default: false,
            home_url: "http://example.com/fr/".into(),
            search_url: "http://example.com/fr/".into(),
            flag: Flag {
                url: "http://example.com/flags/fr.png".into(),
                src: "data:image/png;base64,AAAA".into(),
                title: "Français".into(),
            },
            custom_flag: Some(Flag {
                url: "http://example.com/theme/fr_FR.png".into(),
                src: "http://example.com/theme/fr_FR.png".into(),
                title: "Français".into(),
            }),
            language: FacetIds {
                term_id: 3,
                term_taxonomy_id: 4,
                count: 2,
            },
            term_language: FacetIds {
                term_id: 5,
                term_taxonomy_id: 6,
                count: 0,
            },
        }
    }

    #[test]
    fn test_prop() {
        let fr = french();
        assert_eq!(fr.prop(LanguageFacet::Language, FacetField::TermId), 3);
        assert_eq!(fr.prop(LanguageFacet::TermLanguage, FacetField::TermTaxonomyId), 6);
        assert_eq!(fr.prop(LanguageFacet::Language, FacetField::Count), 2);
        assert_eq!(fr.term_id(), 3);
        assert_eq!(fr.tl_term_id(), 5);
        assert!(fr.is_used());
    }

    #[test]
    fn test_get_prop_by_name() {
        let fr = french();
        assert_eq!(fr.get_prop("term_language", "term_id").unwrap(), 5);
        assert_eq!(fr.get_prop("language", "count").unwrap(), 2);
    }

    #[test]
    fn test_get_prop_unknown_is_domain_error() {
        let fr = french();
        assert!(matches!(
            fr.get_prop("category", "term_id"),
            Err(PolyglotError::DomainError(_))
        ));
        assert!(matches!(
            fr.get_prop("language", "slug"),
            Err(PolyglotError::DomainError(_))
        ));
    }

    #[test]
    fn test_locale_formats() {
        let fr = french();
        assert_eq!(fr.locale(LocaleFormat::Raw), "fr_FR");
        assert_eq!(fr.locale(LocaleFormat::Display), "fr-FR");
    }

    #[test]
    fn test_display_flag_prefers_custom() {
        let mut fr = french();
        assert_eq!(fr.display_flag().url, "http://example.com/theme/fr_FR.png");
        fr.custom_flag = None;
        assert_eq!(fr.display_flag().url, "http://example.com/flags/fr.png");
    }

    #[test]
    fn test_with_request_scheme() {
        let fr = french();
        let secure = fr.with_request_scheme("https");
        assert_eq!(secure.home_url, "https://example.com/fr/");
        assert_eq!(secure.flag.url, "https://example.com/flags/fr.png");
        // Inlined sources are untouched.
        assert_eq!(secure.flag.src, "data:image/png;base64,AAAA");
        assert_eq!(
            secure.custom_flag.unwrap().src,
            "https://example.com/theme/fr_FR.png"
        );
        // The original is not modified.
        assert_eq!(fr.home_url, "http://example.com/fr/");
    }

    #[test]
    fn test_with_request_scheme_leaves_relative_urls() {
        let mut fr = french();
        fr.home_url = "/fr/".into();
        assert_eq!(fr.with_request_scheme("https").home_url, "/fr/");
        assert_eq!(fr.with_request_scheme("ftp").search_url, "http://example.com/fr/");
    }

    #[test]
    fn test_facet_taxonomy_names() {
        assert_eq!(LanguageFacet::Language.taxonomy(), "language");
        assert_eq!("term_language".parse::<LanguageFacet>().unwrap(), LanguageFacet::TermLanguage);
    }
}
