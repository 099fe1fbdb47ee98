//! Language filter input for `where_clause`.

use std::sync::Arc;

use polyglot_rs_core::PolyglotResult;
use polyglot_rs_languages::{Language, LanguageKey, LanguageRegistry};

/// The languages a listing is restricted to.
///
/// Built from a language, a list of slugs, or a comma-joined string of
/// slugs as it comes from a query string.
///
/// # Examples
///
/// ```
/// use polyglot_rs_objects::filter::LanguageFilter;
///
/// let filter = LanguageFilter::from("en, fr,,de");
/// assert_eq!(filter, LanguageFilter::Codes(vec!["en".into(), "fr".into(), "de".into()]));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageFilter {
    Languages(Vec<Arc<Language>>),
    Codes(Vec<String>),
}

impl From<&str> for LanguageFilter {
    fn from(value: &str) -> Self {
        Self::Codes(
            value
                .split(',')
                .map(str::trim)
                .filter(|code| !code.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }
}

impl From<&[&str]> for LanguageFilter {
    fn from(codes: &[&str]) -> Self {
        Self::Codes(codes.iter().map(|code| code.trim().to_string()).collect())
    }
}

impl From<Vec<String>> for LanguageFilter {
    fn from(codes: Vec<String>) -> Self {
        Self::Codes(codes)
    }
}

impl From<&Arc<Language>> for LanguageFilter {
    fn from(lang: &Arc<Language>) -> Self {
        Self::Languages(vec![Arc::clone(lang)])
    }
}

impl From<Vec<Arc<Language>>> for LanguageFilter {
    fn from(langs: Vec<Arc<Language>>) -> Self {
        Self::Languages(langs)
    }
}

impl LanguageFilter {
    /// Resolves the filter to the registry's current languages. Languages
    /// are looked up again by id, so one deleted since it was read is
    /// dropped like an unknown code. Duplicates are removed.
    pub fn resolve(&self, registry: &LanguageRegistry) -> PolyglotResult<Vec<Arc<Language>>> {
        let keys: Vec<LanguageKey> = match self {
            Self::Languages(langs) => langs.iter().map(LanguageKey::from).collect(),
            Self::Codes(codes) => codes.iter().map(|code| LanguageKey::from(code.as_str())).collect(),
        };
        let mut out: Vec<Arc<Language>> = Vec::new();
        for key in keys {
            match registry.get(key.clone())? {
                Some(lang) => {
                    if !out.iter().any(|known| known.slug == lang.slug) {
                        out.push(lang);
                    }
                }
                None => tracing::debug!(key = %key, "unknown language in filter"),
            }
        }
        Ok(out)
    }
}
