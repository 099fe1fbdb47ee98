//! Building languages from loosely typed data.
//!
//! Two entry points:
//!
//! - [`LanguageFactory::create`] takes a flat JSON property bag, sanitizes
//!   it into a typed [`LanguageData`] (unknown keys dropped, strings trimmed,
//!   ids coerced to positive integers, flags coerced to booleans) and builds
//!   a [`Language`]. It never fails hard: a bag without a slug or a locale
//!   yields `None`.
//! - [`LanguageFactory::create_from_facets`] merges the two stored facet
//!   terms and the JSON payload kept in the post facet's description into a
//!   flat bag, then goes through `create`.
//!
//! Strict callers use [`LanguageData::validate`] and
//! [`LanguageFactory::create_from_data`] to get the field errors instead.

use std::sync::Arc;

use polyglot_rs_core::utils::sanitize::{non_negative_int, positive_int, text, text_list, to_bool};
use polyglot_rs_core::ValidationError;
use polyglot_rs_db::Term;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::flags::{bundled_flag, custom_flag, AssetLocator, NoAssets};
use crate::language::{FacetIds, Language};
use crate::links::{DirectoryLinks, LinksModel};
use crate::locales;

/// The sanitized, typed property bag of a language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageData {
    pub name: String,
    pub slug: String,
    pub locale: String,
    pub w3c: String,
    pub facebook: String,
    pub rtl: bool,
    pub term_group: i64,
    pub flag_code: String,
    pub active: bool,
    pub fallbacks: Vec<String>,
    pub is_default: bool,
    pub term_id: i64,
    pub term_taxonomy_id: i64,
    pub count: i64,
    pub tl_term_id: i64,
    pub tl_term_taxonomy_id: i64,
    pub tl_count: i64,
}

impl Default for LanguageData {
    fn default() -> Self {
        Self {
            name: String::new(),
            slug: String::new(),
            locale: String::new(),
            w3c: String::new(),
            facebook: String::new(),
            rtl: false,
            term_group: 0,
            flag_code: String::new(),
            active: true,
            fallbacks: Vec::new(),
            is_default: false,
            term_id: 0,
            term_taxonomy_id: 0,
            count: 0,
            tl_term_id: 0,
            tl_term_taxonomy_id: 0,
            tl_count: 0,
        }
    }
}

impl LanguageData {
    /// Sanitizes a flat property bag. Unknown keys are ignored.
    pub fn sanitize(bag: &Map<String, Value>) -> Self {
        let get = |key: &str| bag.get(key).unwrap_or(&Value::Null);
        let id = |key: &str| positive_int(get(key)).unwrap_or(0);
        Self {
            name: text(get("name")),
            slug: text(get("slug")),
            locale: text(get("locale")),
            w3c: text(get("w3c")),
            facebook: text(get("facebook")),
            rtl: to_bool(get("rtl")) || to_bool(get("is_rtl")),
            term_group: non_negative_int(get("term_group")),
            flag_code: text(get("flag_code")),
            active: bag.get("active").map_or(true, to_bool),
            fallbacks: text_list(get("fallbacks")),
            is_default: to_bool(get("is_default")),
            term_id: id("term_id"),
            term_taxonomy_id: id("term_taxonomy_id"),
            count: non_negative_int(get("count")),
            tl_term_id: id("tl_term_id"),
            tl_term_taxonomy_id: id("tl_term_taxonomy_id"),
            tl_count: non_negative_int(get("tl_count")),
        }
    }

    /// Checks the fields a language cannot be meaningful without.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = ValidationError::with_field_errors(Default::default());
        if self.slug.is_empty() {
            errors.add_field_error(
                "slug",
                ValidationError::new("The language code is required.", "required"),
            );
        }
        if self.locale.is_empty() {
            errors.add_field_error(
                "locale",
                ValidationError::new("The locale is required.", "required"),
            );
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// The JSON payload stored in the description of a language's post facet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageDescription {
    pub locale: String,
    pub rtl: bool,
    pub flag_code: String,
    pub active: bool,
    pub fallbacks: Vec<String>,
}

impl Default for LanguageDescription {
    fn default() -> Self {
        Self {
            locale: String::new(),
            rtl: false,
            flag_code: String::new(),
            active: true,
            fallbacks: Vec::new(),
        }
    }
}

impl LanguageDescription {
    /// Serializes the payload for storage.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Builds [`Language`] values for one site.
#[derive(Clone)]
pub struct LanguageFactory {
    locator: Arc<dyn AssetLocator>,
    links: Arc<dyn LinksModel>,
    inline_flags: bool,
}

impl std::fmt::Debug for LanguageFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageFactory")
            .field("inline_flags", &self.inline_flags)
            .finish_non_exhaustive()
    }
}

impl LanguageFactory {
    pub fn new(locator: Arc<dyn AssetLocator>, links: Arc<dyn LinksModel>, inline_flags: bool) -> Self {
        Self {
            locator,
            links,
            inline_flags,
        }
    }

    /// A factory with no flag files and `http://localhost` URLs.
    pub fn detached() -> Self {
        Self::new(
            Arc::new(NoAssets),
            Arc::new(DirectoryLinks::new("http://localhost", true)),
            false,
        )
    }

    pub fn locator(&self) -> &Arc<dyn AssetLocator> {
        &self.locator
    }

    /// Returns a factory that computes URLs with another links model.
    #[must_use]
    pub fn with_links(&self, links: Arc<dyn LinksModel>) -> Self {
        Self {
            links,
            ..self.clone()
        }
    }

    /// Builds a language from a flat property bag.
    ///
    /// Returns `None` when `bag` is not an object or lacks a slug or locale.
    pub fn create(&self, bag: &Value) -> Option<Language> {
        let Value::Object(map) = bag else {
            tracing::debug!("language data is not an object");
            return None;
        };
        match self.create_from_data(LanguageData::sanitize(map)) {
            Ok(lang) => Some(lang),
            Err(err) => {
                tracing::debug!(error = %err, "inert language data");
                None
            }
        }
    }

    /// Builds a language from sanitized data.
    pub fn create_from_data(&self, mut data: LanguageData) -> Result<Language, ValidationError> {
        data.validate()?;
        if data.w3c.is_empty() {
            data.w3c = locales::w3c_for(&data.locale);
        }
        if data.facebook.is_empty() {
            data.facebook = locales::facebook_for(&data.locale).unwrap_or_default();
        }
        if data.name.is_empty() {
            data.name = data.slug.clone();
        }

        let flag = bundled_flag(self.locator.as_ref(), &data.flag_code, &data.name, self.inline_flags);
        let custom = custom_flag(self.locator.as_ref(), &data.locale, &data.name, self.inline_flags);

        Ok(Language {
            home_url: self.links.home_url(&data.slug, data.is_default),
            search_url: self.links.search_url(&data.slug, data.is_default),
            name: data.name,
            slug: data.slug,
            locale: data.locale,
            w3c: data.w3c,
            facebook: data.facebook,
            is_rtl: data.rtl,
            term_group: data.term_group,
            flag_code: data.flag_code,
            active: data.active,
            fallbacks: data.fallbacks,
            is_default: data.is_default,
            flag,
            custom_flag: custom,
            language: FacetIds {
                term_id: data.term_id,
                term_taxonomy_id: data.term_taxonomy_id,
                count: data.count,
            },
            term_language: FacetIds {
                term_id: data.tl_term_id,
                term_taxonomy_id: data.tl_term_taxonomy_id,
                count: data.tl_count,
            },
        })
    }

    /// Builds a language from its two stored facets.
    pub fn create_from_facets(
        &self,
        language: &Term,
        term_language: &Term,
        is_default: bool,
    ) -> Option<Language> {
        let mut bag = match serde_json::from_str::<Value>(&language.description) {
            Ok(Value::Object(map)) => map,
            _ => {
                tracing::warn!(slug = %language.slug, "language description is not a JSON object");
                Map::new()
            }
        };
        // Stored columns win over anything the payload might claim.
        bag.insert("name".into(), Value::from(language.name.as_str()));
        bag.insert("slug".into(), Value::from(language.slug.as_str()));
        bag.insert("term_group".into(), Value::from(language.term_group));
        bag.insert("term_id".into(), Value::from(language.term_id));
        bag.insert("term_taxonomy_id".into(), Value::from(language.term_taxonomy_id));
        bag.insert("count".into(), Value::from(language.count));
        bag.insert("tl_term_id".into(), Value::from(term_language.term_id));
        bag.insert("tl_term_taxonomy_id".into(), Value::from(term_language.term_taxonomy_id));
        bag.insert("tl_count".into(), Value::from(term_language.count));
        bag.insert("is_default".into(), Value::Bool(is_default));

        if let Some(locale) = bag.get("locale").and_then(Value::as_str).map(str::to_string) {
            if let Some(info) = locales::lookup(&locale) {
                bag.insert("w3c".into(), Value::from(info.w3c));
                bag.insert("facebook".into(), Value::from(info.facebook));
            }
        }
        self.create(&Value::Object(bag))
    }
}
