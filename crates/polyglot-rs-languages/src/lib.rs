//! # polyglot-rs-languages
//!
//! Languages of a site: the [`Language`] entity with its two storage facets,
//! the static locale table, flag resolution, the factory that turns stored
//! or loosely typed data into languages, and the per-site
//! [`LanguageRegistry`].
//!
//! ## Modules
//!
//! - [`language`] - The language entity and its facets
//! - [`locales`] - Static locale facts (W3C tag, Facebook locale, flag, direction)
//! - [`flags`] - Bundled and custom flag resolution
//! - [`links`] - Home and search URL computation
//! - [`factory`] - Sanitization and construction of languages
//! - [`registry`] - Lookup, listing, and mutation of a site's languages

pub mod factory;
pub mod flags;
pub mod language;
pub mod links;
pub mod locales;
pub mod registry;

pub use factory::{LanguageData, LanguageDescription, LanguageFactory};
pub use flags::{AssetLocator, Flag, FsAssetLocator, NoAssets};
pub use language::{
    FacetField, Language, LanguageFacet, LocaleFormat, LANGUAGE_TAXONOMY, TERM_LANGUAGE_TAXONOMY,
};
pub use links::{DirectoryLinks, LinksModel};
pub use registry::{
    DeletePolicy, LanguageEvent, LanguageKey, LanguageList, LanguageRegistry, LanguageUpdate,
    ListArgs, ListField, NewLanguage, DEFAULT_LANG_OPTION,
};
