//! # polyglot-rs-objects
//!
//! Translatable content kinds. Every kind (posts, terms) links its objects
//! to at most one language and groups mutual translations together; the
//! shared behavior lives in the [`Translatable`] and [`Translated`] traits
//! and each kind only supplies its storage facts.
//!
//! ## Modules
//!
//! - [`kind`] - Static description of a kind
//! - [`context`] - The site services a kind works against
//! - [`translatable`] - Language links, listing predicates, mass assignment
//! - [`translated`] - Translation groups
//! - [`group`] - Group payload parsing
//! - [`filter`] - Language filters for listings
//! - [`post`] - Posts, pages, and media
//! - [`term`] - Terms of translated taxonomies
//! - [`registry`] - The kinds of a site, by name
//! - [`permissions`] - Capability checks

pub mod context;
pub mod filter;
pub mod group;
pub mod kind;
pub mod permissions;
pub mod post;
pub mod registry;
pub mod term;
pub mod translatable;
pub mod translated;

pub use context::{ObjectCaches, ObjectContext, TranslationsSaved};
pub use filter::LanguageFilter;
pub use group::TranslationGroup;
pub use kind::{KindDescriptor, KindTable, POST_TRANSLATIONS_TAXONOMY, TERM_TRANSLATIONS_TAXONOMY};
pub use permissions::{AllowAll, GrantedPermissions, PermissionChecker};
pub use post::{TranslatedPost, ATTACHMENT};
pub use registry::ObjectRegistry;
pub use term::{TermInsertContext, TranslatedTerm};
pub use translatable::{Translatable, JOIN_ALIAS};
pub use translated::{Translated, Translations, GROUP_NAME_PREFIX};
