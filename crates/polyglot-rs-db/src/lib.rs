//! # polyglot-rs-db
//!
//! The storage substrate the multilingual engine rides on: a synchronous
//! executor over SQLite, per-site table naming, a generic classification
//! store (taxonomies, terms, object links, usage counts), a content-object
//! store, and site options.
//!
//! ## Modules
//!
//! - [`value`] - Backend-agnostic values
//! - [`row`] - Result rows and typed column access
//! - [`executor`] - The [`DbExecutor`] trait and [`atomic`] blocks
//! - [`sqlite`] - The SQLite backend
//! - [`schema`] - Per-site table names and schema installation
//! - [`taxonomy`] - Terms and object/term relationships
//! - [`content`] - Posts and post metadata
//! - [`options`] - Site options

pub mod content;
pub mod executor;
pub mod options;
pub mod row;
pub mod schema;
pub mod sqlite;
pub mod taxonomy;
pub mod value;

pub use content::{ContentStore, Post, POSTS_GROUP};
pub use executor::{atomic, DbExecutor};
pub use options::OptionsStore;
pub use row::{FromValue, Row};
pub use schema::{install, Tables};
pub use sqlite::SqliteBackend;
pub use taxonomy::{LinkMode, NewTerm, ObjectTerm, TaxonomyStore, Term, TermField, TermUpdate, TERMS_GROUP};
pub use value::Value;
