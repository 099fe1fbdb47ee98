//! # polyglot-rs
//!
//! A multilingual content-linking engine. Sites define languages; posts and
//! terms carry at most one language each and are linked to their
//! translations through translation groups; listings can be restricted to
//! a set of languages with SQL fragments spliced into the host's queries.
//!
//! This is the meta-crate: it re-exports the sub-crates and provides the
//! [`Polyglot`] bootstrap that wires them per site.

/// Core types, settings, caching, hooks, and error types.
pub use polyglot_rs_core as core;

/// The storage substrate: SQLite executor, per-site tables, taxonomy and
/// content stores.
pub use polyglot_rs_db as db;

/// Language entities, factory, and the per-site language registry.
pub use polyglot_rs_languages as languages;

/// Translatable kinds, translation groups, and the kind registry.
pub use polyglot_rs_objects as objects;

pub mod engine;

pub use engine::{Polyglot, Site};
