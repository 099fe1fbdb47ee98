//! Utility functions for the polyglot-rs engine.
//!
//! - [`sanitize`]: coercion of loosely typed input (ids, flags, text) into
//!   the strict values the engine works with.
//! - [`text`]: string helpers (slugify, tag stripping).

pub mod sanitize;
pub mod text;
