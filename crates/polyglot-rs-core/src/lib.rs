//! # polyglot-rs-core
//!
//! Core types, settings, caching, and error types for the polyglot-rs engine.
//! This crate has no engine dependencies and provides the foundation for all other crates.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Engine settings
//! - [`settings_loader`] - Loading settings from TOML, JSON, and the environment
//! - [`logging`] - Tracing-based logging integration
//! - [`cache`] - Per-site in-memory cache and last-changed tokens
//! - [`hooks`] - Signals and filter chains
//! - [`utils`] - Sanitization helpers

pub mod cache;
pub mod error;
pub mod hooks;
pub mod logging;
pub mod settings;
pub mod settings_loader;
pub mod utils;

/// Identifier of a site (tenant) in a multi-site installation.
pub type SiteId = u64;

/// The site used when an installation is not multi-site.
pub const MAIN_SITE: SiteId = 1;

// Re-export the most commonly used types at the crate root.
pub use cache::{unique_key, LastChanged, TenantCache};
pub use error::{PolyglotError, PolyglotResult, ValidationError};
pub use settings::Settings;
