//! Core error types for the polyglot-rs engine.
//!
//! This module provides the error enum [`PolyglotError`] covering storage
//! errors, validation errors, configuration errors, and misuse of the
//! language accessors. Data-layer oddities (bad ids, unknown languages) are
//! not errors: callers coerce them to neutral values before they get here.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// Represents a validation error with optional field-level errors.
///
/// Validation errors can be either simple (a single message) or compound
/// (containing per-field error lists).
///
/// # Examples
///
/// ```
/// use polyglot_rs_core::error::ValidationError;
///
/// // Simple validation error
/// let err = ValidationError::new("The language code must be unique.", "slug_exists");
///
/// // Field-level validation errors
/// let mut field_errors = std::collections::HashMap::new();
/// field_errors.insert(
///     "locale".to_string(),
///     vec![ValidationError::new("Enter a valid WordPress locale.", "invalid_locale")],
/// );
/// let err = ValidationError::with_field_errors(field_errors);
/// ```
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The primary error message.
    pub message: String,
    /// A short code identifying the type of validation failure (e.g. "required", "invalid").
    pub code: String,
    /// Additional parameters providing context for the error message.
    pub params: HashMap<String, String>,
    /// Per-field validation errors, keyed by field name.
    pub field_errors: HashMap<String, Vec<Self>>,
}

impl ValidationError {
    /// Creates a new `ValidationError` with a message and code.
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            params: HashMap::new(),
            field_errors: HashMap::new(),
        }
    }

    /// Creates a `ValidationError` containing per-field errors.
    pub fn with_field_errors(field_errors: HashMap<String, Vec<Self>>) -> Self {
        Self {
            message: String::new(),
            code: String::new(),
            params: HashMap::new(),
            field_errors,
        }
    }

    /// Adds a parameter to this validation error.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Records an error against a field.
    pub fn add_field_error(&mut self, field: impl Into<String>, error: Self) {
        self.field_errors.entry(field.into()).or_default().push(error);
    }

    /// Returns `true` if neither a message nor any field error is present.
    pub fn is_empty(&self) -> bool {
        self.message.is_empty() && self.field_errors.is_empty()
    }

    /// Returns `true` if the given field has at least one error.
    pub fn has_field(&self, field: &str) -> bool {
        self.field_errors.get(field).is_some_and(|errors| !errors.is_empty())
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.message.is_empty() {
            write!(f, "{}", self.message)?;
        } else if !self.field_errors.is_empty() {
            let mut fields: Vec<_> = self.field_errors.iter().collect();
            fields.sort_by(|a, b| a.0.cmp(b.0));
            let mut first = true;
            for (field, errors) in fields {
                for error in errors {
                    if !first {
                        write!(f, "; ")?;
                    }
                    write!(f, "{field}: {error}")?;
                    first = false;
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// The primary error type for the polyglot-rs engine.
#[derive(Error, Debug)]
pub enum PolyglotError {
    // ── Storage errors ───────────────────────────────────────────────

    /// Raised when a query expected exactly one result but found none.
    #[error("Object does not exist: {0}")]
    DoesNotExist(String),

    /// Raised when a query expected exactly one result but found multiple.
    #[error("Multiple objects returned when one expected: {0}")]
    MultipleObjectsReturned(String),

    /// A generic database error.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// A database integrity constraint was violated.
    #[error("Integrity error: {0}")]
    IntegrityError(String),

    /// An operational database error (connection failure, etc.).
    #[error("Operational error: {0}")]
    OperationalError(String),

    // ── Domain ───────────────────────────────────────────────────────

    /// One or more fields failed validation.
    #[error("Validation error: {0}")]
    ValidationError(ValidationError),

    /// An accessor was called with an unknown facet or field name.
    #[error("Domain error: {0}")]
    DomainError(String),

    /// The operation conflicts with existing data (e.g. deleting a language still in use).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The current user is not allowed to perform the operation.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The engine is improperly configured.
    #[error("Improperly configured: {0}")]
    ImproperlyConfigured(String),

    // ── Serialization ────────────────────────────────────────────────

    /// An error occurred during serialization or deserialization.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl PolyglotError {
    /// Returns a short, stable machine code for this error.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::DoesNotExist(_) => "does_not_exist",
            Self::MultipleObjectsReturned(_) => "multiple_objects",
            Self::DatabaseError(_) => "db_error",
            Self::IntegrityError(_) => "integrity",
            Self::OperationalError(_) => "operational",
            Self::ValidationError(_) => "validation",
            Self::DomainError(_) => "domain",
            Self::Conflict(_) => "conflict",
            Self::PermissionDenied(_) => "permission_denied",
            Self::ConfigurationError(_) => "configuration",
            Self::ImproperlyConfigured(_) => "improperly_configured",
            Self::SerializationError(_) => "serialization",
            Self::IoError(_) => "io",
        }
    }

    /// Returns `true` for errors raised by the storage layer.
    pub const fn is_storage_error(&self) -> bool {
        matches!(
            self,
            Self::DoesNotExist(_)
                | Self::MultipleObjectsReturned(_)
                | Self::DatabaseError(_)
                | Self::IntegrityError(_)
                | Self::OperationalError(_)
        )
    }
}

impl From<ValidationError> for PolyglotError {
    fn from(err: ValidationError) -> Self {
        Self::ValidationError(err)
    }
}

impl From<serde_json::Error> for PolyglotError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

/// A convenience type alias for `Result<T, PolyglotError>`.
pub type PolyglotResult<T> = Result<T, PolyglotError>;
