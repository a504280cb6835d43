//! # Error Types
//!
//! Domain-specific error types for backoffice-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  backoffice-core errors (this file)                                    │
//! │  ├── ValidationError   - One field failed one constraint               │
//! │  ├── ValidationErrors  - Every field failure of one request            │
//! │  └── CoreError         - Validation or malformed arguments             │
//! │                                                                         │
//! │  backoffice-db errors (separate crate)                                 │
//! │  └── DbError           - Database operation failures                   │
//! │                                                                         │
//! │  admin-server errors (in app)                                          │
//! │  └── ApiError          - What the HTTP client sees                     │
//! │                                                                         │
//! │  Flow: ValidationError → ValidationErrors → DbError → ApiError         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Every validation failure is keyed by the input field it concerns
//! 3. Errors are enum variants, never String
//! 4. A request reports all of its field failures at once

use std::collections::BTreeMap;

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A request parameter could not be interpreted (e.g. `page=abc`).
    ///
    /// ## When This Occurs
    /// - Non-numeric, zero or negative page numbers
    /// - Page sizes outside `1..=MAX_PAGE_SIZE`
    #[error("Invalid argument {name}: {reason}")]
    InvalidArgument { name: String, reason: String },

    /// Input failed one or more declared constraints.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),
}

impl CoreError {
    /// Creates an InvalidArgument error.
    pub fn invalid_argument(name: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::InvalidArgument {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

impl From<ValidationError> for CoreError {
    fn from(err: ValidationError) -> Self {
        CoreError::Validation(err.into())
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// A single field-level validation failure.
///
/// `field` uses the request's own naming, with line items addressed as
/// `lines.<index>.<field>` so a form can place the message next to the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be at least 1")]
    MustBePositive { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g. an email without `@`).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in the allowed set.
    #[error("{field} must be one of: {}", .allowed.join(", "))]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g. a transaction id already in use).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },

    /// Referenced record does not exist (e.g. an unknown user id).
    #[error("selected {field} '{value}' does not exist")]
    UnknownReference { field: String, value: String },
}

impl ValidationError {
    /// Returns the name of the field this error is about.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. }
            | ValidationError::Duplicate { field, .. }
            | ValidationError::UnknownReference { field, .. } => field,
        }
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// All field failures collected while validating one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{}", summarize(.errors))]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    /// Creates an empty collection.
    pub fn new() -> Self {
        ValidationErrors::default()
    }

    /// Records a failure.
    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Appends every failure of `other`.
    pub fn merge(&mut self, other: ValidationErrors) {
        self.errors.extend(other.errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }

    /// Whether any failure concerns `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field() == field)
    }

    /// Groups messages by field, the shape forms render next to inputs.
    ///
    /// ```rust
    /// use backoffice_core::{ValidationError, ValidationErrors};
    ///
    /// let mut errors = ValidationErrors::new();
    /// errors.push(ValidationError::Required { field: "status".into() });
    ///
    /// let map = errors.field_messages();
    /// assert_eq!(map["status"], vec!["status is required".to_string()]);
    /// ```
    pub fn field_messages(&self) -> BTreeMap<String, Vec<String>> {
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for error in &self.errors {
            map.entry(error.field().to_string())
                .or_default()
                .push(error.to_string());
        }
        map
    }

    /// Returns `Ok(value)` when nothing was recorded, `Err(self)` otherwise.
    pub fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        ValidationErrors {
            errors: vec![error],
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
