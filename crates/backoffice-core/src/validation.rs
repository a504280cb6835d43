//! # Validation Module
//!
//! Field validators shared by the repositories and the HTTP layer.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Request decoding (axum extractors)                           │
//! │  └── Type validation (deserialization)                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE + purchase::PurchaseInput::validate              │
//! │  └── Pure field rules, every failure collected                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Repositories (backoffice-db)                                 │
//! │  └── Reference checks: user exists, product exists, txn id unused      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 4: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE constraints                                                │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validators that normalise their input return the normalised value.

use crate::error::ValidationError;
use crate::types::{PaymentMethod, PurchaseStatus};
use crate::{MAX_SEARCH_LENGTH, MAX_TRANSACTION_ID_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

fn required_trimmed<'a>(field: &str, value: &'a str, max: usize) -> ValidationResult<&'a str> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value)
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use backoffice_core::validation::validate_sku;
///
/// assert!(validate_sku("LAP-0001").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("A".repeat(100).as_str()).is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = required_trimmed("sku", sku, 50)?;

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name (1..=255 characters).
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    required_trimmed("name", name, 255).map(|_| ())
}

/// Validates a user's display name (1..=255 characters).
pub fn validate_user_name(name: &str) -> ValidationResult<()> {
    required_trimmed("name", name, 255).map(|_| ())
}

/// Validates an email address and returns it lowercased.
///
/// Only the shape `local@domain.tld` is checked. Deliverability is not.
///
/// ```rust
/// use backoffice_core::validation::validate_email;
///
/// assert_eq!(validate_email(" Test@Example.com ").unwrap(), "test@example.com");
/// assert!(validate_email("not-an-email").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<String> {
    let email = required_trimmed("email", email, 255)?;

    let invalid = || ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: "must be a valid email address".to_string(),
    };

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || email.chars().any(char::is_whitespace)
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(invalid());
    }

    Ok(email.to_lowercase())
}

/// Validates a purchase transaction identifier and returns it trimmed.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most [`MAX_TRANSACTION_ID_LENGTH`] characters
///
/// Uniqueness needs the store and is checked by the purchase repository.
pub fn validate_transaction_id(transaction_id: &str) -> ValidationResult<String> {
    required_trimmed("transaction_id", transaction_id, MAX_TRANSACTION_ID_LENGTH)
        .map(str::to_string)
}

/// Validates a free-text search query.
///
/// ## Rules
/// - Can be empty (no filter)
/// - At most [`MAX_SEARCH_LENGTH`] characters
/// - No control characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > MAX_SEARCH_LENGTH {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: MAX_SEARCH_LENGTH,
        });
    }

    if query.chars().any(char::is_control) {
        return Err(ValidationError::InvalidFormat {
            field: "search".to_string(),
            reason: "must not contain control characters".to_string(),
        });
    }

    Ok(query.to_string())
}

/// Parses a purchase status, reporting a missing value as `Required`.
pub fn parse_status(raw: Option<&str>) -> ValidationResult<PurchaseStatus> {
    match raw.map(str::trim) {
        None | Some("") => Err(ValidationError::Required {
            field: "status".to_string(),
        }),
        Some(value) => value.parse(),
    }
}

/// Parses a payment method, reporting a missing value as `Required`.
pub fn parse_payment_method(raw: Option<&str>) -> ValidationResult<PaymentMethod> {
    match raw.map(str::trim) {
        None | Some("") => Err(ValidationError::Required {
            field: "payment_method".to_string(),
        }),
        Some(value) => value.parse(),
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity for the field `field` (e.g. `lines.0.quantity`).
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Purchase form: line row                                                │
/// │                                                                         │
/// │  Staff enters quantity: 0                                              │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity("lines.0.quantity", 0) ← THIS FUNCTION              │
/// │       │                                                                 │
/// │       ├── qty < 1? → "lines.0.quantity must be at least 1"             │
/// │       │                                                                 │
/// │       └── OK → product lookup and price snapshot                       │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(field: &str, qty: i64) -> ValidationResult<()> {
    if qty < 1 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items)
///
/// ## Example
/// ```rust
/// use backoffice_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a stock level (non-negative).
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
