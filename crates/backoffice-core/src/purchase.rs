//! # Purchase Rules
//!
//! Everything the purchase write path decides without the store: field
//! checks on the submitted payload, pricing of lines against a snapshot of
//! product prices, and the total.
//!
//! ## Write Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PurchaseInput (untrusted)                                              │
//! │       │                                                                 │
//! │       ▼  validate()                                                     │
//! │  PurchaseCheck ── field errors so far                                   │
//! │       │                                                                 │
//! │       │  repository adds reference failures via reject():               │
//! │       │    user_id unknown, transaction_id taken                        │
//! │       │                                                                 │
//! │       │  price_lines(lines, prices)                                     │
//! │       │    lines.N.product_id unknown / duplicated                      │
//! │       │    lines.N.quantity < 1 / subtotal overflow                     │
//! │       ▼                                                                 │
//! │  finish() ──► PurchaseRecord (all checks passed)                        │
//! │               or every collected ValidationError at once                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{ValidationError, ValidationErrors};
use crate::money::Money;
use crate::types::{PaymentMethod, PurchaseStatus};
use crate::validation::{
    parse_payment_method, parse_status, validate_quantity, validate_transaction_id,
};

// =============================================================================
// Input
// =============================================================================

/// A purchase create/update payload as submitted by the form.
///
/// Every field is optional at the type level so that a missing field is
/// reported as a validation failure instead of a decoding error.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseInput {
    /// Also accepts a numeric string; `""` and `null` read as absent.
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub user_id: Option<i64>,
    pub status: Option<String>,
    pub payment_method: Option<String>,
    pub transaction_id: Option<String>,
    pub notes: Option<String>,
    /// `None` on update leaves the existing lines untouched.
    pub lines: Option<Vec<LineInput>>,
}

/// One requested line: which product and how many.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineInput {
    pub product_id: i64,
    pub quantity: i64,
}

/// Reads an id from a JSON number or a form string.
fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct OptionalIdVisitor;

    impl<'de> Visitor<'de> for OptionalIdVisitor {
        type Value = Option<i64>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("an integer id, a numeric string, or nothing")
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            deserializer.deserialize_any(self)
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            i64::try_from(value)
                .map(Some)
                .map_err(|_| E::custom("must be an integer"))
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            let value = value.trim();
            if value.is_empty() {
                return Ok(None);
            }
            value
                .parse::<i64>()
                .map(Some)
                .map_err(|_| E::custom("must be an integer"))
        }
    }

    deserializer.deserialize_any(OptionalIdVisitor)
}

impl PurchaseInput {
    /// Runs the checks that need no store access.
    pub fn validate(&self) -> PurchaseCheck {
        let mut errors = ValidationErrors::new();

        let user_id = match self.user_id {
            Some(id) => Some(id),
            None => {
                errors.push(ValidationError::Required {
                    field: "user_id".to_string(),
                });
                None
            }
        };

        let status = parse_status(self.status.as_deref())
            .map_err(|e| errors.push(e))
            .ok();
        let payment_method = parse_payment_method(self.payment_method.as_deref())
            .map_err(|e| errors.push(e))
            .ok();
        let transaction_id = validate_transaction_id(self.transaction_id.as_deref().unwrap_or(""))
            .map_err(|e| errors.push(e))
            .ok();

        let notes = self
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        PurchaseCheck {
            user_id,
            status,
            payment_method,
            transaction_id,
            notes,
            errors,
        }
    }
}

// =============================================================================
// Check
// =============================================================================

/// Fields that passed their own checks, plus every failure recorded so far.
#[derive(Debug, Clone)]
pub struct PurchaseCheck {
    user_id: Option<i64>,
    status: Option<PurchaseStatus>,
    payment_method: Option<PaymentMethod>,
    transaction_id: Option<String>,
    notes: Option<String>,
    errors: ValidationErrors,
}

impl PurchaseCheck {
    /// The user id, if one was supplied. Existence is the caller's check.
    pub fn user_id(&self) -> Option<i64> {
        self.user_id
    }

    /// The trimmed transaction id, if it is well-formed.
    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }

    /// Records a failure found outside this module.
    pub fn reject(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn merge(&mut self, errors: ValidationErrors) {
        self.errors.merge(errors);
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Succeeds only when no failure of any kind was recorded.
    pub fn finish(self) -> Result<PurchaseRecord, ValidationErrors> {
        match (
            self.errors.is_empty(),
            self.user_id,
            self.status,
            self.payment_method,
            self.transaction_id,
        ) {
            (true, Some(user_id), Some(status), Some(payment_method), Some(transaction_id)) => {
                Ok(PurchaseRecord {
                    user_id,
                    status,
                    payment_method,
                    transaction_id,
                    notes: self.notes,
                })
            }
            _ => Err(self.errors),
        }
    }
}

/// The purchase header fields, fully validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseRecord {
    pub user_id: i64,
    pub status: PurchaseStatus,
    pub payment_method: PaymentMethod,
    pub transaction_id: String,
    pub notes: Option<String>,
}

impl PurchaseRecord {
    /// Folded text the listing search matches against.
    pub fn search_text(&self) -> String {
        crate::search::search_text([
            Some(self.transaction_id.as_str()),
            Some(self.status.as_str()),
            Some(self.payment_method.as_str()),
            self.notes.as_deref(),
        ])
    }
}

// =============================================================================
// Pricing
// =============================================================================

/// A line with its price snapshot and subtotal, ready to persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: i64,
    pub quantity: i64,
    pub price: Money,
    pub subtotal: Money,
}

/// Prices every line against `prices` (product id → current price).
///
/// A product missing from `prices` does not exist. All failures are
/// reported together, keyed `lines.<index>.<field>`.
///
/// ```rust
/// use std::collections::HashMap;
/// use backoffice_core::money::Money;
/// use backoffice_core::purchase::{price_lines, LineInput};
///
/// let prices = HashMap::from([(7, Money::from_cents(299))]);
/// let priced = price_lines(&[LineInput { product_id: 7, quantity: 3 }], &prices).unwrap();
/// assert_eq!(priced[0].subtotal, Money::from_cents(897));
///
/// let errors = price_lines(&[LineInput { product_id: 8, quantity: 0 }], &prices).unwrap_err();
/// assert!(errors.has_field("lines.0.product_id"));
/// assert!(errors.has_field("lines.0.quantity"));
/// ```
pub fn price_lines(
    lines: &[LineInput],
    prices: &HashMap<i64, Money>,
) -> Result<Vec<PricedLine>, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let mut seen = HashSet::with_capacity(lines.len());
    let mut priced = Vec::with_capacity(lines.len());

    for (index, line) in lines.iter().enumerate() {
        let product_field = format!("lines.{index}.product_id");
        let quantity_field = format!("lines.{index}.quantity");

        if !seen.insert(line.product_id) {
            errors.push(ValidationError::Duplicate {
                field: product_field.clone(),
                value: line.product_id.to_string(),
            });
        }

        let quantity_ok = validate_quantity(&quantity_field, line.quantity)
            .map_err(|e| errors.push(e))
            .is_ok();

        let Some(&price) = prices.get(&line.product_id) else {
            errors.push(ValidationError::UnknownReference {
                field: product_field,
                value: line.product_id.to_string(),
            });
            continue;
        };

        if !quantity_ok {
            continue;
        }

        match price.checked_multiply_quantity(line.quantity) {
            Some(subtotal) => priced.push(PricedLine {
                product_id: line.product_id,
                quantity: line.quantity,
                price,
                subtotal,
            }),
            None => errors.push(ValidationError::OutOfRange {
                field: quantity_field,
                min: 1,
                max: i64::MAX / price.cents().max(1),
            }),
        }
    }

    errors.into_result(priced)
}

/// Σ subtotal, zero for no lines.
pub fn total_of(lines: &[PricedLine]) -> Result<Money, ValidationError> {
    lines
        .iter()
        .try_fold(Money::zero(), |acc, line| acc.checked_add(line.subtotal))
        .ok_or_else(|| ValidationError::InvalidFormat {
            field: "lines".to_string(),
            reason: "total amount is too large".to_string(),
        })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> PurchaseInput {
        PurchaseInput {
            user_id: Some(1),
            status: Some("completed".to_string()),
            payment_method: Some("credit_card".to_string()),
            transaction_id: Some(" tx1 ".to_string()),
            notes: Some("   ".to_string()),
            lines: None,
        }
    }

    #[test]
    fn test_user_id_accepts_blank_and_numeric_strings() {
        let blank: PurchaseInput = serde_json::from_str(r#"{"user_id":""}"#).unwrap();
        assert_eq!(blank.user_id, None);
        let errors = blank.validate().finish().unwrap_err();
        assert!(errors.has_field("user_id"));

        let numeric: PurchaseInput = serde_json::from_str(r#"{"user_id":" 42 "}"#).unwrap();
        assert_eq!(numeric.user_id, Some(42));

        let number: PurchaseInput = serde_json::from_str(r#"{"user_id":7}"#).unwrap();
        assert_eq!(number.user_id, Some(7));

        let absent: PurchaseInput = serde_json::from_str(r#"{"user_id":null}"#).unwrap();
        assert_eq!(absent.user_id, None);
        let missing: PurchaseInput = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.user_id, None);

        let err = serde_json::from_str::<PurchaseInput>(r#"{"user_id":"abc"}"#).unwrap_err();
        assert!(err.to_string().contains("must be an integer"));
    }

    #[test]
    fn test_valid_input_finishes() {
        let record = valid_input().validate().finish().unwrap();
        assert_eq!(record.user_id, 1);
        assert_eq!(record.status, PurchaseStatus::Completed);
        assert_eq!(record.payment_method, PaymentMethod::CreditCard);
        assert_eq!(record.transaction_id, "tx1");
        assert_eq!(record.notes, None);
    }

    #[test]
    fn test_all_field_failures_collected() {
        let input = PurchaseInput {
            user_id: None,
            status: Some("invalid_status".to_string()),
            payment_method: Some("invalid_method".to_string()),
            transaction_id: None,
            notes: None,
            lines: None,
        };

        let check = input.validate();
        let errors = check.errors();
        assert_eq!(errors.len(), 4);
        for field in ["user_id", "status", "payment_method", "transaction_id"] {
            assert!(errors.has_field(field), "missing {field}");
        }
        assert!(check.finish().is_err());
    }

    #[test]
    fn test_reject_blocks_finish() {
        let mut check = valid_input().validate();
        assert_eq!(check.transaction_id(), Some("tx1"));

        check.reject(ValidationError::Duplicate {
            field: "transaction_id".to_string(),
            value: "tx1".to_string(),
        });
        let errors = check.finish().unwrap_err();
        assert!(errors.has_field("transaction_id"));
    }

    #[test]
    fn test_price_lines_snapshot_and_total() {
        let prices = HashMap::from([(1, Money::from_cents(1000)), (2, Money::from_cents(500))]);
        let lines = [
            LineInput { product_id: 1, quantity: 2 },
            LineInput { product_id: 2, quantity: 1 },
        ];

        let priced = price_lines(&lines, &prices).unwrap();
        assert_eq!(priced[0].price, Money::from_cents(1000));
        assert_eq!(priced[0].subtotal, Money::from_cents(2000));
        assert_eq!(priced[1].subtotal, Money::from_cents(500));
        assert_eq!(total_of(&priced).unwrap(), Money::from_cents(2500));
    }

    #[test]
    fn test_empty_lines_total_zero() {
        let priced = price_lines(&[], &HashMap::new()).unwrap();
        assert!(priced.is_empty());
        assert_eq!(total_of(&priced).unwrap(), Money::zero());
    }

    #[test]
    fn test_duplicate_product_rejected() {
        let prices = HashMap::from([(1, Money::from_cents(1000))]);
        let lines = [
            LineInput { product_id: 1, quantity: 1 },
            LineInput { product_id: 1, quantity: 2 },
        ];

        let errors = price_lines(&lines, &prices).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.has_field("lines.1.product_id"));
    }

    #[test]
    fn test_subtotal_overflow_rejected() {
        let prices = HashMap::from([(1, Money::from_cents(i64::MAX / 2))]);
        let errors = price_lines(&[LineInput { product_id: 1, quantity: 3 }], &prices).unwrap_err();
        assert!(errors.has_field("lines.0.quantity"));
    }

    #[test]
    fn test_total_overflow_rejected() {
        let big = PricedLine {
            product_id: 1,
            quantity: 1,
            price: Money::from_cents(i64::MAX),
            subtotal: Money::from_cents(i64::MAX),
        };
        let err = total_of(&[big, PricedLine { product_id: 2, ..big }]).unwrap_err();
        assert_eq!(err.field(), "lines");
    }
}
