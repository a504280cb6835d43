//! Dashboard request handlers.
//!
//! Reads answer with JSON, writes answer with a 303 redirect to the page
//! showing the result.

pub mod health;
pub mod products;
pub mod purchases;
pub mod users;

use serde::Deserialize;

/// `?search=&page=` as sent by the listing forms.
///
/// Kept as raw strings so that `page=abc` reaches the pagination parser and
/// is reported as an invalid argument rather than a decoding failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub page: Option<String>,
}
