//! # backoffice-core: Pure Domain Logic for the Backoffice
//!
//! This crate holds every rule of the admin back office that can be expressed
//! without touching a database: entity types, money arithmetic, input
//! validation, the description of a search/page request, purchase line
//! pricing and record navigation.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Backoffice Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Web frontend (external)                         │   │
//! │  │    Users list ──► Products list ──► Purchases ──► Purchase form │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP / JSON                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    admin-server (axum)                          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ backoffice-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌──────────┐ ┌────────┐ │   │
//! │  │   │  types  │ │  money  │ │  search  │ │ purchase │ │  nav   │ │   │
//! │  │   └─────────┘ └─────────┘ └──────────┘ └──────────┘ └────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 backoffice-db (Database Layer)                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain entities (User, Product, Role, Purchase, PurchaseLine)
//! - [`money`] - Money type with integer cents
//! - [`error`] - Domain error types
//! - [`validation`] - Field validators
//! - [`search`] - Search specifications, page requests and result pages
//! - [`purchase`] - Purchase input validation and line pricing
//! - [`navigation`] - Previous/next position of a record
//!
//! ## Example Usage
//!
//! ```rust
//! use backoffice_core::money::Money;
//! use backoffice_core::purchase::{price_lines, total_of, LineInput};
//! use std::collections::HashMap;
//!
//! let prices = HashMap::from([(1, Money::from_cents(1000)), (2, Money::from_cents(500))]);
//! let lines = vec![
//!     LineInput { product_id: 1, quantity: 2 },
//!     LineInput { product_id: 2, quantity: 1 },
//! ];
//!
//! let priced = price_lines(&lines, &prices).unwrap();
//! assert_eq!(total_of(&priced).unwrap(), Money::from_cents(2500));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod navigation;
pub mod purchase;
pub mod search;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError, ValidationErrors};
pub use money::Money;
pub use navigation::Position;
pub use search::{Page, PageRequest, SearchSpec, SearchTerm};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Page size of the user and product listings.
pub const DEFAULT_PAGE_SIZE: u32 = 15;

/// Page size of the purchase listing.
pub const PURCHASE_PAGE_SIZE: u32 = 10;

/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Longest accepted free-text search term, in characters.
pub const MAX_SEARCH_LENGTH: usize = 100;

/// Longest accepted purchase transaction identifier.
pub const MAX_TRANSACTION_ID_LENGTH: usize = 255;
