//! # backoffice-db: Database Layer for the Backoffice
//!
//! This crate provides database access for the admin back office.
//! It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Backoffice Data Flow                             │
//! │                                                                         │
//! │  HTTP handler (GET /dashboard/products?search=…)                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   backoffice-db (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │   │  (embedded)  │  │   │
//! │  │   │               │    │ UserRepo       │   │ 001_init.sql │  │   │
//! │  │   │ SqlitePool    │◄───│ ProductRepo    │   │              │  │   │
//! │  │   │ Connection    │    │ RoleRepo       │   │              │  │   │
//! │  │   │ Management    │    │ PurchaseRepo   │   │              │  │   │
//! │  │   └───────────────┘    │ search (pages) │   └──────────────┘  │   │
//! │  │                        └────────────────┘                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │                     ./backoffice.db                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (user, product, role, purchase)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use backoffice_core::{search::PRODUCT_SEARCH, PageRequest, SearchTerm};
//! use backoffice_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./backoffice.db")).await?;
//!
//! let term = SearchTerm::parse(Some("Laptop"))?;
//! let page = PageRequest::first(PRODUCT_SEARCH.per_page)?;
//! let products = db.products().search(&term, &page).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::product::ProductRepository;
pub use repository::purchase::{PurchaseNavigation, PurchaseRepository};
pub use repository::role::RoleRepository;
pub use repository::user::UserRepository;
