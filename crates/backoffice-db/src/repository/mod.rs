//! # Repository Module
//!
//! Database repository implementations for the Backoffice.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.purchases().create(&input)                                 │
//! │       ▼                                                                 │
//! │  PurchaseRepository                                                    │
//! │  ├── search(&self, term, page)      → Page<PurchaseDetail>             │
//! │  ├── show(&self, id)                → detail + prev/next position      │
//! │  ├── create / update / delete       → one transaction each             │
//! │  └── attach / detach                → line change + total refresh      │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`UserRepository`](user::UserRepository) - Users
//! - [`ProductRepository`](product::ProductRepository) - Product catalogue
//! - [`RoleRepository`](role::RoleRepository) - Roles and user assignments
//! - [`PurchaseRepository`](purchase::PurchaseRepository) - Purchases and lines

pub mod product;
pub mod purchase;
pub mod role;
pub(crate) mod search;
pub mod user;
