//! # Backoffice Admin Server
//!
//! JSON dashboard over the backoffice database.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Admin Server Routes                            │
//! │                                                                         │
//! │  Public                         /dashboard (bearer token required)     │
//! │  ┌────────────────┐             ┌────────────────────────────────────┐ │
//! │  │ GET /          │             │ GET  /users      search + page     │ │
//! │  │ GET /health    │             │ GET  /products   search + page     │ │
//! │  └────────────────┘             │ GET  /purchases  search + page     │ │
//! │                                 │ POST /purchases                    │ │
//! │                                 │ GET|PUT|DELETE /purchases/{id}     │ │
//! │                                 └────────────────────────────────────┘ │
//! │                                        │ no token                      │
//! │                                        ▼                               │
//! │                                 303 ──► login path                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `BACKOFFICE_HTTP_PORT` - HTTP port (default: 8080)
//! - `BACKOFFICE_BIND_ADDR` - Bind address (default: 0.0.0.0)
//! - `BACKOFFICE_DB_PATH` - SQLite file (default: ./backoffice.db)
//! - `BACKOFFICE_DB_MAX_CONNECTIONS` - Pool size (default: 5)
//! - `BACKOFFICE_JWT_SECRET` - Secret for HS256 tokens
//! - `BACKOFFICE_JWT_LIFETIME_SECS` - Token lifetime (default: 3600)
//! - `BACKOFFICE_LOGIN_PATH` - Redirect target for anonymous requests (default: /login)

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod state;

use axum::middleware;
use axum::routing::get;
use axum::Router;

use crate::handlers::{health, products, purchases, users};

// Re-exports
pub use auth::AuthGate;
pub use config::{ConfigError, ServerConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use extract::Payload;
pub use state::AppState;

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    let dashboard = Router::new()
        .route("/users", get(users::list))
        .route("/products", get(products::list))
        .route("/purchases", get(purchases::list).post(purchases::create))
        .route(
            "/purchases/{id}",
            get(purchases::show)
                .put(purchases::update)
                .delete(purchases::destroy),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .route("/", get(health::landing))
        .route("/health", get(health::health))
        .nest("/dashboard", dashboard)
        .with_state(state)
}
