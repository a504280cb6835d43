//! Shared application state.

use std::sync::Arc;

use backoffice_db::Database;

use crate::auth::AuthGate;
use crate::config::ServerConfig;

/// Handed to every handler through axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub auth: Arc<AuthGate>,
}

impl AppState {
    pub fn new(db: Database, auth: AuthGate) -> Self {
        AppState {
            db,
            auth: Arc::new(auth),
        }
    }

    pub fn from_config(db: Database, config: &ServerConfig) -> Self {
        AppState::new(
            db,
            AuthGate::new(
                &config.jwt_secret,
                config.jwt_lifetime_secs,
                config.login_path.clone(),
            ),
        )
    }
}
