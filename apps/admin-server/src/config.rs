//! Admin server configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::str::FromStr;

use backoffice_db::DbConfig;

/// Admin server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP port
    pub http_port: u16,

    /// Address to bind (default: 0.0.0.0)
    pub bind_addr: String,

    /// SQLite database file
    pub db_path: String,

    /// Pool size
    pub db_max_connections: u32,

    /// Secret for HS256 bearer tokens
    pub jwt_secret: String,

    /// Token lifetime in seconds
    pub jwt_lifetime_secs: i64,

    /// Where unauthenticated dashboard requests are sent
    pub login_path: String,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ServerConfig {
            http_port: parse_var("BACKOFFICE_HTTP_PORT", "8080")?,

            bind_addr: env::var("BACKOFFICE_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".to_string()),

            db_path: env::var("BACKOFFICE_DB_PATH")
                .unwrap_or_else(|_| "./backoffice.db".to_string()),

            db_max_connections: parse_var("BACKOFFICE_DB_MAX_CONNECTIONS", "5")?,

            // Must be set outside development
            jwt_secret: env::var("BACKOFFICE_JWT_SECRET")
                .unwrap_or_else(|_| "backoffice-dev-secret-change-in-production".to_string()),

            jwt_lifetime_secs: parse_var("BACKOFFICE_JWT_LIFETIME_SECS", "3600")?,

            login_path: env::var("BACKOFFICE_LOGIN_PATH").unwrap_or_else(|_| "/login".to_string()),
        };

        if config.jwt_secret.is_empty() {
            return Err(ConfigError::MissingRequired("BACKOFFICE_JWT_SECRET".to_string()));
        }
        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "BACKOFFICE_DB_MAX_CONNECTIONS".to_string(),
            ));
        }

        Ok(config)
    }

    /// Returns the full bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.http_port)
    }

    /// Pool configuration for [`backoffice_db::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.db_path).max_connections(self.db_max_connections)
    }
}

fn parse_var<T: FromStr>(name: &str, default: &str) -> Result<T, ConfigError> {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name.to_string()))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var_default() {
        let port: u16 = parse_var("BACKOFFICE_TEST_UNSET_PORT", "8080").unwrap();
        assert_eq!(port, 8080);
    }

    #[test]
    fn test_parse_var_invalid() {
        let result: Result<u16, _> = parse_var("BACKOFFICE_TEST_UNSET_PORT", "not-a-port");
        assert!(matches!(result, Err(ConfigError::InvalidValue(name)) if name == "BACKOFFICE_TEST_UNSET_PORT"));
    }

    #[test]
    fn test_bind_address() {
        let config = ServerConfig {
            http_port: 9000,
            bind_addr: "127.0.0.1".to_string(),
            db_path: "./test.db".to_string(),
            db_max_connections: 5,
            jwt_secret: "secret".to_string(),
            jwt_lifetime_secs: 60,
            login_path: "/login".to_string(),
        };
        assert_eq!(config.bind_address(), "127.0.0.1:9000");
    }
}
