//! JWT authentication gate.
//!
//! Every `/dashboard` route requires `Authorization: Bearer <token>` signed
//! with the configured secret. Anything else is redirected to the login path.

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{ApiError, ErrorCode};
use crate::state::AppState;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID
    pub jti: String,
}

/// Issues and checks dashboard tokens.
pub struct AuthGate {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime_secs: i64,
    login_path: String,
}

impl AuthGate {
    pub fn new(secret: &str, lifetime_secs: i64, login_path: impl Into<String>) -> Self {
        AuthGate {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            lifetime_secs,
            login_path: login_path.into(),
        }
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Signs a token for `user_id`.
    pub fn issue_token(&self, user_id: i64) -> Result<String, ApiError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.lifetime_secs)).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ApiError::internal(format!("Failed to generate token: {}", e)))
    }

    /// Validate and decode a token.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| ApiError::new(ErrorCode::Unauthenticated, format!("Invalid token: {}", e)))
    }

    /// Whether the request carries a valid bearer token.
    pub fn is_authenticated(&self, headers: &HeaderMap) -> bool {
        let Some(token) = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(extract_bearer_token)
        else {
            return false;
        };

        match self.validate_token(token) {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "Rejected bearer token");
                false
            }
        }
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ").map(str::trim)
}

/// Middleware for the dashboard routes.
pub async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if state.auth.is_authenticated(request.headers()) {
        next.run(request).await
    } else {
        debug!(path = %request.uri().path(), "Unauthenticated dashboard request");
        Redirect::to(state.auth.login_path()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn gate() -> AuthGate {
        AuthGate::new("test-secret", 3600, "/login")
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    #[test]
    fn test_issued_token_authenticates() {
        let gate = gate();
        let token = gate.issue_token(42).unwrap();

        assert!(gate.is_authenticated(&bearer(&token)));
        assert_eq!(gate.validate_token(&token).unwrap().sub, "42");
    }

    #[test]
    fn test_missing_or_foreign_token_rejected() {
        let gate = gate();
        assert!(!gate.is_authenticated(&HeaderMap::new()));
        assert!(!gate.is_authenticated(&bearer("not-a-jwt")));

        let other = AuthGate::new("other-secret", 3600, "/login");
        let token = other.issue_token(1).unwrap();
        assert!(!gate.is_authenticated(&bearer(&token)));
    }

    #[test]
    fn test_expired_token_rejected() {
        let gate = AuthGate::new("test-secret", -600, "/login");
        let token = gate.issue_token(1).unwrap();
        assert!(!gate.is_authenticated(&bearer(&token)));
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }
}
