//! Request body extractor for dashboard writes.
//!
//! ```text
//!   Content-Type: application/x-www-form-urlencoded ──► Form<T>
//!   anything else                                   ──► Json<T>
//!                                                        │ rejected
//!                                                        ▼
//!                                        ApiError (422 keyed by field, 415)
//! ```
//!
//! Forms carry flat fields only, so a form-encoded purchase never has lines.

use axum::extract::{FromRequest, Request};
use axum::http::header;
use axum::{Form, Json};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A body decoded from JSON or an HTML form.
#[derive(Debug, Clone)]
pub struct Payload<T>(pub T);

fn is_form(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
}

impl<T, S> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_form(&request) {
            let Form(value) = Form::<T>::from_request(request, state).await?;
            Ok(Payload(value))
        } else {
            let Json(value) = Json::<T>::from_request(request, state).await?;
            Ok(Payload(value))
        }
    }
}
