//! # API Error Types
//!
//! Errors returned by dashboard handlers, rendered as JSON.
//!
//! ## Status Mapping
//! ```text
//! ┌──────────────────────────────┬────────┬──────────────────────────────┐
//! │ Source                       │ Status │ Body                         │
//! ├──────────────────────────────┼────────┼──────────────────────────────┤
//! │ ValidationErrors             │ 422    │ message + errors{field:[..]} │
//! │ Undecodable body field       │ 422    │ message + errors{field:[..]} │
//! │ Body without a content type  │ 415    │ code + message               │
//! │ DbError::NotFound            │ 404    │ code + message               │
//! │ InvalidArgument (page=abc)   │ 400    │ code + message               │
//! │ UniqueViolation / FK         │ 409    │ code + message               │
//! │ anything else                │ 500    │ generic message              │
//! └──────────────────────────────┴────────┴──────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use backoffice_core::{CoreError, ValidationError, ValidationErrors};
use backoffice_db::DbError;
use serde::Serialize;
use tracing::{debug, error};

/// Machine-readable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationFailed,
    NotFound,
    InvalidArgument,
    ConstraintViolation,
    Unauthenticated,
    UnsupportedMediaType,
    Internal,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::ValidationFailed => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorCode::ConstraintViolation => StatusCode::CONFLICT,
            ErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorCode::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error returned from handlers.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    /// Field-keyed messages, only for validation failures.
    pub errors: Option<BTreeMap<String, Vec<String>>>,
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    code: ErrorCode,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a BTreeMap<String, Vec<String>>>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            errors: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code,
            message: &self.message,
            errors: self.errors.as_ref(),
        };
        (self.code.status(), Json(body)).into_response()
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let message = match errors.iter().next() {
            Some(first) if errors.len() > 1 => {
                format!("{} (and {} more errors)", first, errors.len() - 1)
            }
            Some(first) => first.to_string(),
            None => "The given data was invalid".to_string(),
        };

        ApiError {
            code: ErrorCode::ValidationFailed,
            message,
            errors: Some(errors.field_messages()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        ApiError::from(ValidationErrors::from(error))
    }
}

impl From<CoreError> for ApiError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::InvalidArgument { .. } => {
                ApiError::new(ErrorCode::InvalidArgument, error.to_string())
            }
            CoreError::Validation(errors) => errors.into(),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(error: DbError) -> Self {
        match error {
            DbError::Validation(errors) => errors.into(),
            DbError::NotFound { .. } => ApiError::new(ErrorCode::NotFound, error.to_string()),
            DbError::InvalidArgument { .. } => {
                ApiError::new(ErrorCode::InvalidArgument, error.to_string())
            }
            DbError::UniqueViolation { .. } | DbError::ForeignKeyViolation { .. } => {
                ApiError::new(ErrorCode::ConstraintViolation, error.to_string())
            }
            other => {
                error!(error = %other, "Database failure");
                ApiError::internal("Internal server error")
            }
        }
    }
}

/// Turns a body decoding message into a field-keyed failure.
///
/// Decoder messages read `[<context>: ]<path>: <reason>[ at line L column C]`;
/// the path `lines[0].quantity` is keyed as `lines.0.quantity`. Failures
/// without a field path are keyed under `body`.
fn decode_failure(body_text: &str) -> ValidationError {
    let mut start = 0;
    let mut keyed = None;
    for (idx, sep) in body_text.match_indices(": ") {
        let segment = &body_text[start..idx];
        if is_field_path(segment) {
            keyed = Some((segment, &body_text[idx + sep.len()..]));
            break;
        }
        start = idx + sep.len();
    }

    let (field, reason) = match keyed {
        Some((path, reason)) => (path.replace('[', ".").replace(']', ""), reason),
        None => (
            "body".to_string(),
            body_text.split_once(": ").map_or(body_text, |(_, rest)| rest),
        ),
    };
    let reason = reason.rsplit_once(" at line ").map_or(reason, |(r, _)| r);

    ValidationError::InvalidFormat {
        field,
        reason: reason.to_string(),
    }
}

fn is_field_path(path: &str) -> bool {
    !path.is_empty()
        && path
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'))
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(rejection = %rejection.body_text(), "Rejected JSON body");
        match rejection {
            JsonRejection::JsonDataError(e) => decode_failure(&e.body_text()).into(),
            JsonRejection::MissingJsonContentType(e) => {
                ApiError::new(ErrorCode::UnsupportedMediaType, e.body_text())
            }
            other => ApiError::new(ErrorCode::InvalidArgument, other.body_text()),
        }
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        debug!(rejection = %rejection.body_text(), "Rejected form body");
        match rejection {
            FormRejection::FailedToDeserializeForm(e) => decode_failure(&e.body_text()).into(),
            FormRejection::FailedToDeserializeFormBody(e) => {
                decode_failure(&e.body_text()).into()
            }
            FormRejection::InvalidFormContentType(e) => {
                ApiError::new(ErrorCode::UnsupportedMediaType, e.body_text())
            }
            other => ApiError::new(ErrorCode::InvalidArgument, other.body_text()),
        }
    }
}
