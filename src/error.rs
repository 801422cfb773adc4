use axum::{
    extract::multipart::MultipartRejection,
    extract::rejection::{FormRejection, JsonRejection, PathRejection},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::{
    auth::{error::AuthError, password::PasswordError, validation::ValidationError},
    db::StoreError,
};

pub const UNAUTHORIZED_DETAIL: &str = "Could not validate credentials";
const INTERNAL_DETAIL: &str = "Internal server error";

/// Errors as the client sees them. Causes are logged where the conversion
/// happens; only the `detail` string reaches the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    Validation(String),
    Conflict(String),
    Unauthorized,
    NotFound(String),
    Internal,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_DETAIL.into()),
            ApiError::Unauthorized => {
                return (
                    StatusCode::UNAUTHORIZED,
                    [(header::WWW_AUTHENTICATE, "Bearer")],
                    Json(ErrorBody {
                        detail: UNAUTHORIZED_DETAIL.into(),
                    }),
                )
                    .into_response();
            }
        };
        (status, Json(ErrorBody { detail })).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

// Extractor rejections become 422s with a fixed message; the parser's own text
// only goes to the log.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(error = %rejection.body_text(), "json body rejected");
        let detail = match rejection {
            JsonRejection::JsonSyntaxError(_) => "Request body is not valid JSON",
            JsonRejection::JsonDataError(_) => "Request body has missing or invalid fields",
            JsonRejection::MissingJsonContentType(_) => "Expected an application/json body",
            _ => "Invalid request body",
        };
        ApiError::Validation(detail.into())
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        debug!(error = %rejection.body_text(), "form body rejected");
        ApiError::Validation("Request form has missing or invalid fields".into())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        debug!(error = %rejection.body_text(), "path parameter rejected");
        ApiError::Validation("Invalid path parameter".into())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        debug!(error = %rejection.body_text(), "multipart body rejected");
        ApiError::Validation("Expected a multipart/form-data body".into())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Encoding(e) => {
                error!(error = %e, "jwt encoding failed");
                ApiError::Internal
            }
            AuthError::LifetimeOutOfRange => {
                error!("token expiry does not fit a timestamp");
                ApiError::Internal
            }
            AuthError::Store(e) => ApiError::from(e),
            other => {
                warn!(reason = %other, "authentication failed");
                ApiError::Unauthorized
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UsernameTaken => {
                ApiError::Conflict("A user with this username already exists".into())
            }
            StoreError::EmailTaken => {
                ApiError::Conflict("A user with this email already exists".into())
            }
            StoreError::Database(e) => {
                error!(error = %e, "database error");
                ApiError::Internal
            }
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        error!(error = %err, "password hashing failed");
        ApiError::Internal
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        error!(error = ?err, "internal error");
        ApiError::Internal
    }
}
