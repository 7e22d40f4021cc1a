// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::auth::{PasswordError, TokenError};
use crate::database::StoreError;
use crate::middleware::validate::FieldError;

/// Every way a request can fail, each with a fixed HTTP status and an
/// `{status: "ERR", data}` body
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    MissingField(String),
    ValidationFailed(Vec<FieldError>),
    InvalidId(String),
    AlreadyRegistered(String),
    MalformedBody(String),

    // 401 Unauthorized
    Unauthenticated(String),
    Expired,
    InvalidCredentials,

    // 403 Forbidden
    Forbidden,

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error
    InternalError(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingField(_)
            | ApiError::ValidationFailed(_)
            | ApiError::InvalidId(_)
            | ApiError::AlreadyRegistered(_)
            | ApiError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) | ApiError::Expired | ApiError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get client-facing message
    pub fn message(&self) -> String {
        match self {
            ApiError::MissingField(field) => format!("Missing required field: {}", field),
            ApiError::ValidationFailed(errors) => {
                format!("Validation failed on {} field(s)", errors.len())
            }
            ApiError::InvalidId(id) => format!("Invalid ID format: {}", id),
            ApiError::AlreadyRegistered(email) => {
                format!("A user is already registered with email {}", email)
            }
            ApiError::MalformedBody(msg) => format!("Malformed request body: {}", msg),
            ApiError::Unauthenticated(msg) => msg.clone(),
            ApiError::Expired => "Token has expired".to_string(),
            ApiError::InvalidCredentials => "Invalid email or password".to_string(),
            ApiError::Forbidden => "Not authorized to access this resource".to_string(),
            ApiError::NotFound(msg) => msg.clone(),
            ApiError::InternalError(msg) => msg.clone(),
        }
    }

    /// Get error code for logs and client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::MissingField(_) => "MISSING_FIELD",
            ApiError::ValidationFailed(_) => "VALIDATION_FAILED",
            ApiError::InvalidId(_) => "INVALID_ID",
            ApiError::AlreadyRegistered(_) => "ALREADY_REGISTERED",
            ApiError::MalformedBody(_) => "MALFORMED_BODY",
            ApiError::Unauthenticated(_) => "UNAUTHENTICATED",
            ApiError::Expired => "EXPIRED",
            ApiError::InvalidCredentials => "INVALID_CREDENTIALS",
            ApiError::Forbidden => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to the JSON envelope. Validation failures carry the full
    /// per-field list as `data`; everything else carries the message.
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::ValidationFailed(errors) => json!({
                "status": "ERR",
                "data": errors,
            }),
            _ => json!({
                "status": "ERR",
                "data": self.message(),
            }),
        }
    }
}

impl ApiError {
    pub fn missing_field(field: impl Into<String>) -> Self {
        ApiError::MissingField(field.into())
    }

    pub fn invalid_id(id: impl Into<String>) -> Self {
        ApiError::InvalidId(id.into())
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        ApiError::Unauthenticated(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::InternalError(message.into())
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => ApiError::Expired,
            TokenError::Invalid => ApiError::unauthenticated("Token is not valid"),
            TokenError::MissingSecret | TokenError::Generation(_) => {
                tracing::error!("Token service error: {}", err);
                ApiError::internal("Unable to process session token")
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(email) => ApiError::AlreadyRegistered(email),
            StoreError::Sqlx(sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("Database error: {}", sqlx_err);
                ApiError::internal("Database error occurred")
            }
            StoreError::Corrupt(msg) => {
                tracing::error!("Stored record could not be decoded: {}", msg);
                ApiError::internal("Database error occurred")
            }
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        tracing::error!("{}", err);
        ApiError::internal("Unable to process password")
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}
