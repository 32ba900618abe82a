/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `Result<T, ApiError>`, which converts into the
/// uniform failure envelope:
///
/// ```json
/// { "success": false, "statusCode": 404, "message": "Project not found" }
/// ```
///
/// Internal details (database errors, token-signing failures) are logged
/// via `tracing` and never echoed to the caller.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use taskcamp_shared::auth::{authorization::AuthzError, jwt::JwtError, password::PasswordError};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Malformed input (400) - field-level validation failures
    Validation(Vec<ValidationErrorDetail>),

    /// Missing/invalid/expired credential or token (401)
    Unauthorized(String),

    /// Authenticated but insufficient role (403)
    Forbidden(String),

    /// Missing entity (404)
    NotFound(String),

    /// Duplicate unique field (409)
    Conflict(String),

    /// Unexpected persistence or token failure (500)
    Internal(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Uniform failure envelope
///
/// Every failed request gets exactly this shape, regardless of which layer
/// produced the error.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Always false
    pub success: bool,

    /// HTTP status code, repeated in the body
    pub status_code: u16,

    /// Human-readable error message
    pub message: String,
}

impl ApiError {
    /// Builds a validation error from `validator` derive output
    pub fn from_validation_errors(errors: validator::ValidationErrors) -> Self {
        let details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();

        ApiError::Validation(details)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg) => msg.clone(),
            ApiError::Validation(details) => {
                let fields: Vec<String> = details
                    .iter()
                    .map(|d| format!("{}: {}", d.field, d.message))
                    .collect();
                format!("Validation failed: {}", fields.join("; "))
            }
            // Never leak internal detail to the caller
            ApiError::Internal(_) => "An internal error occurred".to_string(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Validation(details) => {
                write!(f, "Validation failed: {} errors", details.len())
            }
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            tracing::error!("Internal error: {}", detail);
        }

        let status = self.status_code();
        let body = Json(ErrorResponse {
            success: false,
            status_code: status.as_u16(),
            message: self.public_message(),
        });

        (status, body).into_response()
    }
}

/// Convert sqlx errors to API errors
///
/// Unique-constraint violations become conflicts (the database is the
/// authority on username/email/membership uniqueness); everything else is
/// internal.
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if let Some(constraint) = db_err.constraint() {
                    if constraint.contains("username") || constraint.contains("email") {
                        return ApiError::Conflict("Username or email already in use".to_string());
                    }
                    return ApiError::Conflict(format!("Duplicate value for {}", constraint));
                }

                ApiError::Internal(format!("Database error: {}", db_err))
            }
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

/// Convert JWT errors to API errors
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            JwtError::WrongTokenType { .. } | JwtError::ValidationError(_) => {
                ApiError::Unauthorized("Invalid token".to_string())
            }
            JwtError::CreateError(detail) => {
                ApiError::Internal(format!("Token creation failed: {}", detail))
            }
        }
    }
}

/// Convert password errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::Internal(format!("Password operation failed: {}", err))
    }
}

/// Convert authorization errors to API errors
impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NotMember(_) => {
                ApiError::Forbidden("You are not a member of this project".to_string())
            }
            AuthzError::RoleNotAllowed { .. } => {
                ApiError::Forbidden("Insufficient project permissions".to_string())
            }
            AuthzError::DatabaseError(err) => {
                ApiError::Internal(format!("Database error: {}", err))
            }
        }
    }
}
