/// Error handling for the API server
///
/// One unified error type maps every failure to an HTTP response with a
/// single JSON envelope `{error, message, details?}`. Handlers return
/// `Result<T, ApiError>`; axum produces exactly one response per request
/// through `IntoResponse`.
///
/// Validation and ownership failures are produced at the handler
/// boundary with their specific kind; unexpected failures flow through
/// the `From<sqlx::Error>` impl, are logged server-side in full, and
/// reach the client as a generic internal error.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use taskhub_shared::auth::{jwt::JwtError, middleware::AuthError, password::PasswordError};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Request validation failed (400)
    Validation(Vec<FieldError>),

    /// No valid session, or invalid credentials (401)
    Unauthorized(String),

    /// Resource absent or not owned by the caller (404)
    NotFound(String),

    /// Duplicate unique key, e.g. email (409)
    Conflict(String),

    /// Internal server error (500)
    Internal(String),
}

/// One field-level validation violation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldError {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "validation_failed", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Field-level violations, for validation failures only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Validation(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "validation_failed",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::Internal(msg) => {
                // Log internal errors but never expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert sqlx errors to API errors
///
/// A unique violation on the email column is the expected
/// duplicate-registration path and becomes a conflict. Any other
/// constraint is unanticipated and stays internal; the constraint name
/// is schema detail that never reaches the client.
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if let Some(constraint) = db_err.constraint() {
                    if constraint.contains("email") {
                        return ApiError::Conflict("That email is already registered".to_string());
                    }
                    return ApiError::Internal(format!("Constraint violation: {}", constraint));
                }

                ApiError::Internal(format!("Database error: {}", db_err))
            }
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

/// Convert validator output into the validation error shape
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details: Vec<FieldError> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| FieldError {
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
}

/// Convert auth gate errors to API errors
///
/// Every session failure is a 401; the message deliberately does not
/// distinguish expired from absent or forged.
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingSession | AuthError::InvalidSession => {
                ApiError::Unauthorized("Unauthorized".to_string())
            }
            AuthError::MissingCsrf | AuthError::CsrfMismatch => {
                ApiError::Unauthorized("CSRF token missing or invalid".to_string())
            }
        }
    }
}

/// Convert session token errors to API errors
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => ApiError::Internal(msg),
            _ => ApiError::Unauthorized("Unauthorized".to_string()),
        }
    }
}

/// Convert password hashing errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::Internal(format!("Password operation failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn envelope(err: ApiError) -> (StatusCode, ErrorResponse) {
        let response = err.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_validation_maps_to_400() {
        let err = ApiError::Validation(vec![FieldError {
            field: "email".to_string(),
            message: "Invalid email format".to_string(),
        }]);

        let (status, body) = envelope(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "validation_failed");
        assert_eq!(body.details.unwrap()[0].field, "email");
    }

    #[tokio::test]
    async fn test_conflict_maps_to_409() {
        let (status, body) = envelope(ApiError::Conflict("duplicate".to_string())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.error, "conflict");
    }

    #[tokio::test]
    async fn test_not_found_maps_to_404() {
        let (status, body) = envelope(ApiError::NotFound("Task not found".to_string())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error, "not_found");
    }

    #[tokio::test]
    async fn test_internal_hides_detail() {
        let (status, body) =
            envelope(ApiError::Internal("connection refused to db-host:5432".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "internal_error");
        assert_eq!(body.message, "An internal error occurred");
    }

    /// Database error stub carrying a constraint name
    #[derive(Debug)]
    struct StubConstraintError(&'static str);

    impl fmt::Display for StubConstraintError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "violates constraint \"{}\"", self.0)
        }
    }

    impl std::error::Error for StubConstraintError {}

    impl sqlx::error::DatabaseError for StubConstraintError {
        fn message(&self) -> &str {
            "constraint violation"
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::UniqueViolation
        }

        fn constraint(&self) -> Option<&str> {
            Some(self.0)
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }
    }

    fn db_error(constraint: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(StubConstraintError(constraint)))
    }

    #[tokio::test]
    async fn test_email_constraint_maps_to_conflict() {
        let (status, body) = envelope(ApiError::from(db_error("users_email_key"))).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.error, "conflict");
        assert_eq!(body.message, "That email is already registered");
    }

    #[tokio::test]
    async fn test_other_constraint_stays_internal_and_unnamed() {
        let (status, body) = envelope(ApiError::from(db_error("tasks_user_id_fkey"))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "internal_error");
        assert_eq!(body.message, "An internal error occurred");
        assert!(!body.message.contains("fkey"));
    }

    #[tokio::test]
    async fn test_auth_errors_map_to_401() {
        for err in [
            AuthError::MissingSession,
            AuthError::InvalidSession,
            AuthError::MissingCsrf,
            AuthError::CsrfMismatch,
        ] {
            let (status, body) = envelope(ApiError::from(err)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body.error, "unauthorized");
        }
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Task not found".to_string());
        assert_eq!(err.to_string(), "Not found: Task not found");
    }
}
