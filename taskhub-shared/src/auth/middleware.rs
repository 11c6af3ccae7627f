/// The auth gate: per-request session resolution
///
/// [`resolve_session`] turns an inbound request's headers into an
/// [`AuthContext`], or an [`AuthError`] that the API layer maps to a
/// 401 before any handler runs. The resolved identity is threaded
/// through the request as an extension; there is deliberately no
/// process-wide "current user" state, so concurrent requests from
/// different callers cannot interfere.
///
/// State-changing methods additionally require the `X-CSRF-Token`
/// header to echo the anti-forgery value embedded in the session token,
/// proving same-origin intent for cookie-carried sessions.
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use taskhub_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("Caller: {}", auth.user_id)
/// }
/// ```

use axum::http::{HeaderMap, Method};
use uuid::Uuid;

use super::cookie::{extract_cookie, SESSION_COOKIE};
use super::jwt::{validate_token, JwtError};

/// Header carrying the echoed anti-forgery value
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Identity resolved from a valid session, attached to the request
///
/// Handlers must scope every data access by `user_id` and never trust a
/// client-supplied owner identifier in its place.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Authenticated account ID
    pub user_id: Uuid,

    /// Anti-forgery value from the session token
    pub csrf_token: String,
}

/// Error type for session resolution
///
/// Every variant is rejected before handler execution; an expired token
/// is indistinguishable from an absent one to the caller.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No session cookie on the request
    #[error("Missing session")]
    MissingSession,

    /// Session token failed validation (bad signature, expired, malformed)
    #[error("Invalid session")]
    InvalidSession,

    /// State-changing request without the CSRF header
    #[error("Missing CSRF token")]
    MissingCsrf,

    /// CSRF header does not match the value embedded in the session
    #[error("CSRF token mismatch")]
    CsrfMismatch,
}

fn is_state_changing(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

/// Resolves the caller's identity from the request
///
/// Extracts the session cookie, validates the token, and for
/// state-changing methods checks the echoed CSRF header.
pub fn resolve_session(
    headers: &HeaderMap,
    method: &Method,
    secret: &str,
) -> Result<AuthContext, AuthError> {
    let token = extract_cookie(headers, SESSION_COOKIE).ok_or(AuthError::MissingSession)?;

    let claims = validate_token(&token, secret).map_err(|e| {
        if !matches!(e, JwtError::Expired) {
            tracing::debug!("Session token rejected: {}", e);
        }
        AuthError::InvalidSession
    })?;

    if is_state_changing(method) {
        let echoed = headers
            .get(CSRF_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError::MissingCsrf)?;

        if echoed != claims.csrf {
            return Err(AuthError::CsrfMismatch);
        }
    }

    Ok(AuthContext {
        user_id: claims.sub,
        csrf_token: claims.csrf,
    })
}
