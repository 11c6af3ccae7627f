/// User endpoints: registration and session lifecycle
///
/// # Endpoints
///
/// - `POST /users/register` - Create an account and start a session
/// - `POST /users/logon` - Authenticate and start a session
/// - `POST /users/logoff` - End the session (behind the auth gate)
///
/// Register and logon both set the session cookie and return the CSRF
/// value in the body; the client echoes it in `X-CSRF-Token` on every
/// state-changing request afterwards.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskhub_shared::{
    auth::{
        cookie::{clear_session_cookie, session_cookie},
        jwt::{create_token, Claims},
        middleware::AuthContext,
        password::{hash_password, verify_password},
    },
    models::{
        task::{CreateTask, Priority, Task},
        user::{CreateUser, User},
    },
};
use validator::Validate;

/// Register request
///
/// Fields default to empty strings so a missing field fails validation
/// with a field-level message instead of a body-parse error.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: String,

    #[serde(default)]
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Logon request
#[derive(Debug, Deserialize)]
pub struct LogonRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Response body for register and logon
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub name: String,
    pub email: String,

    /// Anti-forgery value to echo in `X-CSRF-Token`
    pub csrf_token: String,
}

/// Tasks seeded into every fresh account
fn welcome_tasks() -> Vec<CreateTask> {
    vec![
        CreateTask {
            title: "Complete your profile".to_string(),
            is_completed: false,
            priority: Priority::Medium,
        },
        CreateTask {
            title: "Add your first task".to_string(),
            is_completed: false,
            priority: Priority::High,
        },
        CreateTask {
            title: "Explore the app".to_string(),
            is_completed: false,
            priority: Priority::Low,
        },
    ]
}

/// Issues a session for the account: signs a token and builds the
/// cookie plus the response body carrying the CSRF value
fn start_session(state: &AppState, user: &User, status: StatusCode) -> ApiResult<Response> {
    let claims = Claims::new(user.id);
    let token = create_token(&claims, state.jwt_secret())?;
    let cookie = session_cookie(&token, state.production());

    let body = SessionResponse {
        name: user.name.clone(),
        email: user.email.clone(),
        csrf_token: claims.csrf,
    };

    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie)
            .map_err(|e| ApiError::Internal(format!("Invalid cookie value: {}", e)))?,
    );
    Ok(response)
}

/// Register a new account
///
/// Creates the account and its welcome tasks in one transaction, so a
/// failure partway leaves no orphaned account or partial task set.
///
/// # Errors
///
/// - `400`: Validation failed
/// - `409`: Email already registered (case-insensitive)
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Response> {
    req.validate()?;

    let password_hash = hash_password(&req.password)?;

    let mut tx = state.db.begin().await?;

    let user = User::create(
        &mut *tx,
        CreateUser {
            email: req.email,
            name: req.name,
            password_hash,
        },
    )
    .await?;

    Task::create_many(&mut *tx, user.id, &welcome_tasks()).await?;

    tx.commit().await?;

    tracing::info!(user_id = %user.id, "Registered new account");

    start_session(&state, &user, StatusCode::CREATED)
}

/// Logon endpoint
///
/// The error for an unknown email and the error for a wrong password
/// are identical on purpose; the response never reveals which part was
/// wrong.
///
/// # Errors
///
/// - `400`: Missing email or password
/// - `401`: Invalid credentials
pub async fn logon(
    State(state): State<AppState>,
    Json(req): Json<LogonRequest>,
) -> ApiResult<Response> {
    let (Some(email), Some(password)) = (req.email, req.password) else {
        return Err(ApiError::BadRequest(
            "Email and password are required".to_string(),
        ));
    };

    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    if !verify_password(&password, &user.password_hash) {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    User::update_last_login(&state.db, user.id).await?;

    start_session(&state, &user, StatusCode::OK)
}

/// Logoff endpoint
///
/// Clears the session cookie. The signed token itself stays valid until
/// its expiry; without a deny-list this is the documented gap of
/// cookie-cleared sessions.
pub async fn logoff(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Response> {
    tracing::debug!(user_id = %auth.user_id, "Logging off");

    let cookie = clear_session_cookie(state.production());

    let mut response = (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "ok" })),
    )
        .into_response();
    response.headers_mut().insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie)
            .map_err(|e| ApiError::Internal(format!("Invalid cookie value: {}", e)))?,
    );
    Ok(response)
}
