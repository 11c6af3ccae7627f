/// Application state and router builder
///
/// # Router layout
///
/// ```text
/// /
/// ├── /health               # Liveness probe (public, pings the store)
/// ├── /users/
/// │   ├── POST /register    # Public
/// │   ├── POST /logon       # Public
/// │   └── POST /logoff      # Auth gate
/// └── /tasks/               # Auth gate on every route
///     ├── GET    /
///     ├── POST   /
///     ├── POST   /bulk
///     ├── GET    /stats
///     ├── GET    /:id
///     ├── PATCH  /:id
///     └── DELETE /:id
/// ```
///
/// The auth gate runs before any protected handler: it resolves the
/// session cookie (and CSRF echo for state-changing methods) into an
/// `AuthContext` request extension, or rejects with 401.

use crate::config::Config;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskhub_shared::auth::middleware::{resolve_session, AuthContext};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets the secret for session token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    /// Whether this deployment is production (drives cookie flags)
    pub fn production(&self) -> bool {
        self.config.api.production
    }
}

/// Builds the complete axum router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Register and logon are the only routes reachable anonymously
    let public_user_routes = Router::new()
        .route("/register", post(routes::users::register))
        .route("/logon", post(routes::users::logon));

    let protected_user_routes = Router::new()
        .route("/logoff", post(routes::users::logoff))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_auth_layer,
        ));

    let task_routes = Router::new()
        .route("/", get(routes::tasks::index).post(routes::tasks::create))
        .route("/bulk", post(routes::tasks::bulk_create))
        .route("/stats", get(routes::tasks::stats))
        .route(
            "/:id",
            get(routes::tasks::show)
                .patch(routes::tasks::update)
                .delete(routes::tasks::destroy),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_auth_layer,
        ));

    let user_routes = public_user_routes.merge(protected_user_routes);

    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([
                header::CONTENT_TYPE,
                header::HeaderName::from_static("x-csrf-token"),
            ])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/users", user_routes)
        .nest("/tasks", task_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Session authentication middleware layer
///
/// Resolves the caller's identity from the session cookie and injects
/// `AuthContext` into request extensions, rejecting with 401 before any
/// downstream handler executes.
async fn session_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let auth_context: AuthContext =
        resolve_session(req.headers(), req.method(), state.jwt_secret())?;

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
