/// Common test utilities for integration tests
///
/// Provides a `TestContext` with a real database connection and the
/// full router, plus helpers for driving the API in-process. Tests are
/// skipped when `DATABASE_URL` is not set so the unit suite stays
/// runnable without infrastructure.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use sqlx::PgPool;
use taskhub_api::app::{build_router, AppState};
use taskhub_api::config::Config;
use taskhub_shared::db::migrations;
use tower::Service as _;
use uuid::Uuid;

/// Test context containing the database pool and the app under test
pub struct TestContext {
    pub db: PgPool,
    pub app: Router,
}

/// A logged-on client: the session cookie plus the CSRF value to echo
#[derive(Debug, Clone)]
pub struct Session {
    pub cookie: String,
    pub csrf_token: String,
}

impl TestContext {
    /// Creates a test context, or `None` when no database is configured
    pub async fn new() -> Option<Self> {
        let Ok(database_url) = std::env::var("DATABASE_URL") else {
            eprintln!("skipping integration test: DATABASE_URL not set");
            return None;
        };

        if std::env::var("JWT_SECRET").is_err() {
            std::env::set_var("JWT_SECRET", "integration-test-secret-at-least-32-bytes");
        }

        let config = Config::from_env().expect("Test config should load");

        let db = PgPool::connect(&database_url)
            .await
            .expect("Test database should be reachable");

        migrations::run_migrations(&db)
            .await
            .expect("Migrations should run");

        let app = build_router(AppState::new(db.clone(), config));

        Some(Self { db, app })
    }

    /// Sends a request with optional session and JSON body, returning
    /// status, parsed body, and any Set-Cookie value
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        session: Option<&Session>,
        body: Option<Value>,
    ) -> (StatusCode, Value, Option<String>) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(session) = session {
            builder = builder
                .header(header::COOKIE, session.cookie.clone())
                .header("x-csrf-token", session.csrf_token.clone());
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();

        let status = response.status();
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, body, set_cookie)
    }

    /// Registers a fresh account and returns its session
    pub async fn register(&self, email: &str, name: &str, password: &str) -> Session {
        let (status, body, set_cookie) = self
            .send(
                "POST",
                "/users/register",
                None,
                Some(serde_json::json!({
                    "email": email,
                    "name": name,
                    "password": password
                })),
            )
            .await;

        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

        Session {
            cookie: cookie_pair(&set_cookie.expect("register should set the session cookie")),
            csrf_token: body["csrf_token"].as_str().unwrap().to_string(),
        }
    }

    /// Logs an existing account on and returns its session
    pub async fn logon(&self, email: &str, password: &str) -> Session {
        let (status, body, set_cookie) = self
            .send(
                "POST",
                "/users/logon",
                None,
                Some(serde_json::json!({ "email": email, "password": password })),
            )
            .await;

        assert_eq!(status, StatusCode::OK, "logon failed: {}", body);

        Session {
            cookie: cookie_pair(&set_cookie.expect("logon should set the session cookie")),
            csrf_token: body["csrf_token"].as_str().unwrap().to_string(),
        }
    }
}

/// Generates a unique test email
pub fn unique_email() -> String {
    format!("test-{}@example.com", Uuid::new_v4())
}

/// Extracts the `name=value` pair from a Set-Cookie header value
fn cookie_pair(set_cookie: &str) -> String {
    set_cookie
        .split(';')
        .next()
        .expect("Set-Cookie should have a name=value pair")
        .to_string()
}
