/// Health check endpoint
///
/// `GET /health` pings the backing store; a reachable store answers
/// `200 {"status": "ok"}`, an unreachable one surfaces as a 500.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use taskhub_shared::db::pool;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Application version
    pub version: String,
}

/// Health check handler
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    pool::health_check(&state.db)
        .await
        .map_err(|e| ApiError::Internal(format!("Store health check failed: {}", e)))?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}
