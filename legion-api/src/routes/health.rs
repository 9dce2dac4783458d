//! Health Check Endpoint
//!
//! Single liveness endpoint; there is no external dependency to probe
//! since the store is in-process.

use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;

use crate::{state::AppState, types::HealthResponse};

/// GET /health - Liveness check with uptime
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse),
    ),
))]
pub async fn health(State(start_time): State<std::time::Instant>) -> impl IntoResponse {
    Json(HealthResponse {
        ok: true,
        uptime_seconds: start_time.elapsed().as_secs(),
        timestamp: Utc::now(),
    })
}

pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new().route("/", axum::routing::get(health))
}
