//! Worker Status REST API Routes
//!
//! The list endpoint reconciles the three fixed workers inline, so clients
//! always see already-derived lights. There is no background scheduler.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use legion_agents::{AgentStatusPatch, StatusEngine};
use legion_core::{AgentStatusRecord, WorkerName};
use std::sync::Arc;

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
    types::{AgentUpsertRequest, ErrorReportRequest},
};

const DEFAULT_RETRY_AFTER_MINUTES: i64 = 30;

fn parse_worker(name: &str) -> ApiResult<WorkerName> {
    name.parse::<WorkerName>()
        .map_err(|_| ApiError::agent_not_found(name))
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /api/v1/agents - List reconciled worker statuses
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/agents",
    tag = "Agents",
    responses(
        (status = 200, description = "Worker statuses", body = Vec<AgentStatusRecord>),
    ),
))]
pub async fn list_agents(
    State(statuses): State<Arc<StatusEngine>>,
) -> ApiResult<impl IntoResponse> {
    let records = statuses.reconcile_all(Utc::now()).await?;
    Ok(Json(records))
}

/// POST /api/v1/agents/error-report - Force a worker red with a retry deadline
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/v1/agents/error-report",
    tag = "Agents",
    request_body = ErrorReportRequest,
    responses(
        (status = 200, description = "Error recorded", body = AgentStatusRecord),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 404, description = "Unknown worker", body = ApiError),
    ),
))]
pub async fn report_error(
    State(statuses): State<Arc<StatusEngine>>,
    Json(req): Json<ErrorReportRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.error_state.trim().is_empty() {
        return Err(ApiError::missing_field("error_state"));
    }
    let worker = parse_worker(&req.worker)?;
    let record = statuses
        .report_error(
            worker,
            req.error_state,
            req.retry_after_minutes
                .unwrap_or(DEFAULT_RETRY_AFTER_MINUTES),
            Utc::now(),
        )
        .await?;
    Ok(Json(record))
}

/// PUT /api/v1/agents/:name - Apply an explicit partial status update
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/api/v1/agents/{name}",
    tag = "Agents",
    params(("name" = String, Path, description = "Worker name")),
    request_body = AgentUpsertRequest,
    responses(
        (status = 200, description = "Worker updated", body = AgentStatusRecord),
        (status = 404, description = "Unknown worker", body = ApiError),
    ),
))]
pub async fn upsert_agent(
    State(statuses): State<Arc<StatusEngine>>,
    Path(name): Path<String>,
    Json(req): Json<AgentUpsertRequest>,
) -> ApiResult<impl IntoResponse> {
    let worker = parse_worker(&name)?;

    let patch = if req.clear_error == Some(true) {
        AgentStatusPatch {
            light: req.light,
            error_state: Some(None),
            next_retry_at: Some(None),
            activity_note: req.activity_note,
        }
    } else {
        AgentStatusPatch {
            light: req.light,
            error_state: req.error_state.map(Some),
            next_retry_at: req.next_retry_at.map(Some),
            activity_note: req.activity_note,
        }
    };

    let record = statuses.upsert(worker, patch, Utc::now()).await?;
    Ok(Json(record))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", axum::routing::get(list_agents))
        .route("/error-report", axum::routing::post(report_error))
        .route("/:name", axum::routing::put(upsert_agent))
}
