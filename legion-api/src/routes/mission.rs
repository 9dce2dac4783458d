//! Mission REST API Routes
//!
//! Lifecycle verbs go through `MissionLifecycle` so the audit signals and
//! pause-history rules live in one place; plain field updates write the
//! store directly.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use legion_core::{Insight, Mission, MissionState};
use legion_missions::MissionLifecycle;
use legion_storage::{InMemoryStore, MissionStore};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    routes::emit_api_event,
    state::AppState,
    types::{
        ChatReplyResponse, CreateMissionRequest, DuplicateMissionRequest, StateChangeRequest,
        UpdateMissionRequest,
    },
};

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /api/v1/missions - Create a new mission
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/v1/missions",
    tag = "Missions",
    request_body = CreateMissionRequest,
    responses(
        (status = 201, description = "Mission created", body = Mission),
        (status = 400, description = "Invalid request", body = ApiError),
    ),
))]
pub async fn create_mission(
    State(lifecycle): State<Arc<MissionLifecycle>>,
    Json(req): Json<CreateMissionRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.title.trim().is_empty() {
        return Err(ApiError::missing_field("title"));
    }

    let state = req
        .state
        .map(MissionState::from)
        .unwrap_or(MissionState::Draft);
    let mission = lifecycle
        .create(
            req.title,
            req.objective.unwrap_or_default(),
            req.posture.unwrap_or_else(|| "research_only".to_string()),
            state,
            Utc::now(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(mission)))
}

/// GET /api/v1/missions - List all missions, newest first
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/missions",
    tag = "Missions",
    responses(
        (status = 200, description = "List of missions", body = Vec<Mission>),
    ),
))]
pub async fn list_missions(
    State(store): State<Arc<InMemoryStore>>,
) -> ApiResult<impl IntoResponse> {
    let missions = store.mission_list().await?;
    Ok(Json(missions))
}

/// GET /api/v1/missions/:id - Get a mission by ID
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/missions/{id}",
    tag = "Missions",
    params(("id" = Uuid, Path, description = "Mission ID")),
    responses(
        (status = 200, description = "Mission found", body = Mission),
        (status = 404, description = "Mission not found", body = ApiError),
    ),
))]
pub async fn get_mission(
    State(lifecycle): State<Arc<MissionLifecycle>>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let mission = lifecycle.require(id).await?;
    Ok(Json(mission))
}

/// PATCH /api/v1/missions/:id - Update mission fields
#[cfg_attr(feature = "openapi", utoipa::path(
    patch,
    path = "/api/v1/missions/{id}",
    tag = "Missions",
    params(("id" = Uuid, Path, description = "Mission ID")),
    request_body = UpdateMissionRequest,
    responses(
        (status = 200, description = "Mission updated", body = Mission),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 404, description = "Mission not found", body = ApiError),
    ),
))]
pub async fn update_mission(
    State(store): State<Arc<InMemoryStore>>,
    State(lifecycle): State<Arc<MissionLifecycle>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateMissionRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.is_empty() {
        return Err(ApiError::invalid_input("No fields to update"));
    }

    let now = Utc::now();
    let mut mission = lifecycle.require(id).await?;
    if let Some(title) = req.title {
        if title.trim().is_empty() {
            return Err(ApiError::missing_field("title"));
        }
        mission.title = title;
    }
    if let Some(objective) = req.objective {
        mission.objective = objective;
    }
    if let Some(posture) = req.posture {
        mission.posture = posture;
    }
    if let Some(counters) = req.counters {
        for (key, value) in counters {
            mission.counters.insert(key, value);
        }
    }
    if let Some(text) = req.add_insight {
        mission.insights.push(Insight {
            text,
            created_at: now,
        });
    }
    mission.updated_at = now;
    store.mission_update(&mission).await?;

    emit_api_event(
        &store,
        "mission_updated",
        serde_json::json!({ "mission_id": mission.mission_id }),
        now,
    )
    .await;

    Ok(Json(mission))
}

/// POST /api/v1/missions/:id/state - Apply a state-change token
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/v1/missions/{id}/state",
    tag = "Missions",
    params(("id" = Uuid, Path, description = "Mission ID")),
    request_body = StateChangeRequest,
    responses(
        (status = 200, description = "State applied", body = Mission),
        (status = 404, description = "Mission not found", body = ApiError),
    ),
))]
pub async fn change_mission_state(
    State(lifecycle): State<Arc<MissionLifecycle>>,
    Path(id): Path<Uuid>,
    Json(req): Json<StateChangeRequest>,
) -> ApiResult<impl IntoResponse> {
    let now = Utc::now();
    let (mission, signal) = lifecycle.set_state(id, &req.state, now).await?;
    if let Some(signal) = signal {
        lifecycle.publish(&signal, now).await;
    }
    Ok(Json(mission))
}

/// POST /api/v1/missions/:id/duplicate - Copy a mission into a fresh run
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/v1/missions/{id}/duplicate",
    tag = "Missions",
    params(("id" = Uuid, Path, description = "Source mission ID")),
    request_body = DuplicateMissionRequest,
    responses(
        (status = 201, description = "New run created", body = ChatReplyResponse),
        (status = 400, description = "Mission has no linked thread", body = ApiError),
        (status = 404, description = "Mission not found", body = ApiError),
    ),
))]
pub async fn duplicate_mission(
    State(store): State<Arc<InMemoryStore>>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<DuplicateMissionRequest>,
) -> ApiResult<impl IntoResponse> {
    use legion_storage::ThreadStore;

    // Seed from the requested thread, or the mission's most recently
    // updated one.
    let source_thread_id = match req.source_thread_id {
        Some(thread_id) => thread_id,
        None => store
            .thread_list(Some(id))
            .await?
            .first()
            .map(|t| t.thread_id)
            .ok_or_else(|| {
                ApiError::invalid_input("Mission has no linked thread to duplicate from")
            })?,
    };

    let reply = state
        .engine
        .duplicate_run(id, source_thread_id, req.start_now.unwrap_or(true), Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(ChatReplyResponse::from(reply))))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", axum::routing::post(create_mission))
        .route("/", axum::routing::get(list_missions))
        .route("/:id", axum::routing::get(get_mission))
        .route("/:id", axum::routing::patch(update_mission))
        .route("/:id/state", axum::routing::post(change_mission_state))
        .route("/:id/duplicate", axum::routing::post(duplicate_mission))
}
