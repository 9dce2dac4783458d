//! Hot Lead REST API Routes
//!
//! Approval is policy-gated: an active outreach_freeze guardrail blocks it.
//! A block is a structured outcome with status 200, not an error.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use legion_core::{new_entity_id, HotLead, HotLeadStatus};
use legion_storage::{GuardrailStore, HotLeadStore, InMemoryStore, MissionStore};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    routes::emit_api_event,
    state::AppState,
    types::{ApprovalOutcome, CreateHotLeadRequest},
};

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /api/v1/hot-leads - Record a new hot lead
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/v1/hot-leads",
    tag = "Hot Leads",
    request_body = CreateHotLeadRequest,
    responses(
        (status = 201, description = "Hot lead recorded", body = HotLead),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 404, description = "Linked mission not found", body = ApiError),
    ),
))]
pub async fn create_hot_lead(
    State(store): State<Arc<InMemoryStore>>,
    Json(req): Json<CreateHotLeadRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.handle.trim().is_empty() {
        return Err(ApiError::missing_field("handle"));
    }
    if let Some(mission_id) = req.mission_id {
        if store.mission_get(mission_id).await?.is_none() {
            return Err(ApiError::mission_not_found(mission_id));
        }
    }

    let now = Utc::now();
    let lead = HotLead {
        lead_id: new_entity_id(),
        mission_id: req.mission_id,
        handle: req.handle,
        source_forum: req.source_forum,
        status: HotLeadStatus::New,
        created_at: now,
        updated_at: now,
    };
    store.hot_lead_insert(&lead).await?;

    emit_api_event(
        &store,
        "hot_lead_created",
        serde_json::json!({ "lead_id": lead.lead_id }),
        now,
    )
    .await;

    Ok((StatusCode::CREATED, Json(lead)))
}

/// GET /api/v1/hot-leads - List all hot leads
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/hot-leads",
    tag = "Hot Leads",
    responses(
        (status = 200, description = "List of hot leads", body = Vec<HotLead>),
    ),
))]
pub async fn list_hot_leads(
    State(store): State<Arc<InMemoryStore>>,
) -> ApiResult<impl IntoResponse> {
    let leads = store.hot_lead_list().await?;
    Ok(Json(leads))
}

/// POST /api/v1/hot-leads/:id/approve - Attempt to approve a hot lead
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/v1/hot-leads/{id}/approve",
    tag = "Hot Leads",
    params(("id" = Uuid, Path, description = "Hot lead ID")),
    responses(
        (status = 200, description = "Approval outcome", body = ApprovalOutcome),
        (status = 404, description = "Hot lead not found", body = ApiError),
    ),
))]
pub async fn approve_hot_lead(
    State(store): State<Arc<InMemoryStore>>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let now = Utc::now();
    let mut lead = store
        .hot_lead_get(id)
        .await?
        .ok_or_else(|| ApiError::lead_not_found(id))?;

    let freezes = store.guardrail_list_active("outreach_freeze").await?;
    if !freezes.is_empty() {
        return Ok(Json(ApprovalOutcome {
            approved: false,
            blocked: true,
            warnings: vec!["Outreach freeze is active".to_string()],
        }));
    }

    let mut warnings = Vec::new();
    if let Some(mission_id) = lead.mission_id {
        if let Some(mission) = store.mission_get(mission_id).await? {
            if mission.posture == "research_only" {
                warnings
                    .push("Lead belongs to a research_only mission".to_string());
            }
        }
    }

    lead.status = HotLeadStatus::Approved;
    lead.updated_at = now;
    store.hot_lead_update(&lead).await?;

    emit_api_event(
        &store,
        "hot_lead_approved",
        serde_json::json!({ "lead_id": lead.lead_id }),
        now,
    )
    .await;

    Ok(Json(ApprovalOutcome {
        approved: true,
        blocked: false,
        warnings,
    }))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", axum::routing::post(create_hot_lead))
        .route("/", axum::routing::get(list_hot_leads))
        .route("/:id/approve", axum::routing::post(approve_hot_lead))
}
