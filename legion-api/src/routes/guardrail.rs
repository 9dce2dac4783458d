//! Guardrail REST API Routes
//!
//! Guardrails are append-only policy records. `product_brief` feeds chat
//! context assembly and `outreach_freeze` blocks hot-lead approval, but the
//! API stores any type verbatim.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use legion_core::{new_entity_id, Guardrail};
use legion_storage::{GuardrailStore, InMemoryStore};
use std::sync::Arc;

use crate::{
    error::{ApiError, ApiResult},
    routes::emit_api_event,
    state::AppState,
    types::CreateGuardrailRequest,
};

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /api/v1/guardrails - Create a guardrail
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/v1/guardrails",
    tag = "Guardrails",
    request_body = CreateGuardrailRequest,
    responses(
        (status = 201, description = "Guardrail created", body = Guardrail),
        (status = 400, description = "Invalid request", body = ApiError),
    ),
))]
pub async fn create_guardrail(
    State(store): State<Arc<InMemoryStore>>,
    Json(req): Json<CreateGuardrailRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.guardrail_type.trim().is_empty() {
        return Err(ApiError::missing_field("guardrail_type"));
    }

    let now = Utc::now();
    let guardrail = Guardrail {
        guardrail_id: new_entity_id(),
        guardrail_type: req.guardrail_type,
        scope: req.scope.unwrap_or_else(|| "global".to_string()),
        value: req.value,
        active: req.active.unwrap_or(true),
        created_at: now,
        updated_at: now,
    };
    store.guardrail_insert(&guardrail).await?;

    emit_api_event(
        &store,
        "guardrail_created",
        serde_json::json!({
            "guardrail_id": guardrail.guardrail_id,
            "guardrail_type": guardrail.guardrail_type,
        }),
        now,
    )
    .await;

    Ok((StatusCode::CREATED, Json(guardrail)))
}

/// GET /api/v1/guardrails - List all guardrails
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/guardrails",
    tag = "Guardrails",
    responses(
        (status = 200, description = "List of guardrails", body = Vec<Guardrail>),
    ),
))]
pub async fn list_guardrails(
    State(store): State<Arc<InMemoryStore>>,
) -> ApiResult<impl IntoResponse> {
    let guardrails = store.guardrail_list().await?;
    Ok(Json(guardrails))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", axum::routing::post(create_guardrail))
        .route("/", axum::routing::get(list_guardrails))
}
