//! Thread REST API Routes
//!
//! `thread_status` is a read-time label derived from the linked mission's
//! state; it is never stored.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use legion_core::{StageChange, Thread};
use legion_storage::{InMemoryStore, MessageStore, MissionStore, ThreadStore};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    routes::emit_api_event,
    state::AppState,
    types::{
        CreateThreadRequest, ListThreadsQuery, ThreadDetailResponse, ThreadMessagesQuery,
        ThreadResponse, UpdateThreadRequest,
    },
};

const DEFAULT_MESSAGE_WINDOW: usize = 50;

// ============================================================================
// STATUS DERIVATION
// ============================================================================

/// Derive the display status for a thread from its linked mission.
async fn thread_status(store: &InMemoryStore, thread: &Thread) -> ApiResult<String> {
    let Some(mission_id) = thread.mission_id else {
        return Ok("Unlinked".to_string());
    };
    let label = match store.mission_get(mission_id).await? {
        Some(mission) if mission.state.is_paused() => "Paused",
        Some(mission) if mission.state.as_str() == "complete" => "Completed",
        Some(mission) if mission.state.as_str() == "aborted" => "Aborted",
        Some(_) => "Running",
        // Dangling link, treated the same as no link
        None => "Unlinked",
    };
    Ok(label.to_string())
}

async fn with_status(store: &InMemoryStore, thread: Thread) -> ApiResult<ThreadResponse> {
    let status = thread_status(store, &thread).await?;
    Ok(ThreadResponse {
        thread,
        thread_status: status,
    })
}

async fn require_thread(store: &InMemoryStore, id: Uuid) -> ApiResult<Thread> {
    store
        .thread_get(id)
        .await?
        .ok_or_else(|| ApiError::thread_not_found(id))
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /api/v1/threads - Create a new thread
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/v1/threads",
    tag = "Threads",
    request_body = CreateThreadRequest,
    responses(
        (status = 201, description = "Thread created", body = ThreadResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 404, description = "Linked mission not found", body = ApiError),
    ),
))]
pub async fn create_thread(
    State(store): State<Arc<InMemoryStore>>,
    Json(req): Json<CreateThreadRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.title.trim().is_empty() {
        return Err(ApiError::missing_field("title"));
    }
    if let Some(mission_id) = req.mission_id {
        if store.mission_get(mission_id).await?.is_none() {
            return Err(ApiError::mission_not_found(mission_id));
        }
    }

    let now = Utc::now();
    let mut thread = Thread::new(req.title, req.mission_id, now);
    thread.goal = req.goal;
    store.thread_insert(&thread).await?;

    emit_api_event(
        &store,
        "thread_created",
        serde_json::json!({ "thread_id": thread.thread_id }),
        now,
    )
    .await;

    let response = with_status(&store, thread).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/v1/threads - List threads, most recently updated first
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/threads",
    tag = "Threads",
    params(("mission_id" = Option<Uuid>, Query, description = "Filter by linked mission")),
    responses(
        (status = 200, description = "List of threads", body = Vec<ThreadResponse>),
    ),
))]
pub async fn list_threads(
    State(store): State<Arc<InMemoryStore>>,
    Query(params): Query<ListThreadsQuery>,
) -> ApiResult<impl IntoResponse> {
    let threads = store.thread_list(params.mission_id).await?;
    let mut out = Vec::with_capacity(threads.len());
    for thread in threads {
        out.push(with_status(&store, thread).await?);
    }
    Ok(Json(out))
}

/// GET /api/v1/threads/:id - Get a thread with a window of its messages
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/threads/{id}",
    tag = "Threads",
    params(
        ("id" = Uuid, Path, description = "Thread ID"),
        ("limit" = Option<usize>, Query, description = "Window size, default 50"),
        ("before" = Option<Uuid>, Query, description = "Return messages before this message ID"),
    ),
    responses(
        (status = 200, description = "Thread with messages", body = ThreadDetailResponse),
        (status = 404, description = "Thread not found", body = ApiError),
    ),
))]
pub async fn get_thread(
    State(store): State<Arc<InMemoryStore>>,
    Path(id): Path<Uuid>,
    Query(params): Query<ThreadMessagesQuery>,
) -> ApiResult<impl IntoResponse> {
    let thread = require_thread(&store, id).await?;
    let status = thread_status(&store, &thread).await?;

    let mut messages = store.message_list_by_thread(id).await?;
    if let Some(before) = params.before {
        let cut = messages
            .iter()
            .position(|m| m.message_id == before)
            .ok_or_else(|| ApiError::entity_not_found("Message", before))?;
        messages.truncate(cut);
    }
    let limit = params.limit.unwrap_or(DEFAULT_MESSAGE_WINDOW);
    if messages.len() > limit {
        messages.drain(..messages.len() - limit);
    }

    Ok(Json(ThreadDetailResponse {
        thread,
        thread_status: status,
        messages,
    }))
}

/// PATCH /api/v1/threads/:id - Update thread fields
#[cfg_attr(feature = "openapi", utoipa::path(
    patch,
    path = "/api/v1/threads/{id}",
    tag = "Threads",
    params(("id" = Uuid, Path, description = "Thread ID")),
    request_body = UpdateThreadRequest,
    responses(
        (status = 200, description = "Thread updated", body = ThreadResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 404, description = "Thread or mission not found", body = ApiError),
    ),
))]
pub async fn update_thread(
    State(store): State<Arc<InMemoryStore>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateThreadRequest>,
) -> ApiResult<impl IntoResponse> {
    let now = Utc::now();
    let mut thread = require_thread(&store, id).await?;

    if let Some(title) = req.title {
        if title.trim().is_empty() {
            return Err(ApiError::missing_field("title"));
        }
        thread.title = title;
    }
    if let Some(goal) = req.goal {
        thread.goal = Some(goal);
    }
    if let Some(synopsis) = req.synopsis {
        thread.synopsis = Some(synopsis);
    }
    if let Some(stage) = req.stage {
        if stage != thread.stage {
            thread.stage_history.push(StageChange {
                from: thread.stage,
                to: stage,
                at: now,
            });
            thread.stage = stage;
        }
    }
    if let Some(mission_id) = req.mission_id {
        if store.mission_get(mission_id).await?.is_none() {
            return Err(ApiError::mission_not_found(mission_id));
        }
        thread.mission_id = Some(mission_id);
    }
    thread.updated_at = now;
    store.thread_update(&thread).await?;

    emit_api_event(
        &store,
        "thread_updated",
        serde_json::json!({ "thread_id": thread.thread_id }),
        now,
    )
    .await;

    let response = with_status(&store, thread).await?;
    Ok(Json(response))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", axum::routing::post(create_thread))
        .route("/", axum::routing::get(list_threads))
        .route("/:id", axum::routing::get(get_thread))
        .route("/:id", axum::routing::patch(update_thread))
}

#[cfg(test)]
mod tests {
    use super::*;
    use legion_core::{Mission, MissionState};

    async fn seeded(state: MissionState) -> (Arc<InMemoryStore>, Thread) {
        let store = Arc::new(InMemoryStore::new());
        let now = Utc::now();
        let mission = Mission::new("M", "", "research_only", state, now);
        store.mission_insert(&mission).await.unwrap();
        let thread = Thread::new("General", Some(mission.mission_id), now);
        store.thread_insert(&thread).await.unwrap();
        (store, thread)
    }

    #[tokio::test]
    async fn test_status_reflects_mission_state() {
        for (state, expected) in [
            (MissionState::Scanning, "Running"),
            (MissionState::Paused, "Paused"),
            (MissionState::Complete, "Completed"),
            (MissionState::Aborted, "Aborted"),
        ] {
            let (store, thread) = seeded(state).await;
            assert_eq!(thread_status(&store, &thread).await.unwrap(), expected);
        }
    }

    #[tokio::test]
    async fn test_status_unlinked_thread() {
        let store = Arc::new(InMemoryStore::new());
        let thread = Thread::new("General", None, Utc::now());
        assert_eq!(thread_status(&store, &thread).await.unwrap(), "Unlinked");
    }
}
