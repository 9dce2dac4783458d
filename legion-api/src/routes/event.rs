//! Audit Event REST API Routes
//!
//! Read-only view over the append-only audit log. Source and event name
//! filter in the store; mission and thread filters match against the
//! payload after the fact.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use legion_core::AuditEvent;
use legion_storage::{EventFilter, EventSink, InMemoryStore};
use std::sync::Arc;
use uuid::Uuid;

use crate::{error::ApiResult, state::AppState, types::ListEventsQuery};

const DEFAULT_EVENT_LIMIT: usize = 100;

fn payload_id_matches(event: &AuditEvent, key: &str, id: Uuid) -> bool {
    event.payload.get(key).and_then(|v| v.as_str()) == Some(id.to_string().as_str())
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /api/v1/events - List audit events, newest first
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/events",
    tag = "Events",
    params(
        ("source" = Option<String>, Query, description = "Filter by emitting module"),
        ("event_name" = Option<String>, Query, description = "Filter by event name"),
        ("mission_id" = Option<Uuid>, Query, description = "Filter by mission in the payload"),
        ("thread_id" = Option<Uuid>, Query, description = "Filter by thread in the payload"),
        ("limit" = Option<usize>, Query, description = "Maximum results, default 100"),
    ),
    responses(
        (status = 200, description = "List of events", body = Vec<AuditEvent>),
    ),
))]
pub async fn list_events(
    State(store): State<Arc<InMemoryStore>>,
    Query(params): Query<ListEventsQuery>,
) -> ApiResult<impl IntoResponse> {
    let filter = EventFilter {
        source: params.source,
        event_name: params.event_name,
        limit: None,
    };
    let mut events = store.event_list(&filter).await?;

    if let Some(mission_id) = params.mission_id {
        events.retain(|e| payload_id_matches(e, "mission_id", mission_id));
    }
    if let Some(thread_id) = params.thread_id {
        events.retain(|e| payload_id_matches(e, "thread_id", thread_id));
    }
    events.truncate(params.limit.unwrap_or(DEFAULT_EVENT_LIMIT));

    Ok(Json(events))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new().route("/", axum::routing::get(list_events))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use legion_core::new_entity_id;

    #[test]
    fn test_payload_id_matching() {
        let id = new_entity_id();
        let event = AuditEvent::new(
            "mission_paused",
            "legion/missions",
            serde_json::json!({ "mission_id": id }),
            Utc::now(),
        );
        assert!(payload_id_matches(&event, "mission_id", id));
        assert!(!payload_id_matches(&event, "thread_id", id));
        assert!(!payload_id_matches(&event, "mission_id", new_entity_id()));
    }
}
