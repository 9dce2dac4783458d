//! Request and Response Types for the LEGION API
//!
//! DTOs for route handlers. Entity types come from legion-core; this module
//! only adds the request envelopes and derived response shapes.

use legion_conversation::ChatReply;
use legion_core::{
    ChatMessage, EntityId, StatusLight, SuggestedAction, Thread, ThreadStage, Timestamp,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// MISSION TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateMissionRequest {
    pub title: String,
    #[serde(default)]
    pub objective: Option<String>,
    /// Behavioral policy tag, e.g. "research_only".
    #[serde(default)]
    pub posture: Option<String>,
    /// Initial state string; defaults to "draft".
    #[serde(default)]
    pub state: Option<String>,
}

/// Partial mission update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateMissionRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub objective: Option<String>,
    #[serde(default)]
    pub posture: Option<String>,
    /// Counter entries to merge into the tally map.
    #[serde(default)]
    pub counters: Option<HashMap<String, i64>>,
    /// Free-text insight appended to the mission's log.
    #[serde(default)]
    pub add_insight: Option<String>,
}

impl UpdateMissionRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.objective.is_none()
            && self.posture.is_none()
            && self.counters.is_none()
            && self.add_insight.is_none()
    }
}

/// Raw state-change token: one of resume / paused / abort / aborted /
/// complete, or any pass-through string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StateChangeRequest {
    pub state: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DuplicateMissionRequest {
    /// Thread to seed the new run's thread from. Defaults to the most
    /// recently updated thread linked to the mission.
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Uuid>))]
    pub source_thread_id: Option<EntityId>,
    /// Start the duplicate immediately (engaging). Defaults to true.
    #[serde(default)]
    pub start_now: Option<bool>,
}

// ============================================================================
// AGENT TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorReportRequest {
    /// Worker name: coordinator, crawler or closer.
    pub worker: String,
    pub error_state: String,
    /// Minutes until the auto-clear deadline. Defaults to 30.
    #[serde(default)]
    pub retry_after_minutes: Option<i64>,
}

/// Partial worker status update. `clear_error` wins over `error_state`
/// and `next_retry_at` when both are present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AgentUpsertRequest {
    #[serde(default)]
    pub light: Option<StatusLight>,
    #[serde(default)]
    pub error_state: Option<String>,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<DateTime<Utc>>))]
    pub next_retry_at: Option<Timestamp>,
    /// Reset error_state and next_retry_at to empty.
    #[serde(default)]
    pub clear_error: Option<bool>,
    #[serde(default)]
    pub activity_note: Option<String>,
}

// ============================================================================
// THREAD TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateThreadRequest {
    pub title: String,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Uuid>))]
    pub mission_id: Option<EntityId>,
    #[serde(default)]
    pub goal: Option<String>,
}

/// Partial thread update. A stage change appends to the stage history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateThreadRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub synopsis: Option<String>,
    #[serde(default)]
    pub stage: Option<ThreadStage>,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Uuid>))]
    pub mission_id: Option<EntityId>,
}

/// Thread with its read-time status label, derived from the linked
/// mission's state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ThreadResponse {
    #[serde(flatten)]
    pub thread: Thread,
    pub thread_status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ThreadDetailResponse {
    #[serde(flatten)]
    pub thread: Thread,
    pub thread_status: String,
    /// Window of messages, chronological within the window.
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThreadMessagesQuery {
    /// Window size, default 50.
    pub limit: Option<usize>,
    /// Return messages created before this message id.
    pub before: Option<EntityId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListThreadsQuery {
    pub mission_id: Option<EntityId>,
}

// ============================================================================
// CHAT TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ChatRequest {
    /// Absent id targets the lazily-materialized default thread.
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Uuid>))]
    pub thread_id: Option<EntityId>,
    pub text: String,
}

/// Wire shape of an assistant reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ChatReplyResponse {
    #[cfg_attr(feature = "openapi", schema(value_type = Uuid))]
    pub thread_id: EntityId,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Uuid>))]
    pub mission_id: Option<EntityId>,
    pub text: String,
    pub redrafted: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<SuggestedAction>,
    #[cfg_attr(feature = "openapi", schema(value_type = DateTime<Utc>))]
    pub created_at: Timestamp,
}

impl From<ChatReply> for ChatReplyResponse {
    fn from(reply: ChatReply) -> Self {
        Self {
            thread_id: reply.thread_id,
            mission_id: reply.mission_id,
            text: reply.text,
            redrafted: reply.redrafted,
            actions: reply.actions,
            created_at: reply.created_at,
        }
    }
}

// ============================================================================
// HOT LEAD TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateHotLeadRequest {
    pub handle: String,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Uuid>))]
    pub mission_id: Option<EntityId>,
    #[serde(default)]
    pub source_forum: Option<String>,
}

/// Result of a hot-lead approval attempt. A policy block is a structured
/// outcome with status 200, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ApprovalOutcome {
    pub approved: bool,
    pub blocked: bool,
    pub warnings: Vec<String>,
}

// ============================================================================
// GUARDRAIL TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateGuardrailRequest {
    /// e.g. "product_brief" or "outreach_freeze".
    pub guardrail_type: String,
    #[serde(default)]
    pub scope: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub value: serde_json::Value,
    #[serde(default)]
    pub active: Option<bool>,
}

// ============================================================================
// EVENT TYPES
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListEventsQuery {
    pub source: Option<String>,
    pub event_name: Option<String>,
    pub mission_id: Option<EntityId>,
    pub thread_id: Option<EntityId>,
    pub limit: Option<usize>,
}

// ============================================================================
// HEALTH TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthResponse {
    pub ok: bool,
    pub uptime_seconds: u64,
    #[cfg_attr(feature = "openapi", schema(value_type = DateTime<Utc>))]
    pub timestamp: Timestamp,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_mission_request_is_empty() {
        assert!(UpdateMissionRequest::default().is_empty());
        let req = UpdateMissionRequest {
            title: Some("New".to_string()),
            ..Default::default()
        };
        assert!(!req.is_empty());
    }

    #[test]
    fn test_chat_request_optional_thread() {
        let req: ChatRequest = serde_json::from_str(r#"{"text": "hi"}"#).unwrap();
        assert!(req.thread_id.is_none());
        assert_eq!(req.text, "hi");
    }

    #[test]
    fn test_approval_outcome_shape() {
        let outcome = ApprovalOutcome {
            approved: false,
            blocked: true,
            warnings: vec!["outreach freeze active".to_string()],
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["approved"], false);
        assert_eq!(json["blocked"], true);
        assert_eq!(json["warnings"][0], "outreach freeze active");
    }
}
