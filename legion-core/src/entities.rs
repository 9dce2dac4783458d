//! Core entity structs for the LEGION orchestration system.

use crate::enums::{
    HotLeadStatus, MessageRole, MissionState, StatusLight, SuggestedAction, ThreadStage,
    TransitionKind, WorkerName,
};
use crate::{new_entity_id, EntityId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// MISSION
// ============================================================================

/// Mission - top-level unit of orchestrated work.
///
/// `previous_active_state` is set only when transitioning into paused from a
/// non-terminal, non-paused state, and is cleared only by being consumed on
/// resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Mission {
    #[cfg_attr(feature = "openapi", schema(value_type = Uuid))]
    pub mission_id: EntityId,
    pub title: String,
    pub objective: String,
    /// Behavioral policy tag, e.g. "research_only".
    pub posture: String,
    pub state: MissionState,
    pub previous_active_state: Option<MissionState>,
    /// Small integer tally map (forums_found, prospects_added, hot_leads).
    pub counters: HashMap<String, i64>,
    /// Free-text insight log, newest last.
    pub insights: Vec<Insight>,
    #[cfg_attr(feature = "openapi", schema(value_type = DateTime<Utc>))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = DateTime<Utc>))]
    pub updated_at: Timestamp,
}

impl Mission {
    /// Create a mission with seeded counters.
    pub fn new(
        title: impl Into<String>,
        objective: impl Into<String>,
        posture: impl Into<String>,
        state: MissionState,
        now: Timestamp,
    ) -> Self {
        let mut counters = HashMap::new();
        counters.insert("forums_found".to_string(), 0);
        counters.insert("prospects_added".to_string(), 0);
        counters.insert("hot_leads".to_string(), 0);
        Self {
            mission_id: new_entity_id(),
            title: title.into(),
            objective: objective.into(),
            posture: posture.into(),
            state,
            previous_active_state: None,
            counters,
            insights: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Timestamped free-text observation attached to a mission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Insight {
    pub text: String,
    #[cfg_attr(feature = "openapi", schema(value_type = DateTime<Utc>))]
    pub created_at: Timestamp,
}

/// Signal describing a lifecycle transition, published to the audit log by
/// the caller after the primary mutation commits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionSignal {
    pub kind: TransitionKind,
    pub mission_id: EntityId,
}

// ============================================================================
// AGENT STATUS
// ============================================================================

/// Stored status record for one of the three fixed workers.
///
/// The light is recomputed at read time from missions, hot leads and the
/// error fields; at most one record exists per worker name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AgentStatusRecord {
    #[cfg_attr(feature = "openapi", schema(value_type = Uuid))]
    pub agent_id: EntityId,
    pub name: WorkerName,
    pub light: StatusLight,
    pub error_state: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<DateTime<Utc>>))]
    pub next_retry_at: Option<Timestamp>,
    #[cfg_attr(feature = "openapi", schema(value_type = DateTime<Utc>))]
    pub last_activity: Timestamp,
    pub activity_log: Vec<ActivityEntry>,
    #[cfg_attr(feature = "openapi", schema(value_type = DateTime<Utc>))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = DateTime<Utc>))]
    pub updated_at: Timestamp,
}

impl AgentStatusRecord {
    /// Seed a fresh record for a worker that has no stored row yet.
    pub fn seed(name: WorkerName, now: Timestamp) -> Self {
        Self {
            agent_id: new_entity_id(),
            name,
            light: StatusLight::Yellow,
            error_state: None,
            next_retry_at: None,
            last_activity: now,
            activity_log: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Append-only activity log entry for a worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ActivityEntry {
    pub note: String,
    #[cfg_attr(feature = "openapi", schema(value_type = DateTime<Utc>))]
    pub at: Timestamp,
}

// ============================================================================
// THREADS AND MESSAGES
// ============================================================================

/// Conversation thread, optionally linked to a mission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Thread {
    #[cfg_attr(feature = "openapi", schema(value_type = Uuid))]
    pub thread_id: EntityId,
    pub title: String,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Uuid>))]
    pub mission_id: Option<EntityId>,
    pub goal: Option<String>,
    pub stage: ThreadStage,
    pub synopsis: Option<String>,
    /// Append-only record of stage changes.
    pub stage_history: Vec<StageChange>,
    pub message_count: i64,
    #[cfg_attr(feature = "openapi", schema(value_type = DateTime<Utc>))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = DateTime<Utc>))]
    pub updated_at: Timestamp,
}

impl Thread {
    pub fn new(title: impl Into<String>, mission_id: Option<EntityId>, now: Timestamp) -> Self {
        Self {
            thread_id: new_entity_id(),
            title: title.into(),
            mission_id,
            goal: None,
            stage: ThreadStage::default(),
            synopsis: None,
            stage_history: Vec::new(),
            message_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One entry in a thread's stage history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StageChange {
    pub from: ThreadStage,
    pub to: ThreadStage,
    #[cfg_attr(feature = "openapi", schema(value_type = DateTime<Utc>))]
    pub at: Timestamp,
}

/// Immutable chat message. Ordered by `created_at` within a thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ChatMessage {
    #[cfg_attr(feature = "openapi", schema(value_type = Uuid))]
    pub message_id: EntityId,
    #[cfg_attr(feature = "openapi", schema(value_type = Uuid))]
    pub thread_id: EntityId,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Uuid>))]
    pub mission_id: Option<EntityId>,
    pub role: MessageRole,
    pub text: String,
    #[serde(default)]
    pub metadata: MessageMetadata,
    #[cfg_attr(feature = "openapi", schema(value_type = DateTime<Utc>))]
    pub created_at: Timestamp,
}

impl ChatMessage {
    pub fn new(
        thread_id: EntityId,
        mission_id: Option<EntityId>,
        role: MessageRole,
        text: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            message_id: new_entity_id(),
            thread_id,
            mission_id,
            role,
            text: text.into(),
            metadata: MessageMetadata::default(),
            created_at: now,
        }
    }

    pub fn with_metadata(mut self, metadata: MessageMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Metadata carried on a chat message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MessageMetadata {
    /// True when the text is the result of a drift-triggered corrective call.
    #[serde(default)]
    pub redrafted: bool,
    /// Suggested follow-up actions for the UI.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<SuggestedAction>,
}

// ============================================================================
// AUXILIARY RECORDS
// ============================================================================

/// Hot lead surfaced by a mission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HotLead {
    #[cfg_attr(feature = "openapi", schema(value_type = Uuid))]
    pub lead_id: EntityId,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Uuid>))]
    pub mission_id: Option<EntityId>,
    pub handle: String,
    pub source_forum: Option<String>,
    pub status: HotLeadStatus,
    #[cfg_attr(feature = "openapi", schema(value_type = DateTime<Utc>))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = DateTime<Utc>))]
    pub updated_at: Timestamp,
}

/// Policy guardrail record. `product_brief` feeds context assembly;
/// `outreach_freeze` blocks hot-lead approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Guardrail {
    #[cfg_attr(feature = "openapi", schema(value_type = Uuid))]
    pub guardrail_id: EntityId,
    pub guardrail_type: String,
    pub scope: String,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub value: serde_json::Value,
    pub active: bool,
    #[cfg_attr(feature = "openapi", schema(value_type = DateTime<Utc>))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = DateTime<Utc>))]
    pub updated_at: Timestamp,
}

/// Append-only audit event. Writes are best-effort and never roll back the
/// primary mutation they describe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AuditEvent {
    #[cfg_attr(feature = "openapi", schema(value_type = Uuid))]
    pub event_id: EntityId,
    pub event_name: String,
    pub source: String,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub payload: serde_json::Value,
    #[cfg_attr(feature = "openapi", schema(value_type = DateTime<Utc>))]
    pub timestamp: Timestamp,
}

impl AuditEvent {
    pub fn new(
        event_name: impl Into<String>,
        source: impl Into<String>,
        payload: serde_json::Value,
        now: Timestamp,
    ) -> Self {
        Self {
            event_id: new_entity_id(),
            event_name: event_name.into(),
            source: source.into(),
            payload,
            timestamp: now,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
