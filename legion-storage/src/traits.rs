//! Async store traits for LEGION entities.
//!
//! Each trait covers one collection. Updates take the full entity and are
//! last-write-wins; callers fetch, modify, then write back.

use async_trait::async_trait;
use legion_core::{
    AgentStatusRecord, AuditEvent, ChatMessage, Guardrail, HotLead, LegionResult, Mission, Thread,
    WorkerName,
};
use uuid::Uuid;

// ============================================================================
// MISSION OPERATIONS
// ============================================================================

#[async_trait]
pub trait MissionStore: Send + Sync {
    /// Insert a new mission.
    async fn mission_insert(&self, m: &Mission) -> LegionResult<()>;

    /// Get a mission by ID.
    async fn mission_get(&self, id: Uuid) -> LegionResult<Option<Mission>>;

    /// List all missions, newest first.
    async fn mission_list(&self) -> LegionResult<Vec<Mission>>;

    /// Replace a stored mission. Errors if the mission does not exist.
    async fn mission_update(&self, m: &Mission) -> LegionResult<()>;
}

// ============================================================================
// AGENT STATUS OPERATIONS
// ============================================================================

#[async_trait]
pub trait AgentStatusStore: Send + Sync {
    /// Insert a worker status record.
    async fn agent_status_insert(&self, r: &AgentStatusRecord) -> LegionResult<()>;

    /// Get the record for a worker, if one exists.
    async fn agent_status_get(&self, name: WorkerName) -> LegionResult<Option<AgentStatusRecord>>;

    /// List all worker records in coordinator/crawler/closer order.
    async fn agent_status_list(&self) -> LegionResult<Vec<AgentStatusRecord>>;

    /// Replace a stored record. Errors if no record exists for the worker.
    async fn agent_status_update(&self, r: &AgentStatusRecord) -> LegionResult<()>;
}

// ============================================================================
// THREAD AND MESSAGE OPERATIONS
// ============================================================================

#[async_trait]
pub trait ThreadStore: Send + Sync {
    /// Insert a new thread.
    async fn thread_insert(&self, t: &Thread) -> LegionResult<()>;

    /// Get a thread by ID.
    async fn thread_get(&self, id: Uuid) -> LegionResult<Option<Thread>>;

    /// Find a thread by exact title. Used to locate the default thread.
    async fn thread_find_by_title(&self, title: &str) -> LegionResult<Option<Thread>>;

    /// List threads, optionally filtered by linked mission, most recently
    /// updated first.
    async fn thread_list(&self, mission_id: Option<Uuid>) -> LegionResult<Vec<Thread>>;

    /// Replace a stored thread. Errors if the thread does not exist.
    async fn thread_update(&self, t: &Thread) -> LegionResult<()>;
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Append a message. Messages are immutable once written.
    async fn message_insert(&self, m: &ChatMessage) -> LegionResult<()>;

    /// Get a single message by ID.
    async fn message_get(&self, id: Uuid) -> LegionResult<Option<ChatMessage>>;

    /// List a thread's messages in chronological order.
    async fn message_list_by_thread(&self, thread_id: Uuid) -> LegionResult<Vec<ChatMessage>>;
}

// ============================================================================
// AUXILIARY RECORD OPERATIONS
// ============================================================================

#[async_trait]
pub trait HotLeadStore: Send + Sync {
    async fn hot_lead_insert(&self, l: &HotLead) -> LegionResult<()>;

    async fn hot_lead_get(&self, id: Uuid) -> LegionResult<Option<HotLead>>;

    async fn hot_lead_list(&self) -> LegionResult<Vec<HotLead>>;

    async fn hot_lead_update(&self, l: &HotLead) -> LegionResult<()>;
}

#[async_trait]
pub trait GuardrailStore: Send + Sync {
    async fn guardrail_insert(&self, g: &Guardrail) -> LegionResult<()>;

    async fn guardrail_list(&self) -> LegionResult<Vec<Guardrail>>;

    /// List active guardrails of a given type.
    async fn guardrail_list_active(&self, guardrail_type: &str) -> LegionResult<Vec<Guardrail>>;
}

// ============================================================================
// AUDIT EVENT SINK
// ============================================================================

/// Filter for audit event listing.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub source: Option<String>,
    pub event_name: Option<String>,
    pub limit: Option<usize>,
}

#[async_trait]
pub trait EventSink: Send + Sync {
    /// Append an audit event. Callers treat failures as non-fatal.
    async fn event_append(&self, e: &AuditEvent) -> LegionResult<()>;

    /// List events, newest first.
    async fn event_list(&self, filter: &EventFilter) -> LegionResult<Vec<AuditEvent>>;
}
