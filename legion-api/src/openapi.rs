//! OpenAPI Specification for the LEGION API
//!
//! Generated with utoipa from the route annotations and the shared entity
//! types.

use utoipa::OpenApi;

use crate::error::{ApiError, ErrorCode};
use crate::routes::{agent, chat, event, guardrail, health, hot_lead, mission, thread};
use crate::types::{
    AgentUpsertRequest, ApprovalOutcome, ChatReplyResponse, ChatRequest, CreateGuardrailRequest,
    CreateHotLeadRequest, CreateMissionRequest, CreateThreadRequest, DuplicateMissionRequest,
    ErrorReportRequest, HealthResponse, StateChangeRequest, ThreadDetailResponse, ThreadResponse,
    UpdateMissionRequest, UpdateThreadRequest,
};

use legion_core::{
    ActivityEntry, AgentStatusRecord, AuditEvent, ChatMessage, Guardrail, HotLead, HotLeadStatus,
    Insight, MessageMetadata, MessageRole, Mission, MissionState, StageChange, StatusLight,
    SuggestedAction, Thread, ThreadStage, WorkerName,
};

/// OpenAPI document for the LEGION API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "LEGION API",
        version = "0.1.0",
        description = "Mission orchestration service: missions, worker statuses, conversation threads and the Praefectus chat coordinator",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT"),
    ),
    servers(
        (url = "http://localhost:3000", description = "Local Development")
    ),
    tags(
        (name = "Missions", description = "Mission lifecycle: create, update, state changes, duplication"),
        (name = "Agents", description = "Derived traffic-light statuses for the three fixed workers"),
        (name = "Threads", description = "Conversation threads with message windows and stage history"),
        (name = "Chat", description = "Praefectus chat endpoint with command triggers"),
        (name = "Hot Leads", description = "Hot lead intake and policy-gated approval"),
        (name = "Guardrails", description = "Policy records feeding chat context and approval gates"),
        (name = "Events", description = "Append-only audit log"),
        (name = "Health", description = "Liveness check"),
    ),
    paths(
        mission::create_mission,
        mission::list_missions,
        mission::get_mission,
        mission::update_mission,
        mission::change_mission_state,
        mission::duplicate_mission,

        agent::list_agents,
        agent::report_error,
        agent::upsert_agent,

        thread::create_thread,
        thread::list_threads,
        thread::get_thread,
        thread::update_thread,

        chat::post_message,

        hot_lead::create_hot_lead,
        hot_lead::list_hot_leads,
        hot_lead::approve_hot_lead,

        guardrail::create_guardrail,
        guardrail::list_guardrails,

        event::list_events,

        health::health,
    ),
    components(schemas(
        // Request/response envelopes
        ApiError,
        ErrorCode,
        CreateMissionRequest,
        UpdateMissionRequest,
        StateChangeRequest,
        DuplicateMissionRequest,
        ErrorReportRequest,
        AgentUpsertRequest,
        CreateThreadRequest,
        UpdateThreadRequest,
        ThreadResponse,
        ThreadDetailResponse,
        ChatRequest,
        ChatReplyResponse,
        CreateHotLeadRequest,
        ApprovalOutcome,
        CreateGuardrailRequest,
        HealthResponse,
        // Domain entities
        Mission,
        MissionState,
        Insight,
        AgentStatusRecord,
        ActivityEntry,
        WorkerName,
        StatusLight,
        Thread,
        ThreadStage,
        StageChange,
        ChatMessage,
        MessageRole,
        MessageMetadata,
        SuggestedAction,
        HotLead,
        HotLeadStatus,
        Guardrail,
        AuditEvent,
    ))
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_document_generates() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("/api/v1/missions"));
        assert!(json.contains("/api/v1/chat/message"));
        assert!(json.contains("/health"));
    }
}
