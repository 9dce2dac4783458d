//! Shared fixtures and test doubles for the LEGION workspace.

use async_trait::async_trait;
use chrono::Utc;
use legion_core::{
    CompletionError, Guardrail, HotLead, HotLeadStatus, LegionError, LegionResult, Mission,
    MissionState, Thread, new_entity_id,
};
use legion_llm::{
    CompletionProvider, CompletionRequest, CompletionResponse, ModelInfo,
};
use std::collections::VecDeque;
use std::sync::Mutex;

// ============================================================================
// FIXTURES
// ============================================================================

pub fn mission_fixture(posture: &str, state: MissionState) -> Mission {
    Mission::new("Find design partners", "", posture, state, Utc::now())
}

pub fn thread_fixture(title: &str, mission_id: Option<legion_core::EntityId>) -> Thread {
    Thread::new(title, mission_id, Utc::now())
}

pub fn hot_lead_fixture(status: HotLeadStatus) -> HotLead {
    let now = Utc::now();
    HotLead {
        lead_id: new_entity_id(),
        mission_id: None,
        handle: "user_42".to_string(),
        source_forum: Some("r/selfhosted".to_string()),
        status,
        created_at: now,
        updated_at: now,
    }
}

pub fn product_brief_fixture(text: &str) -> Guardrail {
    let now = Utc::now();
    Guardrail {
        guardrail_id: new_entity_id(),
        guardrail_type: "product_brief".to_string(),
        scope: "global".to_string(),
        value: serde_json::json!({ "text": text }),
        active: true,
        created_at: now,
        updated_at: now,
    }
}

// ============================================================================
// SCRIPTED COMPLETION PROVIDER
// ============================================================================

/// Completion provider that replays queued responses and records every
/// request it receives. An exhausted queue fails the call, which doubles
/// as the upstream-failure fixture.
#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let provider = Self::new();
        provider.enqueue_all(replies);
        provider
    }

    pub fn enqueue(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().push_back(reply.into());
    }

    pub fn enqueue_all<I, S>(&self, replies: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut queue = self.replies.lock().unwrap();
        for reply in replies {
            queue.push_back(reply.into());
        }
    }

    /// Requests seen so far, in order.
    pub fn recorded_requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, request: &CompletionRequest) -> LegionResult<CompletionResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(text) => Ok(CompletionResponse {
                text,
                tokens_in: Some(10),
                tokens_out: Some(20),
                latency_ms: 1,
                provider: "scripted".to_string(),
                model_id: request.model_id.clone(),
            }),
            None => Err(LegionError::Completion(CompletionError::RequestFailed {
                provider: "scripted".to_string(),
                status: 500,
                message: "No scripted reply queued".to_string(),
            })),
        }
    }

    async fn list_models(&self) -> LegionResult<Vec<ModelInfo>> {
        Ok(vec![ModelInfo {
            id: "scripted-1".to_string(),
            provider: "scripted".to_string(),
            context_window: None,
            capabilities: vec!["chat".to_string()],
        }])
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
