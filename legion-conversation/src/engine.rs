//! Conversation engine: thread resolution, command dispatch, context
//! assembly, drift guard, persistence.

use crate::commands::{self, CommandIntent};
use crate::context::{assemble_context, corrective_turns, DriftPolicy, EngineConfig};
use legion_core::{
    AuditEvent, ChatMessage, EntityId, EntityType, LegionResult, MessageMetadata, MessageRole,
    Mission, MissionState, StorageError, SuggestedAction, Thread, Timestamp, TransitionSignal,
    ValidationError, WorkerName,
};
use legion_agents::StatusEngine;
use legion_llm::{CompletionRequest, ModelSelector, ProviderRegistry};
use legion_missions::MissionLifecycle;
use legion_storage::{EventSink, GuardrailStore, MessageStore, MissionStore, ThreadStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

const EVENT_SOURCE: &str = "legion/conversation";

/// Title of the thread materialized lazily when no thread id is given.
pub const DEFAULT_THREAD_TITLE: &str = "General";

const REPLY_MISSION_CREATED: &str =
    "Mission created. Would you like to make modifications before starting?";
const REPLY_MISSION_RESUMED: &str = "Resumed the mission. Ready to continue.";
const REPLY_MISSION_RUNNING: &str = "Mission is already running.";
const REPLY_MISSION_PAUSED: &str = "Mission paused.";
const REPLY_MISSION_STOPPED: &str = "Mission stopped and marked complete.";
const REPLY_MISSION_ABORTED: &str = "Mission aborted.";
const REPLY_NEW_RUN: &str = "New run created. Any changes before starting?";

/// Posture assigned to missions created through chat commands.
const CHAT_MISSION_POSTURE: &str = "research_only";

/// Assistant reply handed back to the chat endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub thread_id: EntityId,
    pub mission_id: Option<EntityId>,
    pub text: String,
    pub redrafted: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<SuggestedAction>,
    pub created_at: Timestamp,
}

/// Per-message orchestrator.
///
/// Multi-step flows are independent writes with no transaction: the human
/// turn is persisted before command dispatch or generation, and stays
/// persisted when the completion call fails.
pub struct ConversationEngine {
    threads: Arc<dyn ThreadStore>,
    messages: Arc<dyn MessageStore>,
    missions: Arc<dyn MissionStore>,
    guardrails: Arc<dyn GuardrailStore>,
    events: Arc<dyn EventSink>,
    lifecycle: Arc<MissionLifecycle>,
    statuses: Arc<StatusEngine>,
    registry: Arc<ProviderRegistry>,
    selector: Arc<ModelSelector>,
    drift: Arc<dyn DriftPolicy>,
    config: EngineConfig,
}

impl ConversationEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        threads: Arc<dyn ThreadStore>,
        messages: Arc<dyn MessageStore>,
        missions: Arc<dyn MissionStore>,
        guardrails: Arc<dyn GuardrailStore>,
        events: Arc<dyn EventSink>,
        lifecycle: Arc<MissionLifecycle>,
        statuses: Arc<StatusEngine>,
        registry: Arc<ProviderRegistry>,
        selector: Arc<ModelSelector>,
        drift: Arc<dyn DriftPolicy>,
        config: EngineConfig,
    ) -> Self {
        Self {
            threads,
            messages,
            missions,
            guardrails,
            events,
            lifecycle,
            statuses,
            registry,
            selector,
            drift,
            config,
        }
    }

    /// Handle one inbound chat message.
    ///
    /// The human turn is persisted unconditionally before any dispatch or
    /// generation. Recognized commands never reach the completion provider.
    pub async fn handle_message(
        &self,
        thread_id: Option<Uuid>,
        text: &str,
        now: Timestamp,
    ) -> LegionResult<ChatReply> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "text".to_string(),
            }
            .into());
        }

        let mut thread = self.resolve_thread(thread_id, now).await?;
        let prior = self.messages.message_list_by_thread(thread.thread_id).await?;

        let human = ChatMessage::new(
            thread.thread_id,
            thread.mission_id,
            MessageRole::Human,
            trimmed,
            now,
        );
        self.messages.message_insert(&human).await?;
        thread.message_count += 1;
        thread.updated_at = now;
        self.threads.thread_update(&thread).await?;

        if let Some(intent) = commands::match_command(trimmed) {
            if let Some(reply) = self.dispatch(intent, &mut thread, now).await? {
                return Ok(reply);
            }
            // pause/stop/abort without a linked mission falls through
        }

        self.generate_reply(&mut thread, &prior, trimmed, now).await
    }

    /// Copy a terminal mission into a fresh run: new mission (scanning,
    /// then engaging when `start_now`), new thread seeded from the source
    /// thread, one synthetic acknowledgement in the new thread.
    pub async fn duplicate_run(
        &self,
        mission_id: Uuid,
        source_thread_id: Uuid,
        start_now: bool,
        now: Timestamp,
    ) -> LegionResult<ChatReply> {
        let source = self.require_thread(source_thread_id).await?;
        let mission = self
            .lifecycle
            .duplicate_mission(mission_id, start_now, now)
            .await?;

        let mut thread = Thread::new(source.title.clone(), Some(mission.mission_id), now);
        thread.goal = source.goal.clone();
        thread.synopsis = source.synopsis.clone();
        self.threads.thread_insert(&thread).await?;

        self.emit_controls("duplicate_start", thread.thread_id, Some(mission.mission_id), now)
            .await;
        self.append_assistant(
            &mut thread,
            REPLY_NEW_RUN,
            vec![SuggestedAction::StartNow, SuggestedAction::EditDraft],
            false,
            now,
        )
        .await
    }

    // ------------------------------------------------------------------
    // Command dispatch
    // ------------------------------------------------------------------

    /// Returns `None` when the command requires a linked mission and the
    /// thread has none; the caller falls through to generation.
    async fn dispatch(
        &self,
        intent: CommandIntent,
        thread: &mut Thread,
        now: Timestamp,
    ) -> LegionResult<Option<ChatReply>> {
        let mission = self.linked_mission(thread).await?;
        match intent {
            CommandIntent::CreateMission => {
                Ok(Some(self.create_linked_mission(thread, now).await?))
            }
            CommandIntent::RunMission => match mission {
                Some(m) if m.state.is_paused() => {
                    let (resumed, signal) = self.lifecycle.resume(m.mission_id, now).await?;
                    self.publish_transition(signal, now).await;
                    self.emit_controls("run_resume", thread.thread_id, Some(resumed.mission_id), now)
                        .await;
                    let reply = self
                        .append_assistant(
                            thread,
                            REPLY_MISSION_RESUMED,
                            vec![SuggestedAction::StartNow, SuggestedAction::EditDraft],
                            false,
                            now,
                        )
                        .await?;
                    Ok(Some(reply))
                }
                Some(m) if m.state.is_terminal() => {
                    let reply = self
                        .duplicate_run(m.mission_id, thread.thread_id, true, now)
                        .await?;
                    Ok(Some(reply))
                }
                Some(_) => {
                    let reply = self
                        .append_assistant(thread, REPLY_MISSION_RUNNING, Vec::new(), false, now)
                        .await?;
                    Ok(Some(reply))
                }
                None => Ok(Some(self.create_linked_mission(thread, now).await?)),
            },
            CommandIntent::PauseMission => match mission {
                Some(m) => {
                    let (_, signal) = self.lifecycle.pause(m.mission_id, now).await?;
                    self.publish_transition(signal, now).await;
                    self.emit_controls("pause", thread.thread_id, Some(m.mission_id), now)
                        .await;
                    let reply = self
                        .append_assistant(thread, REPLY_MISSION_PAUSED, Vec::new(), false, now)
                        .await?;
                    Ok(Some(reply))
                }
                None => Ok(None),
            },
            CommandIntent::StopMission => match mission {
                Some(m) => {
                    let (_, signal) = self.lifecycle.complete(m.mission_id, now).await?;
                    self.publish_transition(signal, now).await;
                    self.emit_controls("stop", thread.thread_id, Some(m.mission_id), now)
                        .await;
                    let reply = self
                        .append_assistant(thread, REPLY_MISSION_STOPPED, Vec::new(), false, now)
                        .await?;
                    Ok(Some(reply))
                }
                None => Ok(None),
            },
            CommandIntent::AbortMission => match mission {
                Some(m) => {
                    let (_, signal) = self.lifecycle.abort(m.mission_id, now).await?;
                    self.publish_transition(signal, now).await;
                    self.emit_controls("abort", thread.thread_id, Some(m.mission_id), now)
                        .await;
                    let reply = self
                        .append_assistant(thread, REPLY_MISSION_ABORTED, Vec::new(), false, now)
                        .await?;
                    Ok(Some(reply))
                }
                None => Ok(None),
            },
        }
    }

    /// Create a mission titled from the thread (draft, then scanning) and
    /// link it.
    async fn create_linked_mission(
        &self,
        thread: &mut Thread,
        now: Timestamp,
    ) -> LegionResult<ChatReply> {
        let mission = self
            .lifecycle
            .create(
                thread.title.clone(),
                "",
                CHAT_MISSION_POSTURE,
                MissionState::Draft,
                now,
            )
            .await?;
        let (mission, signal) = self
            .lifecycle
            .set_state(mission.mission_id, "scanning", now)
            .await?;
        self.publish_transition(signal, now).await;

        thread.mission_id = Some(mission.mission_id);
        thread.updated_at = now;
        self.threads.thread_update(thread).await?;

        self.emit_controls("run_create", thread.thread_id, Some(mission.mission_id), now)
            .await;
        self.append_assistant(
            thread,
            REPLY_MISSION_CREATED,
            vec![SuggestedAction::StartNow, SuggestedAction::EditDraft],
            false,
            now,
        )
        .await
    }

    // ------------------------------------------------------------------
    // Generation path
    // ------------------------------------------------------------------

    async fn generate_reply(
        &self,
        thread: &mut Thread,
        prior: &[ChatMessage],
        text: &str,
        now: Timestamp,
    ) -> LegionResult<ChatReply> {
        let provider = self.registry.completion()?;
        let mission = self.linked_mission(thread).await?;
        let brief = self.product_brief().await?;

        let turns = assemble_context(
            &self.config,
            brief.as_deref(),
            thread,
            mission.as_ref(),
            prior,
            text,
        );
        let model_id = self.selector.select(provider.as_ref()).await?;
        let request = CompletionRequest {
            model_id: model_id.clone(),
            turns,
            temperature: Some(self.config.temperature),
            max_tokens: Some(self.config.max_tokens),
        };
        let response = provider.complete(&request).await?;
        self.emit(
            "context_preamble_used",
            serde_json::json!({ "thread_id": thread.thread_id, "model_id": model_id }),
            now,
        )
        .await;

        let mut reply_text = response.text;
        let mut redrafted = false;
        if self.drift.is_off_course(&reply_text) {
            let corrective = CompletionRequest {
                model_id,
                turns: corrective_turns(&self.config, thread, &reply_text),
                temperature: Some(self.config.temperature),
                max_tokens: Some(self.config.max_tokens),
            };
            // One corrective call; the result is taken as-is, no second scan.
            reply_text = provider.complete(&corrective).await?.text;
            redrafted = true;
            self.emit(
                "assistant_redrafted",
                serde_json::json!({ "thread_id": thread.thread_id }),
                now,
            )
            .await;
        }

        self.append_assistant(thread, &reply_text, Vec::new(), redrafted, now)
            .await
    }

    // ------------------------------------------------------------------
    // Shared plumbing
    // ------------------------------------------------------------------

    async fn resolve_thread(
        &self,
        thread_id: Option<Uuid>,
        now: Timestamp,
    ) -> LegionResult<Thread> {
        match thread_id {
            Some(id) => self.require_thread(id).await,
            None => {
                if let Some(thread) = self.threads.thread_find_by_title(DEFAULT_THREAD_TITLE).await? {
                    return Ok(thread);
                }
                let thread = Thread::new(DEFAULT_THREAD_TITLE, None, now);
                self.threads.thread_insert(&thread).await?;
                Ok(thread)
            }
        }
    }

    async fn require_thread(&self, id: Uuid) -> LegionResult<Thread> {
        self.threads.thread_get(id).await?.ok_or_else(|| {
            StorageError::NotFound {
                entity_type: EntityType::Thread,
                id,
            }
            .into()
        })
    }

    async fn linked_mission(&self, thread: &Thread) -> LegionResult<Option<Mission>> {
        match thread.mission_id {
            Some(id) => self.missions.mission_get(id).await,
            None => Ok(None),
        }
    }

    /// Text of the first active product brief guardrail, if any.
    async fn product_brief(&self) -> LegionResult<Option<String>> {
        let briefs = self.guardrails.guardrail_list_active("product_brief").await?;
        Ok(briefs
            .first()
            .and_then(|g| g.value.get("text"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()))
    }

    /// Persist the assistant turn, bump the thread, record coordinator
    /// activity, and emit the append signal.
    async fn append_assistant(
        &self,
        thread: &mut Thread,
        text: &str,
        actions: Vec<SuggestedAction>,
        redrafted: bool,
        now: Timestamp,
    ) -> LegionResult<ChatReply> {
        let metadata = MessageMetadata {
            redrafted,
            actions: actions.clone(),
        };
        let message = ChatMessage::new(
            thread.thread_id,
            thread.mission_id,
            MessageRole::Assistant,
            text,
            now,
        )
        .with_metadata(metadata);
        self.messages.message_insert(&message).await?;

        thread.message_count += 1;
        thread.updated_at = now;
        self.threads.thread_update(thread).await?;

        self.statuses
            .record_activity(
                WorkerName::Coordinator,
                format!("replied in {}", thread.title),
                now,
            )
            .await?;
        self.emit(
            "assistant_message_appended",
            serde_json::json!({
                "thread_id": thread.thread_id,
                "message_id": message.message_id,
            }),
            now,
        )
        .await;

        Ok(ChatReply {
            thread_id: thread.thread_id,
            mission_id: thread.mission_id,
            text: text.to_string(),
            redrafted,
            actions,
            created_at: now,
        })
    }

    /// Publish a lifecycle transition signal returned by the controller.
    async fn publish_transition(&self, signal: Option<TransitionSignal>, now: Timestamp) {
        if let Some(signal) = signal {
            self.lifecycle.publish(&signal, now).await;
        }
    }

    async fn emit_controls(
        &self,
        action: &str,
        thread_id: Uuid,
        mission_id: Option<Uuid>,
        now: Timestamp,
    ) {
        self.emit(
            "run_controls_used",
            serde_json::json!({
                "action": action,
                "thread_id": thread_id,
                "mission_id": mission_id,
            }),
            now,
        )
        .await;
    }

    async fn emit(&self, event_name: &str, payload: serde_json::Value, now: Timestamp) {
        let event = AuditEvent::new(event_name, EVENT_SOURCE, payload, now);
        if let Err(e) = self.events.event_append(&event).await {
            tracing::warn!(event_name, error = %e, "Audit signal write failed");
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
