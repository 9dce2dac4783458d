//! LEGION Missions - Mission Lifecycle Controller
//!
//! Owns every mission state change. The transition rules are a pure
//! function over the mission; `MissionLifecycle` wraps them with storage
//! and best-effort audit signals.
//!
//! The state machine is lenient by design: the five verbs (pause, resume,
//! abort, complete, overwrite) are the only ones with semantics, and any
//! unrecognized state string is written verbatim.

use legion_core::{
    AuditEvent, EntityType, LegionResult, Mission, MissionState, StorageError, Timestamp,
    TransitionKind, TransitionSignal,
};
use legion_storage::{EventSink, MissionStore};
use std::sync::Arc;
use uuid::Uuid;

const EVENT_SOURCE: &str = "legion/missions";

// ============================================================================
// STATE REQUESTS AND PURE TRANSITIONS
// ============================================================================

/// Parsed state-change request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateRequest {
    Resume,
    Pause,
    Abort,
    Complete,
    /// Any other requested state, stored verbatim.
    Overwrite(MissionState),
}

impl StateRequest {
    /// Map a raw request token to a transition. "abort" and "aborted" are
    /// both accepted; anything unrecognized becomes a verbatim overwrite.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "resume" => StateRequest::Resume,
            "paused" => StateRequest::Pause,
            "abort" | "aborted" => StateRequest::Abort,
            "complete" => StateRequest::Complete,
            other => StateRequest::Overwrite(MissionState::from(other)),
        }
    }
}

/// Apply a state request to a mission in place.
///
/// Returns the transition kind when the mission changed, `None` for
/// no-ops (pausing an already-paused or terminal mission).
///
/// Invariant: `previous_active_state` is written only by a pause from a
/// non-terminal, non-paused state, and cleared only by being consumed on
/// resume.
pub fn apply_state_request(
    mission: &mut Mission,
    request: &StateRequest,
    now: Timestamp,
) -> Option<TransitionKind> {
    let kind = match request {
        StateRequest::Pause => {
            if mission.state.is_paused() || mission.state.is_terminal() {
                return None;
            }
            mission.previous_active_state = Some(mission.state.clone());
            mission.state = MissionState::Paused;
            TransitionKind::Paused
        }
        StateRequest::Resume => {
            mission.state = mission
                .previous_active_state
                .take()
                .unwrap_or(MissionState::Scanning);
            TransitionKind::Resumed
        }
        StateRequest::Abort => {
            mission.state = MissionState::Aborted;
            TransitionKind::Aborted
        }
        StateRequest::Complete => {
            mission.state = MissionState::Complete;
            TransitionKind::Completed
        }
        StateRequest::Overwrite(state) => {
            mission.state = state.clone();
            TransitionKind::Overwritten
        }
    };
    mission.updated_at = now;
    Some(kind)
}

// ============================================================================
// LIFECYCLE CONTROLLER
// ============================================================================

/// Store-backed mission lifecycle.
///
/// State transitions hand a `TransitionSignal` back to the caller, who owns
/// publishing it to the audit log via `publish`. Creation and duplication
/// record their events directly; a failed signal write is logged and never
/// rolls the mutation back.
pub struct MissionLifecycle {
    missions: Arc<dyn MissionStore>,
    events: Arc<dyn EventSink>,
}

impl MissionLifecycle {
    pub fn new(missions: Arc<dyn MissionStore>, events: Arc<dyn EventSink>) -> Self {
        Self { missions, events }
    }

    /// Create a mission and record `mission_created`.
    pub async fn create(
        &self,
        title: impl Into<String>,
        objective: impl Into<String>,
        posture: impl Into<String>,
        state: MissionState,
        now: Timestamp,
    ) -> LegionResult<Mission> {
        let mission = Mission::new(title, objective, posture, state, now);
        self.missions.mission_insert(&mission).await?;
        self.emit(
            "mission_created",
            serde_json::json!({ "mission_id": mission.mission_id }),
            now,
        )
        .await;
        Ok(mission)
    }

    /// Apply a raw state-change token to a mission.
    ///
    /// Returns the signal for the caller to publish, `None` for no-ops.
    pub async fn set_state(
        &self,
        id: Uuid,
        raw: &str,
        now: Timestamp,
    ) -> LegionResult<(Mission, Option<TransitionSignal>)> {
        let mut mission = self.require(id).await?;
        let request = StateRequest::parse(raw);
        let signal = match apply_state_request(&mut mission, &request, now) {
            Some(kind) => {
                self.missions.mission_update(&mission).await?;
                Some(TransitionSignal {
                    kind,
                    mission_id: mission.mission_id,
                })
            }
            None => None,
        };
        Ok((mission, signal))
    }

    pub async fn pause(
        &self,
        id: Uuid,
        now: Timestamp,
    ) -> LegionResult<(Mission, Option<TransitionSignal>)> {
        self.set_state(id, "paused", now).await
    }

    pub async fn resume(
        &self,
        id: Uuid,
        now: Timestamp,
    ) -> LegionResult<(Mission, Option<TransitionSignal>)> {
        self.set_state(id, "resume", now).await
    }

    pub async fn abort(
        &self,
        id: Uuid,
        now: Timestamp,
    ) -> LegionResult<(Mission, Option<TransitionSignal>)> {
        self.set_state(id, "abort", now).await
    }

    pub async fn complete(
        &self,
        id: Uuid,
        now: Timestamp,
    ) -> LegionResult<(Mission, Option<TransitionSignal>)> {
        self.set_state(id, "complete", now).await
    }

    /// Publish a transition signal to the audit log, best effort.
    pub async fn publish(&self, signal: &TransitionSignal, now: Timestamp) {
        self.emit(
            signal.kind.event_name(),
            serde_json::json!({ "mission_id": signal.mission_id }),
            now,
        )
        .await;
    }

    /// Copy a mission into a fresh scanning run, optionally starting it
    /// (engaging) right away. The caller wires up the new thread.
    pub async fn duplicate_mission(
        &self,
        source_id: Uuid,
        start_now: bool,
        now: Timestamp,
    ) -> LegionResult<Mission> {
        let source = self.require(source_id).await?;
        let mut duplicate = Mission::new(
            source.title.clone(),
            source.objective.clone(),
            source.posture.clone(),
            MissionState::Scanning,
            now,
        );
        self.missions.mission_insert(&duplicate).await?;
        self.emit(
            "mission_created",
            serde_json::json!({
                "mission_id": duplicate.mission_id,
                "duplicated_from": source_id,
            }),
            now,
        )
        .await;

        if start_now {
            duplicate.state = MissionState::Engaging;
            duplicate.updated_at = now;
            self.missions.mission_update(&duplicate).await?;
            self.emit(
                "mission_started",
                serde_json::json!({ "mission_id": duplicate.mission_id }),
                now,
            )
            .await;
        }
        Ok(duplicate)
    }

    /// Fetch a mission, mapping absence to NotFound.
    pub async fn require(&self, id: Uuid) -> LegionResult<Mission> {
        self.missions
            .mission_get(id)
            .await?
            .ok_or_else(|| {
                StorageError::NotFound {
                    entity_type: EntityType::Mission,
                    id,
                }
                .into()
            })
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

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use legion_storage::InMemoryStore;

    fn mission_in(state: MissionState) -> Mission {
        Mission::new("M", "obj", "research_only", state, Utc::now())
    }

    #[test]
    fn test_pause_captures_previous_active_state() {
        for state in [
            MissionState::Draft,
            MissionState::Scanning,
            MissionState::Engaging,
            MissionState::Escalating,
        ] {
            let mut m = mission_in(state.clone());
            let kind = apply_state_request(&mut m, &StateRequest::Pause, Utc::now());
            assert_eq!(kind, Some(TransitionKind::Paused));
            assert_eq!(m.state, MissionState::Paused);
            assert_eq!(m.previous_active_state, Some(state));
        }
    }

    #[test]
    fn test_pause_is_noop_when_paused_or_terminal() {
        for state in [
            MissionState::Paused,
            MissionState::Complete,
            MissionState::Aborted,
        ] {
            let mut m = mission_in(state.clone());
            let kind = apply_state_request(&mut m, &StateRequest::Pause, Utc::now());
            assert_eq!(kind, None);
            assert_eq!(m.state, state);
            assert!(m.previous_active_state.is_none());
        }
    }

    #[test]
    fn test_resume_restores_and_consumes() {
        let mut m = mission_in(MissionState::Engaging);
        apply_state_request(&mut m, &StateRequest::Pause, Utc::now());
        let kind = apply_state_request(&mut m, &StateRequest::Resume, Utc::now());
        assert_eq!(kind, Some(TransitionKind::Resumed));
        assert_eq!(m.state, MissionState::Engaging);
        assert!(m.previous_active_state.is_none());
    }

    #[test]
    fn test_resume_without_history_falls_back_to_scanning() {
        let mut m = mission_in(MissionState::Paused);
        let kind = apply_state_request(&mut m, &StateRequest::Resume, Utc::now());
        assert_eq!(kind, Some(TransitionKind::Resumed));
        assert_eq!(m.state, MissionState::Scanning);
    }

    #[test]
    fn test_abort_and_complete_are_unconditional() {
        let mut m = mission_in(MissionState::Complete);
        apply_state_request(&mut m, &StateRequest::Abort, Utc::now());
        assert_eq!(m.state, MissionState::Aborted);

        let mut m = mission_in(MissionState::Paused);
        apply_state_request(&mut m, &StateRequest::Complete, Utc::now());
        assert_eq!(m.state, MissionState::Complete);
    }

    #[test]
    fn test_overwrite_stores_verbatim() {
        let mut m = mission_in(MissionState::Scanning);
        let request = StateRequest::parse("on_hold_for_review");
        let kind = apply_state_request(&mut m, &request, Utc::now());
        assert_eq!(kind, Some(TransitionKind::Overwritten));
        assert_eq!(m.state.as_str(), "on_hold_for_review");
    }

    #[test]
    fn test_overwrite_leaves_pause_history_intact() {
        // previous_active_state is only cleared by being consumed on resume
        let mut m = mission_in(MissionState::Scanning);
        apply_state_request(&mut m, &StateRequest::Pause, Utc::now());
        apply_state_request(
            &mut m,
            &StateRequest::Overwrite(MissionState::Engaging),
            Utc::now(),
        );
        assert_eq!(m.previous_active_state, Some(MissionState::Scanning));
        apply_state_request(&mut m, &StateRequest::Resume, Utc::now());
        assert_eq!(m.state, MissionState::Scanning);
        assert!(m.previous_active_state.is_none());
    }

    #[test]
    fn test_state_request_parse_tokens() {
        assert_eq!(StateRequest::parse("resume"), StateRequest::Resume);
        assert_eq!(StateRequest::parse("paused"), StateRequest::Pause);
        assert_eq!(StateRequest::parse("abort"), StateRequest::Abort);
        assert_eq!(StateRequest::parse("aborted"), StateRequest::Abort);
        assert_eq!(StateRequest::parse("complete"), StateRequest::Complete);
        assert_eq!(
            StateRequest::parse("engaging"),
            StateRequest::Overwrite(MissionState::Engaging)
        );
    }

    #[tokio::test]
    async fn test_lifecycle_set_state_returns_signal_for_caller() {
        let store = Arc::new(InMemoryStore::new());
        let lifecycle = MissionLifecycle::new(store.clone(), store.clone());
        let now = Utc::now();

        let m = lifecycle
            .create("M", "obj", "research_only", MissionState::Scanning, now)
            .await
            .unwrap();
        assert_eq!(store.event_count(), 1);

        // The transition itself writes no event; the caller publishes
        let (paused, signal) = lifecycle.pause(m.mission_id, now).await.unwrap();
        assert_eq!(paused.state, MissionState::Paused);
        let signal = signal.unwrap();
        assert_eq!(signal.kind, TransitionKind::Paused);
        assert_eq!(signal.mission_id, m.mission_id);
        assert_eq!(store.event_count(), 1);

        lifecycle.publish(&signal, now).await;
        assert_eq!(store.event_count(), 2);

        let (resumed, signal) = lifecycle.resume(m.mission_id, now).await.unwrap();
        assert_eq!(resumed.state, MissionState::Scanning);
        assert_eq!(signal.unwrap().kind, TransitionKind::Resumed);

        // no-op pause of a terminal mission yields no signal
        lifecycle.complete(m.mission_id, now).await.unwrap();
        let (_, signal) = lifecycle.pause(m.mission_id, now).await.unwrap();
        assert!(signal.is_none());
    }

    #[tokio::test]
    async fn test_lifecycle_unknown_mission_is_not_found() {
        let store = Arc::new(InMemoryStore::new());
        let lifecycle = MissionLifecycle::new(store.clone(), store);
        let err = lifecycle
            .set_state(legion_core::new_entity_id(), "resume", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            legion_core::LegionError::Storage(StorageError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_duplicate_mission_copies_and_starts() {
        let store = Arc::new(InMemoryStore::new());
        let lifecycle = MissionLifecycle::new(store.clone(), store.clone());
        let now = Utc::now();

        let source = lifecycle
            .create("M", "obj", "research_only", MissionState::Complete, now)
            .await
            .unwrap();

        let dup = lifecycle
            .duplicate_mission(source.mission_id, true, now)
            .await
            .unwrap();
        assert_ne!(dup.mission_id, source.mission_id);
        assert_eq!(dup.title, source.title);
        assert_eq!(dup.posture, source.posture);
        assert_eq!(dup.state, MissionState::Engaging);

        let dup = lifecycle
            .duplicate_mission(source.mission_id, false, now)
            .await
            .unwrap();
        assert_eq!(dup.state, MissionState::Scanning);
    }
}

// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
