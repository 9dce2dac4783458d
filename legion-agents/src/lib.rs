//! LEGION Agents - Worker Status Derivation
//!
//! Derives the traffic-light indicators for the three fixed workers
//! (coordinator, crawler, closer) lazily, every time statuses are read.
//! There is no background scheduler: the list endpoint calls
//! `reconcile_all` inline and gets the already-reconciled records back.

use chrono::Duration;
use legion_core::{
    ActivityEntry, AgentStatusRecord, AuditEvent, HotLeadStatus, LegionResult, StatusLight,
    Timestamp, WorkerName,
};
use legion_storage::{AgentStatusStore, EventSink, HotLeadStore, MissionStore};
use std::sync::Arc;

const EVENT_SOURCE: &str = "legion/agents";

/// Cap on stored activity-log entries per worker.
const ACTIVITY_LOG_CAP: usize = 50;

/// Partial update for an explicit worker upsert.
#[derive(Debug, Clone, Default)]
pub struct AgentStatusPatch {
    pub light: Option<StatusLight>,
    pub error_state: Option<Option<String>>,
    pub next_retry_at: Option<Option<Timestamp>>,
    pub activity_note: Option<String>,
}

/// Read-time status engine over the mission and hot-lead stores.
pub struct StatusEngine {
    statuses: Arc<dyn AgentStatusStore>,
    missions: Arc<dyn MissionStore>,
    hot_leads: Arc<dyn HotLeadStore>,
    events: Arc<dyn EventSink>,
}

impl StatusEngine {
    pub fn new(
        statuses: Arc<dyn AgentStatusStore>,
        missions: Arc<dyn MissionStore>,
        hot_leads: Arc<dyn HotLeadStore>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            statuses,
            missions,
            hot_leads,
            events,
        }
    }

    /// Seed missing workers and recompute the derived lights.
    ///
    /// Idempotent: a second call with the same `now` and no intervening
    /// writes returns identical records and emits nothing.
    pub async fn reconcile_all(&self, now: Timestamp) -> LegionResult<Vec<AgentStatusRecord>> {
        let any_active = self.any_mission_active().await?;
        let research_gate = self.any_research_only_active().await?;
        let any_approved_lead = self.any_approved_hot_lead().await?;

        let mut out = Vec::with_capacity(WorkerName::ALL.len());
        for name in WorkerName::ALL {
            let record = match self.statuses.agent_status_get(name).await? {
                Some(r) => r,
                None => {
                    let seeded = AgentStatusRecord::seed(name, now);
                    self.statuses.agent_status_insert(&seeded).await?;
                    seeded
                }
            };
            let record = match name {
                // The coordinator only reflects explicit writes.
                WorkerName::Coordinator => record,
                WorkerName::Crawler => self.reconcile_crawler(record, any_active, now).await?,
                WorkerName::Closer => {
                    self.reconcile_closer(record, research_gate, any_approved_lead, now)
                        .await?
                }
            };
            out.push(record);
        }
        Ok(out)
    }

    /// Force a worker red with a retry deadline.
    pub async fn report_error(
        &self,
        name: WorkerName,
        error_state: impl Into<String>,
        retry_after_minutes: i64,
        now: Timestamp,
    ) -> LegionResult<AgentStatusRecord> {
        let mut record = self.get_or_seed(name, now).await?;
        let error_state = error_state.into();
        record.light = StatusLight::Red;
        record.error_state = Some(error_state.clone());
        record.next_retry_at = Some(now + Duration::minutes(retry_after_minutes));
        push_activity(&mut record, format!("error reported: {}", error_state), now);
        record.updated_at = now;
        self.statuses.agent_status_update(&record).await?;
        self.emit(
            "agent_error_reported",
            serde_json::json!({
                "worker": name.as_str(),
                "error_state": error_state,
                "retry_after_minutes": retry_after_minutes,
            }),
            now,
        )
        .await;
        Ok(record)
    }

    /// Apply an explicit partial update to a worker record.
    pub async fn upsert(
        &self,
        name: WorkerName,
        patch: AgentStatusPatch,
        now: Timestamp,
    ) -> LegionResult<AgentStatusRecord> {
        let mut record = self.get_or_seed(name, now).await?;
        if let Some(light) = patch.light {
            record.light = light;
        }
        if let Some(error_state) = patch.error_state {
            record.error_state = error_state;
        }
        if let Some(next_retry_at) = patch.next_retry_at {
            record.next_retry_at = next_retry_at;
        }
        let note = patch
            .activity_note
            .unwrap_or_else(|| "status updated".to_string());
        push_activity(&mut record, note, now);
        record.last_activity = now;
        record.updated_at = now;
        self.statuses.agent_status_update(&record).await?;
        self.emit(
            "agent_status_upserted",
            serde_json::json!({ "worker": name.as_str() }),
            now,
        )
        .await;
        Ok(record)
    }

    /// Append an activity-log entry for a worker. Used by the conversation
    /// engine to mark coordinator interactions.
    pub async fn record_activity(
        &self,
        name: WorkerName,
        note: impl Into<String>,
        now: Timestamp,
    ) -> LegionResult<()> {
        let mut record = self.get_or_seed(name, now).await?;
        push_activity(&mut record, note.into(), now);
        record.last_activity = now;
        record.updated_at = now;
        self.statuses.agent_status_update(&record).await
    }

    // ------------------------------------------------------------------
    // Derivation rules
    // ------------------------------------------------------------------

    /// Crawler: a red record whose retry deadline has passed is cleared
    /// exactly once; otherwise the light tracks mission activity.
    async fn reconcile_crawler(
        &self,
        mut record: AgentStatusRecord,
        any_active: bool,
        now: Timestamp,
    ) -> LegionResult<AgentStatusRecord> {
        let derived_light = if any_active {
            StatusLight::Green
        } else {
            StatusLight::Yellow
        };

        if record.light == StatusLight::Red && record.error_state.is_some() {
            match record.next_retry_at {
                Some(deadline) if now >= deadline => {
                    record.error_state = None;
                    record.next_retry_at = None;
                    record.light = derived_light;
                    push_activity(&mut record, "error auto-cleared".to_string(), now);
                    record.updated_at = now;
                    self.statuses.agent_status_update(&record).await?;
                    self.emit(
                        "agent_auto_reset",
                        serde_json::json!({ "worker": record.name.as_str() }),
                        now,
                    )
                    .await;
                }
                // Deadline pending (or none set): leave the red state alone.
                _ => {}
            }
            return Ok(record);
        }

        if record.light != derived_light {
            record.light = derived_light;
            record.updated_at = now;
            self.statuses.agent_status_update(&record).await?;
        }
        Ok(record)
    }

    /// Closer: any active research_only mission forces yellow, taking
    /// precedence over the approved-hot-lead green.
    async fn reconcile_closer(
        &self,
        mut record: AgentStatusRecord,
        research_gate: bool,
        any_approved_lead: bool,
        now: Timestamp,
    ) -> LegionResult<AgentStatusRecord> {
        let derived_light = if research_gate {
            StatusLight::Yellow
        } else if any_approved_lead {
            StatusLight::Green
        } else {
            StatusLight::Yellow
        };

        if record.light != derived_light {
            record.light = derived_light;
            record.updated_at = now;
            self.statuses.agent_status_update(&record).await?;
        }
        Ok(record)
    }

    // ------------------------------------------------------------------
    // Store queries
    // ------------------------------------------------------------------

    async fn any_mission_active(&self) -> LegionResult<bool> {
        Ok(self
            .missions
            .mission_list()
            .await?
            .iter()
            .any(|m| m.state.is_active()))
    }

    async fn any_research_only_active(&self) -> LegionResult<bool> {
        Ok(self
            .missions
            .mission_list()
            .await?
            .iter()
            .any(|m| m.posture == "research_only" && m.state.is_active()))
    }

    async fn any_approved_hot_lead(&self) -> LegionResult<bool> {
        Ok(self
            .hot_leads
            .hot_lead_list()
            .await?
            .iter()
            .any(|l| l.status == HotLeadStatus::Approved))
    }

    async fn get_or_seed(
        &self,
        name: WorkerName,
        now: Timestamp,
    ) -> LegionResult<AgentStatusRecord> {
        match self.statuses.agent_status_get(name).await? {
            Some(r) => Ok(r),
            None => {
                let seeded = AgentStatusRecord::seed(name, now);
                self.statuses.agent_status_insert(&seeded).await?;
                Ok(seeded)
            }
        }
    }

    async fn emit(&self, event_name: &str, payload: serde_json::Value, now: Timestamp) {
        let event = AuditEvent::new(event_name, EVENT_SOURCE, payload, now);
        if let Err(e) = self.events.event_append(&event).await {
            tracing::warn!(event_name, error = %e, "Audit signal write failed");
        }
    }
}

fn push_activity(record: &mut AgentStatusRecord, note: String, now: Timestamp) {
    record.activity_log.push(ActivityEntry { note, at: now });
    if record.activity_log.len() > ACTIVITY_LOG_CAP {
        let excess = record.activity_log.len() - ACTIVITY_LOG_CAP;
        record.activity_log.drain(..excess);
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use legion_core::{HotLead, Mission, MissionState, new_entity_id};
    use legion_storage::InMemoryStore;

    fn engine(store: &Arc<InMemoryStore>) -> StatusEngine {
        StatusEngine::new(store.clone(), store.clone(), store.clone(), store.clone())
    }

    async fn insert_mission(store: &InMemoryStore, posture: &str, state: MissionState) {
        let m = Mission::new("M", "", posture, state, Utc::now());
        store.mission_insert(&m).await.unwrap();
    }

    async fn insert_approved_lead(store: &InMemoryStore) {
        let now = Utc::now();
        let lead = HotLead {
            lead_id: new_entity_id(),
            mission_id: None,
            handle: "user_42".to_string(),
            source_forum: None,
            status: HotLeadStatus::Approved,
            created_at: now,
            updated_at: now,
        };
        store.hot_lead_insert(&lead).await.unwrap();
    }

    #[tokio::test]
    async fn test_reconcile_seeds_all_three_workers() {
        let store = Arc::new(InMemoryStore::new());
        let engine = engine(&store);
        let records = engine.reconcile_all(Utc::now()).await.unwrap();
        let names: Vec<WorkerName> = records.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec![WorkerName::Coordinator, WorkerName::Crawler, WorkerName::Closer]
        );
        // Nothing active, nothing approved: everyone yellow
        assert!(records.iter().all(|r| r.light == StatusLight::Yellow));
    }

    #[tokio::test]
    async fn test_closer_research_gate_beats_approved_leads() {
        let store = Arc::new(InMemoryStore::new());
        insert_mission(&store, "research_only", MissionState::Scanning).await;
        insert_approved_lead(&store).await;

        let engine = engine(&store);
        let records = engine.reconcile_all(Utc::now()).await.unwrap();
        let closer = records.iter().find(|r| r.name == WorkerName::Closer).unwrap();
        assert_eq!(closer.light, StatusLight::Yellow);
    }

    #[tokio::test]
    async fn test_closer_green_on_approved_lead_without_gate() {
        let store = Arc::new(InMemoryStore::new());
        insert_mission(&store, "outreach", MissionState::Engaging).await;
        insert_approved_lead(&store).await;

        let engine = engine(&store);
        let records = engine.reconcile_all(Utc::now()).await.unwrap();
        let closer = records.iter().find(|r| r.name == WorkerName::Closer).unwrap();
        assert_eq!(closer.light, StatusLight::Green);
    }

    #[tokio::test]
    async fn test_closer_gate_ignores_terminal_research_missions() {
        let store = Arc::new(InMemoryStore::new());
        insert_mission(&store, "research_only", MissionState::Complete).await;
        insert_approved_lead(&store).await;

        let engine = engine(&store);
        let records = engine.reconcile_all(Utc::now()).await.unwrap();
        let closer = records.iter().find(|r| r.name == WorkerName::Closer).unwrap();
        assert_eq!(closer.light, StatusLight::Green);
    }

    #[tokio::test]
    async fn test_crawler_red_holds_until_deadline_then_clears() {
        let store = Arc::new(InMemoryStore::new());
        insert_mission(&store, "research_only", MissionState::Scanning).await;
        let engine = engine(&store);
        let t0 = Utc::now();

        engine
            .report_error(WorkerName::Crawler, "crawl_timeout", 1, t0)
            .await
            .unwrap();

        // Before the deadline: still red, fields intact
        let records = engine.reconcile_all(t0).await.unwrap();
        let crawler = records.iter().find(|r| r.name == WorkerName::Crawler).unwrap();
        assert_eq!(crawler.light, StatusLight::Red);
        assert_eq!(crawler.error_state.as_deref(), Some("crawl_timeout"));
        assert!(crawler.next_retry_at.is_some());

        // Past the deadline: cleared, green because a mission is active
        let later = t0 + Duration::minutes(2);
        let records = engine.reconcile_all(later).await.unwrap();
        let crawler = records.iter().find(|r| r.name == WorkerName::Crawler).unwrap();
        assert_eq!(crawler.light, StatusLight::Green);
        assert!(crawler.error_state.is_none());
        assert!(crawler.next_retry_at.is_none());
    }

    #[tokio::test]
    async fn test_crawler_auto_clear_is_idempotent() {
        let store = Arc::new(InMemoryStore::new());
        let engine = engine(&store);
        let t0 = Utc::now();

        engine
            .report_error(WorkerName::Crawler, "crawl_timeout", 1, t0)
            .await
            .unwrap();

        let later = t0 + Duration::minutes(5);
        let first = engine.reconcile_all(later).await.unwrap();
        let events_after_first = store.event_count();
        let second = engine.reconcile_all(later).await.unwrap();

        assert_eq!(first, second);
        // The reset signal fires only on the transition
        assert_eq!(store.event_count(), events_after_first);
        let crawler = second.iter().find(|r| r.name == WorkerName::Crawler).unwrap();
        // No mission active: clears to yellow
        assert_eq!(crawler.light, StatusLight::Yellow);
    }

    #[tokio::test]
    async fn test_coordinator_reflects_explicit_sets_only() {
        let store = Arc::new(InMemoryStore::new());
        insert_mission(&store, "research_only", MissionState::Scanning).await;
        let engine = engine(&store);
        let now = Utc::now();

        engine
            .upsert(
                WorkerName::Coordinator,
                AgentStatusPatch {
                    light: Some(StatusLight::Green),
                    activity_note: Some("manual check".to_string()),
                    ..Default::default()
                },
                now,
            )
            .await
            .unwrap();

        let records = engine.reconcile_all(now).await.unwrap();
        let coordinator = records
            .iter()
            .find(|r| r.name == WorkerName::Coordinator)
            .unwrap();
        // Reconciliation leaves the explicit green in place
        assert_eq!(coordinator.light, StatusLight::Green);
        assert_eq!(coordinator.activity_log.len(), 1);
    }

    #[tokio::test]
    async fn test_record_activity_appends_and_caps() {
        let store = Arc::new(InMemoryStore::new());
        let engine = engine(&store);
        let now = Utc::now();
        for i in 0..(ACTIVITY_LOG_CAP + 10) {
            engine
                .record_activity(WorkerName::Coordinator, format!("note {}", i), now)
                .await
                .unwrap();
        }
        let record = store
            .agent_status_get(WorkerName::Coordinator)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.activity_log.len(), ACTIVITY_LOG_CAP);
        // Oldest entries are dropped first
        assert_eq!(record.activity_log.last().unwrap().note, format!("note {}", ACTIVITY_LOG_CAP + 9));
    }
}
