//! In-memory store backend.
//!
//! Backs every store trait with `Arc<RwLock<HashMap>>`. Clones share state,
//! so one instance can be handed to several service layers. Critical
//! sections are short and never held across an await.

use crate::traits::{
    AgentStatusStore, EventFilter, EventSink, GuardrailStore, HotLeadStore, MessageStore,
    MissionStore, ThreadStore,
};
use async_trait::async_trait;
use legion_core::{
    AgentStatusRecord, AuditEvent, ChatMessage, EntityType, Guardrail, HotLead, LegionResult,
    Mission, StorageError, Thread, WorkerName,
};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Thread-safe in-memory store implementing every LEGION store trait.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    missions: Arc<RwLock<HashMap<Uuid, Mission>>>,
    agent_statuses: Arc<RwLock<HashMap<WorkerName, AgentStatusRecord>>>,
    threads: Arc<RwLock<HashMap<Uuid, Thread>>>,
    messages: Arc<RwLock<HashMap<Uuid, ChatMessage>>>,
    hot_leads: Arc<RwLock<HashMap<Uuid, HotLead>>>,
    guardrails: Arc<RwLock<HashMap<Uuid, Guardrail>>>,
    events: Arc<RwLock<Vec<AuditEvent>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove all stored data. Test helper.
    pub fn clear(&self) {
        self.missions.write().unwrap().clear();
        self.agent_statuses.write().unwrap().clear();
        self.threads.write().unwrap().clear();
        self.messages.write().unwrap().clear();
        self.hot_leads.write().unwrap().clear();
        self.guardrails.write().unwrap().clear();
        self.events.write().unwrap().clear();
    }

    /// Number of stored audit events. Test helper.
    pub fn event_count(&self) -> usize {
        self.events.read().unwrap().len()
    }
}

#[async_trait]
impl MissionStore for InMemoryStore {
    async fn mission_insert(&self, m: &Mission) -> LegionResult<()> {
        let mut map = self.missions.write().map_err(|_| StorageError::LockPoisoned)?;
        map.insert(m.mission_id, m.clone());
        Ok(())
    }

    async fn mission_get(&self, id: Uuid) -> LegionResult<Option<Mission>> {
        let map = self.missions.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(map.get(&id).cloned())
    }

    async fn mission_list(&self) -> LegionResult<Vec<Mission>> {
        let map = self.missions.read().map_err(|_| StorageError::LockPoisoned)?;
        let mut all: Vec<Mission> = map.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn mission_update(&self, m: &Mission) -> LegionResult<()> {
        let mut map = self.missions.write().map_err(|_| StorageError::LockPoisoned)?;
        if !map.contains_key(&m.mission_id) {
            return Err(StorageError::NotFound {
                entity_type: EntityType::Mission,
                id: m.mission_id,
            }
            .into());
        }
        map.insert(m.mission_id, m.clone());
        Ok(())
    }
}

#[async_trait]
impl AgentStatusStore for InMemoryStore {
    async fn agent_status_insert(&self, r: &AgentStatusRecord) -> LegionResult<()> {
        let mut map = self
            .agent_statuses
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        map.insert(r.name, r.clone());
        Ok(())
    }

    async fn agent_status_get(&self, name: WorkerName) -> LegionResult<Option<AgentStatusRecord>> {
        let map = self
            .agent_statuses
            .read()
            .map_err(|_| StorageError::LockPoisoned)?;
        Ok(map.get(&name).cloned())
    }

    async fn agent_status_list(&self) -> LegionResult<Vec<AgentStatusRecord>> {
        let map = self
            .agent_statuses
            .read()
            .map_err(|_| StorageError::LockPoisoned)?;
        Ok(WorkerName::ALL
            .iter()
            .filter_map(|name| map.get(name).cloned())
            .collect())
    }

    async fn agent_status_update(&self, r: &AgentStatusRecord) -> LegionResult<()> {
        let mut map = self
            .agent_statuses
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        if !map.contains_key(&r.name) {
            return Err(StorageError::NotFound {
                entity_type: EntityType::AgentStatus,
                id: r.agent_id,
            }
            .into());
        }
        map.insert(r.name, r.clone());
        Ok(())
    }
}

#[async_trait]
impl ThreadStore for InMemoryStore {
    async fn thread_insert(&self, t: &Thread) -> LegionResult<()> {
        let mut map = self.threads.write().map_err(|_| StorageError::LockPoisoned)?;
        map.insert(t.thread_id, t.clone());
        Ok(())
    }

    async fn thread_get(&self, id: Uuid) -> LegionResult<Option<Thread>> {
        let map = self.threads.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(map.get(&id).cloned())
    }

    async fn thread_find_by_title(&self, title: &str) -> LegionResult<Option<Thread>> {
        let map = self.threads.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(map.values().find(|t| t.title == title).cloned())
    }

    async fn thread_list(&self, mission_id: Option<Uuid>) -> LegionResult<Vec<Thread>> {
        let map = self.threads.read().map_err(|_| StorageError::LockPoisoned)?;
        let mut all: Vec<Thread> = map
            .values()
            .filter(|t| mission_id.is_none() || t.mission_id == mission_id)
            .cloned()
            .collect();
        all.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(all)
    }

    async fn thread_update(&self, t: &Thread) -> LegionResult<()> {
        let mut map = self.threads.write().map_err(|_| StorageError::LockPoisoned)?;
        if !map.contains_key(&t.thread_id) {
            return Err(StorageError::NotFound {
                entity_type: EntityType::Thread,
                id: t.thread_id,
            }
            .into());
        }
        map.insert(t.thread_id, t.clone());
        Ok(())
    }
}

#[async_trait]
impl MessageStore for InMemoryStore {
    async fn message_insert(&self, m: &ChatMessage) -> LegionResult<()> {
        let mut map = self.messages.write().map_err(|_| StorageError::LockPoisoned)?;
        map.insert(m.message_id, m.clone());
        Ok(())
    }

    async fn message_get(&self, id: Uuid) -> LegionResult<Option<ChatMessage>> {
        let map = self.messages.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(map.get(&id).cloned())
    }

    async fn message_list_by_thread(&self, thread_id: Uuid) -> LegionResult<Vec<ChatMessage>> {
        let map = self.messages.read().map_err(|_| StorageError::LockPoisoned)?;
        let mut all: Vec<ChatMessage> = map
            .values()
            .filter(|m| m.thread_id == thread_id)
            .cloned()
            .collect();
        // UUIDv7 message ids break created_at ties in insertion order
        all.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then(a.message_id.cmp(&b.message_id))
        });
        Ok(all)
    }
}

#[async_trait]
impl HotLeadStore for InMemoryStore {
    async fn hot_lead_insert(&self, l: &HotLead) -> LegionResult<()> {
        let mut map = self.hot_leads.write().map_err(|_| StorageError::LockPoisoned)?;
        map.insert(l.lead_id, l.clone());
        Ok(())
    }

    async fn hot_lead_get(&self, id: Uuid) -> LegionResult<Option<HotLead>> {
        let map = self.hot_leads.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(map.get(&id).cloned())
    }

    async fn hot_lead_list(&self) -> LegionResult<Vec<HotLead>> {
        let map = self.hot_leads.read().map_err(|_| StorageError::LockPoisoned)?;
        let mut all: Vec<HotLead> = map.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn hot_lead_update(&self, l: &HotLead) -> LegionResult<()> {
        let mut map = self.hot_leads.write().map_err(|_| StorageError::LockPoisoned)?;
        if !map.contains_key(&l.lead_id) {
            return Err(StorageError::NotFound {
                entity_type: EntityType::HotLead,
                id: l.lead_id,
            }
            .into());
        }
        map.insert(l.lead_id, l.clone());
        Ok(())
    }
}

#[async_trait]
impl GuardrailStore for InMemoryStore {
    async fn guardrail_insert(&self, g: &Guardrail) -> LegionResult<()> {
        let mut map = self
            .guardrails
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        map.insert(g.guardrail_id, g.clone());
        Ok(())
    }

    async fn guardrail_list(&self) -> LegionResult<Vec<Guardrail>> {
        let map = self
            .guardrails
            .read()
            .map_err(|_| StorageError::LockPoisoned)?;
        let mut all: Vec<Guardrail> = map.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn guardrail_list_active(&self, guardrail_type: &str) -> LegionResult<Vec<Guardrail>> {
        let map = self
            .guardrails
            .read()
            .map_err(|_| StorageError::LockPoisoned)?;
        Ok(map
            .values()
            .filter(|g| g.active && g.guardrail_type == guardrail_type)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EventSink for InMemoryStore {
    async fn event_append(&self, e: &AuditEvent) -> LegionResult<()> {
        let mut log = self.events.write().map_err(|_| StorageError::LockPoisoned)?;
        log.push(e.clone());
        Ok(())
    }

    async fn event_list(&self, filter: &EventFilter) -> LegionResult<Vec<AuditEvent>> {
        let log = self.events.read().map_err(|_| StorageError::LockPoisoned)?;
        let mut out: Vec<AuditEvent> = log
            .iter()
            .filter(|e| {
                filter
                    .source
                    .as_deref()
                    .map_or(true, |s| e.source == s)
                    && filter
                        .event_name
                        .as_deref()
                        .map_or(true, |n| e.event_name == n)
            })
            .cloned()
            .collect();
        out.reverse();
        if let Some(limit) = filter.limit {
            out.truncate(limit);
        }
        Ok(out)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use legion_core::{LegionError, MessageRole, MissionState};

    #[tokio::test]
    async fn test_mission_insert_get_update() {
        let store = InMemoryStore::new();
        let mut m = Mission::new("M", "", "research_only", MissionState::Draft, Utc::now());
        store.mission_insert(&m).await.unwrap();

        let got = store.mission_get(m.mission_id).await.unwrap().unwrap();
        assert_eq!(got.state, MissionState::Draft);

        m.state = MissionState::Scanning;
        store.mission_update(&m).await.unwrap();
        let got = store.mission_get(m.mission_id).await.unwrap().unwrap();
        assert_eq!(got.state, MissionState::Scanning);
    }

    #[tokio::test]
    async fn test_mission_update_unknown_is_not_found() {
        let store = InMemoryStore::new();
        let m = Mission::new("M", "", "research_only", MissionState::Draft, Utc::now());
        let err = store.mission_update(&m).await.unwrap_err();
        assert!(matches!(
            err,
            LegionError::Storage(StorageError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_agent_status_list_is_in_worker_order() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        store
            .agent_status_insert(&AgentStatusRecord::seed(WorkerName::Closer, now))
            .await
            .unwrap();
        store
            .agent_status_insert(&AgentStatusRecord::seed(WorkerName::Coordinator, now))
            .await
            .unwrap();
        store
            .agent_status_insert(&AgentStatusRecord::seed(WorkerName::Crawler, now))
            .await
            .unwrap();

        let names: Vec<WorkerName> = store
            .agent_status_list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(
            names,
            vec![WorkerName::Coordinator, WorkerName::Crawler, WorkerName::Closer]
        );
    }

    #[tokio::test]
    async fn test_messages_are_chronological() {
        let store = InMemoryStore::new();
        let thread_id = legion_core::new_entity_id();
        let t0 = Utc::now();
        for (i, offset_ms) in [(0, 0i64), (1, 5), (2, 10)] {
            let at = t0 + chrono::Duration::milliseconds(offset_ms);
            let m = ChatMessage::new(thread_id, None, MessageRole::Human, format!("m{}", i), at);
            store.message_insert(&m).await.unwrap();
        }
        let texts: Vec<String> = store
            .message_list_by_thread(thread_id)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(texts, vec!["m0", "m1", "m2"]);
    }

    #[tokio::test]
    async fn test_guardrail_active_filter() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let mut brief = Guardrail {
            guardrail_id: legion_core::new_entity_id(),
            guardrail_type: "product_brief".to_string(),
            scope: "global".to_string(),
            value: serde_json::json!({"text": "brief"}),
            active: true,
            created_at: now,
            updated_at: now,
        };
        store.guardrail_insert(&brief).await.unwrap();
        brief.guardrail_id = legion_core::new_entity_id();
        brief.active = false;
        store.guardrail_insert(&brief).await.unwrap();

        let active = store.guardrail_list_active("product_brief").await.unwrap();
        assert_eq!(active.len(), 1);
        assert!(store.guardrail_list_active("outreach_freeze").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_event_list_newest_first_with_limit() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        for name in ["a", "b", "c"] {
            store
                .event_append(&AuditEvent::new(name, "test", serde_json::json!({}), now))
                .await
                .unwrap();
        }
        let filter = EventFilter {
            limit: Some(2),
            ..Default::default()
        };
        let events = store.event_list(&filter).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_name, "c");
        assert_eq!(events[1].event_name, "b");
    }
}
