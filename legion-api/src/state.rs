//! Shared application state for Axum routers.

use std::sync::Arc;
use std::time::Duration;

use legion_agents::StatusEngine;
use legion_conversation::{ConversationEngine, EngineConfig, LexiconDriftPolicy};
use legion_llm::{ModelSelector, OpenAiProvider, ProviderRegistry};
use legion_missions::MissionLifecycle;
use legion_storage::InMemoryStore;

use crate::config::ApiConfig;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Backing store for every collection. The service layers hold their
    /// own trait-object handles to the same instance.
    pub store: Arc<InMemoryStore>,
    pub lifecycle: Arc<MissionLifecycle>,
    pub statuses: Arc<StatusEngine>,
    pub engine: Arc<ConversationEngine>,
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Wire the full service stack over one in-memory store.
    ///
    /// The completion provider is registered only when an API key is
    /// configured; without one the chat endpoint reports the provider as
    /// unconfigured instead of failing at startup.
    pub fn from_config(config: &ApiConfig) -> Self {
        let store = Arc::new(InMemoryStore::new());

        let mut registry = ProviderRegistry::new();
        if let Some(api_key) = &config.openai_api_key {
            let mut provider = OpenAiProvider::new(api_key, config.requests_per_minute);
            if let Some(base_url) = &config.openai_base_url {
                provider = provider.with_base_url(base_url);
            }
            registry.register_completion(Arc::new(provider));
        } else {
            tracing::warn!("OPENAI_API_KEY not set, chat generation is disabled");
        }

        let lifecycle = Arc::new(MissionLifecycle::new(store.clone(), store.clone()));
        let statuses = Arc::new(StatusEngine::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
        ));
        let selector = Arc::new(ModelSelector::new(
            config.model_id.clone(),
            Duration::from_secs(config.model_cache_ttl_secs),
        ));
        let engine = Arc::new(ConversationEngine::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            lifecycle.clone(),
            statuses.clone(),
            Arc::new(registry),
            selector,
            Arc::new(LexiconDriftPolicy::default()),
            EngineConfig::default(),
        ));

        Self {
            store,
            lifecycle,
            statuses,
            engine,
            start_time: std::time::Instant::now(),
        }
    }
}

// Use macro to reduce boilerplate for FromRef implementations
crate::impl_from_ref!(Arc<InMemoryStore>, store);
crate::impl_from_ref!(Arc<MissionLifecycle>, lifecycle);
crate::impl_from_ref!(Arc<StatusEngine>, statuses);
crate::impl_from_ref!(Arc<ConversationEngine>, engine);
crate::impl_from_ref!(std::time::Instant, start_time);
