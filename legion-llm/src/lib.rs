//! LEGION LLM - Completion Provider Abstraction
//!
//! Provider-agnostic trait for chat completions plus the registry and model
//! selector the conversation engine talks to. Actual HTTP providers live
//! under `providers/`.

pub mod providers;

pub use providers::openai::OpenAiProvider;

use async_trait::async_trait;
use legion_core::{CompletionError, LegionError, LegionResult, StorageError};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

// ============================================================================
// COMPLETION PROVIDER TRAIT
// ============================================================================

/// Role of a turn handed to a completion provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// One role-tagged turn in a completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into() }
    }
}

/// Provider-agnostic completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model_id: String,
    pub turns: Vec<ChatTurn>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<i32>,
}

/// Completion result with token and latency metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub text: String,
    pub tokens_in: Option<i64>,
    pub tokens_out: Option<i64>,
    pub latency_ms: i64,
    pub provider: String,
    pub model_id: String,
}

/// Entry in a provider's model catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub provider: String,
    pub context_window: Option<i64>,
    pub capabilities: Vec<String>,
}

/// Trait for chat completion providers.
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Run a single completion call.
    async fn complete(&self, request: &CompletionRequest) -> LegionResult<CompletionResponse>;

    /// List the models this provider exposes.
    async fn list_models(&self) -> LegionResult<Vec<ModelInfo>>;

    /// Short provider identifier (e.g. "openai").
    fn name(&self) -> &str;
}

// ============================================================================
// PROVIDER REGISTRY
// ============================================================================

/// Registry for completion providers.
/// Providers must be explicitly registered - no auto-discovery.
pub struct ProviderRegistry {
    completion: Option<Arc<dyn CompletionProvider>>,
}

impl ProviderRegistry {
    /// Create a new empty provider registry.
    pub fn new() -> Self {
        Self { completion: None }
    }

    /// Register a completion provider.
    /// Replaces any previously registered provider.
    pub fn register_completion(&mut self, provider: Arc<dyn CompletionProvider>) {
        self.completion = Some(provider);
    }

    /// Get the registered completion provider.
    pub fn completion(&self) -> LegionResult<Arc<dyn CompletionProvider>> {
        self.completion
            .clone()
            .ok_or(LegionError::Completion(CompletionError::ProviderNotConfigured))
    }

    pub fn has_completion(&self) -> bool {
        self.completion.is_some()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("has_completion", &self.has_completion())
            .finish()
    }
}

// ============================================================================
// MODEL SELECTOR
// ============================================================================

/// Picks the default model for orchestrator completions.
///
/// An explicit model id wins. With "auto", the provider catalog is scanned
/// for a gpt-5 reasoning variant, then a gpt-5 chat model, then the first
/// listed model. The choice is cached with a TTL and can be dropped with
/// `refresh()`; the selector is an owned object, not process-global state.
pub struct ModelSelector {
    configured: String,
    cache_ttl: Duration,
    cached: RwLock<Option<(String, Instant)>>,
}

impl ModelSelector {
    pub const FALLBACK_MODEL: &'static str = "gpt-5";

    /// `configured` is a concrete model id or "auto".
    pub fn new(configured: impl Into<String>, cache_ttl: Duration) -> Self {
        Self {
            configured: configured.into(),
            cache_ttl,
            cached: RwLock::new(None),
        }
    }

    /// Drop the cached choice so the next `select` re-consults the catalog.
    pub fn refresh(&self) -> LegionResult<()> {
        let mut cached = self
            .cached
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        *cached = None;
        Ok(())
    }

    /// Resolve the model id to use for the next completion.
    pub async fn select(&self, provider: &dyn CompletionProvider) -> LegionResult<String> {
        if !self.configured.is_empty() && self.configured != "auto" {
            return Ok(self.configured.clone());
        }

        let cached = self
            .cached
            .read()
            .map_err(|_| StorageError::LockPoisoned)?
            .clone();
        if let Some((id, at)) = cached {
            if at.elapsed() < self.cache_ttl {
                return Ok(id);
            }
        }

        let chosen = match provider.list_models().await {
            Ok(models) => Self::pick(&models),
            Err(e) => {
                tracing::warn!(error = %e, "Model catalog unavailable, using fallback model");
                Self::FALLBACK_MODEL.to_string()
            }
        };

        *self
            .cached
            .write()
            .map_err(|_| StorageError::LockPoisoned)? = Some((chosen.clone(), Instant::now()));
        Ok(chosen)
    }

    fn pick(models: &[ModelInfo]) -> String {
        let lowered = |m: &ModelInfo| m.id.to_lowercase();
        if let Some(m) = models.iter().find(|m| {
            let id = lowered(m);
            id.contains("gpt-5") && (id.contains("reason") || id.contains("think"))
        }) {
            return m.id.clone();
        }
        if let Some(m) = models.iter().find(|m| {
            let id = lowered(m);
            id.contains("gpt-5") && id.contains("chat")
        }) {
            return m.id.clone();
        }
        models
            .first()
            .map(|m| m.id.clone())
            .unwrap_or_else(|| Self::FALLBACK_MODEL.to_string())
    }
}

impl std::fmt::Debug for ModelSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSelector")
            .field("configured", &self.configured)
            .field("cache_ttl", &self.cache_ttl)
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================
