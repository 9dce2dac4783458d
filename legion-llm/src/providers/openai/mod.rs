//! OpenAI-compatible completion provider.

mod client;
mod types;

pub use client::OpenAiClient;

use crate::providers::invalid_response;
use crate::{CompletionProvider, CompletionRequest, CompletionResponse, ModelInfo};
use async_trait::async_trait;
use legion_core::LegionResult;
use std::time::Instant;
use types::{ChatCompletionRequest, ChatCompletionResponse, ModelsResponse, WireMessage};

/// Completion provider backed by the OpenAI chat completions API.
#[derive(Debug)]
pub struct OpenAiProvider {
    client: OpenAiClient,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>, requests_per_minute: u32) -> Self {
        Self {
            client: OpenAiClient::new(api_key, requests_per_minute),
        }
    }

    /// Point the provider at an OpenAI-compatible gateway.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.client = self.client.with_base_url(base_url);
        self
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(&self, request: &CompletionRequest) -> LegionResult<CompletionResponse> {
        let wire = ChatCompletionRequest {
            model: request.model_id.clone(),
            messages: request
                .turns
                .iter()
                .map(|t| WireMessage {
                    role: t.role.as_str().to_string(),
                    content: t.content.clone(),
                })
                .collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let started = Instant::now();
        let response: ChatCompletionResponse = self.client.post("chat/completions", wire).await?;
        let latency_ms = started.elapsed().as_millis() as i64;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| invalid_response("openai", "Response contained no choices"))?;

        Ok(CompletionResponse {
            text: choice.message.content,
            tokens_in: response.usage.as_ref().map(|u| u.prompt_tokens),
            tokens_out: response.usage.as_ref().and_then(|u| u.completion_tokens),
            latency_ms,
            provider: self.name().to_string(),
            model_id: request.model_id.clone(),
        })
    }

    async fn list_models(&self) -> LegionResult<Vec<ModelInfo>> {
        let response: ModelsResponse = self.client.get("models").await?;
        Ok(response
            .data
            .into_iter()
            .map(|m| ModelInfo {
                id: m.id,
                provider: "openai".to_string(),
                context_window: m.context_window,
                capabilities: vec!["chat".to_string()],
            })
            .collect())
    }

    fn name(&self) -> &str {
        "openai"
    }
}
