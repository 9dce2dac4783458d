//! Completion provider implementations.

pub mod openai;

use legion_core::{CompletionError, LegionError};

pub(crate) fn request_failed(provider: &str, status: i32, message: impl Into<String>) -> LegionError {
    LegionError::Completion(CompletionError::RequestFailed {
        provider: provider.to_string(),
        status,
        message: message.into(),
    })
}

pub(crate) fn rate_limited(provider: &str, retry_after_ms: i64) -> LegionError {
    LegionError::Completion(CompletionError::RateLimited {
        provider: provider.to_string(),
        retry_after_ms,
    })
}

pub(crate) fn invalid_response(provider: &str, reason: impl Into<String>) -> LegionError {
    LegionError::Completion(CompletionError::InvalidResponse {
        provider: provider.to_string(),
        reason: reason.into(),
    })
}
