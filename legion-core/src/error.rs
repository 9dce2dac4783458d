//! Error types for LEGION operations

use crate::EntityType;
use thiserror::Error;
use uuid::Uuid;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Entity not found: {entity_type:?} with id {id}")]
    NotFound { entity_type: EntityType, id: Uuid },

    #[error("Insert failed for {entity_type:?}: {reason}")]
    InsertFailed { entity_type: EntityType, reason: String },

    #[error("Update failed for {entity_type:?} with id {id}: {reason}")]
    UpdateFailed {
        entity_type: EntityType,
        id: Uuid,
        reason: String,
    },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Completion provider errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompletionError {
    #[error("No completion provider configured")]
    ProviderNotConfigured,

    #[error("Request to {provider} failed with status {status}: {message}")]
    RequestFailed {
        provider: String,
        status: i32,
        message: String,
    },

    #[error("Rate limited by {provider}, retry after {retry_after_ms}ms")]
    RateLimited {
        provider: String,
        retry_after_ms: i64,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all LEGION errors.
#[derive(Debug, Clone, Error)]
pub enum LegionError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for LEGION operations.
pub type LegionResult<T> = Result<T, LegionError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display_not_found() {
        let err = StorageError::NotFound {
            entity_type: EntityType::Mission,
            id: Uuid::nil(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Entity not found"));
        assert!(msg.contains("Mission"));
        assert!(msg.contains("00000000-0000-0000-0000-000000000000"));
    }

    #[test]
    fn test_completion_error_display_rate_limited() {
        let err = CompletionError::RateLimited {
            provider: "openai".to_string(),
            retry_after_ms: 1500,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Rate limited"));
        assert!(msg.contains("openai"));
        assert!(msg.contains("1500"));
    }

    #[test]
    fn test_validation_error_display_missing_field() {
        let err = ValidationError::RequiredFieldMissing {
            field: "text".to_string(),
        };
        assert!(format!("{}", err).contains("text"));
    }

    #[test]
    fn test_legion_error_from_variants() {
        let storage = LegionError::from(StorageError::LockPoisoned);
        assert!(matches!(storage, LegionError::Storage(_)));

        let completion = LegionError::from(CompletionError::ProviderNotConfigured);
        assert!(matches!(completion, LegionError::Completion(_)));

        let validation = LegionError::from(ValidationError::RequiredFieldMissing {
            field: "title".to_string(),
        });
        assert!(matches!(validation, LegionError::Validation(_)));

        let config = LegionError::from(ConfigError::MissingRequired {
            field: "api_key".to_string(),
        });
        assert!(matches!(config, LegionError::Config(_)));
    }
}
