//! Error Types for the LEGION API
//!
//! This module defines error handling for the API layer, including:
//! - ApiError struct for structured error responses
//! - ErrorCode enum for categorizing errors
//! - IntoResponse implementation for Axum HTTP responses
//!
//! All errors are serialized as JSON with appropriate HTTP status codes.
//! Policy blocks are not errors: hot-lead approval returns a structured
//! outcome with status 200 even when blocked.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use legion_core::{CompletionError, EntityType, LegionError, StorageError, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
///
/// Each error code maps to a specific HTTP status code and represents
/// a category of error that can occur during API operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Validation Errors (400)
    // ========================================================================
    /// Request validation failed
    ValidationFailed,

    /// Request contains invalid input data
    InvalidInput,

    /// Required field is missing from request
    MissingField,

    /// Field format is incorrect
    InvalidFormat,

    // ========================================================================
    // Not Found Errors (404)
    // ========================================================================
    /// Requested entity does not exist
    EntityNotFound,

    /// Requested mission does not exist
    MissionNotFound,

    /// Requested thread does not exist
    ThreadNotFound,

    /// Requested worker does not exist
    AgentNotFound,

    /// Requested hot lead does not exist
    LeadNotFound,

    // ========================================================================
    // Upstream and Server Errors (502, 500, 503)
    // ========================================================================
    /// The completion provider failed or returned garbage
    UpstreamUnavailable,

    /// Internal server error
    InternalError,

    /// Service is temporarily unavailable
    ServiceUnavailable,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationFailed
            | ErrorCode::InvalidInput
            | ErrorCode::MissingField
            | ErrorCode::InvalidFormat => StatusCode::BAD_REQUEST,

            ErrorCode::EntityNotFound
            | ErrorCode::MissionNotFound
            | ErrorCode::ThreadNotFound
            | ErrorCode::AgentNotFound
            | ErrorCode::LeadNotFound => StatusCode::NOT_FOUND,

            ErrorCode::UpstreamUnavailable => StatusCode::BAD_GATEWAY,

            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,

            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed => "Request validation failed",
            ErrorCode::InvalidInput => "Invalid input data",
            ErrorCode::MissingField => "Required field is missing",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::EntityNotFound => "Entity not found",
            ErrorCode::MissionNotFound => "Mission not found",
            ErrorCode::ThreadNotFound => "Thread not found",
            ErrorCode::AgentNotFound => "Worker not found",
            ErrorCode::LeadNotFound => "Hot lead not found",
            ErrorCode::UpstreamUnavailable => "Completion provider unavailable",
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::ServiceUnavailable => "Service temporarily unavailable",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error response for API operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Create a new API error with the given code, using the default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.default_message().to_string(),
            details: None,
        }
    }

    /// Add additional details to the error.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // ========================================================================
    // Convenience constructors for common errors
    // ========================================================================

    /// Create a ValidationFailed error.
    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Create a MissingField error.
    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingField,
            format!("Required field '{}' is missing", field),
        )
    }

    /// Create an InvalidFormat error.
    pub fn invalid_format(field: &str, expected: &str) -> Self {
        Self::new(
            ErrorCode::InvalidFormat,
            format!("Field '{}' has invalid format, expected {}", field, expected),
        )
    }

    /// Create an EntityNotFound error.
    pub fn entity_not_found(entity_type: &str, id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::EntityNotFound,
            format!("{} with id {} not found", entity_type, id),
        )
    }

    /// Create a MissionNotFound error.
    pub fn mission_not_found(mission_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::MissionNotFound,
            format!("Mission {} not found", mission_id),
        )
    }

    /// Create a ThreadNotFound error.
    pub fn thread_not_found(thread_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::ThreadNotFound,
            format!("Thread {} not found", thread_id),
        )
    }

    /// Create an AgentNotFound error.
    pub fn agent_not_found(name: impl fmt::Display) -> Self {
        Self::new(ErrorCode::AgentNotFound, format!("Worker {} not found", name))
    }

    /// Create a LeadNotFound error.
    pub fn lead_not_found(lead_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::LeadNotFound,
            format!("Hot lead {} not found", lead_id),
        )
    }

    /// Create an UpstreamUnavailable error.
    pub fn upstream_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UpstreamUnavailable, message)
    }

    /// Create an InternalError.
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Create a ServiceUnavailable error.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

/// Implement IntoResponse for ApiError to enable automatic error handling
/// in Axum handlers.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self);
        (status, body).into_response()
    }
}

// ============================================================================
// CONVERSIONS FROM SERVICE ERRORS
// ============================================================================

/// Map service-layer errors to API errors with the right status code.
impl From<LegionError> for ApiError {
    fn from(err: LegionError) -> Self {
        match err {
            LegionError::Storage(StorageError::NotFound { entity_type, id }) => {
                match entity_type {
                    EntityType::Mission => ApiError::mission_not_found(id),
                    EntityType::Thread => ApiError::thread_not_found(id),
                    EntityType::AgentStatus => ApiError::agent_not_found(id),
                    EntityType::HotLead => ApiError::lead_not_found(id),
                    _ => ApiError::entity_not_found(&format!("{:?}", entity_type), id),
                }
            }
            LegionError::Storage(e) => {
                tracing::error!(error = %e, "Storage error");
                ApiError::internal_error("Storage operation failed")
            }
            LegionError::Completion(CompletionError::ProviderNotConfigured) => {
                ApiError::service_unavailable("No completion provider configured")
            }
            LegionError::Completion(e) => {
                tracing::error!(error = %e, "Completion provider error");
                ApiError::upstream_unavailable(format!("Completion failed: {}", e))
            }
            LegionError::Validation(ValidationError::RequiredFieldMissing { field }) => {
                ApiError::missing_field(&field)
            }
            LegionError::Validation(e) => ApiError::invalid_input(e.to_string()),
            LegionError::Config(e) => {
                tracing::error!(error = %e, "Configuration error");
                ApiError::internal_error("Configuration error")
            }
        }
    }
}

/// Convert from serde_json::Error to ApiError.
impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON serialization error: {:?}", err);
        ApiError::invalid_input(format!("Invalid JSON: {}", err))
    }
}

/// Convert from uuid::Error to ApiError.
impl From<uuid::Error> for ApiError {
    fn from(err: uuid::Error) -> Self {
        ApiError::invalid_format("id", &format!("valid UUID: {}", err))
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;
