//! LEGION API - REST API Layer
//!
//! Axum HTTP surface over the LEGION service crates: mission lifecycle,
//! worker statuses, conversation threads, the chat coordinator, hot leads,
//! guardrails and the audit log. All state lives in one shared
//! `InMemoryStore`; the route handlers extract service handles via
//! `FromRef`.

pub mod config;
pub mod error;
pub mod macros;
#[cfg(feature = "openapi")]
pub mod openapi;
pub mod routes;
pub mod state;
pub mod types;

// Re-export commonly used types
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
#[cfg(feature = "openapi")]
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use state::AppState;
pub use types::*;
