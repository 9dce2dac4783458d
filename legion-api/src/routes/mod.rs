//! REST API Routes Module
//!
//! Route handlers organized by entity type:
//! - Mission CRUD, state changes and duplication
//! - Worker status listing, error reports and upserts
//! - Thread CRUD with message windows
//! - Chat message endpoint
//! - Hot leads with policy-gated approval
//! - Guardrails and the audit event log
//! - Health check and OpenAPI spec

pub mod agent;
pub mod chat;
pub mod event;
pub mod guardrail;
pub mod health;
pub mod hot_lead;
pub mod mission;
pub mod thread;

use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use legion_core::AuditEvent;
use legion_storage::{EventSink, InMemoryStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::state::AppState;

/// Event source tag for audit signals emitted directly by route handlers.
const EVENT_SOURCE: &str = "legion/api";

/// Best-effort audit signal from a handler. Failures are logged and never
/// fail the request.
pub(crate) async fn emit_api_event(
    store: &InMemoryStore,
    event_name: &str,
    payload: serde_json::Value,
    now: legion_core::Timestamp,
) {
    let event = AuditEvent::new(event_name, EVENT_SOURCE, payload, now);
    if let Err(e) = store.event_append(&event).await {
        tracing::warn!(event_name, error = %e, "Audit signal write failed");
    }
}

// ============================================================================
// OPENAPI ENDPOINT
// ============================================================================

/// Handler for /openapi.json endpoint.
#[cfg(feature = "openapi")]
async fn openapi_json() -> impl axum::response::IntoResponse {
    use utoipa::OpenApi;
    axum::Json(crate::openapi::ApiDoc::openapi())
}

// ============================================================================
// CORS LAYER
// ============================================================================

/// Build the CORS layer from ApiConfig.
///
/// Empty origins means development mode: all origins allowed.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: allowing all origins");
        cors.allow_origin(Any)
    } else {
        tracing::info!(origins = ?config.cors_origins, "CORS: restricting origins");
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

// ============================================================================
// ROUTER
// ============================================================================

/// Create the complete API router:
/// - Entity routes under /api/v1/*
/// - Health check at /health
/// - OpenAPI spec at /openapi.json (feature `openapi`)
pub fn create_api_router(state: AppState, config: &ApiConfig) -> Router {
    let api_routes = Router::new()
        .nest("/missions", mission::create_router())
        .nest("/agents", agent::create_router())
        .nest("/threads", thread::create_router())
        .nest("/chat", chat::create_router())
        .nest("/hot-leads", hot_lead::create_router())
        .nest("/guardrails", guardrail::create_router())
        .nest("/events", event::create_router());

    let router = Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health::create_router());

    #[cfg(feature = "openapi")]
    let router = router.route("/openapi.json", axum::routing::get(openapi_json));

    router
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(config))
        .with_state(state)
}
