//! Chat REST API Routes
//!
//! A single endpoint: the conversation engine owns command matching,
//! context assembly and drift handling. A completion failure surfaces as
//! 502 while the human turn stays persisted.

use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;
use legion_conversation::ConversationEngine;
use std::sync::Arc;

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
    types::{ChatReplyResponse, ChatRequest},
};

/// POST /api/v1/chat/message - Send a message and get the reply
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/v1/chat/message",
    tag = "Chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply", body = ChatReplyResponse),
        (status = 400, description = "Blank message", body = ApiError),
        (status = 404, description = "Thread not found", body = ApiError),
        (status = 502, description = "Completion provider failed", body = ApiError),
        (status = 503, description = "No completion provider configured", body = ApiError),
    ),
))]
pub async fn post_message(
    State(engine): State<Arc<ConversationEngine>>,
    Json(req): Json<ChatRequest>,
) -> ApiResult<impl IntoResponse> {
    let reply = engine
        .handle_message(req.thread_id, &req.text, Utc::now())
        .await?;
    Ok(Json(ChatReplyResponse::from(reply)))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new().route("/message", axum::routing::post(post_message))
}
