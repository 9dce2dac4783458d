//! End-to-end handler tests over the full router.
//!
//! Uses a scripted completion provider so no network is involved.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use legion_agents::StatusEngine;
use legion_api::{create_api_router, ApiConfig, AppState};
use legion_conversation::{ConversationEngine, EngineConfig, LexiconDriftPolicy};
use legion_llm::{ModelSelector, ProviderRegistry};
use legion_missions::MissionLifecycle;
use legion_storage::InMemoryStore;
use legion_test_utils::ScriptedProvider;
use tower::ServiceExt;

fn test_app() -> (Router, Arc<InMemoryStore>, Arc<ScriptedProvider>) {
    let store = Arc::new(InMemoryStore::new());
    let provider = Arc::new(ScriptedProvider::new());

    let mut registry = ProviderRegistry::new();
    registry.register_completion(provider.clone());

    let lifecycle = Arc::new(MissionLifecycle::new(store.clone(), store.clone()));
    let statuses = Arc::new(StatusEngine::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
    ));
    let selector = Arc::new(ModelSelector::new(
        "auto".to_string(),
        Duration::from_secs(3600),
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

    let state = AppState {
        store: store.clone(),
        lifecycle,
        statuses,
        engine,
        start_time: std::time::Instant::now(),
    };
    let app = create_api_router(state, &ApiConfig::default());
    (app, store, provider)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let request = match body {
        Some(json) => Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _, _) = test_app();
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert!(body["uptime_seconds"].is_u64());
}

#[cfg(feature = "openapi")]
#[tokio::test]
async fn test_openapi_spec_is_served() {
    let (app, _, _) = test_app();
    let (status, body) = send(&app, "GET", "/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["info"]["title"], "LEGION API");
}

#[tokio::test]
async fn test_mission_create_and_get() {
    let (app, _, _) = test_app();

    let (status, created) = send(
        &app,
        "POST",
        "/api/v1/missions",
        Some(serde_json::json!({ "title": "Find design partners" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["state"], "draft");
    assert_eq!(created["posture"], "research_only");
    assert_eq!(created["counters"]["forums_found"], 0);

    let id = created["mission_id"].as_str().unwrap();
    let (status, fetched) = send(&app, "GET", &format!("/api/v1/missions/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["title"], "Find design partners");

    let (status, listed) = send(&app, "GET", "/api/v1/missions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_mission_create_requires_title() {
    let (app, _, _) = test_app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/missions",
        Some(serde_json::json!({ "title": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MISSING_FIELD");
}

#[tokio::test]
async fn test_unknown_mission_is_404() {
    let (app, _, _) = test_app();
    let id = uuid::Uuid::now_v7();
    let (status, body) = send(&app, "GET", &format!("/api/v1/missions/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "MISSION_NOT_FOUND");
}

#[tokio::test]
async fn test_mission_pause_resume_over_http() {
    let (app, _, _) = test_app();
    let (_, created) = send(
        &app,
        "POST",
        "/api/v1/missions",
        Some(serde_json::json!({ "title": "M", "state": "engaging" })),
    )
    .await;
    let id = created["mission_id"].as_str().unwrap().to_string();

    let (status, paused) = send(
        &app,
        "POST",
        &format!("/api/v1/missions/{}/state", id),
        Some(serde_json::json!({ "state": "paused" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paused["state"], "paused");
    assert_eq!(paused["previous_active_state"], "engaging");

    let (_, resumed) = send(
        &app,
        "POST",
        &format!("/api/v1/missions/{}/state", id),
        Some(serde_json::json!({ "state": "resume" })),
    )
    .await;
    assert_eq!(resumed["state"], "engaging");
    assert!(resumed["previous_active_state"].is_null());
}

#[tokio::test]
async fn test_mission_update_merges_counters_and_insights() {
    let (app, _, _) = test_app();
    let (_, created) = send(
        &app,
        "POST",
        "/api/v1/missions",
        Some(serde_json::json!({ "title": "M" })),
    )
    .await;
    let id = created["mission_id"].as_str().unwrap().to_string();

    let (status, updated) = send(
        &app,
        "PATCH",
        &format!("/api/v1/missions/{}", id),
        Some(serde_json::json!({
            "counters": { "forums_found": 4 },
            "add_insight": "Forum X is active on weekends",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["counters"]["forums_found"], 4);
    assert_eq!(updated["counters"]["hot_leads"], 0);
    assert_eq!(
        updated["insights"][0]["text"],
        "Forum X is active on weekends"
    );

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/api/v1/missions/{}", id),
        Some(serde_json::json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_agents_list_seeds_three_workers() {
    let (app, _, _) = test_app();
    let (status, body) = send(&app, "GET", "/api/v1/agents", None).await;
    assert_eq!(status, StatusCode::OK);
    let records = body.as_array().unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["name"], "coordinator");
    assert_eq!(records[1]["name"], "crawler");
    assert_eq!(records[2]["name"], "closer");
}

#[tokio::test]
async fn test_agent_error_report_and_clear() {
    let (app, _, _) = test_app();

    let (status, red) = send(
        &app,
        "POST",
        "/api/v1/agents/error-report",
        Some(serde_json::json!({ "worker": "crawler", "error_state": "crawl_timeout" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(red["light"], "red");
    assert_eq!(red["error_state"], "crawl_timeout");

    let (status, cleared) = send(
        &app,
        "PUT",
        "/api/v1/agents/crawler",
        Some(serde_json::json!({ "clear_error": true, "light": "yellow" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(cleared["error_state"].is_null());
    assert!(cleared["next_retry_at"].is_null());

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/agents/error-report",
        Some(serde_json::json!({ "worker": "praetor", "error_state": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "AGENT_NOT_FOUND");
}

#[tokio::test]
async fn test_thread_create_and_status_label() {
    let (app, _, _) = test_app();

    let (_, mission) = send(
        &app,
        "POST",
        "/api/v1/missions",
        Some(serde_json::json!({ "title": "M", "state": "scanning" })),
    )
    .await;
    let mission_id = mission["mission_id"].as_str().unwrap().to_string();

    let (status, thread) = send(
        &app,
        "POST",
        "/api/v1/threads",
        Some(serde_json::json!({ "title": "Outreach plan", "mission_id": mission_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(thread["thread_status"], "Running");
    assert_eq!(thread["stage"], "brainstorm");

    let (_, unlinked) = send(
        &app,
        "POST",
        "/api/v1/threads",
        Some(serde_json::json!({ "title": "Scratch" })),
    )
    .await;
    assert_eq!(unlinked["thread_status"], "Unlinked");
}

#[tokio::test]
async fn test_thread_stage_change_appends_history() {
    let (app, _, _) = test_app();
    let (_, thread) = send(
        &app,
        "POST",
        "/api/v1/threads",
        Some(serde_json::json!({ "title": "Plan" })),
    )
    .await;
    let id = thread["thread_id"].as_str().unwrap().to_string();

    let (status, updated) = send(
        &app,
        "PATCH",
        &format!("/api/v1/threads/{}", id),
        Some(serde_json::json!({ "stage": "execute" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["stage"], "execute");
    assert_eq!(updated["stage_history"][0]["from"], "brainstorm");
    assert_eq!(updated["stage_history"][0]["to"], "execute");

    // Same stage again: no new history entry
    let (_, same) = send(
        &app,
        "PATCH",
        &format!("/api/v1/threads/{}", id),
        Some(serde_json::json!({ "stage": "execute" })),
    )
    .await;
    assert_eq!(same["stage_history"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_chat_message_round_trip() {
    let (app, _, provider) = test_app();
    provider.enqueue("Here is a plan for finding design partners.");

    let (status, reply) = send(
        &app,
        "POST",
        "/api/v1/chat/message",
        Some(serde_json::json!({ "text": "How should I find design partners?" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["text"], "Here is a plan for finding design partners.");
    assert_eq!(reply["redrafted"], false);

    // The default thread was materialized with both turns
    let thread_id = reply["thread_id"].as_str().unwrap().to_string();
    let (_, detail) = send(&app, "GET", &format!("/api/v1/threads/{}", thread_id), None).await;
    assert_eq!(detail["title"], "General");
    assert_eq!(detail["messages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_chat_blank_message_is_rejected() {
    let (app, _, _) = test_app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/chat/message",
        Some(serde_json::json!({ "text": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MISSING_FIELD");
}

#[tokio::test]
async fn test_chat_command_creates_mission() {
    let (app, _, provider) = test_app();

    let (status, reply) = send(
        &app,
        "POST",
        "/api/v1/chat/message",
        Some(serde_json::json!({ "text": "create mission now" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        reply["text"],
        "Mission created. Would you like to make modifications before starting?"
    );
    assert_eq!(reply["actions"][0], "start_now");
    // Commands never hit the provider
    assert_eq!(provider.call_count(), 0);

    let (_, missions) = send(&app, "GET", "/api/v1/missions", None).await;
    assert_eq!(missions.as_array().unwrap().len(), 1);
    assert_eq!(missions[0]["state"], "scanning");
}

#[tokio::test]
async fn test_chat_provider_failure_is_bad_gateway() {
    let (app, _, _) = test_app();
    // Nothing enqueued: the scripted provider fails the completion
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/chat/message",
        Some(serde_json::json!({ "text": "hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "UPSTREAM_UNAVAILABLE");
}

#[tokio::test]
async fn test_hot_lead_approval_and_freeze() {
    let (app, _, _) = test_app();

    let (status, lead) = send(
        &app,
        "POST",
        "/api/v1/hot-leads",
        Some(serde_json::json!({ "handle": "user_42", "source_forum": "indiehackers" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(lead["status"], "new");
    let id = lead["lead_id"].as_str().unwrap().to_string();

    let (status, outcome) = send(
        &app,
        "POST",
        &format!("/api/v1/hot-leads/{}/approve", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["approved"], true);
    assert_eq!(outcome["blocked"], false);

    // An active freeze blocks the next approval with status 200
    send(
        &app,
        "POST",
        "/api/v1/guardrails",
        Some(serde_json::json!({
            "guardrail_type": "outreach_freeze",
            "value": { "reason": "compliance review" },
        })),
    )
    .await;

    let (_, lead2) = send(
        &app,
        "POST",
        "/api/v1/hot-leads",
        Some(serde_json::json!({ "handle": "user_43" })),
    )
    .await;
    let id2 = lead2["lead_id"].as_str().unwrap().to_string();
    let (status, outcome) = send(
        &app,
        "POST",
        &format!("/api/v1/hot-leads/{}/approve", id2),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["approved"], false);
    assert_eq!(outcome["blocked"], true);
}

#[tokio::test]
async fn test_events_filtering() {
    let (app, _, _) = test_app();
    let (_, created) = send(
        &app,
        "POST",
        "/api/v1/missions",
        Some(serde_json::json!({ "title": "M" })),
    )
    .await;
    let id = created["mission_id"].as_str().unwrap().to_string();
    send(
        &app,
        "POST",
        &format!("/api/v1/missions/{}/state", id),
        Some(serde_json::json!({ "state": "paused" })),
    )
    .await;

    let (status, events) = send(
        &app,
        "GET",
        &format!("/api/v1/events?event_name=mission_paused&mission_id={}", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let events = events.as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["source"], "legion/missions");

    let (_, none) = send(&app, "GET", "/api/v1/events?event_name=no_such_event", None).await;
    assert!(none.as_array().unwrap().is_empty());
}
