//! End-to-end route tests against the in-memory store and scripted model gateways.

use api_lib::{
    adapters::{InMemoryStore, OpenAiClientProvider},
    config::Config,
    web::{build_router, state::AppState},
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use cofounder_core::{
    domain::{Message, StartupStage},
    ports::{
        ChatCompletionService, ImageGenerationService, PortError, PortResult, SimulationService,
    },
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

const TEST_KEY: &str = "sk-test";

//=========================================================================================
// Scripted gateways
//=========================================================================================

/// Replies "reply N" and records how many history messages each call saw.
/// Credentials are resolved exactly as the real adapters do, with no default key.
#[derive(Default)]
struct ScriptedChat {
    seen_history: Mutex<Vec<usize>>,
}

#[async_trait]
impl ChatCompletionService for ScriptedChat {
    async fn chat_completion(
        &self,
        history: &[Message],
        _system_prompt: &str,
        api_key: Option<&str>,
    ) -> PortResult<String> {
        OpenAiClientProvider::new(None).client_for(api_key)?;
        let mut seen = self.seen_history.lock().unwrap();
        seen.push(history.len());
        Ok(format!("reply {}", seen.len()))
    }
}

struct FixedSimulation;

#[async_trait]
impl SimulationService for FixedSimulation {
    async fn generate_simulation(
        &self,
        name: &str,
        _description: &str,
        stage: StartupStage,
        months: u32,
        _api_key: Option<&str>,
    ) -> PortResult<String> {
        Ok(format!("{} at {} for {} months", name, stage, months))
    }
}

struct StubImages {
    fail: bool,
}

#[async_trait]
impl ImageGenerationService for StubImages {
    async fn generate_image(
        &self,
        _prompt: &str,
        _design_type: &str,
        _api_key: Option<&str>,
    ) -> PortResult<String> {
        if self.fail {
            Err(PortError::Unexpected(
                "Design Generation Error: content policy violation".to_string(),
            ))
        } else {
            Ok("https://images.example.com/generated.png".to_string())
        }
    }
}

//=========================================================================================
// Helpers
//=========================================================================================

fn test_config() -> Config {
    Config::from_lookup(|name| match name {
        "DATABASE_URL" => Some("memory://".to_string()),
        _ => None,
    })
    .unwrap()
}

fn app_with(chat: Arc<ScriptedChat>, image_fails: bool) -> Router {
    let app_state = Arc::new(AppState {
        db: Arc::new(InMemoryStore::new()),
        config: Arc::new(test_config()),
        chat_adapter: chat,
        simulation_adapter: Arc::new(FixedSimulation),
        image_adapter: Arc::new(StubImages { fail: image_fails }),
    });
    build_router(app_state)
}

fn app() -> Router {
    app_with(Arc::new(ScriptedChat::default()), false)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn chat(app: &Router, session_id: &str, message: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/api/chat",
        Some(json!({ "message": message, "session_id": session_id, "user_api_key": TEST_KEY })),
    )
    .await
}

async fn create_startup(app: &Router, session_id: &str, name: &str) -> Value {
    let (status, json) = send(
        app,
        Method::POST,
        "/api/startup",
        Some(json!({ "session_id": session_id, "name": name, "description": "A marketplace" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    json["startup"].clone()
}

//=========================================================================================
// Health and docs
//=========================================================================================

#[tokio::test]
async fn health_reports_healthy() {
    let (status, json) = send(&app(), Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn openapi_document_lists_the_routes() {
    let (status, json) = send(&app(), Method::GET, "/api-docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["paths"]["/api/chat"].is_object());
    assert!(json["paths"]["/api/session/{session_id}/summary"].is_object());
}

//=========================================================================================
// Chat
//=========================================================================================

#[tokio::test]
async fn each_chat_turn_persists_two_messages_in_order() {
    let scripted = Arc::new(ScriptedChat::default());
    let app = app_with(scripted.clone(), false);

    for text in ["first", "second", "third"] {
        let (status, json) = chat(&app, "s1", text).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["session_id"], "s1");
    }

    let (status, json) = send(&app, Method::GET, "/api/chat/history/s1", None).await;
    assert_eq!(status, StatusCode::OK);
    let messages = json["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 6);

    let contents: Vec<&str> = messages
        .iter()
        .map(|m| m["content"].as_str().unwrap())
        .collect();
    assert_eq!(
        contents,
        ["first", "reply 1", "second", "reply 2", "third", "reply 3"]
    );
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[1]["role"], "assistant");

    // The model sees prior turns plus the new user message.
    assert_eq!(*scripted.seen_history.lock().unwrap(), vec![1, 3, 5]);
}

#[tokio::test]
async fn history_limit_returns_the_most_recent_messages() {
    let app = app();
    for text in ["a", "b", "c"] {
        chat(&app, "s1", text).await;
    }

    let (_, json) = send(&app, Method::GET, "/api/chat/history/s1?limit=2", None).await;
    let messages = json["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["content"], "c");
    assert_eq!(messages[1]["content"], "reply 3");
}

#[tokio::test]
async fn model_sees_at_most_the_history_window_plus_the_new_message() {
    let scripted = Arc::new(ScriptedChat::default());
    let app = app_with(scripted.clone(), false);
    for turn in 0..7 {
        let (status, _) = chat(&app, "s1", &format!("turn {}", turn)).await;
        assert_eq!(status, StatusCode::OK);
    }

    assert_eq!(
        *scripted.seen_history.lock().unwrap(),
        vec![1, 3, 5, 7, 9, 11, 11]
    );

    let (_, json) = send(&app, Method::GET, "/api/chat/history/s1?limit=100", None).await;
    let messages = json["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 14);
    assert_eq!(messages[0]["content"], "turn 0");
    assert_eq!(messages[13]["content"], "reply 7");
}

#[tokio::test]
async fn zero_history_limit_returns_everything() {
    let app = app();
    for turn in 0..11 {
        chat(&app, "s1", &format!("turn {}", turn)).await;
    }

    let (_, json) = send(&app, Method::GET, "/api/chat/history/s1?limit=0", None).await;
    assert_eq!(json["messages"].as_array().unwrap().len(), 22);

    let (_, json) = send(&app, Method::GET, "/api/chat/history/s1", None).await;
    assert_eq!(json["messages"].as_array().unwrap().len(), 20);
}

#[tokio::test]
async fn missing_credential_fails_but_keeps_the_user_message() {
    let app = app();
    let (status, json) = send(
        &app,
        Method::POST,
        "/api/chat",
        Some(json!({ "message": "hello", "session_id": "s1", "user_api_key": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["detail"], PortError::MissingCredential.to_string());

    let (_, json) = send(&app, Method::GET, "/api/chat/history/s1", None).await;
    let messages = json["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[0]["content"], "hello");
}

#[tokio::test]
async fn blank_chat_message_is_rejected() {
    let (status, json) = chat(&app(), "s1", "  ").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["detail"].as_str().unwrap().contains("message"));
}

#[tokio::test]
async fn malformed_body_is_a_validation_error() {
    let body = json!({ "message": 3 });
    let (status, json) = send(&app(), Method::POST, "/api/chat", Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["detail"].is_string());
}

//=========================================================================================
// Memory
//=========================================================================================

#[tokio::test]
async fn memory_search_is_a_union_without_duplicates() {
    let app = app();
    let notes = [
        json!({
            "session_id": "s1",
            "content": "Pricing tiers",
            "category": "idea",
            "tags": ["pricing"]
        }),
        json!({
            "session_id": "s1",
            "content": "Annual plans",
            "category": "idea",
            "tags": ["pricing"]
        }),
        json!({ "session_id": "s1", "content": "Hire a designer", "category": "goal", "tags": [] }),
        json!({
            "session_id": "s2",
            "content": "pricing elsewhere",
            "category": "idea",
            "tags": []
        }),
    ];
    for note in notes {
        let (status, _) = send(&app, Method::POST, "/api/memory", Some(note)).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, json) =
        send(&app, Method::GET, "/api/memory/search/s1?q=pricing", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 2);
    let contents: Vec<&str> = json["memories"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, ["Annual plans", "Pricing tiers"]);
}

#[tokio::test]
async fn memory_list_filters_by_category() {
    let app = app();
    for (content, category) in [("one", "idea"), ("two", "goal"), ("three", "idea")] {
        send(
            &app,
            Method::POST,
            "/api/memory",
            Some(json!({ "session_id": "s1", "content": content, "category": category })),
        )
        .await;
    }

    let (_, all) = send(&app, Method::GET, "/api/memory/s1", None).await;
    assert_eq!(all["count"], 3);
    assert_eq!(all["memories"][0]["content"], "three");

    let (_, ideas) = send(&app, Method::GET, "/api/memory/s1?category=idea", None).await;
    assert_eq!(ideas["count"], 2);
}

#[tokio::test]
async fn memory_update_and_delete_report_whether_a_record_matched() {
    let app = app();
    let (_, created) = send(
        &app,
        Method::POST,
        "/api/memory",
        Some(json!({
            "session_id": "s1",
            "content": "draft",
            "category": "note",
            "tags": ["a", "a"]
        })),
    )
    .await;
    assert_eq!(created["memory"]["tags"], json!(["a"]));
    let id = created["memory"]["id"].as_str().unwrap().to_string();

    let (status, json) = send(
        &app,
        Method::PUT,
        &format!("/api/memory/{}", id),
        Some(json!({ "content": "final", "tags": ["b"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);

    let (_, listed) = send(&app, Method::GET, "/api/memory/s1", None).await;
    assert_eq!(listed["memories"][0]["content"], "final");

    let (_, json) = send(&app, Method::DELETE, &format!("/api/memory/{}", id), None).await;
    assert_eq!(json["success"], true);
    let (_, json) = send(&app, Method::DELETE, &format!("/api/memory/{}", id), None).await;
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn deleting_an_unknown_memory_reports_false() {
    let uri = format!("/api/memory/{}", uuid::Uuid::new_v4());
    let (status, json) = send(&app(), Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn foreign_ids_match_nothing() {
    let app = app();
    for uri in ["/api/memory/abc123", "/api/startup/abc123", "/api/canvas/abc123"] {
        let (status, json) = send(&app, Method::DELETE, uri, None).await;
        assert_eq!(status, StatusCode::OK, "{}", uri);
        assert_eq!(json["success"], false, "{}", uri);
    }

    let (status, json) = send(
        &app,
        Method::PUT,
        "/api/memory/abc123",
        Some(json!({ "content": "edited" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], false);

    let (status, json) = send(
        &app,
        Method::PUT,
        "/api/startup/abc123/stage",
        Some(json!({ "stage": "mvp" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn foreign_startup_ids_are_not_found() {
    let app = app();
    let (status, json) = send(&app, Method::GET, "/api/startup/detail/abc123", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["detail"], "Startup not found");

    let (status, json) = send(
        &app,
        Method::POST,
        "/api/startup/simulate",
        Some(json!({ "startup_id": "abc123", "months": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["detail"], "Startup not found");
}

//=========================================================================================
// Startups
//=========================================================================================

#[tokio::test]
async fn new_startups_always_begin_as_ideas() {
    let app = app();
    let (status, json) = send(
        &app,
        Method::POST,
        "/api/startup",
        Some(json!({
            "session_id": "s1",
            "name": "Acme",
            "description": "Rockets",
            "stage": "growth"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["startup"]["stage"], "idea");
    assert_eq!(json["startup"]["metrics"]["team_size"], 1);
}

#[tokio::test]
async fn simulating_an_unknown_startup_is_not_found() {
    let (status, json) = send(
        &app(),
        Method::POST,
        "/api/startup/simulate",
        Some(json!({ "startup_id": uuid::Uuid::new_v4(), "months": 6 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["detail"], "Startup not found");
}

#[tokio::test]
async fn simulation_does_not_modify_the_startup() {
    let app = app();
    let startup = create_startup(&app, "s1", "Acme").await;
    let id = startup["id"].as_str().unwrap().to_string();

    let (status, json) = send(
        &app,
        Method::POST,
        "/api/startup/simulate",
        Some(json!({ "startup_id": id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["simulation"], "Acme at idea for 6 months");

    let (_, detail) = send(&app, Method::GET, &format!("/api/startup/detail/{}", id), None).await;
    assert_eq!(detail["startup"]["stage"], "idea");
    assert_eq!(detail["startup"]["metrics"], startup["metrics"]);
    assert_eq!(detail["startup"]["milestones"], json!([]));
}

#[tokio::test]
async fn simulation_months_out_of_range_are_rejected() {
    let app = app();
    let startup = create_startup(&app, "s1", "Acme").await;
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/startup/simulate",
        Some(json!({ "startup_id": startup["id"], "months": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn startup_metrics_milestones_and_stage_can_be_updated() {
    let app = app();
    let startup = create_startup(&app, "s1", "Acme").await;
    let id = startup["id"].as_str().unwrap().to_string();

    let (_, json) = send(
        &app,
        Method::PUT,
        &format!("/api/startup/{}/metrics", id),
        Some(json!({ "users": 120, "revenue": 900.0 })),
    )
    .await;
    assert_eq!(json["success"], true);

    let (_, json) = send(
        &app,
        Method::POST,
        &format!("/api/startup/{}/milestones", id),
        Some(json!({ "title": "First customer" })),
    )
    .await;
    assert_eq!(json["success"], true);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/startup/{}/milestones", id),
        Some(json!(["not", "an", "object"])),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, json) = send(
        &app,
        Method::PUT,
        &format!("/api/startup/{}/stage", id),
        Some(json!({ "stage": "mvp" })),
    )
    .await;
    assert_eq!(json["success"], true);

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/startup/{}/stage", id),
        Some(json!({ "stage": "unicorn" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, detail) = send(&app, Method::GET, &format!("/api/startup/detail/{}", id), None).await;
    let startup = &detail["startup"];
    assert_eq!(startup["stage"], "mvp");
    assert_eq!(startup["metrics"]["users"], 120);
    assert_eq!(startup["metrics"]["team_size"], 1);
    assert_eq!(startup["milestones"][0]["title"], "First customer");
}

#[tokio::test]
async fn deleted_startups_disappear_from_the_session() {
    let app = app();
    let startup = create_startup(&app, "s1", "Acme").await;
    let id = startup["id"].as_str().unwrap().to_string();

    let (_, json) = send(&app, Method::DELETE, &format!("/api/startup/{}", id), None).await;
    assert_eq!(json["success"], true);

    let (_, json) = send(&app, Method::GET, "/api/startup/s1", None).await;
    assert_eq!(json["count"], 0);
    let (status, _) = send(&app, Method::GET, &format!("/api/startup/detail/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn action_words_are_still_listable_session_ids() {
    let app = app();
    create_startup(&app, "simulate", "Acme").await;
    send(
        &app,
        Method::POST,
        "/api/canvas/generate",
        Some(json!({ "session_id": "generate", "prompt": "a fox", "design_type": "logo" })),
    )
    .await;

    let (status, json) = send(&app, Method::GET, "/api/startup/simulate", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 1);
    assert_eq!(json["startups"][0]["name"], "Acme");

    let (status, json) = send(&app, Method::GET, "/api/canvas/generate", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 1);
}

//=========================================================================================
// Canvas
//=========================================================================================

#[tokio::test]
async fn generated_designs_are_saved_with_a_title() {
    let app = app();
    let (status, json) = send(
        &app,
        Method::POST,
        "/api/canvas/generate",
        Some(json!({ "session_id": "s1", "prompt": "a fox", "design_type": "logo" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["design"]["title"], "Logo Design");
    assert_eq!(
        json["design"]["image_url"],
        "https://images.example.com/generated.png"
    );

    let (_, listed) = send(&app, Method::GET, "/api/canvas/s1", None).await;
    assert_eq!(listed["count"], 1);
}

#[tokio::test]
async fn failed_generation_leaves_no_design() {
    let app = app_with(Arc::new(ScriptedChat::default()), true);
    let (status, json) = send(
        &app,
        Method::POST,
        "/api/canvas/generate",
        Some(json!({ "session_id": "s1", "prompt": "a fox", "design_type": "logo" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["detail"]
        .as_str()
        .unwrap()
        .contains("Design Generation Error"));

    let (_, listed) = send(&app, Method::GET, "/api/canvas/s1", None).await;
    assert_eq!(listed["count"], 0);
}

//=========================================================================================
// Session summary and agent log
//=========================================================================================

#[tokio::test]
async fn session_summary_counts_everything_and_previews_the_newest() {
    let app = app();
    for i in 0..7 {
        send(
            &app,
            Method::POST,
            "/api/memory",
            Some(json!({
                "session_id": "s1",
                "content": format!("memory {}", i),
                "category": "note"
            })),
        )
        .await;
    }
    for i in 0..4 {
        create_startup(&app, "s1", &format!("startup {}", i)).await;
    }
    for i in 0..6 {
        send(
            &app,
            Method::POST,
            "/api/canvas/generate",
            Some(json!({
                "session_id": "s1",
                "prompt": format!("design {}", i),
                "design_type": "slide"
            })),
        )
        .await;
    }
    chat(&app, "s1", "hi").await;
    chat(&app, "s1", "again").await;
    create_startup(&app, "other", "Elsewhere").await;

    let (status, json) = send(&app, Method::GET, "/api/session/s1/summary", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["memories_count"], 7);
    assert_eq!(json["startups_count"], 4);
    assert_eq!(json["designs_count"], 6);
    assert_eq!(json["messages_count"], 4);

    let summary = &json["summary"];
    assert_eq!(summary["memories"].as_array().unwrap().len(), 5);
    assert_eq!(summary["startups"].as_array().unwrap().len(), 3);
    assert_eq!(summary["designs"].as_array().unwrap().len(), 5);
    assert_eq!(summary["memories"][0]["content"], "memory 6");
    assert_eq!(summary["startups"][0]["name"], "startup 3");
    assert_eq!(summary["designs"][0]["prompt"], "design 5");
}

#[tokio::test]
async fn empty_session_summary_is_all_zeroes() {
    let (status, json) = send(&app(), Method::GET, "/api/session/nobody/summary", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["memories_count"], 0);
    assert_eq!(json["messages_count"], 0);
    assert_eq!(json["summary"]["designs"], json!([]));
}

#[tokio::test]
async fn agent_log_reads_back_in_order() {
    let app = app();
    for content in ["plan the launch", "build the landing page"] {
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/agents/s1/ceo/log",
            Some(json!({ "role": "CEO", "content": content, "to_agent_id": "engineer" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    send(
        &app,
        Method::POST,
        "/api/agents/s1/designer/log",
        Some(json!({ "role": "Designer", "content": "moodboard" })),
    )
    .await;

    let (_, json) = send(&app, Method::GET, "/api/agents/s1/ceo/log", None).await;
    assert_eq!(json["count"], 2);
    assert_eq!(json["messages"][0]["content"], "plan the launch");
    assert_eq!(json["messages"][1]["to_agent_id"], "engineer");

    let (_, json) = send(&app, Method::GET, "/api/agents/s1/ceo/log?limit=1", None).await;
    assert_eq!(json["count"], 1);
    assert_eq!(json["messages"][0]["content"], "build the landing page");
}
