//! services/api/src/web/router.rs
//!
//! Assembles every route under `/api` plus the OpenAPI document.

use crate::web::{
    agents::{agent_log_handler, append_agent_message_handler},
    canvas::{delete_design_handler, generate_design_handler, list_designs_handler},
    chat::{chat_handler, chat_history_handler},
    memory::{
        create_memory_handler, delete_memory_handler, list_memories_handler,
        search_memories_handler, update_memory_handler,
    },
    rest::{health_handler, openapi_json_handler},
    session::session_summary_handler,
    startup::{
        add_milestone_handler, create_startup_handler, delete_startup_handler,
        list_startups_handler, simulate_startup_handler, startup_detail_handler,
        update_metrics_handler, update_stage_handler,
    },
    state::AppState,
};
use axum::{
    extract::{Path, State},
    http::HeaderValue,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

/// Builds the CORS policy. `*` allows any origin; anything else is one exact origin.
fn cors_layer(allow_origin: &str) -> CorsLayer {
    let origin = match allow_origin {
        "*" => AllowOrigin::any(),
        other => match other.parse::<HeaderValue>() {
            Ok(value) => AllowOrigin::exact(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin '{}': {}", other, e);
                AllowOrigin::any()
            }
        },
    };
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Builds the full application router.
///
/// Routes that share a path shape share a parameter name (`{id}`); whether it
/// is a session id or an entity id depends on the method. A `GET` on a static
/// action path lists the session of that name.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    let cors = cors_layer(&app_state.config.cors_allow_origin);

    let api_routes = Router::new()
        .route("/health", get(health_handler))
        // --- Chat ---
        .route("/chat", post(chat_handler))
        .route("/chat/history/{session_id}", get(chat_history_handler))
        // --- Memory ---
        .route("/memory", post(create_memory_handler))
        .route("/memory/search/{session_id}", get(search_memories_handler))
        .route(
            "/memory/{id}",
            get(list_memories_handler)
                .put(update_memory_handler)
                .delete(delete_memory_handler),
        )
        // --- Startup simulator ---
        .route("/startup", post(create_startup_handler))
        .route(
            "/startup/simulate",
            post(simulate_startup_handler).get(|state: State<Arc<AppState>>| async move {
                list_startups_handler(state, Path("simulate".to_string())).await
            }),
        )
        .route("/startup/detail/{startup_id}", get(startup_detail_handler))
        .route(
            "/startup/{id}",
            get(list_startups_handler).delete(delete_startup_handler),
        )
        .route("/startup/{id}/metrics", put(update_metrics_handler))
        .route("/startup/{id}/milestones", post(add_milestone_handler))
        .route("/startup/{id}/stage", put(update_stage_handler))
        // --- Canvas designer ---
        .route(
            "/canvas/generate",
            post(generate_design_handler).get(|state: State<Arc<AppState>>| async move {
                list_designs_handler(state, Path("generate".to_string())).await
            }),
        )
        .route(
            "/canvas/{id}",
            get(list_designs_handler).delete(delete_design_handler),
        )
        // --- Session ---
        .route("/session/{session_id}/summary", get(session_summary_handler))
        // --- Agent log ---
        .route(
            "/agents/{session_id}/{agent_id}/log",
            get(agent_log_handler).post(append_agent_message_handler),
        );

    Router::new()
        .nest("/api", api_routes)
        .route("/api-docs/openapi.json", get(openapi_json_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
