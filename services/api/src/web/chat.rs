//! services/api/src/web/chat.rs
//!
//! The co-founder chat endpoint and conversation history.

use crate::{
    error::{ApiError, ErrorBody},
    web::{
        state::AppState,
        validate::{log_port_error, require_non_blank},
    },
};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use cofounder_core::domain::Message;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::{IntoParams, ToSchema};

/// The fixed persona sent ahead of every conversation.
pub const CHAT_SYSTEM_PROMPT: &str = r#"
You are Emergent++, an intelligent AI co-founder workspace.
You help users:
- Brainstorm and develop ideas
- Plan and simulate startups
- Create designs and visuals
- Remember context and build on previous conversations

Be creative, insightful, and actionable. Help users turn ideas into reality.
"#;

const DEFAULT_HISTORY_LIMIT: usize = 20;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: String,
    /// Overrides the server's default API key for this request.
    pub user_api_key: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct HistoryQuery {
    /// How many of the most recent messages to return (default 20, `0` for all).
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryResponse {
    pub messages: Vec<Message>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Send a message to the AI co-founder.
///
/// The user's message is persisted before the model is called and is kept even
/// when the model call fails.
#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "The assistant's reply", body = ChatResponse),
        (status = 422, description = "Invalid request", body = ErrorBody),
        (status = 500, description = "Store or model failure", body = ErrorBody)
    )
)]
pub async fn chat_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(req) = payload?;
    require_non_blank("session_id", &req.session_id)?;
    require_non_blank("message", &req.message)?;

    let db = &app_state.db;
    let conversation = db
        .get_or_create_conversation(&req.session_id)
        .await
        .map_err(log_port_error("Failed to load conversation"))?;
    let mut history = conversation
        .recent(Some(app_state.config.chat_history_window))
        .to_vec();

    let user_message = Message::user(&req.message);
    db.append_message(&req.session_id, user_message.clone())
        .await
        .map_err(log_port_error("Failed to save user message"))?;
    history.push(user_message);

    let reply = app_state
        .chat_adapter
        .chat_completion(&history, CHAT_SYSTEM_PROMPT, req.user_api_key.as_deref())
        .await
        .map_err(|e| {
            error!(
                "Chat completion failed for session {} (user message kept): {:?}",
                req.session_id, e
            );
            ApiError::Port(e)
        })?;

    db.append_message(&req.session_id, Message::assistant(&reply))
        .await
        .map_err(log_port_error("Failed to save assistant message"))?;
    info!("Chat turn completed for session {}", req.session_id);

    Ok(Json(ChatResponse {
        response: reply,
        session_id: req.session_id,
    }))
}

/// Get the most recent messages of a session's conversation, oldest first.
#[utoipa::path(
    get,
    path = "/api/chat/history/{session_id}",
    params(
        ("session_id" = String, Path, description = "The session partition."),
        HistoryQuery
    ),
    responses(
        (status = 200, description = "Conversation history", body = HistoryResponse),
        (status = 500, description = "Store failure", body = ErrorBody)
    )
)]
pub async fn chat_history_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let Query(query) = query?;
    let limit = match query.limit {
        Some(0) => None,
        Some(n) => Some(n),
        None => Some(DEFAULT_HISTORY_LIMIT),
    };

    let messages = app_state
        .db
        .conversation_history(&session_id, limit)
        .await
        .map_err(log_port_error("Failed to load conversation history"))?;

    Ok(Json(HistoryResponse { messages }))
}
