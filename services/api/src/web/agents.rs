//! services/api/src/web/agents.rs
//!
//! The per-(session, agent) message log. Entries are recorded and read back;
//! nothing here schedules or drives the agents themselves.

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
use cofounder_core::domain::AgentMessage;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AgentMessageRequest {
    /// The agent's team role, e.g. CEO, Engineer, Designer, Marketer.
    pub role: String,
    pub content: String,
    pub to_agent_id: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub meta: Option<Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AgentMessageResponse {
    pub success: bool,
    pub message: AgentMessage,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AgentLogResponse {
    pub messages: Vec<AgentMessage>,
    pub count: usize,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct AgentLogQuery {
    /// Only return this many of the most recent entries.
    pub limit: Option<usize>,
}

/// Record a message in an agent's log.
#[utoipa::path(
    post,
    path = "/api/agents/{session_id}/{agent_id}/log",
    params(
        ("session_id" = String, Path, description = "The session partition."),
        ("agent_id" = String, Path, description = "The agent whose log is appended to.")
    ),
    request_body = AgentMessageRequest,
    responses(
        (status = 200, description = "Entry recorded", body = AgentMessageResponse),
        (status = 422, description = "Invalid request", body = ErrorBody),
        (status = 500, description = "Store failure", body = ErrorBody)
    )
)]
pub async fn append_agent_message_handler(
    State(app_state): State<Arc<AppState>>,
    Path((session_id, agent_id)): Path<(String, String)>,
    payload: Result<Json<AgentMessageRequest>, JsonRejection>,
) -> Result<Json<AgentMessageResponse>, ApiError> {
    let Json(req) = payload?;
    require_non_blank("content", &req.content)?;

    let mut message = AgentMessage::new(session_id, agent_id, req.role, req.content);
    message.to_agent_id = req.to_agent_id;
    message.meta = req.meta;

    let message = app_state
        .db
        .append_agent_message(message)
        .await
        .map_err(log_port_error("Failed to append agent message"))?;

    Ok(Json(AgentMessageResponse {
        success: true,
        message,
    }))
}

/// Read an agent's log, oldest first.
#[utoipa::path(
    get,
    path = "/api/agents/{session_id}/{agent_id}/log",
    params(
        ("session_id" = String, Path, description = "The session partition."),
        ("agent_id" = String, Path, description = "The agent whose log is read."),
        AgentLogQuery
    ),
    responses(
        (status = 200, description = "The agent's log", body = AgentLogResponse),
        (status = 500, description = "Store failure", body = ErrorBody)
    )
)]
pub async fn agent_log_handler(
    State(app_state): State<Arc<AppState>>,
    Path((session_id, agent_id)): Path<(String, String)>,
    query: Result<Query<AgentLogQuery>, QueryRejection>,
) -> Result<Json<AgentLogResponse>, ApiError> {
    let Query(query) = query?;

    let messages = app_state
        .db
        .agent_log(&session_id, &agent_id, query.limit)
        .await
        .map_err(log_port_error("Failed to read agent log"))?;

    Ok(Json(AgentLogResponse {
        count: messages.len(),
        messages,
    }))
}
