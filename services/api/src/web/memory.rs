//! services/api/src/web/memory.rs
//!
//! Memory note endpoints: create, list, search, update and delete.

use crate::{
    error::{ApiError, ErrorBody},
    web::{
        state::AppState,
        validate::{log_port_error, parse_entity_id, require_non_blank},
        SuccessResponse,
    },
};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use cofounder_core::domain::Memory;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct MemoryRequest {
    pub session_id: String,
    pub content: String,
    /// Advisory: idea, goal, project or note.
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MemoryUpdateRequest {
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateMemoryResponse {
    pub success: bool,
    pub memory: Memory,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MemoryListResponse {
    pub memories: Vec<Memory>,
    pub count: usize,
}

impl From<Vec<Memory>> for MemoryListResponse {
    fn from(memories: Vec<Memory>) -> Self {
        Self {
            count: memories.len(),
            memories,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct CategoryQuery {
    /// Only return memories with exactly this category.
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchQuery {
    /// Matched against content (case-insensitive) or tags (exact).
    pub q: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Create a new memory entry.
#[utoipa::path(
    post,
    path = "/api/memory",
    request_body = MemoryRequest,
    responses(
        (status = 200, description = "Memory created", body = CreateMemoryResponse),
        (status = 422, description = "Invalid request", body = ErrorBody),
        (status = 500, description = "Store failure", body = ErrorBody)
    )
)]
pub async fn create_memory_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<MemoryRequest>, JsonRejection>,
) -> Result<Json<CreateMemoryResponse>, ApiError> {
    let Json(req) = payload?;
    require_non_blank("session_id", &req.session_id)?;
    require_non_blank("content", &req.content)?;

    let memory = Memory::new(req.session_id, req.content, req.category, req.tags);
    let memory = app_state
        .db
        .insert_memory(memory)
        .await
        .map_err(log_port_error("Failed to create memory"))?;
    info!("Created memory {} for session {}", memory.id, memory.session_id);

    Ok(Json(CreateMemoryResponse {
        success: true,
        memory,
    }))
}

/// List a session's memories, newest first.
#[utoipa::path(
    get,
    path = "/api/memory/{id}",
    params(
        ("id" = String, Path, description = "The session partition."),
        CategoryQuery
    ),
    responses(
        (status = 200, description = "Memories for the session", body = MemoryListResponse),
        (status = 500, description = "Store failure", body = ErrorBody)
    )
)]
pub async fn list_memories_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    query: Result<Query<CategoryQuery>, QueryRejection>,
) -> Result<Json<MemoryListResponse>, ApiError> {
    let Query(query) = query?;
    let category = query.category.as_deref().filter(|c| !c.is_empty());

    let memories = app_state
        .db
        .memories_for_session(&session_id, category)
        .await
        .map_err(log_port_error("Failed to list memories"))?;

    Ok(Json(memories.into()))
}

/// Search a session's memories by content or tag.
#[utoipa::path(
    get,
    path = "/api/memory/search/{session_id}",
    params(
        ("session_id" = String, Path, description = "The session partition."),
        SearchQuery
    ),
    responses(
        (status = 200, description = "Matching memories", body = MemoryListResponse),
        (status = 422, description = "Missing search term", body = ErrorBody),
        (status = 500, description = "Store failure", body = ErrorBody)
    )
)]
pub async fn search_memories_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<MemoryListResponse>, ApiError> {
    let Query(query) = query?;

    let memories = app_state
        .db
        .search_memories(&session_id, &query.q)
        .await
        .map_err(log_port_error("Failed to search memories"))?;

    Ok(Json(memories.into()))
}

/// Replace a memory's content and tags.
#[utoipa::path(
    put,
    path = "/api/memory/{id}",
    params(("id" = String, Path, description = "The memory to update.")),
    request_body = MemoryUpdateRequest,
    responses(
        (status = 200, description = "Whether a memory was updated", body = SuccessResponse),
        (status = 422, description = "Invalid request", body = ErrorBody),
        (status = 500, description = "Store failure", body = ErrorBody)
    )
)]
pub async fn update_memory_handler(
    State(app_state): State<Arc<AppState>>,
    Path(memory_id): Path<String>,
    payload: Result<Json<MemoryUpdateRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Json(req) = payload?;
    require_non_blank("content", &req.content)?;

    let Some(memory_id) = parse_entity_id(&memory_id) else {
        return Ok(Json(SuccessResponse { success: false }));
    };

    let success = app_state
        .db
        .update_memory(memory_id, &req.content, req.tags)
        .await
        .map_err(log_port_error("Failed to update memory"))?;

    Ok(Json(SuccessResponse { success }))
}

/// Delete a memory. Unknown ids report `success: false`.
#[utoipa::path(
    delete,
    path = "/api/memory/{id}",
    params(("id" = String, Path, description = "The memory to delete.")),
    responses(
        (status = 200, description = "Whether a memory was deleted", body = SuccessResponse),
        (status = 500, description = "Store failure", body = ErrorBody)
    )
)]
pub async fn delete_memory_handler(
    State(app_state): State<Arc<AppState>>,
    Path(memory_id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Some(memory_id) = parse_entity_id(&memory_id) else {
        return Ok(Json(SuccessResponse { success: false }));
    };

    let success = app_state
        .db
        .delete_memory(memory_id)
        .await
        .map_err(log_port_error("Failed to delete memory"))?;

    Ok(Json(SuccessResponse { success }))
}
