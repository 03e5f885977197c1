//! services/api/src/web/session.rs
//!
//! The session summary: four independent reads, no cross-entity computation.

use crate::{
    error::{ApiError, ErrorBody},
    web::{state::AppState, validate::log_port_error},
};
use axum::{
    extract::{Path, State},
    Json,
};
use cofounder_core::domain::SessionSummary;
use std::sync::Arc;

/// Get counts and newest-first previews of everything a session owns.
#[utoipa::path(
    get,
    path = "/api/session/{session_id}/summary",
    params(("session_id" = String, Path, description = "The session partition.")),
    responses(
        (status = 200, description = "Session summary", body = SessionSummary),
        (status = 500, description = "Store failure", body = ErrorBody)
    )
)]
pub async fn session_summary_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionSummary>, ApiError> {
    let db = &app_state.db;
    // The reads are not atomic with respect to each other.
    let (memories, startups, designs, messages) = futures::try_join!(
        db.memories_for_session(&session_id, None),
        db.startups_for_session(&session_id),
        db.designs_for_session(&session_id),
        db.conversation_history(&session_id, None),
    )
    .map_err(log_port_error("Failed to build session summary"))?;

    Ok(Json(SessionSummary::from_parts(
        session_id,
        memories,
        startups,
        designs,
        messages.len(),
    )))
}
