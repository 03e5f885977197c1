//! services/api/src/web/rest.rs
//!
//! The health probe, shared response payloads and the master definition for
//! the OpenAPI specification.

use crate::{
    error::ErrorBody,
    web::{agents, canvas, chat, memory, session, startup},
};
use axum::response::Json;
use cofounder_core::domain::{
    AgentMessage, Design, Memory, Message, Role, SessionSummary, Startup, StartupMetrics,
    StartupStage, SummaryPreview,
};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

pub const SERVICE_NAME: &str = "Emergent++";

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        chat::chat_handler,
        chat::chat_history_handler,
        memory::create_memory_handler,
        memory::list_memories_handler,
        memory::search_memories_handler,
        memory::update_memory_handler,
        memory::delete_memory_handler,
        startup::create_startup_handler,
        startup::list_startups_handler,
        startup::startup_detail_handler,
        startup::simulate_startup_handler,
        startup::update_metrics_handler,
        startup::add_milestone_handler,
        startup::update_stage_handler,
        startup::delete_startup_handler,
        canvas::generate_design_handler,
        canvas::list_designs_handler,
        canvas::delete_design_handler,
        session::session_summary_handler,
        agents::append_agent_message_handler,
        agents::agent_log_handler,
    ),
    components(
        schemas(
            HealthResponse,
            SuccessResponse,
            ErrorBody,
            Role,
            Message,
            Memory,
            Startup,
            StartupStage,
            StartupMetrics,
            Design,
            AgentMessage,
            SummaryPreview,
            SessionSummary,
            chat::ChatRequest,
            chat::ChatResponse,
            chat::HistoryResponse,
            memory::MemoryRequest,
            memory::MemoryUpdateRequest,
            memory::CreateMemoryResponse,
            memory::MemoryListResponse,
            startup::StartupRequest,
            startup::SimulateRequest,
            startup::StageUpdateRequest,
            startup::CreateStartupResponse,
            startup::StartupListResponse,
            startup::StartupDetailResponse,
            startup::SimulationResponse,
            canvas::DesignRequest,
            canvas::CreateDesignResponse,
            canvas::DesignListResponse,
            agents::AgentMessageRequest,
            agents::AgentMessageResponse,
            agents::AgentLogResponse,
        )
    ),
    tags(
        (name = "Emergent++ API", description = "AI co-founder workspace endpoints.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

/// Returned by updates and deletes; `false` means no record matched the id.
#[derive(Debug, Serialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
    })
}

/// Serves the generated OpenAPI document.
pub async fn openapi_json_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
