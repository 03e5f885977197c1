//! services/api/src/web/startup.rs
//!
//! Startup simulator endpoints. Simulation is a preview: its output is returned
//! to the caller and never written back to the startup record.

use crate::{
    error::{ApiError, ErrorBody},
    web::{
        state::AppState,
        validate::{log_port_error, parse_entity_id, require_months_in_range, require_non_blank},
        SuccessResponse,
    },
};
use axum::{
    extract::{
        rejection::JsonRejection,
        Path, State,
    },
    Json,
};
use cofounder_core::domain::{Startup, StartupMetrics, StartupStage};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

const DEFAULT_SIMULATION_MONTHS: u32 = 6;

fn default_months() -> u32 {
    DEFAULT_SIMULATION_MONTHS
}

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// Any other fields in the body (e.g. a `stage`) are ignored.
#[derive(Debug, Deserialize, ToSchema)]
pub struct StartupRequest {
    pub session_id: String,
    pub name: String,
    pub description: String,
    pub user_api_key: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SimulateRequest {
    pub startup_id: String,
    #[serde(default = "default_months")]
    pub months: u32,
    pub user_api_key: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StageUpdateRequest {
    pub stage: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateStartupResponse {
    pub success: bool,
    pub startup: Startup,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StartupListResponse {
    pub startups: Vec<Startup>,
    pub count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StartupDetailResponse {
    pub startup: Startup,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SimulationResponse {
    pub success: bool,
    pub startup_id: Uuid,
    /// The model's projection exactly as returned; usually, but not always, JSON.
    pub simulation: String,
}

async fn load_startup(app_state: &AppState, startup_id: &str) -> Result<Startup, ApiError> {
    let not_found = || ApiError::NotFound("Startup not found".to_string());
    let startup_id = parse_entity_id(startup_id).ok_or_else(not_found)?;
    app_state
        .db
        .startup_by_id(startup_id)
        .await
        .map_err(log_port_error("Failed to load startup"))?
        .ok_or_else(not_found)
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Create a new startup. It always starts at the `idea` stage.
#[utoipa::path(
    post,
    path = "/api/startup",
    request_body = StartupRequest,
    responses(
        (status = 200, description = "Startup created", body = CreateStartupResponse),
        (status = 422, description = "Invalid request", body = ErrorBody),
        (status = 500, description = "Store failure", body = ErrorBody)
    )
)]
pub async fn create_startup_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<StartupRequest>, JsonRejection>,
) -> Result<Json<CreateStartupResponse>, ApiError> {
    let Json(req) = payload?;
    require_non_blank("session_id", &req.session_id)?;
    require_non_blank("name", &req.name)?;

    let startup = app_state
        .db
        .insert_startup(Startup::new(req.session_id, req.name, req.description))
        .await
        .map_err(log_port_error("Failed to create startup"))?;
    info!("Created startup {} ({})", startup.id, startup.name);

    Ok(Json(CreateStartupResponse {
        success: true,
        startup,
    }))
}

/// List a session's startups, newest first.
#[utoipa::path(
    get,
    path = "/api/startup/{id}",
    params(("id" = String, Path, description = "The session partition.")),
    responses(
        (status = 200, description = "Startups for the session", body = StartupListResponse),
        (status = 500, description = "Store failure", body = ErrorBody)
    )
)]
pub async fn list_startups_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<StartupListResponse>, ApiError> {
    let startups = app_state
        .db
        .startups_for_session(&session_id)
        .await
        .map_err(log_port_error("Failed to list startups"))?;

    Ok(Json(StartupListResponse {
        count: startups.len(),
        startups,
    }))
}

/// Get one startup.
#[utoipa::path(
    get,
    path = "/api/startup/detail/{startup_id}",
    params(("startup_id" = String, Path, description = "The startup to fetch.")),
    responses(
        (status = 200, description = "The startup", body = StartupDetailResponse),
        (status = 404, description = "Startup not found", body = ErrorBody),
        (status = 500, description = "Store failure", body = ErrorBody)
    )
)]
pub async fn startup_detail_handler(
    State(app_state): State<Arc<AppState>>,
    Path(startup_id): Path<String>,
) -> Result<Json<StartupDetailResponse>, ApiError> {
    let startup = load_startup(&app_state, &startup_id).await?;
    Ok(Json(StartupDetailResponse { startup }))
}

/// Project a startup's growth over the coming months.
#[utoipa::path(
    post,
    path = "/api/startup/simulate",
    request_body = SimulateRequest,
    responses(
        (status = 200, description = "Opaque simulation text", body = SimulationResponse),
        (status = 404, description = "Startup not found", body = ErrorBody),
        (status = 422, description = "Invalid request", body = ErrorBody),
        (status = 500, description = "Store or model failure", body = ErrorBody)
    )
)]
pub async fn simulate_startup_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<SimulateRequest>, JsonRejection>,
) -> Result<Json<SimulationResponse>, ApiError> {
    let Json(req) = payload?;
    require_months_in_range(req.months)?;

    let startup = load_startup(&app_state, &req.startup_id).await?;

    let simulation = app_state
        .simulation_adapter
        .generate_simulation(
            &startup.name,
            &startup.description,
            startup.stage,
            req.months,
            req.user_api_key.as_deref(),
        )
        .await
        .map_err(|e| {
            error!("Simulation failed for startup {}: {:?}", startup.id, e);
            ApiError::Port(e)
        })?;

    Ok(Json(SimulationResponse {
        success: true,
        startup_id: startup.id,
        simulation,
    }))
}

/// Replace a startup's metrics.
#[utoipa::path(
    put,
    path = "/api/startup/{id}/metrics",
    params(("id" = String, Path, description = "The startup to update.")),
    request_body = StartupMetrics,
    responses(
        (status = 200, description = "Whether a startup was updated", body = SuccessResponse),
        (status = 422, description = "Negative or malformed metrics", body = ErrorBody),
        (status = 500, description = "Store failure", body = ErrorBody)
    )
)]
pub async fn update_metrics_handler(
    State(app_state): State<Arc<AppState>>,
    Path(startup_id): Path<String>,
    payload: Result<Json<StartupMetrics>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Json(metrics) = payload?;
    metrics.validate().map_err(ApiError::Validation)?;

    let Some(startup_id) = parse_entity_id(&startup_id) else {
        return Ok(Json(SuccessResponse { success: false }));
    };

    let success = app_state
        .db
        .update_startup_metrics(startup_id, metrics)
        .await
        .map_err(log_port_error("Failed to update startup metrics"))?;

    Ok(Json(SuccessResponse { success }))
}

/// Append a milestone to a startup. The body may be any JSON object.
#[utoipa::path(
    post,
    path = "/api/startup/{id}/milestones",
    params(("id" = String, Path, description = "The startup to update.")),
    responses(
        (status = 200, description = "Whether a startup was updated", body = SuccessResponse),
        (status = 422, description = "Milestone is not a JSON object", body = ErrorBody),
        (status = 500, description = "Store failure", body = ErrorBody)
    )
)]
pub async fn add_milestone_handler(
    State(app_state): State<Arc<AppState>>,
    Path(startup_id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Json(milestone) = payload?;
    if !milestone.is_object() {
        return Err(ApiError::Validation(
            "a milestone must be a JSON object".to_string(),
        ));
    }

    let Some(startup_id) = parse_entity_id(&startup_id) else {
        return Ok(Json(SuccessResponse { success: false }));
    };

    let success = app_state
        .db
        .add_startup_milestone(startup_id, milestone)
        .await
        .map_err(log_port_error("Failed to add startup milestone"))?;

    Ok(Json(SuccessResponse { success }))
}

/// Move a startup to another lifecycle stage.
#[utoipa::path(
    put,
    path = "/api/startup/{id}/stage",
    params(("id" = String, Path, description = "The startup to update.")),
    request_body = StageUpdateRequest,
    responses(
        (status = 200, description = "Whether a startup was updated", body = SuccessResponse),
        (status = 422, description = "Unknown stage", body = ErrorBody),
        (status = 500, description = "Store failure", body = ErrorBody)
    )
)]
pub async fn update_stage_handler(
    State(app_state): State<Arc<AppState>>,
    Path(startup_id): Path<String>,
    payload: Result<Json<StageUpdateRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Json(req) = payload?;
    let stage = req
        .stage
        .parse::<StartupStage>()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let Some(startup_id) = parse_entity_id(&startup_id) else {
        return Ok(Json(SuccessResponse { success: false }));
    };

    let success = app_state
        .db
        .update_startup_stage(startup_id, stage)
        .await
        .map_err(log_port_error("Failed to update startup stage"))?;

    Ok(Json(SuccessResponse { success }))
}

/// Delete a startup. Unknown ids report `success: false`.
#[utoipa::path(
    delete,
    path = "/api/startup/{id}",
    params(("id" = String, Path, description = "The startup to delete.")),
    responses(
        (status = 200, description = "Whether a startup was deleted", body = SuccessResponse),
        (status = 500, description = "Store failure", body = ErrorBody)
    )
)]
pub async fn delete_startup_handler(
    State(app_state): State<Arc<AppState>>,
    Path(startup_id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Some(startup_id) = parse_entity_id(&startup_id) else {
        return Ok(Json(SuccessResponse { success: false }));
    };

    let success = app_state
        .db
        .delete_startup(startup_id)
        .await
        .map_err(log_port_error("Failed to delete startup"))?;

    Ok(Json(SuccessResponse { success }))
}
