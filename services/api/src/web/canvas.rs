//! services/api/src/web/canvas.rs
//!
//! Canvas designer endpoints: generate an image, list and delete designs.

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
        rejection::JsonRejection,
        Path, State,
    },
    Json,
};
use cofounder_core::domain::Design;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct DesignRequest {
    pub session_id: String,
    pub prompt: String,
    /// Advisory: slide, mockup, visual or logo.
    pub design_type: String,
    pub user_api_key: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateDesignResponse {
    pub success: bool,
    pub design: Design,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DesignListResponse {
    pub designs: Vec<Design>,
    pub count: usize,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Generate an image for a design and save it.
///
/// Nothing is saved when image generation fails.
#[utoipa::path(
    post,
    path = "/api/canvas/generate",
    request_body = DesignRequest,
    responses(
        (status = 200, description = "Design generated and saved", body = CreateDesignResponse),
        (status = 422, description = "Invalid request", body = ErrorBody),
        (status = 500, description = "Store or model failure", body = ErrorBody)
    )
)]
pub async fn generate_design_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<DesignRequest>, JsonRejection>,
) -> Result<Json<CreateDesignResponse>, ApiError> {
    let Json(req) = payload?;
    require_non_blank("session_id", &req.session_id)?;
    require_non_blank("prompt", &req.prompt)?;
    require_non_blank("design_type", &req.design_type)?;

    let image_url = app_state
        .image_adapter
        .generate_image(&req.prompt, &req.design_type, req.user_api_key.as_deref())
        .await
        .map_err(|e| {
            error!("Image generation failed for session {}: {:?}", req.session_id, e);
            ApiError::Port(e)
        })?;

    let design = Design::new(req.session_id, req.prompt, req.design_type, image_url);
    let design = app_state
        .db
        .insert_design(design)
        .await
        .map_err(log_port_error("Failed to save design"))?;
    info!("Saved design {} for session {}", design.id, design.session_id);

    Ok(Json(CreateDesignResponse {
        success: true,
        design,
    }))
}

/// List a session's designs, newest first.
#[utoipa::path(
    get,
    path = "/api/canvas/{id}",
    params(("id" = String, Path, description = "The session partition.")),
    responses(
        (status = 200, description = "Designs for the session", body = DesignListResponse),
        (status = 500, description = "Store failure", body = ErrorBody)
    )
)]
pub async fn list_designs_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<DesignListResponse>, ApiError> {
    let designs = app_state
        .db
        .designs_for_session(&session_id)
        .await
        .map_err(log_port_error("Failed to list designs"))?;

    Ok(Json(DesignListResponse {
        count: designs.len(),
        designs,
    }))
}

/// Delete a design. Unknown ids report `success: false`.
#[utoipa::path(
    delete,
    path = "/api/canvas/{id}",
    params(("id" = String, Path, description = "The design to delete.")),
    responses(
        (status = 200, description = "Whether a design was deleted", body = SuccessResponse),
        (status = 500, description = "Store failure", body = ErrorBody)
    )
)]
pub async fn delete_design_handler(
    State(app_state): State<Arc<AppState>>,
    Path(design_id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Some(design_id) = parse_entity_id(&design_id) else {
        return Ok(Json(SuccessResponse { success: false }));
    };

    let success = app_state
        .db
        .delete_design(design_id)
        .await
        .map_err(log_port_error("Failed to delete design"))?;

    Ok(Json(SuccessResponse { success }))
}
