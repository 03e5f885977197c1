//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use cofounder_core::ports::{
    ChatCompletionService, DocumentStore, ImageGenerationService, SimulationService,
};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
/// The store connection is the only resource shared between requests.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DocumentStore>,
    pub config: Arc<Config>,
    pub chat_adapter: Arc<dyn ChatCompletionService>,
    pub simulation_adapter: Arc<dyn SimulationService>,
    pub image_adapter: Arc<dyn ImageGenerationService>,
}
