//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        DbAdapter, InMemoryStore, OpenAiChatAdapter, OpenAiClientProvider, OpenAiImageAdapter,
        OpenAiSimulationAdapter,
    },
    config::Config,
    error::ApiError,
    web::{build_router, state::AppState},
};
use cofounder_core::ports::DocumentStore;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Connects the document store named by the configuration.
async fn connect_store(config: &Config) -> Result<Arc<dyn DocumentStore>, ApiError> {
    if config.uses_in_memory_store() {
        warn!("Using the in-memory document store; nothing will survive a restart.");
        return Ok(Arc::new(InMemoryStore::new()));
    }

    info!("Connecting to database...");
    let mut connect_options = config.database_url.parse::<PgConnectOptions>()?;
    if let Some(name) = &config.database_name {
        connect_options = connect_options.database(name);
    }
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect_with(connect_options)
        .await?;
    let db_adapter = DbAdapter::new(db_pool);

    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    Ok(Arc::new(db_adapter))
}

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect the Document Store ---
    let db = connect_store(&config).await?;

    // --- 3. Initialize Model Gateway Adapters ---
    let clients = OpenAiClientProvider::new(config.openai_api_key.clone());
    if !clients.has_default_key() {
        warn!("OPENAI_API_KEY is not set; every model call must supply its own key.");
    }

    let chat_adapter = Arc::new(OpenAiChatAdapter::new(
        clients.clone(),
        config.chat_model.clone(),
    ));
    let simulation_adapter = Arc::new(OpenAiSimulationAdapter::new(
        clients.clone(),
        config.simulation_model.clone(),
    ));
    let image_adapter = Arc::new(OpenAiImageAdapter::new(clients, config.image_model.clone()));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        db,
        config: config.clone(),
        chat_adapter,
        simulation_adapter,
        image_adapter,
    });

    // --- 5. Create the Web Router ---
    let app = build_router(app_state);

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "OpenAPI document available at http://{}/api-docs/openapi.json",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
