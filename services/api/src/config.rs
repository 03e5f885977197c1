//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use tracing::Level;

/// The `DATABASE_URL` value that selects the in-process store instead of Postgres.
pub const IN_MEMORY_DATABASE_URL: &str = "memory://";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub database_name: Option<String>,
    pub database_max_connections: u32,
    pub log_level: Level,
    pub openai_api_key: Option<String>,
    pub chat_model: String,
    pub simulation_model: String,
    pub image_model: String,
    pub chat_history_window: usize,
    pub cors_allow_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |name: &str, default: &str| -> String {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        // --- Load Server and Database Settings ---
        let bind_address_str = var_or("BIND_ADDRESS", "0.0.0.0:8001");
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?;
        let database_name = lookup("DATABASE_NAME").filter(|v| !v.trim().is_empty());

        let database_max_connections =
            parse_var("DATABASE_MAX_CONNECTIONS", &var_or("DATABASE_MAX_CONNECTIONS", "5"))?;

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load the default API key (optional; callers may supply their own) ---
        let openai_api_key = lookup("OPENAI_API_KEY").filter(|v| !v.trim().is_empty());

        // --- Load Adapter-specific Settings ---
        let chat_model = var_or("CHAT_MODEL", "gpt-4o");
        let simulation_model = var_or("SIMULATION_MODEL", "gpt-4o");
        let image_model = var_or("IMAGE_MODEL", "dall-e-3");
        let chat_history_window: usize =
            parse_var("CHAT_HISTORY_WINDOW", &var_or("CHAT_HISTORY_WINDOW", "10"))?;
        let cors_allow_origin = var_or("CORS_ALLOW_ORIGIN", "*");
        if cors_allow_origin != "*" {
            axum::http::HeaderValue::from_str(&cors_allow_origin).map_err(|e| {
                ConfigError::InvalidValue("CORS_ALLOW_ORIGIN".to_string(), e.to_string())
            })?;
        }

        Ok(Self {
            bind_address,
            database_url,
            database_name,
            database_max_connections,
            log_level,
            openai_api_key,
            chat_model,
            simulation_model,
            image_model,
            chat_history_window,
            cors_allow_origin,
        })
    }

    pub fn uses_in_memory_store(&self) -> bool {
        self.database_url == IN_MEMORY_DATABASE_URL
    }
}

fn parse_var<T>(name: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string()))
}
