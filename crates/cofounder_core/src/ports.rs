//! crates/cofounder_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the concrete document store and generative-model provider.

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::{
    AgentMessage, Conversation, Design, Memory, Message, Startup, StartupMetrics, StartupStage,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("No API key provided. Please provide your OpenAI API key or configure system key.")]
    MissingCredential,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Persistence Port
//=========================================================================================

/// The document store holding memories, startups, designs, conversations and the
/// agent log. Every list operation returns records newest first.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    // --- Memories ---
    async fn insert_memory(&self, memory: Memory) -> PortResult<Memory>;

    /// Lists a session's memories, optionally restricted to an exact category.
    async fn memories_for_session(
        &self,
        session_id: &str,
        category: Option<&str>,
    ) -> PortResult<Vec<Memory>>;

    /// Case-insensitive substring match on content OR exact tag membership.
    async fn search_memories(&self, session_id: &str, term: &str) -> PortResult<Vec<Memory>>;

    async fn update_memory(
        &self,
        memory_id: Uuid,
        content: &str,
        tags: Vec<String>,
    ) -> PortResult<bool>;

    async fn delete_memory(&self, memory_id: Uuid) -> PortResult<bool>;

    // --- Startups ---
    async fn insert_startup(&self, startup: Startup) -> PortResult<Startup>;

    async fn startups_for_session(&self, session_id: &str) -> PortResult<Vec<Startup>>;

    async fn startup_by_id(&self, startup_id: Uuid) -> PortResult<Option<Startup>>;

    async fn update_startup_metrics(
        &self,
        startup_id: Uuid,
        metrics: StartupMetrics,
    ) -> PortResult<bool>;

    async fn add_startup_milestone(&self, startup_id: Uuid, milestone: Value) -> PortResult<bool>;

    async fn update_startup_stage(&self, startup_id: Uuid, stage: StartupStage)
        -> PortResult<bool>;

    async fn delete_startup(&self, startup_id: Uuid) -> PortResult<bool>;

    // --- Designs ---
    async fn insert_design(&self, design: Design) -> PortResult<Design>;

    async fn designs_for_session(&self, session_id: &str) -> PortResult<Vec<Design>>;

    async fn delete_design(&self, design_id: Uuid) -> PortResult<bool>;

    // --- Conversations ---
    async fn get_or_create_conversation(&self, session_id: &str) -> PortResult<Conversation>;

    /// Appends one message atomically, creating the conversation if absent.
    async fn append_message(&self, session_id: &str, message: Message) -> PortResult<bool>;

    /// The last `limit` messages in chronological order; all of them when `None`.
    async fn conversation_history(
        &self,
        session_id: &str,
        limit: Option<usize>,
    ) -> PortResult<Vec<Message>>;

    // --- Agent Log ---
    async fn append_agent_message(&self, message: AgentMessage) -> PortResult<AgentMessage>;

    /// The last `limit` entries for one agent in chronological order.
    async fn agent_log(
        &self,
        session_id: &str,
        agent_id: &str,
        limit: Option<usize>,
    ) -> PortResult<Vec<AgentMessage>>;
}

//=========================================================================================
// Generative-Content Ports
//=========================================================================================
// Each call accepts an optional caller-supplied API key which takes precedence over
// the default credential the adapter was constructed with.
//=========================================================================================

#[async_trait]
pub trait ChatCompletionService: Send + Sync {
    /// Produces the assistant's reply to a chronological message history.
    async fn chat_completion(
        &self,
        history: &[Message],
        system_prompt: &str,
        api_key: Option<&str>,
    ) -> PortResult<String>;
}

#[async_trait]
pub trait SimulationService: Send + Sync {
    /// Returns the model's growth projection as opaque text. It is not parsed.
    async fn generate_simulation(
        &self,
        name: &str,
        description: &str,
        stage: StartupStage,
        months: u32,
        api_key: Option<&str>,
    ) -> PortResult<String>;
}

#[async_trait]
pub trait ImageGenerationService: Send + Sync {
    /// Generates one image and returns its URL.
    async fn generate_image(
        &self,
        prompt: &str,
        design_type: &str,
        api_key: Option<&str>,
    ) -> PortResult<String>;
}
