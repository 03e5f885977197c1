//! services/api/src/adapters/simulation_llm.rs
//!
//! This module contains the adapter for the startup growth simulator LLM.
//! It implements the `SimulationService` port from the `core` crate. The model
//! is asked for monthly JSON, but its output is returned untouched.

use async_openai::{
    error::OpenAIError,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;
use cofounder_core::{
    domain::StartupStage,
    ports::{PortError, PortResult, SimulationService},
};

use crate::adapters::openai_client::{first_choice_text, OpenAiClientProvider};

/// Fills in the simulator prompt for one startup. User text is inserted verbatim.
pub fn simulation_prompt(
    name: &str,
    description: &str,
    stage: StartupStage,
    months: u32,
) -> String {
    format!(
        r#"
You are a startup growth simulator. Generate a realistic {months}-month growth projection for:

Startup: {name}
Description: {description}
Current Stage: {stage}

Provide realistic metrics for each month including:
- Users/customers growth
- Revenue (if applicable)
- Team size
- Key milestones
- Challenges faced
- Funding events (if any)

Respond in JSON format with monthly data.
"#,
        stage = stage.as_str(),
    )
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `SimulationService` using an OpenAI chat model.
#[derive(Clone)]
pub struct OpenAiSimulationAdapter {
    clients: OpenAiClientProvider,
    model: String,
}

impl OpenAiSimulationAdapter {
    /// Creates a new `OpenAiSimulationAdapter`.
    pub fn new(clients: OpenAiClientProvider, model: String) -> Self {
        Self { clients, model }
    }
}

//=========================================================================================
// `SimulationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl SimulationService for OpenAiSimulationAdapter {
    async fn generate_simulation(
        &self,
        name: &str,
        description: &str,
        stage: StartupStage,
        months: u32,
        api_key: Option<&str>,
    ) -> PortResult<String> {
        let client = self.clients.client_for(api_key)?;

        let prompt: ChatCompletionRequestMessage = ChatCompletionRequestUserMessageArgs::default()
            .content(simulation_prompt(name, description, stage, months))
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .into();
        let messages = vec![prompt];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.8)
            .max_tokens(2000u32)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| {
                PortError::Unexpected(format!("Simulation Error: {}", e))
            })?;

        first_choice_text(response, "Simulation LLM")
    }
}
