//! services/api/src/adapters/chat_llm.rs
//!
//! This module contains the adapter for the conversational co-founder LLM.
//! It implements the `ChatCompletionService` port from the `core` crate.

use async_openai::{
    error::OpenAIError,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;
use cofounder_core::{
    domain::{Message, Role},
    ports::{ChatCompletionService, PortError, PortResult},
};
use tracing::debug;

use crate::adapters::openai_client::{first_choice_text, OpenAiClientProvider};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ChatCompletionService` using an OpenAI chat model.
#[derive(Clone)]
pub struct OpenAiChatAdapter {
    clients: OpenAiClientProvider,
    model: String,
}

impl OpenAiChatAdapter {
    /// Creates a new `OpenAiChatAdapter`.
    pub fn new(clients: OpenAiClientProvider, model: String) -> Self {
        Self { clients, model }
    }

    fn to_request_message(message: &Message) -> PortResult<ChatCompletionRequestMessage> {
        let content = message.content.as_str();
        let request_message: ChatCompletionRequestMessage = match message.role {
            Role::User => ChatCompletionRequestUserMessageArgs::default()
                .content(content)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                .content(content)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        };
        Ok(request_message)
    }
}

//=========================================================================================
// `ChatCompletionService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ChatCompletionService for OpenAiChatAdapter {
    /// Sends the system prompt followed by the history and returns the reply text.
    async fn chat_completion(
        &self,
        history: &[Message],
        system_prompt: &str,
        api_key: Option<&str>,
    ) -> PortResult<String> {
        let client = self.clients.client_for(api_key)?;

        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(history.len() + 1);
        messages.push(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system_prompt)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        );
        for message in history {
            messages.push(Self::to_request_message(message)?);
        }
        debug!("Sending {} messages to {}", messages.len(), self.model);

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.7)
            .max_tokens(1000u32)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(format!("AI Service Error: {}", e)))?;

        first_choice_text(response, "Chat LLM")
    }
}
