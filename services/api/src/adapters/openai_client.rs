//! services/api/src/adapters/openai_client.rs
//!
//! Credential resolution shared by every OpenAI adapter. The default key is
//! injected from `Config` at construction; a key supplied by the caller on an
//! individual request always takes precedence over it.

use async_openai::{config::OpenAIConfig, types::CreateChatCompletionResponse, Client};
use cofounder_core::ports::{PortError, PortResult};

/// Hands out an OpenAI client for a request, choosing which key to use.
#[derive(Clone)]
pub struct OpenAiClientProvider {
    default_client: Option<Client<OpenAIConfig>>,
}

impl OpenAiClientProvider {
    /// Creates a provider. `default_api_key` may be absent, in which case every
    /// request must bring its own key.
    pub fn new(default_api_key: Option<String>) -> Self {
        let default_client = default_api_key
            .filter(|key| !key.trim().is_empty())
            .map(|key| Client::with_config(OpenAIConfig::new().with_api_key(key)));
        Self { default_client }
    }

    /// Resolves the client for one call: caller key, then default key, else an error.
    pub fn client_for(&self, api_key: Option<&str>) -> PortResult<Client<OpenAIConfig>> {
        match caller_key(api_key) {
            Some(key) => Ok(Client::with_config(OpenAIConfig::new().with_api_key(key))),
            None => self
                .default_client
                .clone()
                .ok_or(PortError::MissingCredential),
        }
    }

    pub fn has_default_key(&self) -> bool {
        self.default_client.is_some()
    }
}

/// A blank caller key counts as no key at all.
fn caller_key(api_key: Option<&str>) -> Option<&str> {
    api_key.map(str::trim).filter(|key| !key.is_empty())
}

/// Extracts the text content from the first choice of a chat completion.
pub(crate) fn first_choice_text(
    response: CreateChatCompletionResponse,
    what: &str,
) -> PortResult<String> {
    match response.choices.into_iter().next() {
        Some(choice) => choice.message.content.ok_or_else(|| {
            PortError::Unexpected(format!("{} response contained no text content.", what))
        }),
        None => Err(PortError::Unexpected(format!(
            "{} returned no choices in its response.",
            what
        ))),
    }
}
