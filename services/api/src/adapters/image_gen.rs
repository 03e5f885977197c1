//! services/api/src/adapters/image_gen.rs
//!
//! This module contains the adapter for OpenAI's image generation (DALL-E) service.
//! It implements the `ImageGenerationService` port from the `core` crate.

use async_openai::{
    error::OpenAIError,
    types::{CreateImageRequestArgs, Image, ImageModel, ImageQuality, ImageSize},
};
use async_trait::async_trait;
use cofounder_core::ports::{ImageGenerationService, PortError, PortResult};

use crate::adapters::openai_client::OpenAiClientProvider;

/// Decorates the user's prompt with the design type and a fixed aesthetic.
pub fn design_prompt(prompt: &str, design_type: &str) -> String {
    format!(
        "{} design: {}. Professional, modern, clean aesthetic.",
        design_type, prompt
    )
}

fn image_model(name: &str) -> ImageModel {
    match name {
        "dall-e-3" => ImageModel::DallE3,
        "dall-e-2" => ImageModel::DallE2,
        other => ImageModel::Other(other.to_string()),
    }
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `ImageGenerationService` port using the OpenAI Images API.
#[derive(Clone)]
pub struct OpenAiImageAdapter {
    clients: OpenAiClientProvider,
    model: String,
}

impl OpenAiImageAdapter {
    /// Creates a new `OpenAiImageAdapter`.
    pub fn new(clients: OpenAiClientProvider, model: String) -> Self {
        Self { clients, model }
    }
}

//=========================================================================================
// `ImageGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ImageGenerationService for OpenAiImageAdapter {
    /// Generates a single 1024x1024 image and returns its hosted URL.
    async fn generate_image(
        &self,
        prompt: &str,
        design_type: &str,
        api_key: Option<&str>,
    ) -> PortResult<String> {
        let client = self.clients.client_for(api_key)?;

        let request = CreateImageRequestArgs::default()
            .prompt(design_prompt(prompt, design_type))
            .model(image_model(&self.model))
            .size(ImageSize::S1024x1024)
            .quality(ImageQuality::Standard)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = client.images().create(request).await.map_err(|e: OpenAIError| {
            PortError::Unexpected(format!("Design Generation Error: {}", e))
        })?;

        match response.data.first().map(|image| image.as_ref()) {
            Some(Image::Url { url, .. }) => Ok(url.clone()),
            Some(Image::B64Json { .. }) => Err(PortError::Unexpected(
                "Image generation returned inline data instead of a URL.".to_string(),
            )),
            None => Err(PortError::Unexpected(
                "Image generation returned no images.".to_string(),
            )),
        }
    }
}
