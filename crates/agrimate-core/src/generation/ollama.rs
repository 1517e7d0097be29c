//! Ollama `/api/generate` client

use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::Client;
use serde::Serialize;

use super::{ByteStream, GenerationClient};
use crate::error::{GatewayError, Result};
use crate::http_client::{build_http_client, response_to_error};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "smollm2:latest";

/// Ollama client
pub struct OllamaClient {
    client: Client,
    model: String,
    base_url: String,
}

impl OllamaClient {
    /// Create a client for the default local Ollama endpoint
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: build_http_client()?,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_OLLAMA_URL.to_string(),
        })
    }

    /// Set the model to use
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set custom base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[async_trait]
impl GenerationClient for OllamaClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate_stream(&self, prompt: &str) -> Result<ByteStream> {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: true,
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(response_to_error(response, "Ollama").await);
        }

        tracing::debug!(model = %self.model, "Generation stream opened");

        Ok(Box::pin(
            response.bytes_stream().map_err(GatewayError::from),
        ))
    }
}
