//! Text-generation collaborator
//!
//! A single opaque `prompt -> text` call against an OpenAI-compatible
//! `/v1/chat/completions` endpoint. The engine never retries these calls;
//! a failure here is terminal for the owning node.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServiceError};

/// Opaque text-generation service.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Generate a completion for the given prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Configuration for the HTTP generation client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Base URL of the generation server
    pub base_url: String,
    /// Model name
    pub model: String,
    /// Per-call deadline in milliseconds
    pub timeout_ms: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            model: "gemini-1.5-pro-latest".to_string(),
            timeout_ms: 30_000,
        }
    }
}

/// HTTP client for an OpenAI-compatible chat-completions endpoint.
pub struct HttpGenerationClient {
    http_client: reqwest::Client,
    config: GenerationConfig,
}

impl HttpGenerationClient {
    pub fn new(config: GenerationConfig) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl GenerationService for HttpGenerationClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.config.base_url);
        let request_body = serde_json::json!({
            "model": self.config.model,
            "messages": [{"role": "user", "content": prompt}],
            "stream": false,
        });

        log::debug!(
            "generation request to {} ({} prompt chars)",
            url,
            prompt.len()
        );

        let deadline = Duration::from_millis(self.config.timeout_ms);
        let response = tokio::time::timeout(
            deadline,
            self.http_client.post(&url).json(&request_body).send(),
        )
        .await
        .map_err(|_| ServiceError::Timeout {
            after_ms: self.config.timeout_ms,
        })??;

        if !response.status().is_success() {
            return Err(ServiceError::from_response(response).await);
        }

        let json: serde_json::Value = response.json().await?;
        extract_message_content(&json)
    }
}

/// Pull the completion text out of a chat-completions response body.
fn extract_message_content(json: &serde_json::Value) -> Result<String> {
    json["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ServiceError::invalid("no choices[0].message.content in completion"))
}
