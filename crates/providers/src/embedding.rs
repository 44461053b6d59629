//! Embedding collaborator
//!
//! Generates a dense vector for a query string via an OpenAI-compatible
//! `/v1/embeddings` endpoint. The vector dimensionality is fixed by the
//! serving model and must match the index's dense vector space.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServiceError};

/// Opaque embedding service.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Embed a single text into a dense vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Configuration for the HTTP embedding client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Base URL of the embedding server
    pub base_url: String,
    /// Model name for embeddings
    pub model: String,
    /// Per-call deadline in milliseconds
    pub timeout_ms: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            model: "text-embedding-004".to_string(),
            timeout_ms: 10_000,
        }
    }
}

/// HTTP client for an OpenAI-compatible embeddings endpoint.
pub struct HttpEmbeddingClient {
    http_client: reqwest::Client,
    config: EmbeddingConfig,
}

impl HttpEmbeddingClient {
    pub fn new(config: EmbeddingConfig) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl EmbeddingService for HttpEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/v1/embeddings", self.config.base_url);
        let request_body = serde_json::json!({
            "model": self.config.model,
            "input": text,
        });

        log::debug!("embedding request for {} chars of text", text.len());

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
        extract_embedding(&json)
    }
}

/// Pull the vector out of an embeddings response body.
fn extract_embedding(json: &serde_json::Value) -> Result<Vec<f32>> {
    let values = json["data"][0]["embedding"]
        .as_array()
        .ok_or_else(|| ServiceError::invalid("no data[0].embedding in response"))?;

    let vector: Vec<f32> = values
        .iter()
        .filter_map(|v| v.as_f64())
        .map(|v| v as f32)
        .collect();

    if vector.len() != values.len() {
        return Err(ServiceError::invalid("embedding contains non-numeric values"));
    }
    if vector.is_empty() {
        return Err(ServiceError::invalid("embedding is empty"));
    }
    Ok(vector)
}
