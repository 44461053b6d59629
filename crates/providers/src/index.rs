//! Document index collaborator
//!
//! The index is queried two ways per retrieval: once by dense-vector
//! similarity and once by sparse term overlap. Both come back as independent
//! ranked lists; fusing them is the engine's job, not the index's. The HTTP
//! implementation targets a Qdrant-style collection with named `dense` and
//! `sparse` vectors whose payload carries the passage `text` and source
//! `url`, as written by the ingestion pipeline.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServiceError};

/// A weighted query term for sparse retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseTerm {
    pub term: String,
    pub weight: f32,
}

/// One candidate passage from a ranked index lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexHit {
    /// Point ID in the index.
    pub id: String,
    /// Passage text.
    pub text: String,
    /// URL of the source document.
    pub source_url: String,
    /// Ranker-native score. Dense and sparse scores live on incomparable
    /// scales; only the rank order is meaningful downstream.
    pub rank_score: f64,
}

/// The two independent candidate rankings of one hybrid lookup.
#[derive(Debug, Clone, Default)]
pub struct HybridCandidates {
    pub dense: Vec<IndexHit>,
    pub sparse: Vec<IndexHit>,
}

/// Searchable passage index.
#[async_trait]
pub trait DocumentIndex: Send + Sync {
    /// Run the dense and sparse top-`k` lookups for one query.
    async fn hybrid_query(
        &self,
        dense: &[f32],
        sparse: &[SparseTerm],
        k: usize,
    ) -> Result<HybridCandidates>;
}

/// Configuration for the HTTP index client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Base URL of the index server
    pub base_url: String,
    /// Collection holding the corpus passages
    pub collection: String,
    /// Per-call deadline in milliseconds
    pub timeout_ms: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:6333".to_string(),
            collection: "immigration".to_string(),
            timeout_ms: 10_000,
        }
    }
}

/// HTTP client for a Qdrant-style points index.
pub struct HttpDocumentIndex {
    http_client: reqwest::Client,
    config: IndexConfig,
}

impl HttpDocumentIndex {
    pub fn new(config: IndexConfig) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            config,
        }
    }

    async fn search(&self, body: serde_json::Value) -> Result<Vec<IndexHit>> {
        let url = format!(
            "{}/collections/{}/points/search",
            self.config.base_url, self.config.collection
        );

        let deadline = Duration::from_millis(self.config.timeout_ms);
        let response = tokio::time::timeout(
            deadline,
            self.http_client.post(&url).json(&body).send(),
        )
        .await
        .map_err(|_| ServiceError::Timeout {
            after_ms: self.config.timeout_ms,
        })??;

        if !response.status().is_success() {
            return Err(ServiceError::from_response(response).await);
        }

        let json: serde_json::Value = response.json().await?;
        parse_hits(&json)
    }
}

#[async_trait]
impl DocumentIndex for HttpDocumentIndex {
    async fn hybrid_query(
        &self,
        dense: &[f32],
        sparse: &[SparseTerm],
        k: usize,
    ) -> Result<HybridCandidates> {
        let dense_body = serde_json::json!({
            "vector": {"name": "dense", "vector": dense},
            "limit": k,
            "with_payload": true,
        });

        // Sparse dimensions are addressed by stable term hashes; the same
        // scheme the ingestion side uses when writing term weights.
        let indices: Vec<u32> = sparse.iter().map(|t| fnv1a(&t.term)).collect();
        let values: Vec<f32> = sparse.iter().map(|t| t.weight).collect();
        let sparse_body = serde_json::json!({
            "vector": {"name": "sparse", "vector": {"indices": indices, "values": values}},
            "limit": k,
            "with_payload": true,
        });

        log::debug!(
            "hybrid query: {}-dim dense vector, {} sparse terms, k={}",
            dense.len(),
            sparse.len(),
            k
        );

        let dense_hits = self.search(dense_body).await?;
        let sparse_hits = self.search(sparse_body).await?;

        Ok(HybridCandidates {
            dense: dense_hits,
            sparse: sparse_hits,
        })
    }
}

/// Parse a points-search response into ranked hits.
fn parse_hits(json: &serde_json::Value) -> Result<Vec<IndexHit>> {
    let results = json["result"]
        .as_array()
        .ok_or_else(|| ServiceError::invalid("no result array in search response"))?;

    results
        .iter()
        .map(|hit| {
            let id = match &hit["id"] {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let text = hit["payload"]["text"]
                .as_str()
                .ok_or_else(|| ServiceError::invalid("hit payload missing text"))?
                .to_string();
            let source_url = hit["payload"]["url"].as_str().unwrap_or_default().to_string();
            let rank_score = hit["score"].as_f64().unwrap_or(0.0);
            Ok(IndexHit {
                id,
                text,
                source_url,
                rank_score,
            })
        })
        .collect()
}

/// 32-bit FNV-1a over a term, used as its sparse dimension index.
fn fnv1a(term: &str) -> u32 {
    let mut hash: u32 = 0x811c_9dc5;
    for byte in term.as_bytes() {
        hash ^= u32::from(*byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hits() {
        let json = serde_json::json!({
            "result": [
                {"id": 7, "score": 0.91, "payload": {"text": "第一段", "url": "https://example.tw/a"}},
                {"id": "point-2", "score": 0.55, "payload": {"text": "second", "url": "https://example.tw/b"}},
            ]
        });

        let hits = parse_hits(&json).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "7");
        assert_eq!(hits[0].text, "第一段");
        assert_eq!(hits[1].id, "point-2");
        assert_eq!(hits[1].source_url, "https://example.tw/b");
    }

    #[test]
    fn test_parse_rejects_missing_text() {
        let json = serde_json::json!({
            "result": [{"id": 1, "score": 0.9, "payload": {"url": "u"}}]
        });
        assert!(matches!(
            parse_hits(&json),
            Err(ServiceError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_fnv1a_is_stable() {
        // The sparse dimension of a term must never drift between queries.
        assert_eq!(fnv1a("visa"), fnv1a("visa"));
        assert_ne!(fnv1a("visa"), fnv1a("簽證"));
        // Reference value for the empty string (FNV offset basis).
        assert_eq!(fnv1a(""), 0x811c_9dc5);
    }
}
