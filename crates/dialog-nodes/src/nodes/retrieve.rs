//! Hybrid retrieval step
//!
//! Embeds the corpus-language query, derives its sparse terms, runs the two
//! independent top-K index lookups, and fuses the rankings with
//! reciprocal-rank fusion. Each run replaces the previous passages wholesale
//! and consumes one retrieval attempt; on grade-driven retries the per-list
//! candidate limit widens so the retry is not a structural no-op.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use dialog_engine::{ConversationState, DialogNode, FailureKind, Result, StepDelta};
use providers::{DocumentIndex, EmbeddingService};

use super::ids;
use crate::retrieval::{encode_sparse, reciprocal_rank_fusion};

/// Tuning parameters for hybrid retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalParams {
    /// Top-K per candidate list on the first attempt.
    pub candidates_per_list: usize,
    /// Size of the fused result.
    pub result_size: usize,
    /// Rank-offset constant of the fusion formula.
    pub rrf_constant: f64,
    /// How much each retry widens the per-list candidate limit.
    pub retry_widen_step: usize,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self {
            candidates_per_list: 5,
            result_size: 5,
            rrf_constant: 60.0,
            retry_widen_step: 5,
        }
    }
}

/// Retrieval step combining dense and sparse index lookups.
pub struct RetrieveNode {
    embedding: Arc<dyn EmbeddingService>,
    index: Arc<dyn DocumentIndex>,
    params: RetrievalParams,
}

impl RetrieveNode {
    pub fn new(
        embedding: Arc<dyn EmbeddingService>,
        index: Arc<dyn DocumentIndex>,
        params: RetrievalParams,
    ) -> Self {
        Self {
            embedding,
            index,
            params,
        }
    }
}

#[async_trait]
impl DialogNode for RetrieveNode {
    fn id(&self) -> &str {
        ids::RETRIEVE
    }

    async fn run(&self, state: &ConversationState) -> Result<StepDelta> {
        let query = state
            .translated_query
            .as_deref()
            .map(str::trim)
            .unwrap_or_default();
        if query.is_empty() {
            // Precondition violation, not a quality miss.
            return Ok(StepDelta::failed(
                FailureKind::EmptyQuery,
                "retrieval reached without a usable query",
            ));
        }

        let k = self.params.candidates_per_list
            + state.retrieval_attempts as usize * self.params.retry_widen_step;

        let vector = match self.embedding.embed(query).await {
            Ok(vector) => vector,
            Err(e) => {
                log::error!("query embedding failed: {e}");
                return Ok(StepDelta::failed(FailureKind::Retrieval, e.to_string()));
            }
        };

        let terms = encode_sparse(query);
        let candidates = match self.index.hybrid_query(&vector, &terms, k).await {
            Ok(candidates) => candidates,
            Err(e) => {
                log::error!("index query failed: {e}");
                return Ok(StepDelta::failed(FailureKind::Retrieval, e.to_string()));
            }
        };

        let fused = reciprocal_rank_fusion(
            &candidates.dense,
            &candidates.sparse,
            self.params.rrf_constant,
            self.params.result_size,
        );

        log::debug!(
            "retrieval attempt {}: k={}, {} dense + {} sparse candidates, {} fused",
            state.retrieval_attempts + 1,
            k,
            candidates.dense.len(),
            candidates.sparse.len(),
            fused.len()
        );

        let note = format!("Retrieved {} passages", fused.len());
        Ok(StepDelta::advance()
            .with_docs(fused)
            .record_attempt()
            .with_note(note))
    }
}
