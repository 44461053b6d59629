//! Assembly of the conversation graph.
//!
//! Wires the six steps into the fixed topology:
//!
//! ```text
//! profile_check ──(incomplete)──► ask_profile ──► (suspend)
//!       │(complete)
//!       ▼
//!   translate ──► retrieve ──► grade ──(retry)──► retrieve
//!                                │(answer)
//!                                ▼
//!                           synthesize ──► (done)
//! ```
//!
//! The grade→retrieve cycle is bounded twice: the routing selector stops
//! retrying once the attempt budget is spent, and the executor's visit cap
//! forces forward progress regardless.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use dialog_engine::{DialogGraph, DialogGraphBuilder, Result};
use providers::{DocumentIndex, EmbeddingService, GenerationService};

use crate::nodes::{
    ids, AskProfileNode, GradeNode, ProfileCheckNode, RetrievalParams, RetrieveNode,
    SynthesizeNode, TranslateNode,
};

/// Tunables of the conversation graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Hybrid retrieval parameters.
    pub retrieval: RetrievalParams,
    /// Maximum retrieval attempts per run, counting the first.
    pub max_retrieval_attempts: u32,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            retrieval: RetrievalParams::default(),
            max_retrieval_attempts: 3,
        }
    }
}

/// Build the immigration Q&A conversation graph.
///
/// Collaborator handles are injected here and shared by the nodes; the
/// returned graph is immutable and safe to share across concurrent runs.
pub fn conversation_graph(
    generation: Arc<dyn GenerationService>,
    embedding: Arc<dyn EmbeddingService>,
    index: Arc<dyn DocumentIndex>,
    config: ConversationConfig,
) -> Result<DialogGraph> {
    let max_attempts = config.max_retrieval_attempts;

    DialogGraphBuilder::new("immigration_qa")
        .add_node(Arc::new(ProfileCheckNode::new()))
        .add_node(Arc::new(AskProfileNode::new()))
        .add_node(Arc::new(TranslateNode::new(generation.clone())))
        .add_node(Arc::new(RetrieveNode::new(
            embedding,
            index,
            config.retrieval,
        )))
        .add_node(Arc::new(GradeNode::new(generation.clone())))
        .add_node(Arc::new(SynthesizeNode::new(generation)))
        .start_at(ids::PROFILE_CHECK)
        .conditional(
            ids::PROFILE_CHECK,
            |state| {
                if state.missing_profile_fields.is_empty() {
                    "complete"
                } else {
                    "incomplete"
                }
            },
            vec![
                ("incomplete", ids::ASK_PROFILE),
                ("complete", ids::TRANSLATE),
            ],
        )
        .end(ids::ASK_PROFILE)
        .edge(ids::TRANSLATE, ids::RETRIEVE)
        .edge(ids::RETRIEVE, ids::GRADE)
        .conditional(
            ids::GRADE,
            move |state| {
                if state.evidence_sufficient == Some(false)
                    && state.retrieval_attempts < max_attempts
                {
                    "retry"
                } else {
                    "answer"
                }
            },
            vec![("retry", ids::RETRIEVE), ("answer", ids::SYNTHESIZE)],
        )
        .end(ids::SYNTHESIZE)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dialog_engine::{
        ConversationState, DialogEvent, ExecutorConfig, FailureKind, GraphExecutor, RunStatus,
        VecEventSink,
    };
    use providers::{
        HybridCandidates, IndexHit, Result as ProviderResult, ServiceError, SparseTerm,
    };
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Generation fake that answers translation, grading, and synthesis
    /// prompts by shape, the way the real service is prompted.
    struct ScriptedGeneration {
        sufficient_after: usize,
        grade_calls: AtomicUsize,
    }

    impl ScriptedGeneration {
        fn always_sufficient() -> Self {
            Self {
                sufficient_after: 0,
                grade_calls: AtomicUsize::new(0),
            }
        }

        fn sufficient_after(n: usize) -> Self {
            Self {
                sufficient_after: n,
                grade_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl GenerationService for ScriptedGeneration {
        async fn generate(&self, prompt: &str) -> ProviderResult<String> {
            if prompt.contains("翻譯") {
                Ok("如何申請簽證延期？".to_string())
            } else if prompt.contains("是否足夠") {
                let call = self.grade_calls.fetch_add(1, Ordering::SeqCst);
                if call < self.sufficient_after {
                    Ok("無法回答".to_string())
                } else {
                    Ok("文件足夠回答問題。".to_string())
                }
            } else {
                Ok("Based on the regulations, you need Visa X [1].".to_string())
            }
        }
    }

    struct FakeEmbedding {
        fail: bool,
    }

    #[async_trait]
    impl EmbeddingService for FakeEmbedding {
        async fn embed(&self, _text: &str) -> ProviderResult<Vec<f32>> {
            if self.fail {
                Err(ServiceError::Timeout { after_ms: 10_000 })
            } else {
                Ok(vec![0.1; 8])
            }
        }
    }

    #[derive(Default)]
    struct CountingIndex {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DocumentIndex for CountingIndex {
        async fn hybrid_query(
            &self,
            _dense: &[f32],
            _sparse: &[SparseTerm],
            _k: usize,
        ) -> ProviderResult<HybridCandidates> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let hit = IndexHit {
                id: "p1".to_string(),
                text: "Visa X requires...".to_string(),
                source_url: "url1".to_string(),
                rank_score: 0.9,
            };
            Ok(HybridCandidates {
                dense: vec![hit.clone()],
                sparse: vec![hit],
            })
        }
    }

    fn executor(config: &ConversationConfig) -> GraphExecutor {
        GraphExecutor::with_config(ExecutorConfig {
            max_cycle_visits: config.max_retrieval_attempts,
            max_steps: 64,
        })
    }

    fn complete_profile() -> BTreeMap<String, String> {
        [("nationality", "German"), ("visa_type", "visitor")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_happy_path_produces_cited_answer() {
        let index = Arc::new(CountingIndex::default());
        let config = ConversationConfig::default();
        let graph = conversation_graph(
            Arc::new(ScriptedGeneration::always_sufficient()),
            Arc::new(FakeEmbedding { fail: false }),
            index.clone(),
            config.clone(),
        )
        .unwrap();

        let state =
            ConversationState::for_turn("What visa do I need?", complete_profile(), "English");
        let sink = VecEventSink::new();
        let report = executor(&config).run(&graph, state, &sink).await.unwrap();

        assert_eq!(report.status, RunStatus::Completed);
        let answer = report.state.last_assistant_message().unwrap();
        assert!(answer.contains("[1]"));
        assert_eq!(index.calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.state.retrieval_attempts, 1);

        // profile_check, translate, retrieve, grade, synthesize; never ask_profile.
        let visited: Vec<String> = sink
            .events()
            .iter()
            .filter_map(|e| match e {
                DialogEvent::NodeStarted { node, .. } => Some(node.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(
            visited,
            vec!["profile_check", "translate", "retrieve", "grade", "synthesize"]
        );
    }

    #[tokio::test]
    async fn test_incomplete_profile_suspends_without_retrieval() {
        let index = Arc::new(CountingIndex::default());
        let config = ConversationConfig::default();
        let graph = conversation_graph(
            Arc::new(ScriptedGeneration::always_sufficient()),
            Arc::new(FakeEmbedding { fail: false }),
            index.clone(),
            config.clone(),
        )
        .unwrap();

        let profile: BTreeMap<String, String> =
            [("nationality".to_string(), "German".to_string())].into();
        let state = ConversationState::for_turn("What visa do I need?", profile, "English");
        let report = executor(&config)
            .run(&graph, state, &dialog_engine::NullEventSink)
            .await
            .unwrap();

        assert!(matches!(report.status, RunStatus::Suspended { ref reason } if reason == "profile_incomplete"));
        assert_eq!(index.calls.load(Ordering::SeqCst), 0);
        // The assistant message names exactly the one missing field.
        let message = report.state.last_assistant_message().unwrap();
        assert!(message.contains("visa"));
        assert!(!message.to_lowercase().contains("nationality"));
    }

    #[tokio::test]
    async fn test_insufficient_grading_retries_then_degrades() {
        // Grading never approves; the loop must stop at the attempt budget
        // and still produce an answer.
        let index = Arc::new(CountingIndex::default());
        let config = ConversationConfig::default();
        let graph = conversation_graph(
            Arc::new(ScriptedGeneration::sufficient_after(usize::MAX)),
            Arc::new(FakeEmbedding { fail: false }),
            index.clone(),
            config.clone(),
        )
        .unwrap();

        let state = ConversationState::for_turn("question", complete_profile(), "English");
        let report = executor(&config)
            .run(&graph, state, &dialog_engine::NullEventSink)
            .await
            .unwrap();

        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(report.state.retrieval_attempts, 3);
        assert_eq!(index.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_one_retry_when_second_grade_approves() {
        let index = Arc::new(CountingIndex::default());
        let config = ConversationConfig::default();
        let graph = conversation_graph(
            Arc::new(ScriptedGeneration::sufficient_after(1)),
            Arc::new(FakeEmbedding { fail: false }),
            index.clone(),
            config.clone(),
        )
        .unwrap();

        let state = ConversationState::for_turn("question", complete_profile(), "English");
        let report = executor(&config)
            .run(&graph, state, &dialog_engine::NullEventSink)
            .await
            .unwrap();

        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(report.state.retrieval_attempts, 2);
    }

    #[tokio::test]
    async fn test_embedding_timeout_fails_as_retrieval_error() {
        let config = ConversationConfig::default();
        let graph = conversation_graph(
            Arc::new(ScriptedGeneration::always_sufficient()),
            Arc::new(FakeEmbedding { fail: true }),
            Arc::new(CountingIndex::default()),
            config.clone(),
        )
        .unwrap();

        let state = ConversationState::for_turn("question", complete_profile(), "English");
        let sink = VecEventSink::new();
        let report = executor(&config).run(&graph, state, &sink).await.unwrap();

        assert!(matches!(
            report.status,
            RunStatus::Failed {
                kind: FailureKind::Retrieval,
                ..
            }
        ));

        let events = sink.events();
        let failures = events
            .iter()
            .filter(|e| matches!(e, DialogEvent::RunFailed { .. }))
            .count();
        assert_eq!(failures, 1);
        assert!(!events
            .iter()
            .any(|e| matches!(e, DialogEvent::RunCompleted { .. })));
    }
}
