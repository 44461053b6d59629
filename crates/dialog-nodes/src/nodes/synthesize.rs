//! Answer synthesis step
//!
//! Builds a numbered citation context from the retrieved passages and asks
//! the generation service to answer in the caller's language, citing
//! passage numbers. Success appends the assistant answer and ends the run.

use std::sync::Arc;

use async_trait::async_trait;

use dialog_engine::{ConversationState, DialogNode, FailureKind, Result, StepDelta};
use providers::GenerationService;

use super::ids;
use crate::prompts;

/// Final step producing the cited answer.
pub struct SynthesizeNode {
    generation: Arc<dyn GenerationService>,
}

impl SynthesizeNode {
    pub fn new(generation: Arc<dyn GenerationService>) -> Self {
        Self { generation }
    }
}

#[async_trait]
impl DialogNode for SynthesizeNode {
    fn id(&self) -> &str {
        ids::SYNTHESIZE
    }

    async fn run(&self, state: &ConversationState) -> Result<StepDelta> {
        let prompt = prompts::synthesis_prompt(
            state.pending_question(),
            &state.retrieved_docs,
            &state.response_language,
        );

        match self.generation.generate(&prompt).await {
            Ok(answer) => {
                log::debug!(
                    "synthesized answer over {} passages",
                    state.retrieved_docs.len()
                );
                Ok(StepDelta::done()
                    .with_assistant_message(answer)
                    .with_note("Answer generated"))
            }
            Err(e) => {
                log::error!("answer generation failed: {e}");
                Ok(StepDelta::failed(FailureKind::Generation, e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dialog_engine::{Passage, StepOutcome};
    use providers::ServiceError;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    struct FakeGeneration {
        fail: bool,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl GenerationService for FakeGeneration {
        async fn generate(&self, prompt: &str) -> providers::Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            if self.fail {
                Err(ServiceError::Timeout { after_ms: 30_000 })
            } else {
                Ok("You need Visa X [1].".to_string())
            }
        }
    }

    fn state() -> ConversationState {
        let mut state =
            ConversationState::for_turn("What visa do I need?", BTreeMap::new(), "English");
        state.retrieved_docs = vec![Passage {
            text: "Visa X requires...".into(),
            source_url: "url1".into(),
            score: 1.0,
        }];
        state
    }

    #[tokio::test]
    async fn test_answer_appended_and_terminal() {
        let generation = Arc::new(FakeGeneration {
            fail: false,
            prompts: Mutex::new(Vec::new()),
        });
        let delta = SynthesizeNode::new(generation.clone())
            .run(&state())
            .await
            .unwrap();

        assert_eq!(delta.outcome, StepOutcome::Done);
        assert_eq!(delta.messages.len(), 1);
        assert!(!delta.messages[0].content.is_empty());
        assert!(delta.messages[0].content.contains("[1]"));

        // The prompt carried the numbered citation context.
        let prompts = generation.prompts.lock().unwrap();
        assert!(prompts[0].contains("[1] Visa X requires..."));
        assert!(prompts[0].contains("What visa do I need?"));
    }

    #[tokio::test]
    async fn test_service_failure_is_generation_error() {
        let generation = Arc::new(FakeGeneration {
            fail: true,
            prompts: Mutex::new(Vec::new()),
        });
        let delta = SynthesizeNode::new(generation).run(&state()).await.unwrap();
        assert!(matches!(
            delta.outcome,
            StepOutcome::Failed {
                kind: FailureKind::Generation,
                ..
            }
        ));
        assert!(delta.messages.is_empty());
    }
}
