//! Query translation step
//!
//! The index is maintained in a single corpus language; translating the
//! query instead of the corpus keeps the stored passages
//! language-homogeneous. A service failure here is terminal.

use std::sync::Arc;

use async_trait::async_trait;

use dialog_engine::{ConversationState, DialogNode, FailureKind, Result, StepDelta};
use providers::GenerationService;

use super::ids;
use crate::prompts;

/// Renders the pending question in the corpus language.
pub struct TranslateNode {
    generation: Arc<dyn GenerationService>,
}

impl TranslateNode {
    pub fn new(generation: Arc<dyn GenerationService>) -> Self {
        Self { generation }
    }
}

#[async_trait]
impl DialogNode for TranslateNode {
    fn id(&self) -> &str {
        ids::TRANSLATE
    }

    async fn run(&self, state: &ConversationState) -> Result<StepDelta> {
        let prompt = prompts::translation_prompt(state.pending_question());

        match self.generation.generate(&prompt).await {
            Ok(text) => {
                let query = text.trim().to_string();
                log::debug!("translated query: {} chars", query.len());
                Ok(StepDelta::advance()
                    .with_translated_query(query)
                    .with_note("Translated question to corpus language"))
            }
            Err(e) => {
                log::error!("translation failed: {e}");
                Ok(StepDelta::failed(FailureKind::Translation, e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dialog_engine::StepOutcome;
    use providers::ServiceError;
    use std::collections::BTreeMap;

    struct FakeGeneration {
        reply: std::result::Result<String, ()>,
    }

    #[async_trait]
    impl GenerationService for FakeGeneration {
        async fn generate(&self, _prompt: &str) -> providers::Result<String> {
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(()) => Err(ServiceError::Timeout { after_ms: 30_000 }),
            }
        }
    }

    fn turn() -> ConversationState {
        ConversationState::for_turn("How do I extend my visa?", BTreeMap::new(), "English")
    }

    #[tokio::test]
    async fn test_success_sets_translated_query() {
        let node = TranslateNode::new(Arc::new(FakeGeneration {
            reply: Ok("  如何延長我的簽證？\n".to_string()),
        }));
        let delta = node.run(&turn()).await.unwrap();
        assert_eq!(delta.translated_query.as_deref(), Some("如何延長我的簽證？"));
        assert_eq!(delta.outcome, StepOutcome::Continue);
    }

    #[tokio::test]
    async fn test_service_failure_is_terminal() {
        let node = TranslateNode::new(Arc::new(FakeGeneration { reply: Err(()) }));
        let delta = node.run(&turn()).await.unwrap();
        assert!(matches!(
            delta.outcome,
            StepOutcome::Failed {
                kind: FailureKind::Translation,
                ..
            }
        ));
        assert!(delta.translated_query.is_none());
    }
}
