//! Evidence grading step
//!
//! Asks the generation service whether the retrieved passages suffice to
//! answer the pending question, then classifies the reply by scanning for a
//! small fixed set of negative-judgment phrases. A phrase-match heuristic,
//! not structured output: a known limitation carried over from the corpus
//! prompts. A grading service failure degrades to "insufficient" rather
//! than failing the run; the retry bound still applies through routing.

use std::sync::Arc;

use async_trait::async_trait;

use dialog_engine::{ConversationState, DialogNode, Result, StepDelta};
use providers::GenerationService;

use super::ids;
use crate::prompts;

/// Judges whether the current passages can answer the question.
pub struct GradeNode {
    generation: Arc<dyn GenerationService>,
    negative_phrases: Vec<String>,
}

impl GradeNode {
    pub fn new(generation: Arc<dyn GenerationService>) -> Self {
        Self {
            generation,
            negative_phrases: prompts::default_negative_phrases(),
        }
    }

    /// Override the negative-judgment phrase set.
    pub fn with_negative_phrases(mut self, phrases: Vec<String>) -> Self {
        self.negative_phrases = phrases;
        self
    }

    fn classify(&self, judgment: &str) -> bool {
        let lower = judgment.to_lowercase();
        !self
            .negative_phrases
            .iter()
            .any(|phrase| lower.contains(&phrase.to_lowercase()))
    }
}

#[async_trait]
impl DialogNode for GradeNode {
    fn id(&self) -> &str {
        ids::GRADE
    }

    async fn run(&self, state: &ConversationState) -> Result<StepDelta> {
        let prompt = prompts::grading_prompt(state.pending_question(), &state.retrieved_docs);

        let sufficient = match self.generation.generate(&prompt).await {
            Ok(judgment) => self.classify(&judgment),
            Err(e) => {
                log::warn!("grading failed, assuming insufficient evidence: {e}");
                false
            }
        };

        log::debug!(
            "grade on attempt {}: {}",
            state.retrieval_attempts,
            if sufficient { "sufficient" } else { "insufficient" }
        );

        let note = if sufficient {
            "Evidence sufficient"
        } else {
            "Evidence insufficient"
        };
        Ok(StepDelta::advance().with_evidence(sufficient).with_note(note))
    }
}
