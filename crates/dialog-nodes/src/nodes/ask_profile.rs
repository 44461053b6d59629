//! Ask-profile step
//!
//! Appends a single assistant message enumerating exactly the missing
//! profile fields (one localized fragment per field) and suspends the run.
//! The conversation resumes as a fresh turn once the caller supplies the
//! fields.

use async_trait::async_trait;

use dialog_engine::{ConversationState, DialogNode, Result, StepDelta};

use super::ids;
use crate::prompts;

/// Suspend reason reported for an incomplete profile.
pub const PROFILE_INCOMPLETE: &str = "profile_incomplete";

/// Human-in-the-loop step requesting the missing profile fields.
#[derive(Clone, Default)]
pub struct AskProfileNode;

impl AskProfileNode {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DialogNode for AskProfileNode {
    fn id(&self) -> &str {
        ids::ASK_PROFILE
    }

    async fn run(&self, state: &ConversationState) -> Result<StepDelta> {
        let fragments: Vec<String> = state
            .missing_profile_fields
            .iter()
            .map(|field| prompts::profile_prompt_fragment(field, &state.response_language))
            .collect();
        let question = fragments.join(" ");

        log::debug!(
            "asking for {} missing profile field(s)",
            state.missing_profile_fields.len()
        );

        Ok(StepDelta::suspend(PROFILE_INCOMPLETE)
            .with_assistant_message(question)
            .with_note("Awaiting profile details"))
    }
}
