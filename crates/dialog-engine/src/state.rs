//! Conversation state threaded through every step of a run.
//!
//! A `ConversationState` is owned by exactly one in-flight run. Nodes never
//! mutate it directly; they return a [`StepDelta`](crate::delta::StepDelta)
//! which the executor merges via [`ConversationState::apply`]. The merge is
//! the single place the state invariants are enforced: messages are
//! append-only, retrieved passages are replaced wholesale, and the retrieval
//! attempt counter only moves forward.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::delta::StepDelta;

/// Who authored a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single conversation message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A retrieved corpus passage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Passage {
    /// Passage text as stored in the index.
    pub text: String,
    /// URL of the source document.
    pub source_url: String,
    /// Fused relevance score.
    pub score: f64,
}

/// The mutable context of one conversational run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationState {
    /// Conversation transcript. Append-only within a run.
    pub messages: Vec<Message>,
    /// Caller-supplied profile fields (nationality, visa type, ...).
    /// The engine reads these and may ask for completion; it never deletes keys.
    pub user_profile: BTreeMap<String, String>,
    /// The question under active resolution, fixed at run construction.
    /// Deliberately separate from `messages.last()`, which drifts once
    /// assistant turns are appended.
    pending_question: String,
    /// Corpus-language rendering of the pending question.
    pub translated_query: Option<String>,
    /// Passages from the most recent retrieval attempt only.
    pub retrieved_docs: Vec<Passage>,
    /// Number of retrieval attempts performed so far, counting the first.
    pub retrieval_attempts: u32,
    /// Profile fields found missing by the profile gate.
    pub missing_profile_fields: Vec<String>,
    /// Verdict of the most recent evidence grading, if any.
    pub evidence_sufficient: Option<bool>,
    /// Language the final answer must be written in.
    pub response_language: String,
}

impl ConversationState {
    /// Create the state for a new conversational turn.
    ///
    /// The user message becomes both the first transcript entry and the
    /// immutable pending question of the run.
    pub fn for_turn(
        message: impl Into<String>,
        user_profile: BTreeMap<String, String>,
        response_language: impl Into<String>,
    ) -> Self {
        let message = message.into();
        Self {
            messages: vec![Message::user(message.clone())],
            user_profile,
            pending_question: message,
            translated_query: None,
            retrieved_docs: Vec::new(),
            retrieval_attempts: 0,
            missing_profile_fields: Vec::new(),
            evidence_sufficient: None,
            response_language: response_language.into(),
        }
    }

    /// The question this run is resolving. Immutable once set.
    pub fn pending_question(&self) -> &str {
        &self.pending_question
    }

    /// The last assistant message of the transcript, if any.
    pub fn last_assistant_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(|m| m.content.as_str())
    }

    /// Merge a step delta into the state.
    ///
    /// Messages are appended, never reordered or truncated. Retrieved docs
    /// are replaced wholesale so stale passages can never be graded. The
    /// attempt counter only increments.
    pub fn apply(&mut self, delta: &StepDelta) {
        self.messages.extend(delta.messages.iter().cloned());
        if let Some(query) = &delta.translated_query {
            self.translated_query = Some(query.clone());
        }
        if let Some(docs) = &delta.retrieved_docs {
            self.retrieved_docs = docs.clone();
        }
        if delta.record_attempt {
            self.retrieval_attempts += 1;
        }
        if let Some(missing) = &delta.missing_profile_fields {
            self.missing_profile_fields = missing.clone();
        }
        if let Some(verdict) = delta.evidence_sufficient {
            self.evidence_sufficient = Some(verdict);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::StepDelta;

    fn state() -> ConversationState {
        ConversationState::for_turn("What visa do I need?", BTreeMap::new(), "English")
    }

    #[test]
    fn test_turn_seeds_question_and_transcript() {
        let s = state();
        assert_eq!(s.pending_question(), "What visa do I need?");
        assert_eq!(s.messages.len(), 1);
        assert_eq!(s.messages[0].role, Role::User);
    }

    #[test]
    fn test_apply_appends_messages() {
        let mut s = state();
        s.apply(&StepDelta::advance().with_assistant_message("hello"));
        s.apply(&StepDelta::advance().with_assistant_message("again"));

        assert_eq!(s.messages.len(), 3);
        assert_eq!(s.messages[1].content, "hello");
        assert_eq!(s.messages[2].content, "again");
        // The pending question does not drift with the transcript.
        assert_eq!(s.pending_question(), "What visa do I need?");
    }

    #[test]
    fn test_apply_replaces_docs_wholesale() {
        let mut s = state();
        let first = vec![Passage {
            text: "old".into(),
            source_url: "u1".into(),
            score: 1.0,
        }];
        let second = vec![Passage {
            text: "new".into(),
            source_url: "u2".into(),
            score: 2.0,
        }];

        s.apply(&StepDelta::advance().with_docs(first));
        s.apply(&StepDelta::advance().with_docs(second));

        assert_eq!(s.retrieved_docs.len(), 1);
        assert_eq!(s.retrieved_docs[0].text, "new");
    }

    #[test]
    fn test_attempts_only_increment() {
        let mut s = state();
        s.apply(&StepDelta::advance());
        assert_eq!(s.retrieval_attempts, 0);
        s.apply(&StepDelta::advance().record_attempt());
        s.apply(&StepDelta::advance().record_attempt());
        assert_eq!(s.retrieval_attempts, 2);
    }

    #[test]
    fn test_last_assistant_message() {
        let mut s = state();
        assert!(s.last_assistant_message().is_none());
        s.apply(&StepDelta::advance().with_assistant_message("answer [1]"));
        assert_eq!(s.last_assistant_message(), Some("answer [1]"));
    }
}
