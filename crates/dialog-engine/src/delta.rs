//! Typed step deltas returned by dialog nodes.
//!
//! A node transform never touches `ConversationState` directly: it returns a
//! `StepDelta` describing what changed plus a tagged [`StepOutcome`] that
//! drives routing. The executor merges the delta and dispatches on the
//! outcome variant, so control flow never depends on the presence of ad hoc
//! context keys.

use serde::{Deserialize, Serialize};

use crate::state::{Message, Passage};

/// Classification of a terminal node failure, surfaced to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// Query translation call failed.
    #[serde(rename = "translation_error")]
    Translation,
    /// Embedding or index query failed (infrastructure, not quality).
    #[serde(rename = "retrieval_error")]
    Retrieval,
    /// Answer generation call failed.
    #[serde(rename = "generation_error")]
    Generation,
    /// Retrieval was reached without a usable query.
    #[serde(rename = "empty_query")]
    EmptyQuery,
    /// Engine-level wrapping of an unexpected node error.
    #[serde(rename = "internal_error")]
    Internal,
}

impl FailureKind {
    /// Stable wire identifier for this failure kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Translation => "translation_error",
            FailureKind::Retrieval => "retrieval_error",
            FailureKind::Generation => "generation_error",
            FailureKind::EmptyQuery => "empty_query",
            FailureKind::Internal => "internal_error",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the run proceeds after a node completes.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Follow the node's outgoing route.
    Continue,
    /// End the run in a non-terminal state awaiting caller input.
    Suspend { reason: String },
    /// End the run successfully.
    Done,
    /// End the run with a terminal failure.
    Failed { kind: FailureKind, detail: String },
}

/// The result of one node transform: state changes plus a routing outcome.
#[derive(Debug, Clone)]
pub struct StepDelta {
    /// Messages to append to the transcript.
    pub messages: Vec<Message>,
    /// New corpus-language query, if this step produced one.
    pub translated_query: Option<String>,
    /// Full replacement for the retrieved passages, if this step retrieved.
    pub retrieved_docs: Option<Vec<Passage>>,
    /// Whether this step consumed one retrieval attempt.
    pub record_attempt: bool,
    /// New missing-field list from the profile gate, if it ran.
    pub missing_profile_fields: Option<Vec<String>>,
    /// New grading verdict, if this step graded.
    pub evidence_sufficient: Option<bool>,
    /// Human-readable progress note attached to the completion event.
    pub note: Option<String>,
    /// Routing outcome.
    pub outcome: StepOutcome,
}

impl StepDelta {
    fn with_outcome(outcome: StepOutcome) -> Self {
        Self {
            messages: Vec::new(),
            translated_query: None,
            retrieved_docs: None,
            record_attempt: false,
            missing_profile_fields: None,
            evidence_sufficient: None,
            note: None,
            outcome,
        }
    }

    /// A delta that continues along the node's outgoing route.
    pub fn advance() -> Self {
        Self::with_outcome(StepOutcome::Continue)
    }

    /// A delta that suspends the run awaiting caller input.
    pub fn suspend(reason: impl Into<String>) -> Self {
        Self::with_outcome(StepOutcome::Suspend {
            reason: reason.into(),
        })
    }

    /// A delta that ends the run successfully.
    pub fn done() -> Self {
        Self::with_outcome(StepOutcome::Done)
    }

    /// A delta that ends the run with a terminal failure.
    pub fn failed(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self::with_outcome(StepOutcome::Failed {
            kind,
            detail: detail.into(),
        })
    }

    /// Append an assistant message to the transcript.
    pub fn with_assistant_message(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::assistant(content));
        self
    }

    /// Set the corpus-language query.
    pub fn with_translated_query(mut self, query: impl Into<String>) -> Self {
        self.translated_query = Some(query.into());
        self
    }

    /// Replace the retrieved passages.
    pub fn with_docs(mut self, docs: Vec<Passage>) -> Self {
        self.retrieved_docs = Some(docs);
        self
    }

    /// Consume one retrieval attempt.
    pub fn record_attempt(mut self) -> Self {
        self.record_attempt = true;
        self
    }

    /// Record the profile fields found missing.
    pub fn with_missing_fields(mut self, fields: Vec<String>) -> Self {
        self.missing_profile_fields = Some(fields);
        self
    }

    /// Record the grading verdict.
    pub fn with_evidence(mut self, sufficient: bool) -> Self {
        self.evidence_sufficient = Some(sufficient);
        self
    }

    /// Attach a progress note to the completion event.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_set_outcome() {
        assert_eq!(StepDelta::advance().outcome, StepOutcome::Continue);
        assert_eq!(StepDelta::done().outcome, StepOutcome::Done);
        assert!(matches!(
            StepDelta::suspend("profile_incomplete").outcome,
            StepOutcome::Suspend { .. }
        ));
        assert!(matches!(
            StepDelta::failed(FailureKind::Translation, "timeout").outcome,
            StepOutcome::Failed {
                kind: FailureKind::Translation,
                ..
            }
        ));
    }

    #[test]
    fn test_failure_kind_wire_names() {
        assert_eq!(FailureKind::Translation.as_str(), "translation_error");
        assert_eq!(FailureKind::EmptyQuery.as_str(), "empty_query");
        let json = serde_json::to_string(&FailureKind::Retrieval).unwrap();
        assert_eq!(json, "\"retrieval_error\"");
    }

    #[test]
    fn test_chained_builder() {
        let delta = StepDelta::advance()
            .with_assistant_message("hi")
            .record_attempt()
            .with_note("note");
        assert_eq!(delta.messages.len(), 1);
        assert!(delta.record_attempt);
        assert_eq!(delta.note.as_deref(), Some("note"));
    }
}
