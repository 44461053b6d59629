//! Profile gate
//!
//! Checks the caller-supplied profile against the fixed required-field list.
//! The gate only records what is missing; routing to the ask-profile step
//! happens in the graph's conditional edge.

use async_trait::async_trait;

use dialog_engine::{ConversationState, DialogNode, Result, StepDelta};

use super::ids;

/// Profile fields a question cannot be answered without.
pub const REQUIRED_PROFILE_FIELDS: [&str; 2] = ["nationality", "visa_type"];

/// Gate step verifying the user profile is complete.
#[derive(Clone, Default)]
pub struct ProfileCheckNode;

impl ProfileCheckNode {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DialogNode for ProfileCheckNode {
    fn id(&self) -> &str {
        ids::PROFILE_CHECK
    }

    async fn run(&self, state: &ConversationState) -> Result<StepDelta> {
        let missing: Vec<String> = REQUIRED_PROFILE_FIELDS
            .iter()
            .filter(|field| {
                state
                    .user_profile
                    .get(**field)
                    .map(|v| v.trim().is_empty())
                    .unwrap_or(true)
            })
            .map(|field| field.to_string())
            .collect();

        log::debug!("profile gate: {} field(s) missing", missing.len());

        let note = if missing.is_empty() {
            "Profile complete".to_string()
        } else {
            format!("Missing profile fields: {}", missing.join(", "))
        };

        Ok(StepDelta::advance()
            .with_missing_fields(missing)
            .with_note(note))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn turn_with_profile(fields: &[(&str, &str)]) -> ConversationState {
        let profile: BTreeMap<String, String> = fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ConversationState::for_turn("What visa do I need?", profile, "English")
    }

    #[tokio::test]
    async fn test_complete_profile_passes() {
        let state = turn_with_profile(&[("nationality", "German"), ("visa_type", "visitor")]);
        let delta = ProfileCheckNode::new().run(&state).await.unwrap();
        assert_eq!(delta.missing_profile_fields, Some(vec![]));
    }

    #[tokio::test]
    async fn test_missing_fields_enumerated_exactly() {
        let state = turn_with_profile(&[("nationality", "German")]);
        let delta = ProfileCheckNode::new().run(&state).await.unwrap();
        assert_eq!(
            delta.missing_profile_fields,
            Some(vec!["visa_type".to_string()])
        );
    }

    #[tokio::test]
    async fn test_blank_value_counts_as_missing() {
        let state = turn_with_profile(&[("nationality", "  "), ("visa_type", "visitor")]);
        let delta = ProfileCheckNode::new().run(&state).await.unwrap();
        assert_eq!(
            delta.missing_profile_fields,
            Some(vec!["nationality".to_string()])
        );
    }

    #[tokio::test]
    async fn test_empty_profile_misses_both() {
        let state = turn_with_profile(&[]);
        let delta = ProfileCheckNode::new().run(&state).await.unwrap();
        assert_eq!(
            delta.missing_profile_fields,
            Some(vec!["nationality".to_string(), "visa_type".to_string()])
        );
    }
}
