//! Service configuration
//!
//! Defaults come from [`crate::constants::defaults`] and the collaborator
//! crates; each field can be overridden through the environment variables in
//! [`crate::constants::env_vars`].

use serde::{Deserialize, Serialize};

use dialog_nodes::ConversationConfig;
use providers::{EmbeddingConfig, GenerationConfig, IndexConfig};

use crate::constants::{defaults, env_vars};

/// Full service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Address the HTTP listener binds to
    pub bind_addr: String,
    /// Text-generation collaborator
    pub generation: GenerationConfig,
    /// Embedding collaborator
    pub embedding: EmbeddingConfig,
    /// Document index collaborator
    pub index: IndexConfig,
    /// Conversation graph tunables
    pub conversation: ConversationConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: defaults::BIND_ADDR.to_string(),
            generation: GenerationConfig::default(),
            embedding: EmbeddingConfig::default(),
            index: IndexConfig::default(),
            conversation: ConversationConfig::default(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: '{value}'")]
    Invalid { var: String, value: String },
}

impl ServiceConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Split out from [`Self::from_env`] so overrides are testable without
    /// touching process-global environment state.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup(env_vars::BIND_ADDR) {
            config.bind_addr = value;
        }
        if let Some(value) = lookup(env_vars::GENERATION_URL) {
            config.generation.base_url = value;
        }
        if let Some(value) = lookup(env_vars::GENERATION_MODEL) {
            config.generation.model = value;
        }
        if let Some(value) = lookup(env_vars::EMBEDDING_URL) {
            config.embedding.base_url = value;
        }
        if let Some(value) = lookup(env_vars::EMBEDDING_MODEL) {
            config.embedding.model = value;
        }
        if let Some(value) = lookup(env_vars::INDEX_URL) {
            config.index.base_url = value;
        }
        if let Some(value) = lookup(env_vars::INDEX_COLLECTION) {
            config.index.collection = value;
        }
        if let Some(value) = lookup(env_vars::MAX_RETRIEVAL_ATTEMPTS) {
            config.conversation.max_retrieval_attempts =
                parse(env_vars::MAX_RETRIEVAL_ATTEMPTS, &value)?;
        }
        if let Some(value) = lookup(env_vars::RESULT_SIZE) {
            config.conversation.retrieval.result_size = parse(env_vars::RESULT_SIZE, &value)?;
        }

        Ok(config)
    }
}

fn parse<T: std::str::FromStr>(var: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        var: var.to_string(),
        value: value.to_string(),
    })
}
