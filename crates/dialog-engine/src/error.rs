//! Error types for the dialog engine

use thiserror::Error;

/// Result type alias using EngineError
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur in the dialog engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// A node ID was referenced that is not registered in the graph
    #[error("Node '{0}' not found in graph")]
    UnknownNode(String),

    /// A routing function produced a label with no matching target
    #[error("No route from node '{node}' for label '{label}'")]
    NoRoute { node: String, label: String },

    /// Graph construction failed validation
    #[error("Invalid graph: {0}")]
    InvalidGraph(String),

    /// The global step backstop was exceeded
    #[error("Step limit reached ({0} steps)")]
    StepLimitExceeded(u32),

    /// Node execution failed
    #[error("Node execution failed: {0}")]
    ExecutionFailed(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    /// Create an execution failed error with a message
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::ExecutionFailed(msg.into())
    }

    /// Create an invalid graph error with a message
    pub fn invalid_graph(msg: impl Into<String>) -> Self {
        Self::InvalidGraph(msg.into())
    }
}
