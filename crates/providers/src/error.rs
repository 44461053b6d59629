//! Error types for external service collaborators

use thiserror::Error;

/// Result type alias using ServiceError
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors surfaced by the generation, embedding, and index collaborators
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Transport-level failure (connection refused, DNS, TLS, ...)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("Service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The call exceeded its configured deadline
    #[error("Service call timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    /// The service answered 2xx but the payload was not in the expected shape
    #[error("Invalid service response: {0}")]
    InvalidResponse(String),
}

impl ServiceError {
    /// Create an invalid response error with a message
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Build from a non-success HTTP response, consuming its body
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Self::Status { status, body }
    }
}
