//! External service collaborators for Wayfarer
//!
//! Everything the dialog engine calls out to lives here, behind small
//! async traits: text generation, query embedding, and the passage index.
//! Handles are constructed explicitly and injected at graph-assembly time;
//! nothing in this crate is a global singleton. Every HTTP call carries a
//! bounded deadline, surfaced as [`ServiceError::Timeout`].

pub mod embedding;
pub mod error;
pub mod generation;
pub mod index;

// Re-export key types
pub use embedding::{EmbeddingConfig, EmbeddingService, HttpEmbeddingClient};
pub use error::{Result, ServiceError};
pub use generation::{GenerationConfig, GenerationService, HttpGenerationClient};
pub use index::{
    DocumentIndex, HttpDocumentIndex, HybridCandidates, IndexConfig, IndexHit, SparseTerm,
};
